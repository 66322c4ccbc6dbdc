use super::*;
use crate::subst::apply_subst;
use crate::test_utils::{app, konst, setup};

#[test]
fn variable_pattern_matches_anything() {
    let (symbols, terms) = setup();
    let x = terms.var(0);
    let t = app("f", &[konst("c", &symbols, &terms)], &symbols, &terms);
    let subst = match_term(x, t, &terms).unwrap();
    assert_eq!(subst.get(0), Some(t));
    assert_eq!(subst.len(), 1);
}

#[test]
fn match_instantiates_pattern_only() {
    let (symbols, terms) = setup();
    let x = terms.var(0);
    let y = terms.var(1);
    let e = konst("e", &symbols, &terms);

    let pattern = app("*", &[e, x], &symbols, &terms);
    let target = app("*", &[e, y], &symbols, &terms);
    let subst = match_term(pattern, target, &terms).unwrap();
    assert_eq!(apply_subst(pattern, &subst, &terms), target);

    // The reverse direction fails: `e` in the target is not a variable.
    let pattern2 = app("*", &[x, y], &symbols, &terms);
    assert!(match_term(target, pattern2, &terms).is_none());
}

#[test]
fn target_variable_is_rigid() {
    let (symbols, terms) = setup();
    let x = terms.var(0);
    let c = konst("c", &symbols, &terms);
    assert!(match_term(c, x, &terms).is_none());
}

#[test]
fn repeated_pattern_variable_must_agree() {
    let (symbols, terms) = setup();
    let x = terms.var(0);
    let a = konst("a", &symbols, &terms);
    let b = konst("b", &symbols, &terms);
    let pattern = app("f", &[x, x], &symbols, &terms);

    assert!(match_term(pattern, app("f", &[a, a], &symbols, &terms), &terms).is_some());
    assert!(match_term(pattern, app("f", &[a, b], &symbols, &terms), &terms).is_none());
}

#[test]
fn overlapping_namespaces_are_safe() {
    let (symbols, terms) = setup();
    let x = terms.var(0);
    let y = terms.var(1);
    let a = konst("a", &symbols, &terms);

    // f(x, y) against f(y, a): x := y, y := a, applied at once.
    let pattern = app("f", &[x, y], &symbols, &terms);
    let target = app("f", &[y, a], &symbols, &terms);
    let subst = match_term(pattern, target, &terms).unwrap();
    assert_eq!(apply_subst(pattern, &subst, &terms), target);
}

#[test]
fn match_pair_shares_one_substitution() {
    let (symbols, terms) = setup();
    let x = terms.var(0);
    let c = konst("c", &symbols, &terms);
    let d = konst("d", &symbols, &terms);
    let gx = app("g", &[x], &symbols, &terms);
    let gc = app("g", &[c], &symbols, &terms);

    assert!(match_pair((x, gx), (c, gc), &terms).is_some());
    assert!(match_pair((x, gx), (d, gc), &terms).is_none());
}

#[test]
fn functor_and_arity_mismatch_fail() {
    let (symbols, terms) = setup();
    let x = terms.var(0);
    let f1 = app("f", &[x], &symbols, &terms);
    let g1 = app("g", &[x], &symbols, &terms);
    let f2 = app("f", &[x, x], &symbols, &terms);
    assert!(match_term(f1, g1, &terms).is_none());
    assert!(match_term(f1, f2, &terms).is_none());
}

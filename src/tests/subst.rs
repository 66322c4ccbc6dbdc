use super::*;
use crate::test_utils::{app, konst, setup};

// ========== SUBST CONSTRUCTION ==========

#[test]
fn new_subst_is_empty() {
    let subst = Subst::new();
    assert!(subst.is_empty());
    assert_eq!(subst.len(), 0);
    assert_eq!(subst.get(0), None);
}

#[test]
fn bind_overwrites_previous() {
    let (_, terms) = setup();
    let v1 = terms.var(1);
    let v2 = terms.var(2);

    let mut subst = Subst::new();
    subst.bind(0, v1);
    subst.bind(0, v2);

    assert_eq!(subst.get(0), Some(v2));
    assert_eq!(subst.len(), 1);
    assert!(subst.is_bound(0));
    assert!(!subst.is_bound(1));
}

#[test]
fn bind_large_variable_index() {
    let (_, terms) = setup();
    let t = terms.var(0);
    let mut subst = Subst::new();
    subst.bind(1 << 30, t);
    assert_eq!(subst.get(1 << 30), Some(t));
}

// ========== APPLY ==========

#[test]
fn apply_replaces_bound_leaves() {
    let (symbols, terms) = setup();
    let c = konst("c", &symbols, &terms);
    let x = terms.var(0);
    let y = terms.var(1);
    let t = app("f", &[x, y, x], &symbols, &terms);

    let mut subst = Subst::new();
    subst.bind(0, c);

    let expected = app("f", &[c, y, c], &symbols, &terms);
    assert_eq!(apply_subst(t, &subst, &terms), expected);
}

#[test]
fn apply_leaves_unbound_and_ground_terms_alone() {
    let (symbols, terms) = setup();
    let c = konst("c", &symbols, &terms);
    let g = app("g", &[c], &symbols, &terms);
    let mut subst = Subst::new();
    subst.bind(5, c);
    assert_eq!(apply_subst(g, &subst, &terms), g);
    assert_eq!(apply_subst(terms.var(1), &subst, &terms), terms.var(1));
}

#[test]
fn apply_is_simultaneous() {
    let (symbols, terms) = setup();
    let x = terms.var(0);
    let y = terms.var(1);
    let t = app("f", &[x, y], &symbols, &terms);

    // Swap x and y: chained application would collapse both to one variable.
    let subst: Subst = [(0, y), (1, x)].into_iter().collect();
    let expected = app("f", &[y, x], &symbols, &terms);
    assert_eq!(apply_subst(t, &subst, &terms), expected);
}

#[test]
fn apply_deep_follows_chains() {
    let (symbols, terms) = setup();
    let c = konst("c", &symbols, &terms);
    let x = terms.var(0);
    let y = terms.var(1);
    let gy = app("g", &[y], &symbols, &terms);

    let subst: Subst = [(0, gy), (1, c)].into_iter().collect();
    let expected = app("g", &[c], &symbols, &terms);
    assert_eq!(apply_subst_deep(x, &subst, &terms), expected);
}

#[test]
fn resolve_bindings_is_idempotent() {
    let (symbols, terms) = setup();
    let c = konst("c", &symbols, &terms);
    let y = terms.var(1);
    let z = terms.var(2);
    let gy = app("g", &[y], &symbols, &terms);

    let triangular: Subst = [(0, gy), (1, z), (2, c)].into_iter().collect();
    let resolved = resolve_bindings(&triangular, &terms);

    assert_eq!(resolved.get(0), Some(app("g", &[c], &symbols, &terms)));
    assert_eq!(resolved.get(1), Some(c));
    assert_eq!(resolved.get(2), Some(c));
    for (_, bound) in resolved.iter() {
        assert_eq!(apply_subst(bound, &resolved, &terms), bound);
    }
}

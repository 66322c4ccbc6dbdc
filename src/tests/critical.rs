use super::*;
use crate::matching::match_pair;
use crate::order::{Kbo, Precedence};
use crate::symbol::SymbolStore;
use crate::test_utils::{app, eqn, konst};
use std::sync::Arc;

fn stores() -> (Arc<SymbolStore>, TermStore) {
    (Arc::new(SymbolStore::new()), TermStore::new())
}

fn kbo(symbols: &Arc<SymbolStore>) -> Kbo {
    Kbo::new(Precedence::new(Arc::clone(symbols)))
}

// ========== OVERLAPS ==========

#[test]
fn overlaps_skip_variable_positions() {
    let (symbols, terms) = stores();
    let x = terms.var(0);
    let y = terms.var(1);
    let g = app("f", &[x], &symbols, &terms);
    // `y` unifies with everything, but only the root of f(x) is a candidate.
    let found = overlaps(g, y, &terms);
    assert_eq!(found.len(), 1);
    assert!(found[0].position.is_empty());
}

#[test]
fn overlaps_find_inner_positions() {
    let (symbols, terms) = stores();
    let x = terms.var(0);
    let y = terms.var(1);
    let fx = app("f", &[x], &symbols, &terms);
    let g = app("g", &[fx], &symbols, &terms);
    let a = app("f", &[app("h", &[y], &symbols, &terms)], &symbols, &terms);

    let found = overlaps(g, a, &terms);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].position, vec![0]);
    assert_eq!(found[0].subst.get(0), Some(app("h", &[y], &symbols, &terms)));
}

#[test]
fn overlaps_empty_when_nothing_unifies() {
    let (symbols, terms) = stores();
    let a = konst("a", &symbols, &terms);
    let b = konst("b", &symbols, &terms);
    let g = app("f", &[a], &symbols, &terms);
    assert!(overlaps(g, b, &terms).is_empty());
}

// ========== CRITICAL PAIRS ==========

#[test]
fn identity_laws_meet_at_e_times_e() {
    let (symbols, terms) = stores();
    let order = kbo(&symbols);
    let mut supply = VarSupply::default();
    let x = terms.var(0);
    let e = konst("e", &symbols, &terms);
    let left_id = eqn(app("*", &[e, x], &symbols, &terms), x);
    let right_id = eqn(app("*", &[x, e], &symbols, &terms), x);

    let pairs = critical_pairs(left_id, right_id, &order, &mut supply, &terms).unwrap();
    assert_eq!(pairs, vec![eqn(e, e)]);
}

#[test]
fn self_overlap_produces_a_longer_instance() {
    let (symbols, terms) = stores();
    let order = kbo(&symbols);
    let mut supply = VarSupply::default();
    let x = terms.var(0);
    let fx = app("f", &[x], &symbols, &terms);
    let gfx = app("g", &[fx], &symbols, &terms);
    let rule = eqn(app("f", &[gfx], &symbols, &terms), gfx);

    let pairs = critical_pairs(rule, rule, &order, &mut supply, &terms).unwrap();

    // g(f(g(f(v)))) = f(g(g(f(v)))) for some fresh v
    let ggfx = app("g", &[gfx], &symbols, &terms);
    let pat_lhs = app("g", &[app("f", &[gfx], &symbols, &terms)], &symbols, &terms);
    let pat_rhs = app("f", &[ggfx], &symbols, &terms);
    assert!(pairs
        .iter()
        .any(|eq| match_pair((pat_lhs, pat_rhs), (eq.lhs, eq.rhs), &terms).is_some()));
}

#[test]
fn critical_pairs_use_only_fresh_variables() {
    let (symbols, terms) = stores();
    let order = kbo(&symbols);
    let mut supply = VarSupply::default();
    supply.reserve([0]);
    let x = terms.var(0);
    let fx = app("f", &[x], &symbols, &terms);
    let gfx = app("g", &[fx], &symbols, &terms);
    let rule = eqn(app("f", &[gfx], &symbols, &terms), gfx);

    for pair in critical_pairs(rule, rule, &order, &mut supply, &terms).unwrap() {
        assert!(pair.vars(&terms).iter().all(|v| !supply.is_reserved(*v)));
    }
}

#[test]
fn increasing_instances_are_pruned() {
    let (symbols, terms) = stores();
    let order = kbo(&symbols);
    let mut supply = VarSupply::default();
    let a = konst("a", &symbols, &terms);
    let b = konst("b", &symbols, &terms);

    // b > a, so `a = b` read left to right is increasing and yields nothing.
    let up = eqn(a, b);
    assert!(critical_pairs(up, up, &order, &mut supply, &terms)
        .unwrap()
        .is_empty());

    let down = eqn(b, a);
    assert_eq!(
        critical_pairs(down, down, &order, &mut supply, &terms).unwrap(),
        vec![eqn(a, a)]
    );
}

// ========== SUPERPOSER ==========

#[test]
fn superposer_skips_seen_donor_pairs() {
    let (symbols, terms) = stores();
    let order = kbo(&symbols);
    let mut supply = VarSupply::default();
    let x = terms.var(0);
    let e = konst("e", &symbols, &terms);
    let left_id = eqn(app("*", &[e, x], &symbols, &terms), x);
    let right_id = eqn(app("*", &[x, e], &symbols, &terms), x);

    let mut superposer = Superposer::new();
    let mut ctx = OverlapCtx {
        order: &order,
        supply: &mut supply,
        terms: &terms,
    };
    let first = superposer
        .against_rules(&[left_id], right_id, &mut ctx)
        .unwrap();
    assert_eq!(first, vec![eqn(e, e)]);
    assert_eq!(superposer.seen_len(), 2);

    let again = superposer
        .against_rules(&[left_id], right_id, &mut ctx)
        .unwrap();
    assert!(again.is_empty());
}

#[test]
fn against_all_considers_both_directions() {
    let (symbols, terms) = stores();
    let order = kbo(&symbols);
    let mut supply = VarSupply::default();
    let a = konst("a", &symbols, &terms);
    let b = konst("b", &symbols, &terms);

    // Stored as `a = b` although only `b -> a` decreases.
    let mut superposer = Superposer::new();
    let mut ctx = OverlapCtx {
        order: &order,
        supply: &mut supply,
        terms: &terms,
    };
    let pairs = superposer
        .against_all(&[], &[], eqn(a, b), &mut ctx)
        .unwrap();
    assert_eq!(pairs, vec![eqn(a, a)]);

    let rules_only = Superposer::new()
        .against_rules(&[eqn(a, b)], eqn(a, b), &mut ctx)
        .unwrap();
    assert!(rules_only.is_empty());
}

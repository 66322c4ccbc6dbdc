//! Readable dumps of equations and rules.

use crate::equation::Equation;
use crate::fresh::VarSupply;
use crate::symbol::SymbolStore;
use crate::term::{format_term_with, Term, TermId, TermStore};
use rustc_hash::FxHashMap;

/// Variables of `roots` in order of first appearance, left to right.
fn vars_in_order(roots: &[TermId], terms: &TermStore) -> Vec<u32> {
    let mut seen = Vec::new();
    for &root in roots {
        let mut stack = vec![root];
        while let Some(t) = stack.pop() {
            match terms.resolve(t) {
                Some(Term::Var(v)) => {
                    if !seen.contains(&v) {
                        seen.push(v);
                    }
                }
                Some(Term::App(_, kids)) => stack.extend(kids.iter().rev().copied()),
                None => {}
            }
        }
    }
    seen
}

/// Names for engine-generated variables: `v0`, `v1`, ... in order of first
/// appearance. Caller variables keep their `$N` spelling.
fn fresh_names(roots: &[TermId], terms: &TermStore, supply: &VarSupply) -> FxHashMap<u32, String> {
    vars_in_order(roots, terms)
        .into_iter()
        .filter(|v| !supply.is_reserved(*v))
        .enumerate()
        .map(|(i, v)| (v, format!("v{}", i)))
        .collect()
}

fn render_with(
    term: TermId,
    names: &FxHashMap<u32, String>,
    terms: &TermStore,
    symbols: &SymbolStore,
) -> String {
    let name = |v: u32| {
        names
            .get(&v)
            .cloned()
            .unwrap_or_else(|| format!("${}", v))
    };
    format_term_with(term, terms, symbols, &name).unwrap_or_else(|err| format!("<{}>", err))
}

/// `lhs <sep> rhs` with fresh variables renamed per equation.
pub(crate) fn render_equation(
    eq: &Equation,
    sep: &str,
    terms: &TermStore,
    symbols: &SymbolStore,
    supply: &VarSupply,
) -> String {
    let names = fresh_names(&[eq.lhs, eq.rhs], terms, supply);
    format!(
        "{} {} {}",
        render_with(eq.lhs, &names, terms, symbols),
        sep,
        render_with(eq.rhs, &names, terms, symbols)
    )
}

pub(crate) fn render_term(
    term: TermId,
    terms: &TermStore,
    symbols: &SymbolStore,
    supply: &VarSupply,
) -> String {
    let names = fresh_names(&[term], terms, supply);
    render_with(term, &names, terms, symbols)
}

/// Shortest first, then lexicographic.
pub(crate) fn by_length(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

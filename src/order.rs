//! Reduction orders used to orient equations.
//!
//! The engine only needs a strict "is greater" test. Any
//! `Fn(TermId, TermId, &TermStore) -> bool` qualifies; [`Kbo`] and [`Lpo`] are
//! ready-made simplification orders over a symbol [`Precedence`].

use crate::symbol::{FuncId, SymbolStore};
use crate::term::{Functor, Term, TermId, TermStore};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// A strict order on terms. Completion is only sound when the order is
/// well-founded, closed under substitution and compatible with term structure.
pub trait ReductionOrder {
    /// Is `lhs` strictly greater than `rhs`?
    fn greater(&self, lhs: TermId, rhs: TermId, terms: &TermStore) -> bool;

    /// Can the pair be oriented in either direction?
    fn orientable(&self, lhs: TermId, rhs: TermId, terms: &TermStore) -> bool {
        self.greater(lhs, rhs, terms) || self.greater(rhs, lhs, terms)
    }
}

impl<F> ReductionOrder for F
where
    F: Fn(TermId, TermId, &TermStore) -> bool,
{
    fn greater(&self, lhs: TermId, rhs: TermId, terms: &TermStore) -> bool {
        self(lhs, rhs, terms)
    }
}

/// Total order on symbols used by [`Kbo`] and [`Lpo`].
///
/// Explicitly ranked symbols beat unranked ones; unranked symbols compare by
/// name, then arity. Frozen variables are opaque: each is equal only to itself
/// and incomparable with everything else.
#[derive(Clone)]
pub struct Precedence {
    symbols: Arc<SymbolStore>,
    ranks: FxHashMap<FuncId, u32>,
}

impl Precedence {
    pub fn new(symbols: Arc<SymbolStore>) -> Self {
        Self {
            symbols,
            ranks: FxHashMap::default(),
        }
    }

    /// Rank symbols from greatest to least: `["i", "*", "e"]` means `i > * > e`.
    pub fn with_order(mut self, greatest_first: &[&str]) -> Self {
        self.set_order(greatest_first);
        self
    }

    pub fn set_order(&mut self, greatest_first: &[&str]) {
        self.ranks.clear();
        let n = greatest_first.len() as u32;
        for (i, name) in greatest_first.iter().enumerate() {
            let id = self.symbols.intern(name);
            self.ranks.insert(id, n - i as u32);
        }
    }

    /// Compare two heads. `None` means incomparable.
    pub fn compare(&self, f: Functor, f_arity: usize, g: Functor, g_arity: usize) -> Option<Ordering> {
        match (f, g) {
            (Functor::Frozen(x), Functor::Frozen(y)) => (x == y).then_some(Ordering::Equal),
            (Functor::Frozen(_), _) | (_, Functor::Frozen(_)) => None,
            (Functor::Sym(a), Functor::Sym(b)) => {
                if a == b {
                    return Some(f_arity.cmp(&g_arity));
                }
                let ordering = match (self.ranks.get(&a), self.ranks.get(&b)) {
                    (Some(ra), Some(rb)) => ra.cmp(rb),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => self
                        .symbols
                        .resolve(a)
                        .cmp(&self.symbols.resolve(b))
                        .then(f_arity.cmp(&g_arity)),
                };
                Some(ordering)
            }
        }
    }
}

/// Multiset of variable occurrences.
fn var_counts(term: TermId, terms: &TermStore) -> FxHashMap<u32, usize> {
    let mut counts = FxHashMap::default();
    let mut stack = vec![term];
    while let Some(t) = stack.pop() {
        match terms.resolve(t) {
            Some(Term::Var(v)) => *counts.entry(v).or_insert(0) += 1,
            Some(Term::App(_, kids)) => stack.extend(kids.iter().copied()),
            None => {}
        }
    }
    counts
}

/// Knuth–Bendix order with unit symbol weights: bigger terms are greater,
/// equal-sized terms are split by precedence, then left-to-right arguments.
#[derive(Clone)]
pub struct Kbo {
    precedence: Precedence,
}

impl Kbo {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }

    fn greater_inner(&self, s: TermId, t: TermId, terms: &TermStore) -> bool {
        if s == t {
            return false;
        }
        let (s_term, t_term) = match (terms.resolve(s), terms.resolve(t)) {
            (Some(s_term), Some(t_term)) => (s_term, t_term),
            _ => return false,
        };
        match (s_term, t_term) {
            (Term::Var(_), _) => false,
            (Term::App(_, _), Term::Var(y)) => terms.occurs(s, y),
            (Term::App(f, ss), Term::App(g, ts)) => {
                match terms.size(s).cmp(&terms.size(t)) {
                    Ordering::Greater => return true,
                    Ordering::Less => return false,
                    Ordering::Equal => {}
                }
                match self.precedence.compare(f, ss.len(), g, ts.len()) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => ss
                        .iter()
                        .zip(ts.iter())
                        .find(|(a, b)| a != b)
                        .is_some_and(|(a, b)| self.greater_inner(*a, *b, terms)),
                    _ => false,
                }
            }
        }
    }
}

impl ReductionOrder for Kbo {
    fn greater(&self, lhs: TermId, rhs: TermId, terms: &TermStore) -> bool {
        if lhs == rhs {
            return false;
        }
        let left = var_counts(lhs, terms);
        let right = var_counts(rhs, terms);
        let vars_ok = right
            .iter()
            .all(|(v, n)| left.get(v).is_some_and(|m| m >= n));
        vars_ok && self.greater_inner(lhs, rhs, terms)
    }
}

/// Lexicographic path order over a precedence.
#[derive(Clone)]
pub struct Lpo {
    precedence: Precedence,
}

impl Lpo {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }
}

impl ReductionOrder for Lpo {
    fn greater(&self, s: TermId, t: TermId, terms: &TermStore) -> bool {
        if s == t {
            return false;
        }
        let (s_term, t_term) = match (terms.resolve(s), terms.resolve(t)) {
            (Some(s_term), Some(t_term)) => (s_term, t_term),
            _ => return false,
        };
        match (s_term, t_term) {
            (Term::Var(_), _) => false,
            (Term::App(_, _), Term::Var(y)) => terms.occurs(s, y),
            (Term::App(f, ss), Term::App(g, ts)) => {
                if ss.iter().any(|si| *si == t || self.greater(*si, t, terms)) {
                    return true;
                }
                let dominates_args = || ts.iter().all(|tj| self.greater(s, *tj, terms));
                match self.precedence.compare(f, ss.len(), g, ts.len()) {
                    Some(Ordering::Greater) => dominates_args(),
                    Some(Ordering::Equal) => {
                        let lex = ss
                            .iter()
                            .zip(ts.iter())
                            .find(|(a, b)| a != b)
                            .is_some_and(|(a, b)| self.greater(*a, *b, terms));
                        lex && dominates_args()
                    }
                    _ => false,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/order.rs"]
mod tests;

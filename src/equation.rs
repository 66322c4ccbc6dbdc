//! Equations and rules as directed term pairs, plus subsumption.

use crate::matching::match_pair;
use crate::symbol::SymbolStore;
use crate::term::{format_term, TermId, TermStore};

/// A pair of terms stored directionally.
///
/// As a worklist entry it asserts an undirected equality; in the rule set the
/// same type reads as `lhs -> rhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Equation {
    pub lhs: TermId,
    pub rhs: TermId,
}

impl Equation {
    pub fn new(lhs: TermId, rhs: TermId) -> Self {
        Self { lhs, rhs }
    }

    pub fn reversed(self) -> Self {
        Self {
            lhs: self.rhs,
            rhs: self.lhs,
        }
    }

    /// Both sides syntactically equal.
    pub fn is_trivial(&self) -> bool {
        self.lhs == self.rhs
    }

    /// Sorted, duplicate-free variables of both sides.
    pub fn vars(&self, terms: &TermStore) -> Vec<u32> {
        let mut all = terms.vars(self.lhs).to_vec();
        all.extend_from_slice(&terms.vars(self.rhs));
        all.sort_unstable();
        all.dedup();
        all
    }

    /// Do the two equations share a variable?
    pub fn shares_vars_with(&self, other: &Equation, terms: &TermStore) -> bool {
        let mine = self.vars(terms);
        other
            .vars(terms)
            .iter()
            .any(|v| mine.binary_search(v).is_ok())
    }

    /// Render as `lhs <sep> rhs`.
    pub fn format(
        &self,
        sep: &str,
        terms: &TermStore,
        symbols: &SymbolStore,
    ) -> Result<String, String> {
        Ok(format!(
            "{} {} {}",
            format_term(self.lhs, terms, symbols)?,
            sep,
            format_term(self.rhs, terms, symbols)?
        ))
    }
}

/// Is `candidate` an instance of `general`, side for side?
///
/// One substitution applied to the stored `general` must produce `candidate`.
pub fn subsumes(general: &Equation, candidate: &Equation, terms: &TermStore) -> bool {
    match_pair(
        (general.lhs, general.rhs),
        (candidate.lhs, candidate.rhs),
        terms,
    )
    .is_some()
}

/// Subsumption in any of the four sign combinations.
///
/// Reversing both equations gives the same match as reversing neither, and
/// reversing only one gives the same match whichever one is reversed.
pub fn subsumes_any_direction(general: &Equation, candidate: &Equation, terms: &TermStore) -> bool {
    subsumes(general, candidate, terms) || subsumes(general, &candidate.reversed(), terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{app, konst, setup};

    #[test]
    fn reversed_swaps_sides() {
        let (_, terms) = setup();
        let eq = Equation::new(terms.var(0), terms.var(1));
        assert_eq!(eq.reversed(), Equation::new(terms.var(1), terms.var(0)));
        assert_eq!(eq.reversed().reversed(), eq);
    }

    #[test]
    fn general_equation_subsumes_its_instance() {
        let (symbols, terms) = setup();
        let x = terms.var(0);
        let c = konst("c", &symbols, &terms);
        let general = Equation::new(app("f", &[x], &symbols, &terms), x);
        let instance = Equation::new(app("f", &[c], &symbols, &terms), c);

        assert!(subsumes(&general, &instance, &terms));
        assert!(!subsumes(&instance, &general, &terms));
    }

    #[test]
    fn subsumption_needs_one_substitution_for_both_sides() {
        let (symbols, terms) = setup();
        let x = terms.var(0);
        let a = konst("a", &symbols, &terms);
        let b = konst("b", &symbols, &terms);
        let general = Equation::new(app("f", &[x], &symbols, &terms), x);
        let not_instance = Equation::new(app("f", &[a], &symbols, &terms), b);
        assert!(!subsumes(&general, &not_instance, &terms));
    }

    #[test]
    fn reversed_instance_is_caught_in_any_direction() {
        let (symbols, terms) = setup();
        let x = terms.var(0);
        let c = konst("c", &symbols, &terms);
        let general = Equation::new(app("f", &[x], &symbols, &terms), x);
        let flipped = Equation::new(c, app("f", &[c], &symbols, &terms));

        assert!(!subsumes(&general, &flipped, &terms));
        assert!(subsumes_any_direction(&general, &flipped, &terms));
        assert!(subsumes_any_direction(&general.reversed(), &flipped, &terms));
    }

    #[test]
    fn renamed_variants_subsume_each_other() {
        let (symbols, terms) = setup();
        let x = terms.var(0);
        let y = terms.var(1);
        let u = terms.var(10);
        let v = terms.var(11);
        let comm = Equation::new(
            app("f", &[x, y], &symbols, &terms),
            app("f", &[y, x], &symbols, &terms),
        );
        let renamed = Equation::new(
            app("f", &[u, v], &symbols, &terms),
            app("f", &[v, u], &symbols, &terms),
        );
        assert!(subsumes(&comm, &renamed, &terms));
        assert!(subsumes(&renamed, &comm, &terms));
    }

    #[test]
    fn shares_vars_detects_overlap() {
        let (_, terms) = setup();
        let a = Equation::new(terms.var(0), terms.var(1));
        let b = Equation::new(terms.var(1), terms.var(2));
        let c = Equation::new(terms.var(3), terms.var(4));
        assert!(a.shares_vars_with(&b, &terms));
        assert!(!a.shares_vars_with(&c, &terms));
    }
}

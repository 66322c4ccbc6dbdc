//! Fresh-variable supply and renaming apart.

use crate::equation::Equation;
use crate::subst::{apply_subst, Subst};
use crate::term::TermStore;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// First index handed out by the default supply. Variables below it are left
/// to callers.
pub const FRESH_BASE: u32 = 1 << 24;

/// The fresh-variable source ran dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("fresh variable supply exhausted")]
pub struct Exhausted;

/// Counting iterator of variable indices.
#[derive(Debug, Clone)]
pub struct FreshVars {
    next: u32,
}

impl FreshVars {
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }
}

impl Default for FreshVars {
    fn default() -> Self {
        Self::starting_at(FRESH_BASE)
    }
}

impl Iterator for FreshVars {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let current = self.next;
        self.next = self.next.checked_add(1)?;
        Some(current)
    }
}

/// Wraps a caller-supplied variable source and guarantees it never hands out
/// an index reserved for caller terms.
pub struct VarSupply {
    source: Box<dyn Iterator<Item = u32> + Send>,
    reserved: FxHashSet<u32>,
}

impl VarSupply {
    pub fn new(source: impl Iterator<Item = u32> + Send + 'static) -> Self {
        Self {
            source: Box::new(source),
            reserved: FxHashSet::default(),
        }
    }

    /// Mark variables as belonging to caller terms.
    pub fn reserve(&mut self, vars: impl IntoIterator<Item = u32>) {
        self.reserved.extend(vars);
    }

    /// Was `var` supplied by the caller (as opposed to drawn from the source)?
    pub fn is_reserved(&self, var: u32) -> bool {
        self.reserved.contains(&var)
    }

    pub fn next_var(&mut self) -> Result<u32, Exhausted> {
        loop {
            let var = self.source.next().ok_or(Exhausted)?;
            if !self.reserved.contains(&var) {
                return Ok(var);
            }
        }
    }

    /// Rename every variable of `eq` to a fresh one.
    pub fn rename_apart(&mut self, eq: Equation, terms: &TermStore) -> Result<Equation, Exhausted> {
        let mut subst = Subst::new();
        for var in eq.vars(terms) {
            subst.bind(var, terms.var(self.next_var()?));
        }
        Ok(Equation::new(
            apply_subst(eq.lhs, &subst, terms),
            apply_subst(eq.rhs, &subst, terms),
        ))
    }
}

impl Default for VarSupply {
    fn default() -> Self {
        Self::new(FreshVars::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{app, setup};

    #[test]
    fn fresh_vars_count_up() {
        let vars: Vec<u32> = FreshVars::starting_at(5).take(3).collect();
        assert_eq!(vars, vec![5, 6, 7]);
    }

    #[test]
    fn fresh_vars_stop_at_overflow() {
        let vars: Vec<u32> = FreshVars::starting_at(u32::MAX - 1).collect();
        assert_eq!(vars, vec![u32::MAX - 1]);
    }

    #[test]
    fn supply_skips_reserved_indices() {
        let mut supply = VarSupply::new(0u32..);
        supply.reserve([0, 1, 3]);
        assert_eq!(supply.next_var(), Ok(2));
        assert_eq!(supply.next_var(), Ok(4));
        assert!(supply.is_reserved(3));
        assert!(!supply.is_reserved(2));
    }

    #[test]
    fn exhausted_supply_reports_error() {
        let mut supply = VarSupply::new(0u32..2);
        supply.reserve([1]);
        assert_eq!(supply.next_var(), Ok(0));
        assert_eq!(supply.next_var(), Err(Exhausted));
    }

    #[test]
    fn rename_apart_produces_disjoint_variant() {
        let (symbols, terms) = setup();
        let x = terms.var(0);
        let y = terms.var(1);
        let eq = Equation::new(
            app("f", &[x, y], &symbols, &terms),
            app("f", &[y, x], &symbols, &terms),
        );
        let mut supply = VarSupply::new(FreshVars::starting_at(100));
        let renamed = supply.rename_apart(eq, &terms).unwrap();

        assert!(!renamed.shares_vars_with(&eq, &terms));
        let u = terms.var(100);
        let v = terms.var(101);
        assert_eq!(
            renamed,
            Equation::new(
                app("f", &[u, v], &symbols, &terms),
                app("f", &[v, u], &symbols, &terms),
            )
        );
    }
}

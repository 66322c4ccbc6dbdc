//! Normalization under rules and, in unfailing mode, ordered equations.
//!
//! One pass rewrites every argument first, then tries the rules at the top in
//! insertion order (each applies to the term as left by the previous one),
//! then each equation in both directions. An equation instance only fires
//! when the order says it decreases. Passes repeat until nothing changes.
//!
//! Two budgets bound a normalization: the number of passes, and how far the
//! term may grow past its starting size. A single pass can double a term
//! under a self-embedding rule, so growth is checked after every rewrite.

use crate::equation::Equation;
use crate::fresh::{Exhausted, VarSupply};
use crate::matching::match_term;
use crate::order::ReductionOrder;
use crate::subst::{apply_subst, Subst};
use crate::term::{Term, TermError, TermId, TermStore};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

#[cfg(feature = "tracing")]
use crate::trace::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("reduction of {original:?} did not settle after {passes} passes (last {last:?})")]
    Diverged {
        original: TermId,
        last: TermId,
        passes: usize,
    },
    #[error(transparent)]
    Exhausted(#[from] Exhausted),
    #[error(transparent)]
    Term(#[from] TermError),
}

/// Rewrites terms with a fixed rule list and equation list.
///
/// Results of single passes are memoized for the lifetime of the rewriter, so
/// build a new one whenever the rules or equations change.
pub struct Rewriter<'a> {
    terms: &'a TermStore,
    order: &'a dyn ReductionOrder,
    supply: &'a mut VarSupply,
    rules: &'a [Equation],
    equations: &'a [Equation],
    max_passes: usize,
    max_growth: usize,
    memo: FxHashMap<TermId, TermId>,
    passes: usize,
    /// State of the running `normalize` call.
    origin: Option<TermId>,
    ceiling: usize,
    call_passes: usize,
}

/// Default for [`Rewriter::with_max_growth`].
pub const DEFAULT_MAX_GROWTH: usize = 1_000;

impl<'a> Rewriter<'a> {
    pub fn new(
        terms: &'a TermStore,
        order: &'a dyn ReductionOrder,
        supply: &'a mut VarSupply,
        max_passes: usize,
    ) -> Self {
        Self {
            terms,
            order,
            supply,
            rules: &[],
            equations: &[],
            max_passes,
            max_growth: DEFAULT_MAX_GROWTH,
            memo: FxHashMap::default(),
            passes: 0,
            origin: None,
            ceiling: usize::MAX,
            call_passes: 0,
        }
    }

    /// Nodes a term may gain over its starting size before normalization
    /// gives up as divergent.
    pub fn with_max_growth(mut self, max_growth: usize) -> Self {
        self.max_growth = max_growth;
        self
    }

    pub fn with_rules(mut self, rules: &'a [Equation]) -> Self {
        self.rules = rules;
        self
    }

    /// Equations used in both directions, guarded by the order.
    pub fn with_equations(mut self, equations: &'a [Equation]) -> Self {
        self.equations = equations;
        self
    }

    /// Total passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Rewrite `term` until a pass leaves it unchanged.
    pub fn normalize(&mut self, term: TermId) -> Result<TermId, RewriteError> {
        self.origin = Some(term);
        self.ceiling = self.terms.size(term).saturating_add(self.max_growth);
        self.call_passes = 0;

        let mut current = term;
        while self.call_passes < self.max_passes {
            let next = self.pass(current)?;
            self.passes += 1;
            self.call_passes += 1;
            if next == current {
                #[cfg(feature = "tracing")]
                trace!(term = ?term, normal = ?current, "normalized");
                return Ok(current);
            }
            current = next;
        }
        Err(self.diverged(current))
    }

    fn diverged(&self, last: TermId) -> RewriteError {
        let original = self.origin.unwrap_or(last);

        #[cfg(feature = "tracing")]
        debug!(term = ?original, last = ?last, passes = self.call_passes, "reduction_diverged");

        RewriteError::Diverged {
            original,
            last,
            passes: self.call_passes,
        }
    }

    /// Arguments first, then the top.
    fn pass(&mut self, term: TermId) -> Result<TermId, RewriteError> {
        if let Some(&done) = self.memo.get(&term) {
            return Ok(done);
        }
        let inner = match self.terms.resolve(term) {
            Some(Term::Var(_)) => term,
            Some(Term::App(functor, kids)) => {
                let mut changed = false;
                let mut new_kids: SmallVec<[TermId; 4]> = SmallVec::with_capacity(kids.len());
                for kid in kids {
                    let reduced = self.pass(kid)?;
                    changed |= reduced != kid;
                    new_kids.push(reduced);
                }
                if changed {
                    self.terms.app_functor(functor, new_kids)
                } else {
                    term
                }
            }
            None => return Err(TermError::UnknownTerm(term).into()),
        };
        let out = self.rewrite_top(inner)?;
        if self.terms.size(out) > self.ceiling {
            return Err(self.diverged(out));
        }
        self.memo.insert(term, out);
        Ok(out)
    }

    fn rewrite_top(&mut self, mut term: TermId) -> Result<TermId, RewriteError> {
        let rules = self.rules;
        for &rule in rules {
            if let Some(subst) = match_term(rule.lhs, term, self.terms) {
                term = self.instantiate_rhs(rule, subst, term)?;
            }
        }

        let equations = self.equations;
        for &eq in equations {
            for directed in [eq, eq.reversed()] {
                if let Some(subst) = match_term(directed.lhs, term, self.terms) {
                    let rhs = self.instantiate_rhs(directed, subst, term)?;
                    if self.order.greater(term, rhs, self.terms) {
                        term = rhs;
                    }
                }
            }
        }
        Ok(term)
    }

    /// Apply the match to the right side. Right-side variables the match left
    /// unbound are renamed when they would collide with variables of `target`.
    fn instantiate_rhs(
        &mut self,
        rule: Equation,
        mut subst: Subst,
        target: TermId,
    ) -> Result<TermId, RewriteError> {
        let target_vars = self.terms.vars(target);
        for var in self.terms.vars(rule.rhs).iter().copied() {
            if !subst.is_bound(var) && target_vars.binary_search(&var).is_ok() {
                subst.bind(var, self.terms.var(self.supply.next_var()?));
            }
        }
        Ok(apply_subst(rule.rhs, &subst, self.terms))
    }
}

#[cfg(test)]
#[path = "tests/rewrite.rs"]
mod tests;

//! Critical pairs: superposition of one equation's left side into another's.

use crate::equation::Equation;
use crate::fresh::{Exhausted, VarSupply};
use crate::order::ReductionOrder;
use crate::subst::{apply_subst, Subst};
use crate::term::{Position, TermError, TermId, TermStore};
use crate::unify::unify;
use rustc_hash::FxHashSet;
use thiserror::Error;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// A unifiable non-variable position of `g` against `a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub position: Position,
    pub subst: Subst,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlapError {
    #[error(transparent)]
    Exhausted(#[from] Exhausted),
    #[error(transparent)]
    Term(#[from] TermError),
}

/// Every non-variable position of `g` (root included) whose subterm unifies
/// with `a`. `g` and `a` must not share variables.
pub fn overlaps(g: TermId, a: TermId, terms: &TermStore) -> Vec<Overlap> {
    terms
        .non_var_positions(g)
        .into_iter()
        .filter_map(|(position, sub)| {
            unify(sub, a, terms).map(|subst| Overlap { position, subst })
        })
        .collect()
}

/// Critical pairs from overlapping `ab`'s left side into `gd`'s left side.
///
/// Both donors are renamed apart first. For each overlap σ at position p the
/// pair `(dσ, g[p ← b]σ)` is produced, unless σ makes either donor fail to
/// decrease: `dσ > gσ` or `gσ = dσ`, likewise `bσ > aσ` or `aσ = bσ`.
pub fn critical_pairs(
    gd: Equation,
    ab: Equation,
    order: &dyn ReductionOrder,
    supply: &mut VarSupply,
    terms: &TermStore,
) -> Result<Vec<Equation>, OverlapError> {
    let ab = supply.rename_apart(ab, terms)?;
    let gd = supply.rename_apart(gd, terms)?;

    let mut out = Vec::new();
    for Overlap { position, subst } in overlaps(gd.lhs, ab.lhs, terms) {
        let gs = apply_subst(gd.lhs, &subst, terms);
        let ds = apply_subst(gd.rhs, &subst, terms);
        if gs == ds || order.greater(ds, gs, terms) {
            continue;
        }
        let a_s = apply_subst(ab.lhs, &subst, terms);
        let bs = apply_subst(ab.rhs, &subst, terms);
        if a_s == bs || order.greater(bs, a_s, terms) {
            continue;
        }
        let replaced = terms.replace_at(gd.lhs, &position, ab.rhs)?;
        let pair = Equation::new(ds, apply_subst(replaced, &subst, terms));
        if !out.contains(&pair) {
            out.push(pair);
        }
    }

    #[cfg(feature = "tracing")]
    trace!(pairs = out.len(), "critical_pairs");

    Ok(out)
}

/// Critical-pair generation with memoization of already-superposed donor
/// pairs. One instance belongs to one completion run.
#[derive(Debug, Default)]
pub struct Superposer {
    seen: FxHashSet<(Equation, Equation)>,
}

/// Ordered, duplicate-free accumulator.
struct Collected {
    pairs: Vec<Equation>,
    index: FxHashSet<Equation>,
}

impl Collected {
    fn new() -> Self {
        Self {
            pairs: Vec::new(),
            index: FxHashSet::default(),
        }
    }

    fn extend(&mut self, pairs: Vec<Equation>) {
        for pair in pairs {
            if self.index.insert(pair) {
                self.pairs.push(pair);
            }
        }
    }
}

/// Shared arguments for one round of superposition.
pub struct OverlapCtx<'a> {
    pub order: &'a dyn ReductionOrder,
    pub supply: &'a mut VarSupply,
    pub terms: &'a TermStore,
}

impl Superposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of donor pairs superposed so far.
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    fn superpose(
        &mut self,
        gd: Equation,
        ab: Equation,
        ctx: &mut OverlapCtx<'_>,
        out: &mut Collected,
    ) -> Result<(), OverlapError> {
        if self.seen.insert((gd, ab)) {
            out.extend(critical_pairs(gd, ab, ctx.order, ctx.supply, ctx.terms)?);
        }
        Ok(())
    }

    /// `ab` against every rule, in both overlap orders.
    pub fn against_rules(
        &mut self,
        rules: &[Equation],
        ab: Equation,
        ctx: &mut OverlapCtx<'_>,
    ) -> Result<Vec<Equation>, OverlapError> {
        let mut out = Collected::new();
        for &gd in rules {
            self.superpose(ab, gd, ctx, &mut out)?;
            self.superpose(gd, ab, ctx, &mut out)?;
        }
        Ok(out.pairs)
    }

    /// The unfailing variant: `ab` and its reverse against every pending
    /// equation in both directions, against themselves, and against every rule.
    pub fn against_all(
        &mut self,
        equations: &[Equation],
        rules: &[Equation],
        ab: Equation,
        ctx: &mut OverlapCtx<'_>,
    ) -> Result<Vec<Equation>, OverlapError> {
        let ba = ab.reversed();
        let mut donors: Vec<Equation> = equations.to_vec();
        for extra in [ab, ba] {
            if !donors.contains(&extra) {
                donors.push(extra);
            }
        }

        let mut out = Collected::new();
        for gd in donors {
            let dg = gd.reversed();
            for side in [ab, ba] {
                for other in [gd, dg] {
                    self.superpose(side, other, ctx, &mut out)?;
                    self.superpose(other, side, ctx, &mut out)?;
                }
            }
        }
        for &gd in rules {
            for side in [ab, ba] {
                self.superpose(side, gd, ctx, &mut out)?;
                self.superpose(gd, side, ctx, &mut out)?;
            }
        }
        Ok(out.pairs)
    }
}

#[cfg(test)]
#[path = "tests/critical.rs"]
mod tests;

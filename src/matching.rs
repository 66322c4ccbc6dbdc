//! One-directional matching: instantiate only the pattern side.
//!
//! Bindings are applied simultaneously, so the pattern and the target may
//! share variable names without renaming apart.

use crate::subst::Subst;
use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Find σ with `σ(pattern) == target`.
pub fn match_term(pattern: TermId, target: TermId, terms: &TermStore) -> Option<Subst> {
    match_pairs(&[(pattern, target)], terms)
}

/// Find one σ with `σ(p.0) == t.0` and `σ(p.1) == t.1`.
pub fn match_pair(
    pattern: (TermId, TermId),
    target: (TermId, TermId),
    terms: &TermStore,
) -> Option<Subst> {
    match_pairs(&[(pattern.0, target.0), (pattern.1, target.1)], terms)
}

/// Match every `(pattern, target)` pair under a single substitution.
pub fn match_pairs(pairs: &[(TermId, TermId)], terms: &TermStore) -> Option<Subst> {
    let mut subst = Subst::new();
    let mut worklist: SmallVec<[(TermId, TermId); 32]> = SmallVec::from_slice(pairs);

    while let Some((pattern, target)) = worklist.pop() {
        if terms.is_ground(pattern) {
            if pattern != target {
                #[cfg(feature = "tracing")]
                trace!("match_ground_mismatch");
                return None;
            }
            continue;
        }

        match terms.resolve(pattern)? {
            Term::Var(idx) => match subst.get(idx) {
                Some(bound) if bound != target => {
                    #[cfg(feature = "tracing")]
                    trace!(var = idx, "match_inconsistent_binding");
                    return None;
                }
                Some(_) => {}
                None => subst.bind(idx, target),
            },
            Term::App(f, pattern_kids) => match terms.resolve(target)? {
                Term::App(g, target_kids) if f == g && pattern_kids.len() == target_kids.len() => {
                    worklist.extend(pattern_kids.iter().copied().zip(target_kids.iter().copied()));
                }
                _ => {
                    #[cfg(feature = "tracing")]
                    trace!("match_functor_mismatch");
                    return None;
                }
            },
        }
    }

    Some(subst)
}

#[cfg(test)]
#[path = "tests/matching.rs"]
mod tests;

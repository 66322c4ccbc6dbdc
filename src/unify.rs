//! Syntactic most-general unification with occurs-check.

use crate::subst::{resolve_bindings, Subst};
use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::{debug_span, trace};

/// Unify two terms, returning an idempotent most general unifier.
/// Returns None if the terms cannot be unified.
pub fn unify(t1: TermId, t2: TermId, terms: &TermStore) -> Option<Subst> {
    unify_pairs(&[(t1, t2)], terms)
}

/// Simultaneously unify every pair in `pairs` under one substitution.
///
/// Uses an explicit worklist to avoid recursion.
pub fn unify_pairs(pairs: &[(TermId, TermId)], terms: &TermStore) -> Option<Subst> {
    #[cfg(feature = "tracing")]
    let _span = debug_span!("unify", pairs = pairs.len()).entered();

    let mut subst = Subst::new();
    let mut worklist: SmallVec<[(TermId, TermId); 32]> = SmallVec::from_slice(pairs);

    while let Some((a, b)) = worklist.pop() {
        let a_deref = deref(a, &subst, terms);
        let b_deref = deref(b, &subst, terms);

        if a_deref == b_deref {
            continue;
        }

        match (terms.resolve(a_deref), terms.resolve(b_deref)) {
            (Some(Term::Var(idx_a)), Some(Term::Var(idx_b))) => {
                // Bind the higher index to the lower one for stable results.
                if idx_a < idx_b {
                    subst.bind(idx_b, a_deref);
                } else {
                    subst.bind(idx_a, b_deref);
                }
            }
            (Some(Term::Var(idx)), Some(Term::App(_, _))) => {
                if occurs(idx, b_deref, &subst, terms) {
                    #[cfg(feature = "tracing")]
                    trace!(var = idx, "unify_occurs_check_failed");
                    return None;
                }
                subst.bind(idx, b_deref);
            }
            (Some(Term::App(_, _)), Some(Term::Var(idx))) => {
                if occurs(idx, a_deref, &subst, terms) {
                    #[cfg(feature = "tracing")]
                    trace!(var = idx, "unify_occurs_check_failed");
                    return None;
                }
                subst.bind(idx, a_deref);
            }
            (Some(Term::App(f1, children1)), Some(Term::App(f2, children2))) => {
                if f1 != f2 || children1.len() != children2.len() {
                    #[cfg(feature = "tracing")]
                    trace!("unify_functor_mismatch");
                    return None;
                }
                for (c1, c2) in children1.iter().zip(children2.iter()) {
                    worklist.push((*c1, *c2));
                }
            }
            _ => {
                #[cfg(feature = "tracing")]
                trace!("unify_invalid_term");
                return None;
            }
        }
    }

    #[cfg(feature = "tracing")]
    trace!(bindings = subst.len(), "unify_success");

    Some(resolve_bindings(&subst, terms))
}

/// Follow variable bindings until reaching an unbound variable or an application.
fn deref(term: TermId, subst: &Subst, terms: &TermStore) -> TermId {
    let mut current = term;
    while let Some(idx) = terms.is_var(current) {
        match subst.get(idx) {
            Some(bound) => current = bound,
            None => break,
        }
    }
    current
}

/// Does `var` occur in `term` once bindings are followed?
fn occurs(var: u32, term: TermId, subst: &Subst, terms: &TermStore) -> bool {
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    stack.push(term);

    while let Some(t) = stack.pop() {
        if terms.is_ground(t) {
            continue;
        }
        match terms.resolve(deref(t, subst, terms)) {
            Some(Term::Var(idx)) if idx == var => return true,
            Some(Term::App(_, children)) => stack.extend(children.iter().copied()),
            _ => {}
        }
    }

    false
}

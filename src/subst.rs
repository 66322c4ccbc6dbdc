use crate::term::{Term, TermId, TermStore};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// A substitution maps variable indices to terms.
/// Unbound variables map to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subst {
    bindings: FxHashMap<u32, TermId>,
}

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a term, replacing any previous binding.
    pub fn bind(&mut self, var: u32, term: TermId) {
        self.bindings.insert(var, term);
    }

    /// Get the binding for a variable, if any.
    pub fn get(&self, var: u32) -> Option<TermId> {
        self.bindings.get(&var).copied()
    }

    pub fn is_bound(&self, var: u32) -> bool {
        self.bindings.contains_key(&var)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Iterator over (var_index, term_id) pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, TermId)> + '_ {
        self.bindings.iter().map(|(&v, &t)| (v, t))
    }
}

impl FromIterator<(u32, TermId)> for Subst {
    fn from_iter<I: IntoIterator<Item = (u32, TermId)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// Apply a substitution to a term, replacing every bound variable leaf at once.
///
/// Replacements are not themselves substituted again, so the substitution may
/// mention variables from its own domain in its range.
pub fn apply_subst(term: TermId, subst: &Subst, terms: &TermStore) -> TermId {
    if subst.is_empty() {
        return term;
    }
    if !terms.vars(term).iter().any(|v| subst.is_bound(*v)) {
        return term;
    }
    match terms.resolve(term) {
        Some(Term::Var(idx)) => subst.get(idx).unwrap_or(term),
        Some(Term::App(func, children)) => {
            let new_children: SmallVec<[TermId; 4]> = children
                .iter()
                .map(|c| apply_subst(*c, subst, terms))
                .collect();
            terms.app_functor(func, new_children)
        }
        None => term,
    }
}

/// Apply a triangular substitution, following binding chains until no bound
/// variable remains. The substitution must be acyclic (occurs-checked).
pub fn apply_subst_deep(term: TermId, subst: &Subst, terms: &TermStore) -> TermId {
    let mut current = term;
    loop {
        let next = apply_subst(current, subst, terms);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Rewrite a triangular substitution into an idempotent one: no bound variable
/// occurs in any binding.
pub fn resolve_bindings(subst: &Subst, terms: &TermStore) -> Subst {
    subst
        .iter()
        .map(|(var, bound)| (var, apply_subst_deep(bound, subst, terms)))
        .filter(|&(var, bound)| terms.is_var(bound) != Some(var))
        .collect()
}

#[cfg(test)]
#[path = "tests/subst.rs"]
mod tests;

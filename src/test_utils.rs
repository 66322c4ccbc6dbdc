use crate::equation::Equation;
use crate::symbol::SymbolStore;
use crate::term::{TermId, TermStore};
use smallvec::SmallVec;

pub(crate) fn setup() -> (SymbolStore, TermStore) {
    (SymbolStore::new(), TermStore::new())
}

/// Constant `name`.
pub(crate) fn konst(name: &str, symbols: &SymbolStore, terms: &TermStore) -> TermId {
    terms.app0(symbols.intern(name))
}

/// Application `name(args...)`.
pub(crate) fn app(
    name: &str,
    args: &[TermId],
    symbols: &SymbolStore,
    terms: &TermStore,
) -> TermId {
    terms.app(symbols.intern(name), SmallVec::from_slice(args))
}

pub(crate) fn eqn(lhs: TermId, rhs: TermId) -> Equation {
    Equation::new(lhs, rhs)
}

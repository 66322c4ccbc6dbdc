use lasso::{Spur, ThreadedRodeo};

/// Interned identifier for a function or constant symbol.
pub type FuncId = Spur;

/// Thread-safe interner for function and constant names.
///
/// Guarantees:
/// - Same string always produces same FuncId
/// - Different strings always produce different FuncIds
/// - FuncId can be resolved back to the original string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a symbol name, returning its FuncId.
    pub fn intern(&self, name: &str) -> FuncId {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a FuncId back to its name.
    /// Returns None if the FuncId was not created by this store.
    pub fn resolve(&self, id: FuncId) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Get the FuncId for a name if it exists, without interning.
    pub fn get(&self, name: &str) -> Option<FuncId> {
        self.rodeo.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }

    /// Number of distinct symbols interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let symbols = SymbolStore::new();
        let a = symbols.intern("e");
        let b = symbols.intern("e");
        assert_eq!(a, b);
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn distinct_names_get_distinct_ids() {
        let symbols = SymbolStore::new();
        assert_ne!(symbols.intern("*"), symbols.intern("e"));
    }

    #[test]
    fn resolve_round_trips_name() {
        let symbols = SymbolStore::new();
        let id = symbols.intern("inv");
        assert_eq!(symbols.resolve(id), Some("inv"));
        assert!(symbols.contains("inv"));
        assert_eq!(symbols.get("inv"), Some(id));
        assert_eq!(symbols.get("missing"), None);
    }
}

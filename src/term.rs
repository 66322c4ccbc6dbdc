use crate::symbol::{FuncId, SymbolStore};
use hashbrown::HashMap;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

/// Unique identifier for a term in the term store.
/// Two TermIds from the same store are equal iff the terms are structurally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Head symbol of an application node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Functor {
    /// An ordinary function or constant symbol.
    Sym(FuncId),
    /// A variable turned into a rigid constant by [`TermStore::freeze`].
    Frozen(u32),
}

/// A term is either a variable or a function application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(u32),
    /// Functor applied to children; a constant has no children.
    App(Functor, SmallVec<[TermId; 4]>),
}

/// Child-index path from the root of a term (empty = the root itself).
pub type Position = Vec<usize>;

/// Failures of structural term operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermError {
    #[error("unknown term id {0:?}")]
    UnknownTerm(TermId),
    #[error("position {0:?} does not address a subterm")]
    InvalidPosition(Position),
    #[error("variable ${0} was never frozen")]
    NotFrozen(u32),
}

type FxBuild = BuildHasherDefault<FxHasher>;

/// Number of shards for hashcons maps (power of 2 for fast modulo).
const NUM_SHARDS: usize = 16;

struct Entry {
    term: Term,
    size: u32,
}

/// Hash-consing term store.
///
/// Terms are immutable values: every transformation interns a new node and
/// returns its id. Derived data (variable sets, frozen/unfrozen images) is
/// computed on demand and cached per id.
pub struct TermStore {
    nodes: RwLock<Vec<Entry>>,
    shards: [RwLock<HashMap<Term, TermId, FxBuild>>; NUM_SHARDS],
    vars: RwLock<FxHashMap<TermId, Arc<[u32]>>>,
    frozen: RwLock<FxHashMap<TermId, TermId>>,
    thawed: RwLock<FxHashMap<TermId, TermId>>,
}

impl TermStore {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(Vec::new()),
            shards: std::array::from_fn(|_| RwLock::new(HashMap::default())),
            vars: RwLock::new(FxHashMap::default()),
            frozen: RwLock::new(FxHashMap::default()),
            thawed: RwLock::new(FxHashMap::default()),
        }
    }

    fn intern(&self, term: Term) -> TermId {
        let shard = &self.shards[Self::shard_index(&term)];

        if let Some(&id) = shard.read().get(&term) {
            return id;
        }

        let mut map = shard.write();
        // Another writer may have won the race while we waited.
        if let Some(&id) = map.get(&term) {
            return id;
        }

        let mut nodes = self.nodes.write();
        let size = match &term {
            Term::Var(_) => 1,
            Term::App(_, kids) => 1 + kids
                .iter()
                .map(|k| nodes.get(k.0 as usize).map_or(1, |e| e.size))
                .sum::<u32>(),
        };
        let id = TermId(nodes.len() as u32);
        nodes.push(Entry {
            term: term.clone(),
            size,
        });
        map.insert(term, id);
        id
    }

    fn shard_index(term: &Term) -> usize {
        let mut hasher = FxHasher::default();
        term.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    /// Create a variable term.
    pub fn var(&self, index: u32) -> TermId {
        self.intern(Term::Var(index))
    }

    /// Create an application of an ordinary symbol.
    pub fn app(&self, func: FuncId, children: SmallVec<[TermId; 4]>) -> TermId {
        self.intern(Term::App(Functor::Sym(func), children))
    }

    /// Create an application with an arbitrary functor.
    pub fn app_functor(&self, functor: Functor, children: SmallVec<[TermId; 4]>) -> TermId {
        self.intern(Term::App(functor, children))
    }

    pub fn app0(&self, func: FuncId) -> TermId {
        self.app(func, SmallVec::new())
    }

    pub fn app1(&self, func: FuncId, child: TermId) -> TermId {
        self.app(func, smallvec::smallvec![child])
    }

    pub fn app2(&self, func: FuncId, left: TermId, right: TermId) -> TermId {
        self.app(func, smallvec::smallvec![left, right])
    }

    /// The rigid constant standing for variable `var`.
    pub fn frozen(&self, var: u32) -> TermId {
        self.intern(Term::App(Functor::Frozen(var), SmallVec::new()))
    }

    /// Resolve a TermId to its term.
    /// Returns None if the TermId is invalid.
    pub fn resolve(&self, id: TermId) -> Option<Term> {
        self.nodes.read().get(id.0 as usize).map(|e| e.term.clone())
    }

    /// Variable index if `id` is a variable.
    pub fn is_var(&self, id: TermId) -> Option<u32> {
        match self.resolve(id)? {
            Term::Var(idx) => Some(idx),
            Term::App(_, _) => None,
        }
    }

    /// Functor and children if `id` is an application.
    pub fn is_app(&self, id: TermId) -> Option<(Functor, SmallVec<[TermId; 4]>)> {
        match self.resolve(id)? {
            Term::Var(_) => None,
            Term::App(f, children) => Some((f, children)),
        }
    }

    /// Number of nodes in the term (0 for an unknown id).
    pub fn size(&self, id: TermId) -> usize {
        self.nodes
            .read()
            .get(id.0 as usize)
            .map_or(0, |e| e.size as usize)
    }

    /// Number of interned terms.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted, duplicate-free variables of a term.
    pub fn vars(&self, id: TermId) -> Arc<[u32]> {
        if let Some(cached) = self.vars.read().get(&id) {
            return Arc::clone(cached);
        }
        let computed: Arc<[u32]> = match self.resolve(id) {
            Some(Term::Var(v)) => Arc::from(vec![v]),
            Some(Term::App(_, kids)) => {
                let mut all: Vec<u32> = Vec::new();
                for kid in kids.iter() {
                    all.extend_from_slice(&self.vars(*kid));
                }
                all.sort_unstable();
                all.dedup();
                Arc::from(all)
            }
            None => Arc::from(Vec::new()),
        };
        self.vars.write().insert(id, Arc::clone(&computed));
        computed
    }

    pub fn is_ground(&self, id: TermId) -> bool {
        self.vars(id).is_empty()
    }

    /// Does variable `var` occur in `term`?
    pub fn occurs(&self, term: TermId, var: u32) -> bool {
        self.vars(term).binary_search(&var).is_ok()
    }

    /// Is `candidate` a subterm of `term` (including `term` itself)?
    pub fn contains_subterm(&self, term: TermId, candidate: TermId) -> bool {
        let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
        stack.push(term);
        while let Some(t) = stack.pop() {
            if t == candidate {
                return true;
            }
            if let Some(Term::App(_, kids)) = self.resolve(t) {
                stack.extend(kids.iter().copied());
            }
        }
        false
    }

    /// Subterm addressed by `pos`, if the position exists.
    pub fn subterm_at(&self, term: TermId, pos: &[usize]) -> Option<TermId> {
        let mut current = term;
        for &idx in pos {
            match self.resolve(current)? {
                Term::App(_, kids) => current = *kids.get(idx)?,
                Term::Var(_) => return None,
            }
        }
        Some(current)
    }

    /// Replace the subterm at `pos` with `replacement`.
    pub fn replace_at(
        &self,
        term: TermId,
        pos: &[usize],
        replacement: TermId,
    ) -> Result<TermId, TermError> {
        let Some((&first, rest)) = pos.split_first() else {
            return Ok(replacement);
        };
        match self.resolve(term) {
            Some(Term::App(func, mut kids)) if first < kids.len() => {
                kids[first] = self
                    .replace_at(kids[first], rest, replacement)
                    .map_err(|_| TermError::InvalidPosition(pos.to_vec()))?;
                Ok(self.app_functor(func, kids))
            }
            Some(_) => Err(TermError::InvalidPosition(pos.to_vec())),
            None => Err(TermError::UnknownTerm(term)),
        }
    }

    /// Every position whose subterm is not a variable, in pre-order.
    pub fn non_var_positions(&self, term: TermId) -> Vec<(Position, TermId)> {
        let mut out = Vec::new();
        let mut stack: Vec<(Position, TermId)> = vec![(Vec::new(), term)];
        while let Some((pos, t)) = stack.pop() {
            if let Some(Term::App(_, kids)) = self.resolve(t) {
                for (i, kid) in kids.iter().enumerate().rev() {
                    let mut child_pos = pos.clone();
                    child_pos.push(i);
                    stack.push((child_pos, *kid));
                }
                out.push((pos, t));
            }
        }
        out
    }

    /// Replace every variable with its rigid constant.
    pub fn freeze(&self, term: TermId) -> TermId {
        if let Some(&done) = self.frozen.read().get(&term) {
            return done;
        }
        let result = match self.resolve(term) {
            Some(Term::Var(v)) => self.frozen(v),
            Some(Term::App(func, kids)) => {
                let kids: SmallVec<[TermId; 4]> = kids.iter().map(|k| self.freeze(*k)).collect();
                self.app_functor(func, kids)
            }
            None => term,
        };
        self.frozen.write().insert(term, result);
        result
    }

    /// Inverse of [`freeze`](Self::freeze).
    ///
    /// A bare variable leaf cannot come out of `freeze`, so meeting one is an error.
    pub fn unfreeze(&self, term: TermId) -> Result<TermId, TermError> {
        if let Some(&done) = self.thawed.read().get(&term) {
            return Ok(done);
        }
        let result = match self.resolve(term) {
            Some(Term::Var(v)) => return Err(TermError::NotFrozen(v)),
            Some(Term::App(Functor::Frozen(v), _)) => self.var(v),
            Some(Term::App(func, kids)) => {
                let kids = kids
                    .iter()
                    .map(|k| self.unfreeze(*k))
                    .collect::<Result<SmallVec<[TermId; 4]>, _>>()?;
                self.app_functor(func, kids)
            }
            None => return Err(TermError::UnknownTerm(term)),
        };
        self.thawed.write().insert(term, result);
        Ok(result)
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a term as an S-expression: `(f a $0)`, frozen variables as `#0`.
pub fn format_term(
    term: TermId,
    terms: &TermStore,
    symbols: &SymbolStore,
) -> Result<String, String> {
    format_term_with(term, terms, symbols, &|idx| format!("${}", idx))
}

/// Like [`format_term`], with variables spelled by `var_name`.
pub fn format_term_with(
    term: TermId,
    terms: &TermStore,
    symbols: &SymbolStore,
    var_name: &dyn Fn(u32) -> String,
) -> Result<String, String> {
    fn head(functor: Functor, symbols: &SymbolStore, out: &mut String) -> Result<(), String> {
        match functor {
            Functor::Sym(func) => {
                let name = symbols
                    .resolve(func)
                    .ok_or_else(|| format!("Unknown symbol for func id {:?}", func))?;
                out.push_str(name);
            }
            Functor::Frozen(v) => {
                out.push('#');
                out.push_str(&v.to_string());
            }
        }
        Ok(())
    }

    fn render(
        term: TermId,
        terms: &TermStore,
        symbols: &SymbolStore,
        var_name: &dyn Fn(u32) -> String,
        out: &mut String,
    ) -> Result<(), String> {
        match terms.resolve(term) {
            Some(Term::Var(idx)) => {
                out.push_str(&var_name(idx));
                Ok(())
            }
            Some(Term::App(functor, children)) if children.is_empty() => {
                head(functor, symbols, out)
            }
            Some(Term::App(functor, children)) => {
                out.push('(');
                head(functor, symbols, out)?;
                for child in children.iter() {
                    out.push(' ');
                    render(*child, terms, symbols, var_name, out)?;
                }
                out.push(')');
                Ok(())
            }
            None => Err(format!("Unknown term id {:?}", term)),
        }
    }

    let mut out = String::new();
    render(term, terms, symbols, var_name, &mut out)?;
    Ok(out)
}

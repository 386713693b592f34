use std::{collections::HashMap, fmt};

use crate::{query::Query, syntax::Spanned};

/// Identity of a boolean scope opened during traversal.
///
/// `ScopeId::ROOT` stands for "no enclosing scope": top-level queries register there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("root")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Converted queries waiting for their enclosing scope to close.
///
/// Post-order traversal guarantees every child registers before its scope is reduced,
/// so `take_children` always sees the complete, source-ordered list.
#[derive(Debug, Default)]
pub struct ScopeAggregator {
    last_opened: usize,
    children: HashMap<ScopeId, Vec<Spanned<Query>>>,
}

impl ScopeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the identity for a scope node being entered.
    pub fn open(&mut self) -> ScopeId {
        self.last_opened += 1;
        ScopeId(self.last_opened)
    }

    pub fn register(&mut self, scope: ScopeId, query: Spanned<Query>) {
        self.children.entry(scope).or_default().push(query);
    }

    /// Removes and returns everything registered under `scope`.
    pub fn take_children(&mut self, scope: ScopeId) -> Vec<Spanned<Query>> {
        self.children.remove(&scope).unwrap_or_default()
    }

    pub fn pending(&self, scope: ScopeId) -> usize {
        self.children.get(&scope).map_or(0, Vec::len)
    }
}

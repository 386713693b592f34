//!
//! Provides the handler registry that maps each grammar construct to the function that
//! converts it, and a single canonical function that builds the fully populated registry
//! used by every entrypoint.
//!
//! ## Usage Workflow
//! ```rust
//! use cqn::syntax::NodeKind;
//! use cqn::translate::build_default_handler_registry;
//! let handlers = build_default_handler_registry();
//! assert!(handlers.has(NodeKind::And));
//! assert!(!handlers.has(NodeKind::OrderBy)); // ordering clauses are collected, not converted
//! ```
//!
//! ## Registry Invariant
//! A construct without a handler is still counted when encountered, so removing a handler
//! (or meeting a construct this crate does not know) surfaces as an incomplete
//! translation rather than a silently missing query.

use std::fmt;

use im::HashMap;

use crate::{query::Query, syntax::NodeKind, CqnError};

use super::{composite, leaf, NodeExit, ScopeAggregator, TranslationEnv};

// Handler function type: takes the read-only translation environment, the scope
// aggregator (composites pull their children from it), and the node-exit event. It
// returns the converted query; the dispatcher registers it under the enclosing scope.
pub type HandlerFn = fn(
    env: &TranslationEnv<'_>,
    scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError>;

// Registry for all handlers, inspectable at runtime.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    pub handlers: HashMap<NodeKind, HandlerFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: NodeKind) -> Option<HandlerFn> {
        self.handlers.get(&kind).copied()
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<NodeKind> {
        NodeKind::ALL
            .into_iter()
            .filter(|kind| self.has(*kind))
            .collect()
    }

    // API for extensibility.
    pub fn register(&mut self, kind: NodeKind, handler: HandlerFn) {
        self.handlers.insert(kind, handler);
    }

    pub fn remove(&mut self, kind: NodeKind) -> Option<HandlerFn> {
        self.handlers.remove(&kind)
    }

    pub fn has(&self, kind: NodeKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Builds and returns a registry with a handler for every query-producing construct.
#[inline]
pub fn build_default_handler_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    composite::register_composite_handlers(&mut registry);
    leaf::register_leaf_handlers(&mut registry);
    registry
}

//! # Translation
//!
//! Turns a parse tree into a `Query` by a single depth-first post-order walk.
//!
//! ## Module Structure
//!
//! - **`scope`**: scope identities and the aggregator holding converted children
//! - **`leaf`**: one handler per leaf predicate
//! - **`composite`**: reducers for `and`, `or`, `not`
//! - **`handlers`**: the registry mapping node kinds to handlers
//! - **`coverage`**: encountered/converted bookkeeping
//! - **`order`**: ordering-clause collection
//! - **`result`**: the finished `Translation`
//!
//! ## Flow
//!
//! Every node exit is dispatched through `Translator::exit_node`. Query-producing nodes
//! are counted, converted by their handler, and registered under the scope that encloses
//! them; a boolean scope's reducer later takes those children back out. Ordering clauses
//! bypass the handlers and feed the `OrderClauseCollector`. `Translator::walk` drives the
//! events over a materialized tree; engines with their own traversal call `open_scope`
//! on entering a boolean scope and `exit_node` on leaving any node.

use crate::{
    attribute::{Attribute, AttributeResolver, Capability, ResolveError, ValueType},
    diagnostics::SourceArc,
    err_ctx,
    query::{ObjectType, ParseResult, Query},
    syntax::{ParseNode, ParseTree, Span, Spanned, Token},
    value::{DefaultValueConverter, Value, ValueConverter},
    CqnError, ErrorContext,
};

pub mod composite;
pub mod coverage;
pub mod handlers;
pub mod leaf;
pub mod order;
pub mod result;
pub mod scope;

pub use coverage::CoverageValidator;
pub use handlers::{build_default_handler_registry, HandlerFn, HandlerRegistry};
pub use order::OrderClauseCollector;
pub use result::Translation;
pub use scope::{ScopeAggregator, ScopeId};

// ============================================================================
// ENVIRONMENT AND EVENTS
// ============================================================================

/// Read-only collaborators shared by every handler of one translation.
pub struct TranslationEnv<'a> {
    pub resolver: &'a dyn AttributeResolver,
    pub converter: &'a dyn ValueConverter,
    pub object_type: &'a ObjectType,
    pub source: Option<SourceArc>,
}

impl TranslationEnv<'_> {
    /// Error context pointing at `span` in the expression being translated.
    pub fn context(&self, span: Span) -> ErrorContext {
        ErrorContext::with_source_and_span(self.source.clone(), span)
    }

    /// Hand-built trees often leave token spans empty; fall back to the node's span.
    pub fn token_span(&self, token: &Token, fallback: Span) -> Span {
        if token.span == Span::default() {
            fallback
        } else {
            token.span
        }
    }

    pub fn resolve(
        &self,
        token: &Token,
        capability: Capability,
        fallback: Span,
    ) -> Result<Attribute, CqnError> {
        self.resolver
            .resolve(&token.text, capability)
            .map_err(|e| {
                let ctx = self.context(self.token_span(token, fallback));
                match e {
                    ResolveError::Unknown { .. } => err_ctx!(UnknownAttribute, ctx, "{}", e),
                    ResolveError::CapabilityMismatch { .. } => {
                        err_ctx!(AttributeCapabilityMismatch, ctx, "{}", e)
                    }
                }
            })
    }

    /// Converts `token` to the value type of `attribute`.
    pub fn convert(
        &self,
        attribute: &Attribute,
        token: &Token,
        fallback: Span,
    ) -> Result<Value, CqnError> {
        self.convert_as(attribute.value_type(), token, fallback)
            .map_err(|e| match e {
                CqnError::MalformedValue { message, ctx, source } => CqnError::MalformedValue {
                    message: format!("{message} for attribute '{attribute}'"),
                    ctx,
                    source,
                },
                other => other,
            })
    }

    pub fn convert_as(
        &self,
        value_type: ValueType,
        token: &Token,
        fallback: Span,
    ) -> Result<Value, CqnError> {
        self.converter.convert(value_type, &token.text).map_err(|e| {
            err_ctx!(
                MalformedValue,
                self.context(self.token_span(token, fallback)),
                "'{}' is not a valid {}",
                token.text,
                value_type
            )
            .caused_by(e)
        })
    }
}

/// A node-exit event: the node, the scope enclosing it, and its own scope identity
/// (equal to `scope` for anything that is not a boolean scope).
#[derive(Debug, Clone, Copy)]
pub struct NodeExit<'n> {
    pub node: &'n ParseNode,
    pub scope: ScopeId,
    pub id: ScopeId,
}

// ============================================================================
// TRANSLATOR
// ============================================================================

/// Per-expression translation state. Create one per expression; `finish` consumes it.
pub struct Translator<'a> {
    env: TranslationEnv<'a>,
    handlers: &'a HandlerRegistry,
    scopes: ScopeAggregator,
    coverage: CoverageValidator,
    orders: OrderClauseCollector,
}

impl<'a> Translator<'a> {
    pub fn new(env: TranslationEnv<'a>, handlers: &'a HandlerRegistry) -> Self {
        Self {
            env,
            handlers,
            scopes: ScopeAggregator::new(),
            coverage: CoverageValidator::new(),
            orders: OrderClauseCollector::new(),
        }
    }

    /// Allocates the identity of a boolean scope being entered.
    pub fn open_scope(&mut self) -> ScopeId {
        self.scopes.open()
    }

    /// Handles one node-exit event. Must be called in post-order.
    pub fn exit_node(&mut self, exit: NodeExit<'_>) -> Result<(), CqnError> {
        let node = exit.node;
        self.reject_nested(node)?;
        if !node.kind.produces_query() {
            return self.orders.collect(&self.env, node);
        }
        self.coverage.encounter();
        if let Some(handler) = self.handlers.get(node.kind) {
            let query = handler(&self.env, &mut self.scopes, &exit)?;
            tracing::trace!(kind = %node.kind, scope = %exit.scope, "registered query");
            self.scopes.register(
                exit.scope,
                Spanned {
                    value: query,
                    span: node.span,
                },
            );
            self.coverage.convert();
        }
        self.coverage.check(&self.env, node)
    }

    /// Walks `node` and its descendants in post-order; `scope` is the scope enclosing it.
    pub fn walk(&mut self, node: &ParseNode, scope: ScopeId) -> Result<(), CqnError> {
        self.reject_nested(node)?;
        let id = if node.kind.is_scope() {
            self.open_scope()
        } else {
            scope
        };
        for child in &node.children {
            self.walk(child, id)?;
        }
        self.exit_node(NodeExit { node, scope, id })
    }

    pub fn walk_tree(&mut self, tree: &ParseTree) -> Result<(), CqnError> {
        for node in &tree.nodes {
            self.walk(node, ScopeId::ROOT)?;
        }
        Ok(())
    }

    /// Only boolean scopes may have children; anything nested under a leaf or an
    /// ordering clause is a malformed tree.
    fn reject_nested(&self, node: &ParseNode) -> Result<(), CqnError> {
        match node.children.first() {
            Some(child) if !node.kind.is_scope() => Err(err_ctx!(
                MalformedNode,
                self.env
                    .context(node.span)
                    .related(child.span, format!("nested '{}'", child.kind))
                    .help("only 'and', 'or' and 'not' can contain queries"),
                "'{}' cannot contain other nodes, found {}",
                node.kind,
                node.children.len()
            )),
            _ => Ok(()),
        }
    }

    pub fn coverage(&self) -> &CoverageValidator {
        &self.coverage
    }

    /// Ends collection and hands over the top-level queries.
    pub fn finish(mut self) -> Translation {
        let roots = self.scopes.take_children(ScopeId::ROOT);
        Translation::new(
            roots,
            self.orders.into_orders(),
            self.coverage.encountered(),
            self.coverage.converted(),
            self.env.source,
        )
    }
}

// ============================================================================
// QUERY TRANSLATOR
// ============================================================================

/// Reusable entry point: holds the collaborators and builds a fresh `Translator` for
/// every expression it translates.
pub struct QueryTranslator {
    object_type: ObjectType,
    resolver: Box<dyn AttributeResolver>,
    converter: Box<dyn ValueConverter>,
    handlers: HandlerRegistry,
}

impl QueryTranslator {
    pub fn new(object_type: ObjectType, resolver: impl AttributeResolver + 'static) -> Self {
        Self {
            object_type,
            resolver: Box::new(resolver),
            converter: Box::new(DefaultValueConverter),
            handlers: build_default_handler_registry(),
        }
    }

    pub fn with_converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// A translator for one expression, for callers that drive node events themselves.
    pub fn translator(&self, source: Option<SourceArc>) -> Translator<'_> {
        Translator::new(
            TranslationEnv {
                resolver: self.resolver.as_ref(),
                converter: self.converter.as_ref(),
                object_type: &self.object_type,
                source,
            },
            &self.handlers,
        )
    }

    #[tracing::instrument(level = "debug", skip_all, fields(tree = %tree.name, nodes = tree.nodes.len()))]
    pub fn translation(&self, tree: &ParseTree) -> Result<Translation, CqnError> {
        let source = (!tree.source.is_empty()).then(|| tree.named_source());
        let mut translator = self.translator(source);
        translator.walk_tree(tree)?;
        let translation = translator.finish();
        tracing::debug!(
            converted = translation.converted(),
            "translation complete"
        );
        Ok(translation)
    }

    pub fn translate(&self, tree: &ParseTree) -> Result<ParseResult, CqnError> {
        self.translation(tree)?.into_result()
    }

    /// Translates and keeps only the query, dropping any ordering options.
    pub fn query(&self, tree: &ParseTree) -> Result<Query, CqnError> {
        self.translate(tree).map(|result| result.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{attribute::AttributeRegistry, syntax::NodeKind, ErrorType};

    fn translator() -> QueryTranslator {
        QueryTranslator::new(
            ObjectType::new("Person"),
            AttributeRegistry::new()
                .with("age", ValueType::Integer)
                .with("email", ValueType::String)
                .with("name", ValueType::String),
        )
    }

    fn has(name: &str) -> ParseNode {
        ParseNode::leaf(NodeKind::Has, name)
    }

    #[test]
    fn leaves_with_children_are_malformed() {
        let tree = ParseTree::new([ParseNode::scope(
            NodeKind::And,
            [has("email").with_child(has("name"))],
        )]);
        let err = translator().translate(&tree).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedNode);
        assert_eq!(err.message(), "'has' cannot contain other nodes, found 1");
        assert_eq!(err.context().related.len(), 1);
    }

    #[test]
    fn nested_leaves_under_not_are_not_reported_as_arity() {
        let tree = ParseTree::new([ParseNode::scope(
            NodeKind::Not,
            [has("email").with_child(has("name"))],
        )]);
        let err = translator().translate(&tree).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedNode);
    }

    #[test]
    fn ordering_clauses_cannot_nest_queries() {
        let tree = ParseTree::new([
            has("email"),
            ParseNode::new(NodeKind::OrderBy)
                .with_order_term("age", None)
                .with_child(has("name")),
        ]);
        let err = translator().translate(&tree).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedNode);
    }

    #[test]
    fn exit_events_reject_nested_leaves_too() {
        let translator = translator();
        let mut events = translator.translator(None);
        let node = has("email").with_child(has("name"));
        let err = events
            .exit_node(NodeExit {
                node: &node,
                scope: ScopeId::ROOT,
                id: ScopeId::ROOT,
            })
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedNode);
        assert_eq!(events.coverage().encountered(), 0);
    }

    #[test]
    fn walk_opens_one_scope_per_boolean_node() {
        let translator = translator();
        let mut events = translator.translator(None);
        let tree = ParseTree::new([ParseNode::scope(
            NodeKind::Or,
            [
                ParseNode::scope(NodeKind::And, [has("email"), has("name")]),
                ParseNode::scope(NodeKind::Not, [has("age")]),
            ],
        )]);
        events.walk_tree(&tree).unwrap();
        assert_eq!(events.open_scope().to_string(), "#4");
        assert!(events.coverage().is_complete());
        let translation = events.finish();
        assert_eq!(translation.encountered(), 6);
        assert_eq!(
            translation.root_query().unwrap().to_string(),
            r#"or(and(has("email"), has("name")), not(has("age")))"#
        );
    }

    #[test]
    fn errors_carry_the_tree_source_only_when_present() {
        let bare = ParseTree::new([has("height")]);
        let err = translator().translate(&bare).unwrap_err();
        assert!(err.context().source.is_none());

        let sourced = bare.with_source("q", r#"has("height")"#);
        let err = translator().translate(&sourced).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::UnknownAttribute);
        assert!(err.context().source.is_some());
    }
}

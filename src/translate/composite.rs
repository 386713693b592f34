//! Reducers for the boolean scopes `and`, `or` and `not`.
//!
//! A reducer runs when its scope node exits, after all of its children have been
//! converted and registered under the scope's own identity (`NodeExit::id`).

use crate::{
    err_ctx,
    query::Query,
    syntax::{NodeKind, Spanned},
    CqnError, ErrorContext,
};

use super::{HandlerRegistry, NodeExit, ScopeAggregator, TranslationEnv};

pub fn register_composite_handlers(registry: &mut HandlerRegistry) {
    registry.register(NodeKind::And, reduce_and);
    registry.register(NodeKind::Or, reduce_or);
    registry.register(NodeKind::Not, reduce_not);
}

pub fn reduce_and(
    env: &TranslationEnv<'_>,
    scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    reduce_junction(env, scopes, exit, Query::and)
}

pub fn reduce_or(
    env: &TranslationEnv<'_>,
    scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    reduce_junction(env, scopes, exit, Query::or)
}

fn reduce_junction(
    env: &TranslationEnv<'_>,
    scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
    build: fn(Vec<Query>) -> Query,
) -> Result<Query, CqnError> {
    let children = scopes.take_children(exit.id);
    if children.is_empty() {
        return Err(err_ctx!(
            ArityViolation,
            env.context(exit.node.span)
                .help(format!("'{}' needs at least one query to combine", exit.node.kind)),
            "'{}' has no queries",
            exit.node.kind
        ));
    }
    tracing::debug!(
        kind = %exit.node.kind,
        scope = %exit.id,
        parent = %exit.scope,
        children = children.len(),
        "reduced scope"
    );
    Ok(build(children.into_iter().map(|c| c.value).collect()))
}

pub fn reduce_not(
    env: &TranslationEnv<'_>,
    scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    match <[Spanned<Query>; 1]>::try_from(scopes.take_children(exit.id)) {
        Ok([child]) => {
            tracing::debug!(scope = %exit.id, parent = %exit.scope, "reduced scope 'not'");
            Ok(Query::not(child.value))
        }
        Err(children) => Err(err_ctx!(
            ArityViolation,
            labelled(env.context(exit.node.span), &children)
                .help("'not' negates a single query; combine several with 'and' or 'or' first"),
            "'not' takes exactly one query, found {}",
            children.len()
        )),
    }
}

/// Adds one related label per child so surplus queries are visible in the report.
pub(crate) fn labelled(ctx: ErrorContext, children: &[Spanned<Query>]) -> ErrorContext {
    children
        .iter()
        .enumerate()
        .fold(ctx, |ctx, (i, child)| {
            ctx.related(child.span, format!("query {}: {}", i + 1, child.value.name()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attribute::{Attribute, AttributeRegistry, ValueType},
        query::ObjectType,
        syntax::{ParseNode, Span},
        translate::{HandlerFn, ScopeId},
        value::DefaultValueConverter,
        ErrorType,
    };

    fn has(name: &str, start: usize) -> Spanned<Query> {
        Spanned {
            value: Query::has(Attribute::new(name, ValueType::String)),
            span: Span::new(start, start + 10),
        }
    }

    fn reduce(
        handler: HandlerFn,
        kind: NodeKind,
        children: Vec<Spanned<Query>>,
        scopes: &mut ScopeAggregator,
    ) -> Result<Query, CqnError> {
        let registry = AttributeRegistry::new();
        let object_type = ObjectType::new("Person");
        let env = TranslationEnv {
            resolver: &registry,
            converter: &DefaultValueConverter,
            object_type: &object_type,
            source: None,
        };
        let id = scopes.open();
        for child in children {
            scopes.register(id, child);
        }
        let node = ParseNode::new(kind).at(Span::new(0, 40));
        let result = handler(
            &env,
            scopes,
            &NodeExit {
                node: &node,
                scope: ScopeId::ROOT,
                id,
            },
        );
        assert_eq!(scopes.pending(id), 0, "reducer must drain its scope");
        result
    }

    #[test]
    fn junctions_keep_child_order() {
        let mut scopes = ScopeAggregator::new();
        let and = reduce(
            reduce_and,
            NodeKind::And,
            vec![has("email", 4), has("name", 16)],
            &mut scopes,
        )
        .unwrap();
        assert_eq!(and.to_string(), r#"and(has("email"), has("name"))"#);

        let or = reduce(reduce_or, NodeKind::Or, vec![has("email", 3)], &mut scopes).unwrap();
        assert_eq!(or.to_string(), r#"or(has("email"))"#);
    }

    #[test]
    fn reducers_only_take_their_own_scope() {
        let mut scopes = ScopeAggregator::new();
        let outer = scopes.open();
        scopes.register(outer, has("phone", 30));
        let and = reduce(reduce_and, NodeKind::And, vec![has("email", 4)], &mut scopes).unwrap();
        assert_eq!(and.children().len(), 1);
        assert_eq!(scopes.pending(outer), 1);
    }

    #[test]
    fn empty_junctions_fail_with_help() {
        let err = reduce(reduce_or, NodeKind::Or, vec![], &mut ScopeAggregator::new()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::ArityViolation);
        assert_eq!(err.message(), "'or' has no queries");
        assert!(err.context().help.is_some());
    }

    #[test]
    fn not_negates_exactly_one_query() {
        let mut scopes = ScopeAggregator::new();
        let not = reduce(reduce_not, NodeKind::Not, vec![has("email", 4)], &mut scopes).unwrap();
        assert_eq!(not.to_string(), r#"not(has("email"))"#);

        let err = reduce(
            reduce_not,
            NodeKind::Not,
            vec![has("email", 4), has("name", 16)],
            &mut scopes,
        )
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::ArityViolation);
        let labels: Vec<_> = err.context().related.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["query 1: has", "query 2: has"]);
        assert_eq!(err.context().related[1].span, Span::new(16, 26));

        let err = reduce(reduce_not, NodeKind::Not, vec![], &mut scopes).unwrap_err();
        assert!(err.message().ends_with("found 0"), "{}", err.message());
    }
}

//! Leaf predicate builders.
//!
//! One handler per leaf construct. Each resolves the attribute with the capability its
//! operator needs, converts the literal tokens against the attribute's value type, and
//! returns the predicate; registering it under the enclosing scope is left to the
//! dispatcher.

use crate::{
    attribute::{Attribute, Capability, ValueType},
    err_ctx,
    query::{Pattern, Query},
    syntax::{NodeKind, ParseNode, Token},
    value::Value,
    CqnError,
};

use super::{HandlerRegistry, NodeExit, ScopeAggregator, TranslationEnv};

pub fn register_leaf_handlers(registry: &mut HandlerRegistry) {
    registry.register(NodeKind::Equal, build_equal);
    registry.register(NodeKind::LessThan, build_less_than);
    registry.register(NodeKind::LessThanOrEqual, build_less_than_or_equal);
    registry.register(NodeKind::GreaterThan, build_greater_than);
    registry.register(NodeKind::GreaterThanOrEqual, build_greater_than_or_equal);
    registry.register(NodeKind::Between, build_between);
    registry.register(NodeKind::BetweenVerbose, build_between_verbose);
    registry.register(NodeKind::In, build_in);
    registry.register(NodeKind::StartsWith, build_starts_with);
    registry.register(NodeKind::EndsWith, build_ends_with);
    registry.register(NodeKind::Contains, build_contains);
    registry.register(NodeKind::IsContainedIn, build_is_contained_in);
    registry.register(NodeKind::MatchesRegex, build_matches_regex);
    registry.register(NodeKind::Has, build_has);
    registry.register(NodeKind::All, build_all);
    registry.register(NodeKind::None, build_none);
}

// ============================================================================
// COMPARISONS
// ============================================================================

pub fn build_equal(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    comparison(env, exit.node, Capability::Unconstrained, Query::equal)
}

pub fn build_less_than(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    comparison(env, exit.node, Capability::Ordered, Query::less_than)
}

pub fn build_less_than_or_equal(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    comparison(env, exit.node, Capability::Ordered, Query::less_than_or_equal)
}

pub fn build_greater_than(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    comparison(env, exit.node, Capability::Ordered, Query::greater_than)
}

pub fn build_greater_than_or_equal(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    comparison(env, exit.node, Capability::Ordered, Query::greater_than_or_equal)
}

fn comparison(
    env: &TranslationEnv<'_>,
    node: &ParseNode,
    capability: Capability,
    build: fn(Attribute, Value) -> Query,
) -> Result<Query, CqnError> {
    let attribute = attribute(env, node, capability)?;
    let [raw] = values::<1>(env, node)?;
    no_flags(env, node)?;
    let value = env.convert(&attribute, raw, node.span)?;
    Ok(build(attribute, value))
}

// ============================================================================
// RANGES AND SETS
// ============================================================================

/// `between(attr, lower, upper)`: both ends inclusive.
pub fn build_between(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    let node = exit.node;
    let attribute = attribute(env, node, Capability::Ordered)?;
    let [lower, upper] = values::<2>(env, node)?;
    no_flags(env, node)?;
    let lower = env.convert(&attribute, lower, node.span)?;
    let upper = env.convert(&attribute, upper, node.span)?;
    Ok(Query::between(attribute, lower, upper))
}

/// `betweenVerbose(attr, lower, lowerInclusive, upper, upperInclusive)`.
pub fn build_between_verbose(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    let node = exit.node;
    let attribute = attribute(env, node, Capability::Ordered)?;
    let [lower, upper] = values::<2>(env, node)?;
    let [lower_flag, upper_flag] = flags::<2>(env, node)?;
    let lower = env.convert(&attribute, lower, node.span)?;
    let lower_inclusive = flag(env, lower_flag, node)?;
    let upper = env.convert(&attribute, upper, node.span)?;
    let upper_inclusive = flag(env, upper_flag, node)?;
    Ok(Query::between_with(
        attribute,
        lower,
        lower_inclusive,
        upper,
        upper_inclusive,
    ))
}

pub fn build_in(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    let node = exit.node;
    let attribute = attribute(env, node, Capability::Unconstrained)?;
    no_flags(env, node)?;
    let values = node
        .values
        .iter()
        .map(|raw| env.convert(&attribute, raw, node.span))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Query::is_in(attribute, values))
}

// ============================================================================
// STRING PREDICATES
// ============================================================================

pub fn build_starts_with(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    text_predicate(env, exit.node, |attribute, text| Query::StartsWith { attribute, text })
}

pub fn build_ends_with(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    text_predicate(env, exit.node, |attribute, text| Query::EndsWith { attribute, text })
}

pub fn build_contains(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    text_predicate(env, exit.node, |attribute, text| Query::Contains { attribute, text })
}

pub fn build_is_contained_in(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    text_predicate(env, exit.node, |attribute, text| Query::IsContainedIn { attribute, text })
}

pub fn build_matches_regex(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    let node = exit.node;
    let (attribute, raw, text) = text_operands(env, node)?;
    let pattern = Pattern::new(&text).map_err(|e| {
        err_ctx!(
            MalformedValue,
            env.context(env.token_span(raw, node.span)),
            "'{}' is not a valid regular expression",
            text
        )
        .caused_by(e)
    })?;
    Ok(Query::MatchesRegex { attribute, pattern })
}

fn text_predicate(
    env: &TranslationEnv<'_>,
    node: &ParseNode,
    build: fn(Attribute, String) -> Query,
) -> Result<Query, CqnError> {
    let (attribute, _, text) = text_operands(env, node)?;
    Ok(build(attribute, text))
}

fn text_operands<'n>(
    env: &TranslationEnv<'_>,
    node: &'n ParseNode,
) -> Result<(Attribute, &'n Token, String), CqnError> {
    let attribute = attribute(env, node, Capability::Text)?;
    let [raw] = values::<1>(env, node)?;
    no_flags(env, node)?;
    match env.convert(&attribute, raw, node.span)? {
        Value::String(text) => Ok((attribute, raw, text)),
        other => Err(err_ctx!(
            MalformedValue,
            env.context(env.token_span(raw, node.span)),
            "expected text for '{}', got {} value {}",
            attribute,
            other.value_type(),
            other
        )),
    }
}

// ============================================================================
// EXISTENCE AND OBJECT-TYPE PREDICATES
// ============================================================================

pub fn build_has(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    let node = exit.node;
    let attribute = attribute(env, node, Capability::Unconstrained)?;
    no_operands(env, node)?;
    Ok(Query::has(attribute))
}

pub fn build_all(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    check_object_type(env, exit.node)?;
    no_operands(env, exit.node)?;
    Ok(Query::all(env.object_type.clone()))
}

pub fn build_none(
    env: &TranslationEnv<'_>,
    _scopes: &mut ScopeAggregator,
    exit: &NodeExit<'_>,
) -> Result<Query, CqnError> {
    check_object_type(env, exit.node)?;
    no_operands(env, exit.node)?;
    Ok(Query::none(env.object_type.clone()))
}

fn check_object_type(env: &TranslationEnv<'_>, node: &ParseNode) -> Result<(), CqnError> {
    let token = node
        .object_type
        .as_ref()
        .ok_or_else(|| missing(env, node, "an object type"))?;
    if token.text != env.object_type.as_str() {
        return Err(err_ctx!(
            ObjectTypeMismatch,
            env.context(env.token_span(token, node.span))
                .help(format!("this translator queries '{}' objects", env.object_type)),
            "'{}' does not match the object type '{}'",
            token.text,
            env.object_type
        ));
    }
    Ok(())
}

// ============================================================================
// TOKEN ACCESS
// ============================================================================

fn attribute(
    env: &TranslationEnv<'_>,
    node: &ParseNode,
    capability: Capability,
) -> Result<Attribute, CqnError> {
    let token = node
        .attribute
        .as_ref()
        .ok_or_else(|| missing(env, node, "an attribute name"))?;
    env.resolve(token, capability, node.span)
}

fn values<'n, const N: usize>(
    env: &TranslationEnv<'_>,
    node: &'n ParseNode,
) -> Result<[&'n Token; N], CqnError> {
    exactly(env, node, &node.values, "value")
}

fn flags<'n, const N: usize>(
    env: &TranslationEnv<'_>,
    node: &'n ParseNode,
) -> Result<[&'n Token; N], CqnError> {
    exactly(env, node, &node.flags, "inclusivity flag")
}

fn exactly<'n, const N: usize>(
    env: &TranslationEnv<'_>,
    node: &ParseNode,
    tokens: &'n [Token],
    what: &str,
) -> Result<[&'n Token; N], CqnError> {
    let refs: Vec<&Token> = tokens.iter().collect();
    refs.try_into().map_err(|refs: Vec<&Token>| {
        err_ctx!(
            MalformedNode,
            env.context(node.span),
            "'{}' takes {} {}(s), found {}",
            node.kind,
            N,
            what,
            refs.len()
        )
    })
}

fn no_flags(env: &TranslationEnv<'_>, node: &ParseNode) -> Result<(), CqnError> {
    flags::<0>(env, node).map(|_| ())
}

/// `has`, `all` and `none` take no value or flag tokens at all.
fn no_operands(env: &TranslationEnv<'_>, node: &ParseNode) -> Result<(), CqnError> {
    values::<0>(env, node)?;
    no_flags(env, node)
}

fn flag(env: &TranslationEnv<'_>, token: &Token, node: &ParseNode) -> Result<bool, CqnError> {
    let value = env.convert_as(ValueType::Bool, token, node.span)?;
    value.as_bool().ok_or_else(|| {
        err_ctx!(
            MalformedValue,
            env.context(env.token_span(token, node.span)),
            "inclusivity flag '{}' is not a boolean",
            token.text
        )
    })
}

fn missing(env: &TranslationEnv<'_>, node: &ParseNode, what: &str) -> CqnError {
    err_ctx!(
        MalformedNode,
        env.context(node.span),
        "'{}' is missing {}",
        node.kind,
        what
    )
}

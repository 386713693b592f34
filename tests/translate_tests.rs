mod common;

use common::person_translator;
use cqn::{
    attribute::{Attribute, AttributeRegistry, ValueType},
    query::ObjectType,
    syntax::{NodeKind, ParseNode, ParseTree, Span},
    translate::{build_default_handler_registry, NodeExit, ScopeId},
    value::Value,
    AttributeOrder, ErrorType, Query, QueryOptions, QueryTranslator,
};

fn age() -> Attribute {
    Attribute::new("age", ValueType::Integer)
}

fn name() -> Attribute {
    Attribute::new("name", ValueType::String)
}

fn equal(attribute: &str, value: &str) -> ParseNode {
    ParseNode::leaf(NodeKind::Equal, attribute).with_value(value)
}

fn single(node: ParseNode) -> ParseTree {
    ParseTree::new([node])
}

fn translate_err(tree: &ParseTree) -> ErrorType {
    person_translator().translate(tree).unwrap_err().error_type()
}

// ---------------------------------------------------------------------------
// Leaves and scopes
// ---------------------------------------------------------------------------

#[test]
fn equal_converts_its_value_to_the_attribute_type() {
    let query = person_translator().query(&single(equal("age", "\"30\""))).unwrap();
    assert_eq!(query, Query::equal(age(), Value::Integer(30)));
}

#[test]
fn and_keeps_children_in_source_order() {
    let tree = single(ParseNode::scope(
        NodeKind::And,
        [
            equal("name", "\"bob\""),
            ParseNode::leaf(NodeKind::GreaterThan, "age").with_value("\"18\""),
        ],
    ));
    let query = person_translator().query(&tree).unwrap();
    assert_eq!(
        query,
        Query::and(vec![
            Query::equal(name(), Value::String("bob".into())),
            Query::greater_than(age(), Value::Integer(18)),
        ])
    );
    assert_eq!(query.node_count(), 3);
}

#[test]
fn nested_scopes_do_not_leak_children() {
    let tree = single(ParseNode::scope(
        NodeKind::Or,
        [
            ParseNode::scope(
                NodeKind::And,
                [equal("age", "1"), equal("age", "2")],
            ),
            equal("age", "3"),
            ParseNode::scope(NodeKind::Not, [equal("age", "4")]),
        ],
    ));
    let query = person_translator().query(&tree).unwrap();
    assert_eq!(
        query.to_string(),
        r#"or(and(equal("age", 1), equal("age", 2)), equal("age", 3), not(equal("age", 4)))"#
    );
}

#[test]
fn not_wraps_exactly_one_query() {
    let tree = single(ParseNode::scope(
        NodeKind::Not,
        [ParseNode::leaf(NodeKind::Has, "email")],
    ));
    let query = person_translator().query(&tree).unwrap();
    assert_eq!(
        query,
        Query::not(Query::has(Attribute::new("email", ValueType::String)))
    );
}

#[test]
fn empty_not_is_an_arity_violation() {
    let tree = single(ParseNode::new(NodeKind::Not));
    assert_eq!(translate_err(&tree), ErrorType::ArityViolation);
}

#[test]
fn not_with_two_queries_is_an_arity_violation() {
    let tree = single(ParseNode::scope(
        NodeKind::Not,
        [equal("age", "1"), equal("age", "2")],
    ));
    let err = person_translator().translate(&tree).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::ArityViolation);
    assert!(err.message().contains("found 2"), "{}", err.message());
}

#[test]
fn empty_junctions_are_arity_violations() {
    for kind in [NodeKind::And, NodeKind::Or] {
        let tree = single(ParseNode::new(kind));
        assert_eq!(translate_err(&tree), ErrorType::ArityViolation, "{kind}");
    }
}

#[test]
fn in_keeps_first_occurrence_order() {
    let tree = single(
        ParseNode::leaf(NodeKind::In, "color").with_values(["\"red\"", "\"green\"", "\"blue\""]),
    );
    let query = person_translator().query(&tree).unwrap();
    let Query::In { values, .. } = &query else {
        panic!("expected in, got {query}");
    };
    let texts: Vec<_> = values.iter().filter_map(Value::as_str).collect();
    assert_eq!(texts, vec!["red", "green", "blue"]);
}

#[test]
fn between_is_inclusive_on_both_ends() {
    let short = single(ParseNode::leaf(NodeKind::Between, "age").with_values(["18", "65"]));
    let verbose = single(
        ParseNode::leaf(NodeKind::BetweenVerbose, "age")
            .with_values(["18", "65"])
            .with_flag("true")
            .with_flag("true"),
    );
    let translator = person_translator();
    assert_eq!(
        translator.query(&short).unwrap(),
        translator.query(&verbose).unwrap()
    );
}

#[test]
fn non_boolean_range_flags_are_malformed_values() {
    let tree = single(
        ParseNode::leaf(NodeKind::BetweenVerbose, "age")
            .with_values(["18", "65"])
            .with_flag("yes")
            .with_flag("true"),
    );
    assert_eq!(translate_err(&tree), ErrorType::MalformedValue);
}

#[test]
fn string_predicates_strip_quotes() {
    let tree = single(ParseNode::leaf(NodeKind::StartsWith, "name").with_value("'Bo'"));
    let query = person_translator().query(&tree).unwrap();
    assert_eq!(query.to_string(), r#"startsWith("name", "Bo")"#);
}

#[test]
fn all_and_none_check_the_object_type() {
    let translator = person_translator();
    let all = single(ParseNode::new(NodeKind::All).with_object_type("Person"));
    assert_eq!(
        translator.query(&all).unwrap(),
        Query::all(ObjectType::new("Person"))
    );

    let car = single(ParseNode::new(NodeKind::None).with_object_type("Car"));
    let err = translator.translate(&car).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::ObjectTypeMismatch);
}

// ---------------------------------------------------------------------------
// Root and options
// ---------------------------------------------------------------------------

#[test]
fn sibling_top_level_queries_are_an_arity_violation() {
    let tree = ParseTree::new([equal("age", "1"), equal("age", "2")]);
    let err = person_translator().translate(&tree).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::ArityViolation);
    assert!(err.context().help.is_some());
}

#[test]
fn an_empty_expression_has_no_root_query() {
    assert_eq!(translate_err(&ParseTree::new([])), ErrorType::ArityViolation);
}

#[test]
fn order_clause_becomes_options() {
    let tree = ParseTree::new([
        ParseNode::leaf(NodeKind::Has, "name"),
        ParseNode::new(NodeKind::OrderBy)
            .with_order_term("age", Some("descending"))
            .with_order_term("name", Some("ascending")),
    ]);
    let result = person_translator().translate(&tree).unwrap();
    assert_eq!(
        result.options,
        QueryOptions::order_by(vec![
            AttributeOrder::new(age(), true),
            AttributeOrder::new(name(), false),
        ])
    );
}

#[test]
fn unrecognised_directions_sort_ascending() {
    let tree = ParseTree::new([
        ParseNode::leaf(NodeKind::Has, "name"),
        ParseNode::new(NodeKind::OrderBy)
            .with_order_term("age", Some("DESC"))
            .with_order_term("price", None),
    ]);
    let result = person_translator().translate(&tree).unwrap();
    assert!(result.options.orders().iter().all(|order| !order.descending));
}

#[test]
fn no_order_clause_means_empty_options() {
    let result = person_translator()
        .translate(&single(equal("age", "1")))
        .unwrap();
    assert!(result.options.is_empty());
    assert_eq!(result.options.to_string(), "");
}

// ---------------------------------------------------------------------------
// Attribute and value failures
// ---------------------------------------------------------------------------

#[test]
fn unknown_attributes_are_reported() {
    let err = person_translator()
        .translate(&single(equal("height", "180")))
        .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::UnknownAttribute);
    assert!(err.message().contains("height"));
}

#[test]
fn text_predicates_need_a_string_attribute() {
    let tree = single(ParseNode::leaf(NodeKind::EndsWith, "age").with_value("'5'"));
    assert_eq!(translate_err(&tree), ErrorType::AttributeCapabilityMismatch);
}

#[test]
fn order_terms_resolve_attributes_too() {
    let tree = ParseTree::new([
        ParseNode::leaf(NodeKind::Has, "name"),
        ParseNode::new(NodeKind::OrderBy).with_order_term("height", None),
    ]);
    assert_eq!(translate_err(&tree), ErrorType::UnknownAttribute);
}

#[test]
fn unparseable_values_are_malformed() {
    let err = person_translator()
        .translate(&single(equal("age", "'thirty'")))
        .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::MalformedValue);
    assert!(err.message().contains("age"), "{}", err.message());
}

#[test]
fn invalid_regular_expressions_are_malformed() {
    let tree = single(ParseNode::leaf(NodeKind::MatchesRegex, "email").with_value("'(unclosed'"));
    assert_eq!(translate_err(&tree), ErrorType::MalformedValue);
}

#[test]
fn queries_nested_under_a_leaf_are_rejected() {
    let json = r#"{"nodes": [{
        "kind": "and",
        "children": [{"kind": "has", "attribute": "email",
                      "children": [{"kind": "has", "attribute": "name"}]}]
    }]}"#;
    let tree = ParseTree::from_json_str(json).unwrap();
    let err = person_translator().translate(&tree).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::MalformedNode);
    assert!(err.message().contains("'has' cannot contain"), "{}", err.message());
}

#[test]
fn missing_operands_are_malformed_nodes() {
    let tree = single(ParseNode::leaf(NodeKind::LessThan, "age"));
    assert_eq!(translate_err(&tree), ErrorType::MalformedNode);
}

// ---------------------------------------------------------------------------
// Coverage
// ---------------------------------------------------------------------------

#[test]
fn a_construct_without_a_handler_fails_the_translation() {
    let mut handlers = build_default_handler_registry();
    handlers.remove(NodeKind::Has);
    let translator = person_translator().with_handlers(handlers);
    let tree = single(ParseNode::scope(
        NodeKind::And,
        [equal("age", "1"), ParseNode::leaf(NodeKind::Has, "email")],
    ));
    let err = translator.translate(&tree).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::IncompleteTranslation);
    assert!(err.message().contains("has"), "{}", err.message());
}

#[test]
fn unknown_constructs_fail_the_translation() {
    let tree: ParseTree =
        serde_json::from_str(r#"{"nodes": [{"kind": "near", "attribute": "age"}]}"#).unwrap();
    assert_eq!(tree.nodes[0].kind, NodeKind::Unknown);
    assert_eq!(translate_err(&tree), ErrorType::IncompleteTranslation);
}

#[test]
fn counters_track_every_query_node() {
    let tree = ParseTree::new([
        ParseNode::scope(
            NodeKind::And,
            [
                equal("age", "1"),
                ParseNode::scope(NodeKind::Not, [ParseNode::leaf(NodeKind::Has, "email")]),
            ],
        ),
        ParseNode::new(NodeKind::OrderBy).with_order_term("age", None),
    ]);
    let translation = person_translator().translation(&tree).unwrap();
    assert_eq!(translation.encountered(), 4);
    assert_eq!(translation.converted(), 4);
}

// ---------------------------------------------------------------------------
// Event-driven use
// ---------------------------------------------------------------------------

#[test]
fn callers_can_drive_node_events_themselves() {
    let translator = person_translator();
    let mut events = translator.translator(None);

    let first = equal("age", "1").at(Span::new(4, 18));
    let second = equal("age", "2").at(Span::new(20, 34));
    let or = ParseNode::scope(NodeKind::Or, [first.clone(), second.clone()]).at(Span::new(0, 35));

    let scope = events.open_scope();
    assert!(!scope.is_root());
    for leaf in [&first, &second] {
        events
            .exit_node(NodeExit {
                node: leaf,
                scope,
                id: scope,
            })
            .unwrap();
    }
    events
        .exit_node(NodeExit {
            node: &or,
            scope: ScopeId::ROOT,
            id: scope,
        })
        .unwrap();
    assert!(events.coverage().is_complete());

    let query = events.finish().into_result().unwrap().query;
    assert_eq!(query.to_string(), r#"or(equal("age", 1), equal("age", 2))"#);
}

#[test]
fn translators_are_reusable_across_expressions() {
    let translator = QueryTranslator::new(
        ObjectType::new("Person"),
        AttributeRegistry::new().with("age", ValueType::Integer),
    );
    for n in 0..3 {
        let tree = single(equal("age", &n.to_string()));
        assert_eq!(
            translator.query(&tree).unwrap(),
            Query::equal(age(), Value::Integer(n))
        );
    }
}

#[test]
fn errors_point_into_the_source_text() {
    let source = r#"equal("age", "x")"#;
    let tree = ParseTree::new([equal("age", "\"x\"").at(Span::new(0, source.len()))])
        .with_source("inline", source);
    let err = person_translator().translate(&tree).unwrap_err();
    assert!(miette::Diagnostic::source_code(&err).is_some());
    assert_eq!(err.span(), Some(Span::new(0, source.len())));
}

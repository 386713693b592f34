//! Parse-tree input model for filter expressions.
//!
//! The grammar engine that produces these trees lives outside this crate. A tree arrives
//! already materialized, either built in code with the `ParseNode` builder methods or
//! deserialized from the JSON/YAML an external engine emits. Every node carries the raw
//! text of its tokens and the span it covers in the original filter expression, so that
//! translation errors can point back at the source.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    diagnostics::{to_error_source, SourceArc},
    err_msg, CqnError,
};

/// Represents a span in the source code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered, never less than one so labels stay visible.
    pub fn label_len(&self) -> usize {
        if self.end > self.start {
            self.end - self.start
        } else {
            1
        }
    }
}

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

// ============================================================================
// TOKENS
// ============================================================================

/// Raw token text as the grammar engine saw it, quotes included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TokenRepr")]
pub struct Token {
    pub text: String,
    pub span: Span,
}

// Trees written by hand usually skip token spans, so a bare string is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenRepr {
    Bare(String),
    Spanned {
        text: String,
        #[serde(default)]
        span: Span,
    },
}

impl From<TokenRepr> for Token {
    fn from(repr: TokenRepr) -> Self {
        match repr {
            TokenRepr::Bare(text) => Token {
                text,
                span: Span::default(),
            },
            TokenRepr::Spanned { text, span } => Token { text, span },
        }
    }
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

// ============================================================================
// NODE KINDS
// ============================================================================

/// Grammar construct of a parse node.
///
/// `Unknown` absorbs any construct name this crate has no conversion for; translating
/// one fails with an incomplete-translation error instead of being silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    And,
    Or,
    Not,
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Between,
    BetweenVerbose,
    In,
    StartsWith,
    EndsWith,
    Contains,
    IsContainedIn,
    MatchesRegex,
    Has,
    All,
    None,
    OrderBy,
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    pub const ALL: [NodeKind; 21] = [
        NodeKind::And,
        NodeKind::Or,
        NodeKind::Not,
        NodeKind::Equal,
        NodeKind::LessThan,
        NodeKind::LessThanOrEqual,
        NodeKind::GreaterThan,
        NodeKind::GreaterThanOrEqual,
        NodeKind::Between,
        NodeKind::BetweenVerbose,
        NodeKind::In,
        NodeKind::StartsWith,
        NodeKind::EndsWith,
        NodeKind::Contains,
        NodeKind::IsContainedIn,
        NodeKind::MatchesRegex,
        NodeKind::Has,
        NodeKind::All,
        NodeKind::None,
        NodeKind::OrderBy,
        NodeKind::Unknown,
    ];

    /// Boolean scopes collect the nodes converted beneath them.
    pub fn is_scope(self) -> bool {
        matches!(self, NodeKind::And | NodeKind::Or | NodeKind::Not)
    }

    /// Everything except the ordering clause yields a query node.
    pub fn produces_query(self) -> bool {
        self != NodeKind::OrderBy
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Not => "not",
            NodeKind::Equal => "equal",
            NodeKind::LessThan => "lessThan",
            NodeKind::LessThanOrEqual => "lessThanOrEqual",
            NodeKind::GreaterThan => "greaterThan",
            NodeKind::GreaterThanOrEqual => "greaterThanOrEqual",
            NodeKind::Between => "between",
            NodeKind::BetweenVerbose => "betweenVerbose",
            NodeKind::In => "in",
            NodeKind::StartsWith => "startsWith",
            NodeKind::EndsWith => "endsWith",
            NodeKind::Contains => "contains",
            NodeKind::IsContainedIn => "isContainedIn",
            NodeKind::MatchesRegex => "matchesRegex",
            NodeKind::Has => "has",
            NodeKind::All => "all",
            NodeKind::None => "none",
            NodeKind::OrderBy => "orderBy",
            NodeKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// PARSE NODES
// ============================================================================

/// One term of an ordering clause: `age descending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderTerm {
    pub attribute: Token,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Token>,
}

/// A node of the materialized parse tree.
///
/// Which token fields are populated depends on `kind`: comparisons carry an attribute
/// and one value, `betweenVerbose` carries two values and two flags, `all`/`none` carry
/// an object type, `orderBy` carries order terms, and boolean scopes carry children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParseNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Token>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_terms: Vec<OrderTerm>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            span: Span::default(),
            attribute: None,
            values: Vec::new(),
            flags: Vec::new(),
            object_type: None,
            order_terms: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(Token::new(name));
        self
    }

    pub fn with_value(mut self, text: impl Into<String>) -> Self {
        self.values.push(Token::new(text));
        self
    }

    pub fn with_values<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values.extend(texts.into_iter().map(Token::new));
        self
    }

    pub fn with_flag(mut self, text: impl Into<String>) -> Self {
        self.flags.push(Token::new(text));
        self
    }

    pub fn with_object_type(mut self, text: impl Into<String>) -> Self {
        self.object_type = Some(Token::new(text));
        self
    }

    pub fn with_order_term(mut self, attribute: impl Into<String>, direction: Option<&str>) -> Self {
        self.order_terms.push(OrderTerm {
            attribute: Token::new(attribute),
            direction: direction.map(Token::new),
        });
        self
    }

    pub fn with_child(mut self, child: ParseNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = ParseNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attribute-only leaf, e.g. `has(email)`.
    pub fn leaf(kind: NodeKind, attribute: impl Into<String>) -> Self {
        Self::new(kind).with_attribute(attribute)
    }

    /// Boolean scope over the given children.
    pub fn scope(kind: NodeKind, children: impl IntoIterator<Item = ParseNode>) -> Self {
        Self::new(kind).with_children(children)
    }
}

// ============================================================================
// PARSE TREES
// ============================================================================

/// A whole filter expression: its top-level nodes in source order, with the text they
/// were parsed from for diagnostics.
///
/// Decoding is strict: `nodes` is required and unknown fields are rejected, so a
/// misspelled or wrapped file fails to load instead of reading as an empty expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseTree {
    #[serde(default = "default_tree_name")]
    pub name: String,
    #[serde(default)]
    pub source: String,
    pub nodes: Vec<ParseNode>,
}

fn default_tree_name() -> String {
    "query".to_string()
}

impl ParseTree {
    pub fn new(nodes: impl IntoIterator<Item = ParseNode>) -> Self {
        Self {
            name: default_tree_name(),
            source: String::new(),
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn with_source(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.name = name.into();
        self.source = source.into();
        self
    }

    pub fn named_source(&self) -> SourceArc {
        to_error_source(&self.name, &self.source)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CqnError> {
        serde_json::from_str(text)
            .map_err(|e| err_msg!(Config, "Failed to decode parse tree JSON: {}", e))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CqnError> {
        serde_yaml::from_str(text)
            .map_err(|e| err_msg!(Config, "Failed to decode parse tree YAML: {}", e))
    }

    /// Loads a tree from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: &Path) -> Result<Self, CqnError> {
        let text = crate::config::read_file(path)?;
        match crate::config::Format::from_path(path) {
            crate::config::Format::Yaml => Self::from_yaml_str(&text),
            crate::config::Format::Json => Self::from_json_str(&text),
        }
    }
}

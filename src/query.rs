//! # Query AST
//!
//! The strongly-typed output of translation. A `Query` is a tree of boolean composites
//! over leaf predicates; every leaf holds a resolved `Attribute` and values already
//! converted to that attribute's type. `QueryOptions` carries the ordering clause.
//!
//! `Display` renders a query back in filter-expression notation, e.g.
//! `and(equal("name", "bob"), greaterThan("age", 18))`.

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::{attribute::Attribute, value::Value};

/// The root object type a translator accepts in `all(...)` / `none(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectType(pub String);

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A compiled regular expression, compared and serialized by its source pattern.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Pattern)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Query AST node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Query {
    And {
        children: Vec<Query>,
    },
    Or {
        children: Vec<Query>,
    },
    Not {
        child: Box<Query>,
    },
    Equal {
        attribute: Attribute,
        value: Value,
    },
    LessThan {
        attribute: Attribute,
        value: Value,
    },
    LessThanOrEqual {
        attribute: Attribute,
        value: Value,
    },
    GreaterThan {
        attribute: Attribute,
        value: Value,
    },
    GreaterThanOrEqual {
        attribute: Attribute,
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    Between {
        attribute: Attribute,
        lower: Value,
        lower_inclusive: bool,
        upper: Value,
        upper_inclusive: bool,
    },
    /// Membership; `values` holds no duplicates and keeps first-occurrence order.
    In {
        attribute: Attribute,
        values: Vec<Value>,
    },
    StartsWith {
        attribute: Attribute,
        text: String,
    },
    EndsWith {
        attribute: Attribute,
        text: String,
    },
    Contains {
        attribute: Attribute,
        text: String,
    },
    IsContainedIn {
        attribute: Attribute,
        text: String,
    },
    MatchesRegex {
        attribute: Attribute,
        pattern: Pattern,
    },
    Has {
        attribute: Attribute,
    },
    All {
        object_type: ObjectType,
    },
    None {
        object_type: ObjectType,
    },
}

impl Query {
    pub fn and(children: Vec<Query>) -> Self {
        Query::And { children }
    }

    pub fn or(children: Vec<Query>) -> Self {
        Query::Or { children }
    }

    pub fn not(child: Query) -> Self {
        Query::Not {
            child: Box::new(child),
        }
    }

    pub fn equal(attribute: Attribute, value: Value) -> Self {
        Query::Equal { attribute, value }
    }

    pub fn less_than(attribute: Attribute, value: Value) -> Self {
        Query::LessThan { attribute, value }
    }

    pub fn less_than_or_equal(attribute: Attribute, value: Value) -> Self {
        Query::LessThanOrEqual { attribute, value }
    }

    pub fn greater_than(attribute: Attribute, value: Value) -> Self {
        Query::GreaterThan { attribute, value }
    }

    pub fn greater_than_or_equal(attribute: Attribute, value: Value) -> Self {
        Query::GreaterThanOrEqual { attribute, value }
    }

    /// Range with both ends included.
    pub fn between(attribute: Attribute, lower: Value, upper: Value) -> Self {
        Self::between_with(attribute, lower, true, upper, true)
    }

    pub fn between_with(
        attribute: Attribute,
        lower: Value,
        lower_inclusive: bool,
        upper: Value,
        upper_inclusive: bool,
    ) -> Self {
        Query::Between {
            attribute,
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
        }
    }

    /// Membership over `values`, dropping repeats.
    pub fn is_in(attribute: Attribute, values: impl IntoIterator<Item = Value>) -> Self {
        let mut set: Vec<Value> = Vec::new();
        for value in values {
            if !set.contains(&value) {
                set.push(value);
            }
        }
        Query::In {
            attribute,
            values: set,
        }
    }

    pub fn has(attribute: Attribute) -> Self {
        Query::Has { attribute }
    }

    pub fn all(object_type: ObjectType) -> Self {
        Query::All { object_type }
    }

    pub fn none(object_type: ObjectType) -> Self {
        Query::None { object_type }
    }

    /// Node name in filter-expression notation.
    pub fn name(&self) -> &'static str {
        match self {
            Query::And { .. } => "and",
            Query::Or { .. } => "or",
            Query::Not { .. } => "not",
            Query::Equal { .. } => "equal",
            Query::LessThan { .. } => "lessThan",
            Query::LessThanOrEqual { .. } => "lessThanOrEqual",
            Query::GreaterThan { .. } => "greaterThan",
            Query::GreaterThanOrEqual { .. } => "greaterThanOrEqual",
            Query::Between { .. } => "between",
            Query::In { .. } => "in",
            Query::StartsWith { .. } => "startsWith",
            Query::EndsWith { .. } => "endsWith",
            Query::Contains { .. } => "contains",
            Query::IsContainedIn { .. } => "isContainedIn",
            Query::MatchesRegex { .. } => "matchesRegex",
            Query::Has { .. } => "has",
            Query::All { .. } => "all",
            Query::None { .. } => "none",
        }
    }

    /// Direct sub-queries of a composite; empty for leaves.
    pub fn children(&self) -> &[Query] {
        match self {
            Query::And { children } | Query::Or { children } => children,
            Query::Not { child } => std::slice::from_ref(child.as_ref()),
            _ => &[],
        }
    }

    /// Number of nodes in this tree, the root included.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Query::node_count).sum::<usize>()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Query::And { children } | Query::Or { children } => {
                write!(f, "{name}(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            Query::Not { child } => write!(f, "{name}({child})"),
            Query::Equal { attribute, value }
            | Query::LessThan { attribute, value }
            | Query::LessThanOrEqual { attribute, value }
            | Query::GreaterThan { attribute, value }
            | Query::GreaterThanOrEqual { attribute, value } => {
                write!(f, "{name}({:?}, {value})", attribute.name())
            }
            Query::Between {
                attribute,
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            } => {
                if *lower_inclusive && *upper_inclusive {
                    write!(f, "{name}({:?}, {lower}, {upper})", attribute.name())
                } else {
                    write!(
                        f,
                        "{name}({:?}, {lower}, {lower_inclusive}, {upper}, {upper_inclusive})",
                        attribute.name()
                    )
                }
            }
            Query::In { attribute, values } => {
                write!(f, "{name}({:?}", attribute.name())?;
                for value in values {
                    write!(f, ", {value}")?;
                }
                write!(f, ")")
            }
            Query::StartsWith { attribute, text }
            | Query::EndsWith { attribute, text }
            | Query::Contains { attribute, text }
            | Query::IsContainedIn { attribute, text } => {
                write!(f, "{name}({:?}, {text:?})", attribute.name())
            }
            Query::MatchesRegex { attribute, pattern } => {
                write!(f, "{name}({:?}, {:?})", attribute.name(), pattern.as_str())
            }
            Query::Has { attribute } => write!(f, "{name}({:?})", attribute.name()),
            Query::All { object_type } | Query::None { object_type } => {
                write!(f, "{name}({object_type})")
            }
        }
    }
}

// ============================================================================
// QUERY OPTIONS
// ============================================================================

/// One ordering term: sort by `attribute`, descending or ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeOrder {
    pub attribute: Attribute,
    pub descending: bool,
}

impl AttributeOrder {
    pub fn new(attribute: Attribute, descending: bool) -> Self {
        Self {
            attribute,
            descending,
        }
    }
}

impl fmt::Display for AttributeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.descending {
            "descending"
        } else {
            "ascending"
        };
        write!(f, "{} {direction}", self.attribute)
    }
}

/// Options that accompany a query; currently only ordering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<AttributeOrder>>,
}

impl QueryOptions {
    /// No options at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn order_by(orders: Vec<AttributeOrder>) -> Self {
        Self {
            order_by: Some(orders),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order_by.is_none()
    }

    pub fn orders(&self) -> &[AttributeOrder] {
        self.order_by.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.order_by {
            None => Ok(()),
            Some(orders) => {
                write!(f, "orderBy(")?;
                for (i, order) in orders.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{order}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A fully translated filter expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub query: Query,
    pub options: QueryOptions,
}

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::attribute::ValueType;

/// Represents a typed literal in a query.
///
/// # Examples
///
/// ```rust
/// use cqn::value::Value;
/// let v = Value::Integer(30);
/// assert_eq!(v.to_string(), "30");
/// let s = Value::String("bob".to_string());
/// assert_eq!(s.to_string(), "\"bob\"");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::String(_) => ValueType::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// A raw token that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{raw}' to {value_type}: {reason}")]
pub struct ValueError {
    pub raw: String,
    pub value_type: ValueType,
    pub reason: String,
}

/// Turns raw literal tokens into typed values.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, value_type: ValueType, raw: &str) -> Result<Value, ValueError>;
}

/// Converter for the literal syntax of filter expressions: quoted or bare numbers,
/// `true`/`false` in any case, and single- or double-quoted strings with backslash
/// escapes for the quote character and the backslash itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueConverter;

impl ValueConverter for DefaultValueConverter {
    fn convert(&self, value_type: ValueType, raw: &str) -> Result<Value, ValueError> {
        let text = strip_quotes(raw.trim());
        let fail = |reason: String| ValueError {
            raw: raw.to_string(),
            value_type,
            reason,
        };
        match value_type {
            ValueType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| fail(e.to_string())),
            ValueType::Float => text
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| fail(e.to_string())),
            ValueType::Bool => match text.trim() {
                t if t.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                t if t.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                _ => Err(fail("expected 'true' or 'false'".to_string())),
            },
            ValueType::String => Ok(Value::String(text)),
        }
    }
}

/// Removes one layer of matching quotes and resolves the escapes inside them.
/// Unquoted text is returned as is.
pub fn strip_quotes(raw: &str) -> String {
    let quote = match raw.chars().next() {
        Some(q @ ('"' | '\'')) if raw.len() >= 2 && raw.ends_with(q) => q,
        _ => return raw.to_string(),
    };
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if next == quote || next == '\\' => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

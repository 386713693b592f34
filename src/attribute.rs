//! # Attributes
//!
//! Attribute handles name a field of the indexed objects together with the type of the
//! values stored in it. Predicates are only buildable over attributes whose value type has
//! the capability the operator needs: range and comparison predicates need an ordered
//! type, substring and regex predicates need text.
//!
//! Resolution goes through the `AttributeResolver` trait so that callers can plug in their
//! own schema. `AttributeRegistry` is the in-memory resolver used by the CLI and the tests.

use std::{fmt, sync::Arc};

use im::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// VALUE TYPES AND CAPABILITIES
// ============================================================================

/// Declared type of the values an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Float,
    Bool,
    String,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::Bool => "Bool",
            ValueType::String => "String",
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Unconstrained | Capability::Ordered => true,
            Capability::Text => *self == ValueType::String,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an operator requires of an attribute's value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `equal`, `in`, `has`
    Unconstrained,
    /// comparisons, ranges, ordering terms
    Ordered,
    /// `startsWith`, `endsWith`, `contains`, `isContainedIn`, `matchesRegex`
    Text,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Unconstrained => "any value type",
            Capability::Ordered => "an ordered value type",
            Capability::Text => "a string value type",
        })
    }
}

// ============================================================================
// ATTRIBUTE HANDLES
// ============================================================================

/// Resolved, typed attribute handle. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Attribute {
    name: Arc<str>,
    value_type: ValueType,
}

impl Attribute {
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: Arc::from(name),
            value_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Why an attribute could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no attribute named '{name}' is registered")]
    Unknown { name: String },
    #[error("attribute '{name}' holds {value_type} values, but {required} is required")]
    CapabilityMismatch {
        name: String,
        value_type: ValueType,
        required: Capability,
    },
}

/// Maps attribute names to typed handles. Implementations must be safe to share between
/// translators running on different threads.
pub trait AttributeResolver: Send + Sync {
    fn resolve(&self, name: &str, capability: Capability) -> Result<Attribute, ResolveError>;
}

// ============================================================================
// REGISTRY
// ============================================================================

// Registry for all attributes, inspectable at runtime.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    pub attributes: HashMap<String, Attribute>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Sorted attribute names.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attributes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn register(&mut self, name: &str, value_type: ValueType) {
        self.attributes
            .insert(name.to_string(), Attribute::new(name, value_type));
    }

    pub fn with(mut self, name: &str, value_type: ValueType) -> Self {
        self.register(name, value_type);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl AttributeResolver for AttributeRegistry {
    fn resolve(&self, name: &str, capability: Capability) -> Result<Attribute, ResolveError> {
        let attribute = self.get(name).ok_or_else(|| ResolveError::Unknown {
            name: name.to_string(),
        })?;
        if !attribute.value_type().supports(capability) {
            return Err(ResolveError::CapabilityMismatch {
                name: name.to_string(),
                value_type: attribute.value_type(),
                required: capability,
            });
        }
        Ok(attribute.clone())
    }
}

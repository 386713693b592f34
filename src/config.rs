//! Schema configuration.
//!
//! A schema names the object type queries run over and the attributes that may appear
//! in them:
//!
//! ```yaml
//! objectType: Person
//! attributes:
//!   age: integer
//!   name: string
//! ```
//!
//! YAML and JSON are both accepted; the format follows the file extension.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    attribute::{AttributeRegistry, ValueType},
    err_msg,
    query::ObjectType,
    translate::QueryTranslator,
    CqnError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

pub fn read_file(path: &Path) -> Result<String, CqnError> {
    std::fs::read_to_string(path)
        .map_err(|e| err_msg!(Config, "Failed to read '{}'", path.display()).caused_by(e))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchemaConfig {
    pub object_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, ValueType>,
}

impl SchemaConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, CqnError> {
        let schema: Self = serde_yaml::from_str(text)
            .map_err(|e| err_msg!(Config, "Failed to decode schema YAML: {}", e))?;
        schema.validated()
    }

    pub fn from_json_str(text: &str) -> Result<Self, CqnError> {
        let schema: Self = serde_json::from_str(text)
            .map_err(|e| err_msg!(Config, "Failed to decode schema JSON: {}", e))?;
        schema.validated()
    }

    pub fn from_path(path: &Path) -> Result<Self, CqnError> {
        let text = read_file(path)?;
        match Format::from_path(path) {
            Format::Yaml => Self::from_yaml_str(&text),
            Format::Json => Self::from_json_str(&text),
        }
    }

    fn validated(self) -> Result<Self, CqnError> {
        if self.object_type.trim().is_empty() {
            return Err(err_msg!(Config, "Schema must name a non-empty objectType"));
        }
        Ok(self)
    }

    pub fn registry(&self) -> AttributeRegistry {
        self.attributes
            .iter()
            .fold(AttributeRegistry::new(), |registry, (name, value_type)| {
                registry.with(name, *value_type)
            })
    }

    pub fn translator(&self) -> QueryTranslator {
        QueryTranslator::new(ObjectType::new(self.object_type.clone()), self.registry())
    }
}

//! # cqn Test Harness
//!
//! Minimal fixture loader. Each file under `tests/fixtures/cases` holds one parse tree and
//! its expected outcome; all failures surface as `CqnError`s.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use cqn::{config::SchemaConfig, err_msg, syntax::ParseTree, CqnError, QueryTranslator};
use serde::Deserialize;
use walkdir::WalkDir;

/// A single fixture case.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub description: String,
    pub tree: ParseTree,
    /// Expected query in filter-expression notation.
    #[serde(default)]
    pub expect: Option<String>,
    /// Expected options; empty when absent.
    #[serde(default)]
    pub options: Option<String>,
    /// Expected `ErrorType` name when translation must fail.
    #[serde(default)]
    pub error: Option<String>,
}

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn schema_path() -> PathBuf {
    fixtures_dir().join("schema.yaml")
}

/// Translator over the `Person` schema shared by every test.
pub fn person_translator() -> QueryTranslator {
    SchemaConfig::from_path(&schema_path())
        .map(|schema| schema.translator())
        .unwrap_or_else(|e| panic!("fixture schema must load: {e}"))
}

/// Discovers and decodes every fixture, sorted by path.
pub fn load_fixtures(dir: &Path) -> Result<Vec<(PathBuf, Fixture)>, CqnError> {
    let mut fixtures = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            err_msg!(Config, "Failed to read fixture '{}'", path.display()).caused_by(e)
        })?;
        let fixture: Fixture = match ext {
            "json" => serde_json::from_str(&text)
                .map_err(|e| err_msg!(Config, "Bad fixture '{}': {}", path.display(), e))?,
            "yaml" | "yml" => serde_yaml::from_str(&text)
                .map_err(|e| err_msg!(Config, "Bad fixture '{}': {}", path.display(), e))?,
            _ => continue,
        };
        fixtures.push((path.to_path_buf(), fixture));
    }
    Ok(fixtures)
}

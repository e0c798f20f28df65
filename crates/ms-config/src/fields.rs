//! Field-schema files.
//!
//! A field-schema file replaces the built-in [`Schema`] for a run. Categories
//! are JSON arrays rather than objects so that column order is exactly the
//! order written in the file.
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "core": [{ "category": "mem", "fields": ["resident", "virtual"] }],
//!   "storage_engine": {
//!     "key": "wiredTiger",
//!     "categories": [{ "category": "cache", "fields": ["tracked dirty bytes in the cache"] }]
//!   }
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use ms_common::schema::{is_compatible, DEFAULT_ENGINE_KEY};
use ms_common::{column_name, Category, Error, Result, Schema, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// On-disk form of a field schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsFile {
    pub schema_version: String,

    #[serde(default)]
    pub core: Vec<Category>,

    #[serde(default)]
    pub storage_engine: Option<EngineSection>,
}

/// Storage-engine part of a field-schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_engine_key")]
    pub key: String,
    pub categories: Vec<Category>,
}

fn default_engine_key() -> String {
    DEFAULT_ENGINE_KEY.to_string()
}

impl FieldsFile {
    /// Load and validate a field-schema file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidSchema(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file = Self::parse_json(&content)?;
        debug!(path = %path.display(), columns = file.column_count(), "loaded field schema");
        Ok(file)
    }

    /// Parse and validate a field-schema document.
    pub fn parse_json(json: &str) -> Result<Self> {
        let file: FieldsFile = serde_json::from_str(json)
            .map_err(|e| Error::InvalidSchema(format!("parse error: {}", e)))?;
        file.validate()?;
        Ok(file)
    }

    fn engine_categories(&self) -> &[Category] {
        self.storage_engine
            .as_ref()
            .map(|s| s.categories.as_slice())
            .unwrap_or(&[])
    }

    fn column_count(&self) -> usize {
        self.core
            .iter()
            .chain(self.engine_categories())
            .map(|c| c.fields.len())
            .sum()
    }

    /// Check everything the CSV writer relies on: names that can sit in an
    /// unquoted header and column labels that are unique.
    pub fn validate(&self) -> Result<()> {
        if !is_compatible(&self.schema_version) {
            return Err(Error::InvalidSchema(format!(
                "unsupported schema_version {} (supported: {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        if let Some(engine) = &self.storage_engine {
            check_name("storage engine key", &engine.key)?;
        }
        if self.column_count() == 0 {
            return Err(Error::InvalidSchema("schema selects no fields".into()));
        }

        let mut seen = HashSet::new();
        for category in self.core.iter().chain(self.engine_categories()) {
            check_name("category", &category.name)?;
            for field in &category.fields {
                check_name("field", field)?;
                let column = column_name(&category.name, field);
                if !seen.insert(column.clone()) {
                    return Err(Error::InvalidSchema(format!("duplicate column {}", column)));
                }
            }
        }
        Ok(())
    }

    pub fn into_schema(self) -> Schema {
        let (key, engine) = match self.storage_engine {
            Some(section) => (section.key, section.categories),
            None => (default_engine_key(), Vec::new()),
        };
        Schema::new(self.core, key, engine)
    }
}

impl From<&Schema> for FieldsFile {
    fn from(schema: &Schema) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            core: schema.core().to_vec(),
            storage_engine: Some(EngineSection {
                key: schema.engine_key().to_string(),
                categories: schema.engine().to_vec(),
            }),
        }
    }
}

fn check_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidSchema(format!("empty {} name", what)));
    }
    if name.contains([',', '\n', '\r']) {
        return Err(Error::InvalidSchema(format!(
            "{} name {:?} contains a comma or line break",
            what, name
        )));
    }
    Ok(())
}

/// Schema for a run: the file at `path` when given, the built-in one otherwise.
pub fn load_schema(path: Option<&Path>) -> Result<Schema> {
    match path {
        Some(path) => Ok(FieldsFile::from_file(path)?.into_schema()),
        None => Ok(Schema::default()),
    }
}

//! Field schema: which status fields are sampled, and in what column order.
//!
//! A [`Schema`] is built once at startup and shared read-only by the row
//! flattener and the CSV sink. Its column order is the concatenation of the
//! core categories (read from the top level of a snapshot) followed by the
//! storage-engine categories (read from the engine's sub-document), each in
//! declaration order.

use serde::{Deserialize, Serialize};

/// Current version of the field-schema file format.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Label of the leading timestamp column.
pub const DATETIME_COLUMN: &str = "datetime";

/// Default storage-engine sub-document key.
pub const DEFAULT_ENGINE_KEY: &str = "wiredTiger";

/// Check if a schema file version is compatible with current.
pub fn is_compatible(version: &str) -> bool {
    let major = |v: &str| v.split('.').next().and_then(|s| s.parse::<u32>().ok());
    matches!((major(SCHEMA_VERSION), major(version)), (Some(a), Some(b)) if a == b)
}

/// Column label for a field: `<category>_<field>` with spaces turned into hyphens.
pub fn column_name(category: &str, field: &str) -> String {
    format!("{}_{}", category, field.replace(' ', "-"))
}

/// A labelled, ordered group of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "category")]
    pub name: String,
    pub fields: Vec<String>,
}

impl Category {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Location of one sampled value inside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath<'a> {
    /// Storage-engine key for engine fields; `None` for core fields.
    pub engine: Option<&'a str>,
    pub category: &'a str,
    pub field: &'a str,
}

impl<'a> FieldPath<'a> {
    /// Ordered key sequence for a nested-document lookup.
    pub fn keys(&self) -> Vec<&'a str> {
        match self.engine {
            Some(engine) => vec![engine, self.category, self.field],
            None => vec![self.category, self.field],
        }
    }

    pub fn column(&self) -> String {
        column_name(self.category, self.field)
    }
}

/// The immutable set of sampled fields for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    core: Vec<Category>,
    engine_key: String,
    engine: Vec<Category>,
}

impl Schema {
    pub fn new(core: Vec<Category>, engine_key: impl Into<String>, engine: Vec<Category>) -> Self {
        Self {
            core,
            engine_key: engine_key.into(),
            engine,
        }
    }

    /// Categories read from the top level of a snapshot.
    pub fn core(&self) -> &[Category] {
        &self.core
    }

    /// Key of the storage-engine sub-document.
    pub fn engine_key(&self) -> &str {
        &self.engine_key
    }

    /// Categories read from the storage-engine sub-document.
    pub fn engine(&self) -> &[Category] {
        &self.engine
    }

    /// Every sampled field, in column order.
    pub fn field_paths(&self) -> impl Iterator<Item = FieldPath<'_>> {
        let core = self.core.iter().flat_map(|c| {
            c.fields.iter().map(move |f| FieldPath {
                engine: None,
                category: &c.name,
                field: f,
            })
        });
        let engine = self.engine.iter().flat_map(move |c| {
            c.fields.iter().map(move |f| FieldPath {
                engine: Some(&self.engine_key),
                category: &c.name,
                field: f,
            })
        });
        core.chain(engine)
    }

    /// Data column labels, without the leading `datetime`.
    pub fn columns(&self) -> Vec<String> {
        self.field_paths().map(|p| p.column()).collect()
    }

    /// Full header record: `datetime` followed by every data column.
    pub fn header(&self) -> Vec<String> {
        std::iter::once(DATETIME_COLUMN.to_string())
            .chain(self.columns())
            .collect()
    }

    /// Number of data columns.
    pub fn column_count(&self) -> usize {
        self.core
            .iter()
            .chain(self.engine.iter())
            .map(|c| c.fields.len())
            .sum()
    }

    /// Top-level keys that must be sub-documents in every snapshot.
    pub fn required_containers(&self) -> Vec<Vec<&str>> {
        let mut keys: Vec<Vec<&str>> = self.core.iter().map(|c| vec![c.name.as_str()]).collect();
        if !self.engine.is_empty() {
            keys.push(vec![self.engine_key.as_str()]);
            for c in &self.engine {
                keys.push(vec![self.engine_key.as_str(), c.name.as_str()]);
            }
        }
        keys
    }
}

impl Default for Schema {
    /// Process memory plus WiredTiger cache, eviction, and capacity counters.
    fn default() -> Self {
        Schema::new(
            vec![Category::new("mem", ["resident", "virtual"])],
            DEFAULT_ENGINE_KEY,
            vec![
                Category::new(
                    "cache",
                    [
                        "bytes dirty in the cache cumulative",
                        "tracked dirty bytes in the cache",
                        "tracked dirty pages in the cache",
                        "pages written requiring in-memory restoration",
                        "pages selected for eviction unable to be evicted",
                        "pages queued for urgent eviction",
                    ],
                ),
                Category::new(
                    "capacity",
                    [
                        "throttled bytes written for checkpoint",
                        "throttled bytes written for eviction",
                        "time waiting due to total capacity (usecs)",
                        "time waiting during checkpoint (usecs)",
                        "time waiting during eviction (usecs)",
                    ],
                ),
                Category::new("reconciliation", ["page reconciliation calls for eviction"]),
                Category::new(
                    "thread-yield",
                    [
                        "application thread time evicting (usecs)",
                        "page acquire eviction blocked",
                    ],
                ),
            ],
        )
    }
}

//! Snapshot sources.
//!
//! A source produces one status document per call. The flattener only sees
//! documents through [`StatusDocument`], a path lookup, so the transport that
//! produced them can be swapped without touching the row layout.

mod json;
pub mod mongo;

pub use mongo::MongoStatusSource;

use ms_common::{Error, FieldValue, Result, Schema};
use tracing::trace;

/// Read access to a nested status document.
pub trait StatusDocument {
    /// Value at an ordered key path, or `None` when any key along it is absent.
    fn lookup(&self, path: &[&str]) -> Option<FieldValue>;
}

/// Producer of point-in-time status documents.
///
/// Implementations must not retry or cache: every call reflects the server
/// state at call time.
pub trait SnapshotSource {
    type Document: StatusDocument;

    /// Retrieve one raw status document.
    fn fetch(&mut self) -> Result<Self::Document>;

    /// Retrieve one status document and check it has every container the
    /// schema reads from.
    fn sample(&mut self, schema: &Schema) -> Result<Self::Document> {
        let document = self.fetch()?;
        check_shape(&document, schema)?;
        Ok(document)
    }
}

/// Fail with [`Error::MalformedSnapshot`] unless every category (and the
/// storage-engine sub-document, when engine fields are sampled) is present
/// as a sub-document.
pub fn check_shape<D: StatusDocument + ?Sized>(document: &D, schema: &Schema) -> Result<()> {
    for path in schema.required_containers() {
        match document.lookup(&path) {
            Some(FieldValue::Document) => trace!(key = %path.join("."), "container present"),
            _ => {
                return Err(Error::MalformedSnapshot {
                    key: path.join("."),
                })
            }
        }
    }
    Ok(())
}

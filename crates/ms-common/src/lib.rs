//! mdb-stats common types and errors.
//!
//! This crate provides foundational types shared across the ms-* crates:
//! - The ordered field schema and its CSV column labels
//! - Scalar metric values as read from a status snapshot
//! - The unified error type

pub mod error;
pub mod schema;
pub mod value;

pub use error::{Error, Result};
pub use schema::{column_name, Category, FieldPath, Schema, DATETIME_COLUMN, SCHEMA_VERSION};
pub use value::{FieldValue, MetricValue};

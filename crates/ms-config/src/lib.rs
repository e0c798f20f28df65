//! mdb-stats configuration loading and validation.
//!
//! This crate provides:
//! - Defaults for the connection URL, output path, and sampling period
//! - The validated sampler configuration handed to the core
//! - Field-schema files that replace the built-in schema

pub mod fields;
pub mod sampler;

pub use fields::FieldsFile;
pub use sampler::{SamplerConfig, DEFAULT_CSV_FILENAME, DEFAULT_MONGODB_URL, DEFAULT_PERIOD_SECS};

/// Environment variable overriding the connection URL.
pub const ENV_URL: &str = "MDB_STATS_URL";
/// Environment variable overriding the output CSV path.
pub const ENV_CSV: &str = "MDB_STATS_CSV";
/// Environment variable overriding the sampling period (seconds).
pub const ENV_PERIOD: &str = "MDB_STATS_PERIOD";
/// Environment variable pointing at a field-schema file.
pub const ENV_FIELDS: &str = "MDB_STATS_FIELDS";

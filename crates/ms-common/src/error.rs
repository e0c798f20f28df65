//! Error types for mdb-stats.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for mdb-stats operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for mdb-stats.
///
/// None of these are retried: every variant stops the sampling loop.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid field schema: {0}")]
    InvalidSchema(String),

    // Connectivity errors (20-29)
    #[error("cannot reach or query the server: {0}")]
    Connectivity(String),

    // Snapshot errors (30-39)
    #[error("malformed status snapshot: missing '{key}'")]
    MalformedSnapshot { key: String },

    #[error("status snapshot has no field '{field}' in category '{category}'")]
    MissingField { category: String, field: String },

    #[error("field '{field}' in category '{category}' is not a scalar value")]
    NonScalarField { category: String, field: String },

    #[error("value of field '{field}' in category '{category}' contains a comma or line break")]
    UnsafeValue { category: String, field: String },

    // Sink errors (40-49)
    #[error("cannot open output file {}: {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed writing to output file: {0}")]
    SinkWrite(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code for this error type.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidSchema(_) => 11,
            Error::Connectivity(_) => 20,
            Error::MalformedSnapshot { .. } => 30,
            Error::MissingField { .. } => 31,
            Error::NonScalarField { .. } => 32,
            Error::UnsafeValue { .. } => 33,
            Error::SinkOpen { .. } => 40,
            Error::SinkWrite(_) => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Internal(_) => 99,
        }
    }

    /// Whether the error came from the server's response rather than from
    /// the transport or the local filesystem.
    pub fn is_snapshot_error(&self) -> bool {
        (30..40).contains(&self.code())
    }

    pub fn missing_field(category: &str, field: &str) -> Self {
        Error::MissingField {
            category: category.to_string(),
            field: field.to_string(),
        }
    }
}

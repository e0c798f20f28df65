//! Exit codes for the mdb-stats CLI.
//!
//! Exit codes communicate the run outcome without requiring log parsing.

use ms_common::Error;

/// Exit codes for mdb-stats runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Stopped by the operator (interrupt) or by the sample limit
    Clean = 0,

    /// Invalid flags, environment, or field-schema file
    ConfigError = 10,

    /// Server unreachable or the status command failed
    ConnectivityError = 11,

    /// Status snapshot lacked a required container or field
    SnapshotError = 12,

    /// Output file could not be created or written
    SinkError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Exit code for a run that stopped with `error`.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Config(_) | Error::InvalidSchema(_) => ExitCode::ConfigError,
            Error::Connectivity(_) => ExitCode::ConnectivityError,
            e if e.is_snapshot_error() => ExitCode::SnapshotError,
            Error::SinkOpen { .. } | Error::SinkWrite(_) | Error::Io(_) => ExitCode::SinkError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

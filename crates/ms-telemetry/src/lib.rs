//! mdb-stats time-series storage.
//!
//! This crate provides:
//! - The timestamped [`Row`] produced once per sampling tick
//! - [`CsvSink`], which writes the header once and appends rows with a
//!   flush to stable storage after every write

pub mod row;
pub mod writer;

pub use row::{format_timestamp, Row};
pub use writer::CsvSink;

//! mdb-stats core: the sampling pipeline.
//!
//! One tick of the pipeline captures a timestamp, pulls a status snapshot
//! from a [`SnapshotSource`](source::SnapshotSource), flattens it through the
//! field [`Schema`](ms_common::Schema) into a row, and appends that row to the
//! [`CsvSink`](ms_telemetry::CsvSink). The [`Sampler`](sampler::Sampler)
//! repeats ticks at a fixed period until cancelled or until an error stops it.

pub mod exit_codes;
pub mod flatten;
pub mod sampler;
pub mod source;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use exit_codes::ExitCode;
pub use flatten::flatten;
pub use sampler::{CancelToken, Clock, RunReport, Sampler, SamplerOptions, SamplerState, StopReason, SystemClock};
pub use source::{SnapshotSource, StatusDocument};

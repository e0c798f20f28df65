//! The sampling loop.
//!
//! # States
//!
//! - **Starting**: open the CSV sink and write the header. A failure here
//!   aborts the run before any tick.
//! - **Running**: tick (timestamp → snapshot → row → append), then wait one
//!   period. Cancellation is honoured at the start of a tick and during the
//!   wait, never between the append and its sync.
//! - **Stopping**: close the sink, whatever caused the stop.
//! - **Stopped**: terminal.
//!
//! Ticks never overlap; the loop runs on the caller's thread.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use ms_common::{Error, Result, Schema};
use ms_config::SamplerConfig;
use ms_telemetry::CsvSink;
use tracing::{debug, error, info, warn};

use crate::flatten::flatten;
use crate::source::SnapshotSource;

// ── Cancellation ────────────────────────────────────────────────────────

/// Cloneable stop flag with an interruptible wait.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop and wake any waiter.
    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for `timeout` or until cancelled. Returns `true` if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (flag, cvar) = &*self.inner;
        let mut cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if *cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = cvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

// ── Clock ───────────────────────────────────────────────────────────────

/// Source of row timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ── Run outcome ─────────────────────────────────────────────────────────

/// Lifecycle state of a [`Sampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for SamplerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerState::Idle => write!(f, "idle"),
            SamplerState::Starting => write!(f, "starting"),
            SamplerState::Running => write!(f, "running"),
            SamplerState::Stopping => write!(f, "stopping"),
            SamplerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why the loop left the running state.
#[derive(Debug)]
pub enum StopReason {
    /// External cancellation.
    Cancelled,
    /// The configured number of rows was written.
    SampleLimit,
    /// A snapshot, flatten, or sink error; the run failed.
    Failed(Error),
}

impl StopReason {
    pub fn is_clean(&self) -> bool {
        !matches!(self, StopReason::Failed(_))
    }
}

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub rows_written: u64,
    pub stop: StopReason,
}

impl RunReport {
    /// The termination cause as a `Result`: `Ok(rows)` for a clean stop.
    pub fn into_result(self) -> Result<u64> {
        match self.stop {
            StopReason::Failed(e) => Err(e),
            _ => Ok(self.rows_written),
        }
    }
}

// ── Sampler ─────────────────────────────────────────────────────────────

/// Loop timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerOptions {
    pub period: Duration,
    pub max_samples: Option<u64>,
}

impl From<&SamplerConfig> for SamplerOptions {
    fn from(config: &SamplerConfig) -> Self {
        Self {
            period: config.period,
            max_samples: config.max_samples,
        }
    }
}

/// Drives ticks from a snapshot source into a CSV sink.
pub struct Sampler<S, C = SystemClock> {
    schema: Schema,
    source: S,
    clock: C,
    options: SamplerOptions,
    state: SamplerState,
}

impl<S: SnapshotSource> Sampler<S, SystemClock> {
    pub fn new(schema: Schema, source: S, options: SamplerOptions) -> Self {
        Self::with_clock(schema, source, options, SystemClock)
    }
}

impl<S: SnapshotSource, C: Clock> Sampler<S, C> {
    pub fn with_clock(schema: Schema, source: S, options: SamplerOptions, clock: C) -> Self {
        Self {
            schema,
            source,
            clock,
            options,
            state: SamplerState::Idle,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run until cancelled, the sample limit is hit, or an error occurs.
    ///
    /// Returns `Err` only when the output file cannot be created; every later
    /// failure is reported through [`RunReport::stop`] after the file is closed.
    pub fn run(&mut self, csv_path: &Path, cancel: &CancelToken) -> Result<RunReport> {
        self.transition(SamplerState::Starting);
        let mut sink = match CsvSink::open(csv_path, &self.schema) {
            Ok(sink) => sink,
            Err(e) => {
                error!(error = %e, "cannot start sampling");
                self.transition(SamplerState::Stopped);
                return Err(e);
            }
        };

        self.transition(SamplerState::Running);
        let stop = self.run_ticks(&mut sink, cancel);

        self.transition(SamplerState::Stopping);
        let rows_written = sink.rows_written();
        let stop = match (stop, sink.close()) {
            (stop, Ok(())) => stop,
            (StopReason::Failed(e), Err(close_err)) => {
                warn!(error = %close_err, "closing output file after failure also failed");
                StopReason::Failed(e)
            }
            (_, Err(close_err)) => StopReason::Failed(close_err),
        };
        self.transition(SamplerState::Stopped);

        match &stop {
            StopReason::Failed(e) => error!(error = %e, code = e.code(), rows_written, "sampling stopped on error"),
            other => info!(reason = ?other, rows_written, "sampling stopped"),
        }
        Ok(RunReport { rows_written, stop })
    }

    fn run_ticks(&mut self, sink: &mut CsvSink, cancel: &CancelToken) -> StopReason {
        loop {
            if cancel.is_cancelled() {
                return StopReason::Cancelled;
            }
            if let Err(e) = self.tick(sink) {
                return StopReason::Failed(e);
            }
            if let Some(max) = self.options.max_samples {
                if sink.rows_written() >= max {
                    return StopReason::SampleLimit;
                }
            }
            if cancel.wait_timeout(self.options.period) {
                return StopReason::Cancelled;
            }
        }
    }

    fn tick(&mut self, sink: &mut CsvSink) -> Result<()> {
        let timestamp = self.clock.now();
        let snapshot = self.source.sample(&self.schema)?;
        let row = flatten(&snapshot, &self.schema, timestamp)?;
        sink.append_row(&row)?;
        debug!(%timestamp, rows = sink.rows_written(), "tick complete");
        Ok(())
    }

    fn transition(&mut self, next: SamplerState) {
        debug!(from = %self.state, to = %next, "sampler state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedSource, StepClock};
    use ms_common::Category;
    use serde_json::json;
    use std::fs;
    use std::thread;
    use tempfile::tempdir;

    fn schema() -> Schema {
        Schema::new(
            vec![Category::new("mem", ["resident", "virtual"])],
            "wiredTiger",
            vec![Category::new("cache", ["dirty bytes"])],
        )
    }

    fn status(resident: i64) -> serde_json::Value {
        json!({
            "mem": {"resident": resident, "virtual": 200},
            "wiredTiger": {"cache": {"dirty bytes": 5}}
        })
    }

    fn options(max_samples: Option<u64>) -> SamplerOptions {
        SamplerOptions {
            period: Duration::from_millis(1),
            max_samples,
        }
    }

    #[test]
    fn cancel_token_wait_times_out() {
        let token = CancelToken::new();
        let started = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn cancel_token_wakes_waiter() {
        let token = CancelToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });
        let started = Instant::now();
        assert!(token.wait_timeout(Duration::from_secs(30)));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(token.is_cancelled());
        handle.join().unwrap();
    }

    #[test]
    fn sample_limit_stops_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let source = ScriptedSource::new().repeat(status(100), 5);
        let mut sampler = Sampler::with_clock(schema(), source, options(Some(3)), StepClock::default());

        let report = sampler.run(&path, &CancelToken::new()).unwrap();
        assert!(matches!(report.stop, StopReason::SampleLimit));
        assert_eq!(report.rows_written, 3);
        assert_eq!(sampler.state(), SamplerState::Stopped);
        assert_eq!(sampler.source().fetches(), 3);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 4);
    }

    #[test]
    fn pre_cancelled_token_writes_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let token = CancelToken::new();
        token.cancel();
        let mut sampler = Sampler::new(schema(), ScriptedSource::new().repeat(status(1), 1), options(None));

        let report = sampler.run(&path, &token).unwrap();
        assert!(matches!(report.stop, StopReason::Cancelled));
        assert_eq!(report.rows_written, 0);
        assert_eq!(sampler.source().fetches(), 0);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "datetime,mem_resident,mem_virtual,cache_dirty-bytes\n"
        );
    }

    #[test]
    fn malformed_snapshot_fails_the_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let source = ScriptedSource::new()
            .push_snapshot(status(1))
            .push_snapshot(json!({"mem": {"resident": 2, "virtual": 3}}));
        let mut sampler = Sampler::with_clock(schema(), source, options(None), StepClock::default());

        let report = sampler.run(&path, &CancelToken::new()).unwrap();
        assert_eq!(report.rows_written, 1);
        match report.into_result() {
            Err(Error::MalformedSnapshot { key }) => assert_eq!(key, "wiredTiger"),
            other => panic!("expected MalformedSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn unopenable_output_aborts_before_running() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("stats.csv");
        let mut sampler = Sampler::new(schema(), ScriptedSource::new().repeat(status(1), 1), options(None));

        let err = sampler.run(&path, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, Error::SinkOpen { .. }));
        assert_eq!(sampler.state(), SamplerState::Stopped);
        assert_eq!(sampler.source().fetches(), 0);
    }
}

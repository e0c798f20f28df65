//! Deterministic sources and clocks for exercising the pipeline without a server.

use std::cell::Cell;
use std::collections::VecDeque;

use chrono::{DateTime, Duration, TimeZone, Utc};
use ms_common::{Error, Result};
use serde_json::Value;

use crate::sampler::Clock;
use crate::source::SnapshotSource;

/// Replays a fixed script of JSON snapshots and failures, one per fetch.
///
/// Once the script runs out every fetch fails with a connectivity error.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Result<Value>>,
    fetches: usize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_snapshot(mut self, snapshot: Value) -> Self {
        self.script.push_back(Ok(snapshot));
        self
    }

    pub fn push_error(mut self, error: Error) -> Self {
        self.script.push_back(Err(error));
        self
    }

    pub fn repeat(mut self, snapshot: Value, times: usize) -> Self {
        for _ in 0..times {
            self.script.push_back(Ok(snapshot.clone()));
        }
        self
    }

    /// Number of fetches made so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }
}

impl SnapshotSource for ScriptedSource {
    type Document = Value;

    fn fetch(&mut self) -> Result<Value> {
        self.fetches += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(Error::Connectivity("scripted source exhausted".into())))
    }
}

/// Clock that starts at 2024-01-01T00:00:00Z and advances a fixed step per reading.
#[derive(Debug)]
pub struct StepClock {
    next: Cell<DateTime<Utc>>,
    step: Duration,
}

impl StepClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            Duration::seconds(10),
        )
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}

//! Registry of named interval timers.
//!
//! Each label moves between two states: `Pending` once [`TimerRegistry::begin`]
//! records a start instant, and `Closed` once [`TimerRegistry::end`] turns it
//! into an elapsed duration. Reports render pending labels with a marker
//! instead of a number.

mod report;
mod scope;

pub use self::report::{RecordState, ReportSummary, TimingRecord};
pub use self::scope::ScopedTimer;

use crate::{
    config::ReportConfig,
    error::{Result, TimerError},
};
use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    io::{self, Write},
    time::{Duration, Instant},
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Started, waiting for `end`.
    Pending { started: Instant },
    Closed { elapsed: Duration },
}

impl TimerState {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// The elapsed duration, `None` while pending.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Pending { .. } => None,
            Self::Closed { elapsed } => Some(*elapsed),
        }
    }
}

/// Named timers keyed by label, reported in label order.
///
/// All operations take `&self`, the map is behind a mutex so the registry can
/// be shared with `Arc` or borrowed by several [`ScopedTimer`]s at once.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timings: Mutex<BTreeMap<String, TimerState>>,
    config: ReportConfig,
}

impl TimerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: ReportConfig) -> Self {
        Self {
            timings: Mutex::new(BTreeMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Starts (or restarts) the timer for `label`.
    pub fn begin(&self, label: &str) {
        let started = Instant::now();

        let previous = self
            .timings
            .lock()
            .insert(label.to_string(), TimerState::Pending { started });

        debug!(label, restarted = previous.is_some(), "timer started");
    }

    /// Closes the timer for `label` and returns the elapsed time.
    /// # Errors
    /// `TimerError::MissingTimerStart` if `label` has no pending start, the
    /// registry is left untouched in that case
    pub fn end(&self, label: &str) -> Result<Duration> {
        let now = Instant::now();

        let mut timings = self.timings.lock();

        if let Some(state) = timings.get_mut(label) {
            if let TimerState::Pending { started } = *state {
                let elapsed = now.saturating_duration_since(started);
                *state = TimerState::Closed { elapsed };

                debug!(label, seconds = elapsed.as_secs_f64(), "timer closed");

                return Ok(elapsed);
            }
        }

        drop(timings);

        warn!(label, "timer ended without a matching begin");

        Err(TimerError::MissingTimerStart {
            label: label.to_string(),
        })
    }

    /// Begins `label` now and ends it when the returned guard goes out of scope.
    pub fn scope(&self, label: &str) -> ScopedTimer<'_> {
        ScopedTimer::new(self, label)
    }

    /// Runs `f` with `label` timed around it.
    pub fn measure<T, F>(&self, label: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _timer = self.scope(label);
        f()
    }

    pub fn state(&self, label: &str) -> Option<TimerState> {
        self.timings.lock().get(label).copied()
    }

    pub fn elapsed(&self, label: &str) -> Option<Duration> {
        self.state(label).and_then(|state| state.elapsed())
    }

    pub fn is_pending(&self, label: &str) -> bool {
        self.state(label).is_some_and(|state| state.is_pending())
    }

    pub fn len(&self) -> usize {
        self.timings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.lock().is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.timings.lock().keys().cloned().collect()
    }

    /// Drops every timer.
    pub fn clear(&self) {
        self.timings.lock().clear();
    }

    /// Point-in-time copy of every entry, in label order.
    pub fn snapshot(&self) -> Vec<TimingRecord> {
        self.timings
            .lock()
            .iter()
            .map(|(label, state)| TimingRecord::new(label, state))
            .collect()
    }

    pub fn render(&self) -> String {
        report::render(&self.snapshot(), &self.config)
    }

    /// Writes the report to `writer`.
    /// # Errors
    /// Will return an error if writing fails
    pub fn report_to<W: Write>(&self, writer: &mut W) -> Result<ReportSummary> {
        let records = self.snapshot();

        let summary = report::write(&records, &self.config, writer)?;

        for label in &summary.pending {
            warn!(label = label.as_str(), "reported timer is still pending");
        }

        Ok(summary)
    }

    /// Writes the report to stdout.
    /// # Errors
    /// Will return an error if stdout can't be written
    pub fn report(&self) -> Result<ReportSummary> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();

        self.report_to(&mut handle)
    }
}

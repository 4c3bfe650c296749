//! Reporters: listeners that forward entries somewhere.
//!
//! The buffering reporters collect entries of their levels in a private queue and submit the whole queue through
//! their hub when their trigger fires:
//!
//! | Reporter             | Trigger                                  |
//! |----------------------|------------------------------------------|
//! | [`IntervalReporter`] | a repeating timer                        |
//! | [`BatchReporter`]    | the queue reaching the batch size        |
//! | [`OnUnloadReporter`] | only teardown                            |
//!
//! All of them pick up the backlog of their levels from the hub's history when they are set up, and submit
//! whatever is left with [`Delivery::Blocking`] when the hub is torn down (opt-out for interval and batch
//! reporters through `flush_on_unload`).
//!
//! A flush takes the queue and leaves a fresh one behind before submitting, so entries dispatched while a
//! submission is in flight land in the new queue. If the submission fails the taken entries are put back in front
//! of them; nothing is retried until the next trigger.
//!
//! [`ConsoleReporter`] writes entries to stderr as they are dispatched, without buffering.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::entry::LogEntry;
use crate::hub::{Hub, WeakHub};
use crate::level::LevelSpec;
use crate::schedule::TimerHandle;
use crate::submit::Delivery;

mod batch;
mod console;
mod interval;
mod on_unload;

pub use self::batch::{BatchConfig, BatchReporter};
pub use self::console::{ConsoleConfig, ConsoleReporter};
pub use self::interval::{DEFAULT_INTERVAL_MS, IntervalConfig, IntervalReporter};
pub use self::on_unload::{OnUnloadConfig, OnUnloadReporter};

/// The result of flushing a reporter queue.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The queue was empty, nothing was submitted.
    Empty,
    /// This many entries were submitted and removed from the queue.
    Submitted(usize),
    /// Submitting this many entries failed; they are still queued.
    Failed(usize),
}

/// Returns the levels a reporter subscribes to: the requested ones, or the hub's default.
fn resolve_levels(hub: &Hub, requested: Option<LevelSpec>) -> LevelSpec {
    requested
        .filter(|levels| !levels.is_empty())
        .unwrap_or_else(|| hub.config().default_level)
}

/// The queue shared by all buffering reporters.
#[derive(Debug)]
struct ReporterQueue {
    hub: WeakHub,
    levels: LevelSpec,
    endpoint: Option<String>,
    entries: Mutex<Vec<LogEntry>>,
    timer: Mutex<Option<TimerHandle>>,
}

impl ReporterQueue {
    /// Creates a queue for `levels`, seeded with the matching entries of the hub's history.
    fn seeded(hub: &Hub, levels: LevelSpec, endpoint: Option<String>) -> Self {
        let backlog: Vec<_> = hub
            .history()
            .get(&levels, None)
            .into_iter()
            // Match what a subscription to `levels` would have received.
            .filter(|entry| !levels.is_wildcard() || entry.level.is_builtin())
            .collect();

        tracing::debug!(%levels, backlog = backlog.len(), "reporter queue seeded");

        Self {
            hub: hub.downgrade(),
            levels,
            endpoint,
            entries: Mutex::new(backlog),
            timer: Mutex::new(None),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry and returns the new queue length.
    fn push(&self, entry: &LogEntry) -> usize {
        let mut entries = self.entries();
        entries.push(entry.clone());
        entries.len()
    }

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn set_timer(&self, timer: TimerHandle) {
        *self.timer.lock().unwrap_or_else(PoisonError::into_inner) = Some(timer);
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            timer.cancel();
        }
    }

    /// Submits the whole queue.
    ///
    /// The queue is replaced by an empty one before submitting and restored on failure.
    fn flush(&self, delivery: Delivery) -> FlushOutcome {
        let batch = std::mem::take(&mut *self.entries());
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }

        let submitted = self.hub.upgrade().is_some_and(|hub| {
            hub.submit_to(self.endpoint.as_deref(), &batch, delivery)
        });

        let count = batch.len();
        if submitted {
            tracing::debug!(levels = %self.levels, count, ?delivery, "reporter queue flushed");
            return FlushOutcome::Submitted(count);
        }

        let mut entries = self.entries();
        let newer = std::mem::replace(&mut *entries, batch);
        entries.extend(newer);
        FlushOutcome::Failed(count)
    }

    /// Stops the timer, if any, and submits the queue synchronously.
    fn flush_on_teardown(&self) -> FlushOutcome {
        self.cancel_timer();
        self.flush(Delivery::Blocking)
    }
}

impl Drop for ReporterQueue {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

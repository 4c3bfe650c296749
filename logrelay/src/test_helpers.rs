//! Deterministic doubles for the clock, transport and scheduler of a hub.
//!
//! These are used by the tests of this crate and of crates building reporters on top of it.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::entry::{Clock, LogEntry, Timestamp};
use crate::schedule::{Scheduler, Task, TimerHandle};
use crate::submit::{Delivery, Transport, TransportError};

/// A clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    /// Creates a clock showing `start`.
    pub fn new(start: Timestamp) -> Self {
        Self(Arc::new(AtomicU64::new(start.as_millis())))
    }

    /// Sets the current time.
    pub fn set(&self, now: Timestamp) {
        self.0.store(now.as_millis(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.load(Ordering::SeqCst))
    }
}

/// A single request seen by a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Where the request was sent.
    pub endpoint: String,
    /// The serialized entries.
    pub body: String,
    /// How the request was sent.
    pub delivery: Delivery,
}

impl Submission {
    /// Parses the body back into entries.
    ///
    /// # Panics
    ///
    /// Panics if the body is not a JSON array of entries, i.e. if the hub used a non-JSON serializer.
    pub fn entries(&self) -> Vec<LogEntry> {
        serde_json::from_str(&self.body).expect("submission body should be a JSON array of entries")
    }

    /// Returns the messages of the submitted entries.
    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|entry| entry.message)
            .collect()
    }
}

#[derive(Debug, Default)]
struct Recording {
    submissions: Mutex<Vec<Submission>>,
    failing: AtomicBool,
}

/// A transport that records every request instead of sending it.
///
/// Requests are recorded even while the transport is failing, so tests can count attempts.
#[derive(Debug)]
pub struct RecordingTransport {
    recording: Arc<Recording>,
}

impl RecordingTransport {
    /// Creates a transport and a handle to inspect and control it.
    pub fn new() -> (Self, TransportHandle) {
        let recording = Arc::new(Recording::default());
        (
            Self {
                recording: recording.clone(),
            },
            TransportHandle { recording },
        )
    }
}

impl Transport for RecordingTransport {
    fn send(&self, endpoint: &str, body: String, delivery: Delivery) -> Result<(), TransportError> {
        self.recording
            .submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Submission {
                endpoint: endpoint.to_owned(),
                body,
                delivery,
            });

        if self.recording.failing.load(Ordering::SeqCst) {
            return Err(TransportError::new("recording transport set to fail"));
        }
        Ok(())
    }
}

/// Inspects and controls a [`RecordingTransport`].
#[derive(Debug, Clone)]
pub struct TransportHandle {
    recording: Arc<Recording>,
}

impl TransportHandle {
    /// Makes every following send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.recording.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns all recorded requests, oldest first.
    pub fn submissions(&self) -> Vec<Submission> {
        self.recording
            .submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns all recorded requests.
    pub fn take(&self) -> Vec<Submission> {
        std::mem::take(
            &mut *self
                .recording
                .submissions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Returns the number of recorded requests.
    pub fn len(&self) -> usize {
        self.recording
            .submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no request was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct ManualTimer {
    period: Duration,
    task: Mutex<Task>,
    cancelled: Arc<AtomicBool>,
}

/// A scheduler whose timers only tick when [`ManualScheduler::fire`] is called.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<Vec<Arc<ManualTimer>>>>,
}

impl ManualScheduler {
    /// Creates a scheduler without timers.
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Vec<Arc<ManualTimer>> {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs one tick of every timer that has not been cancelled and returns how many ran.
    pub fn fire(&self) -> usize {
        let mut fired = 0;
        for timer in self.snapshot() {
            if timer.cancelled.load(Ordering::SeqCst) {
                continue;
            }
            let mut task = timer.task.lock().unwrap_or_else(PoisonError::into_inner);
            (*task)();
            fired += 1;
        }
        fired
    }

    /// Returns the number of timers that have not been cancelled.
    pub fn active(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|timer| !timer.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Returns the periods of all timers ever scheduled, in scheduling order.
    pub fn periods(&self) -> Vec<Duration> {
        self.snapshot().iter().map(|timer| timer.period).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, period: Duration, task: Task) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(ManualTimer {
                period,
                task: Mutex::new(task),
                cancelled: cancelled.clone(),
            }));

        TimerHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("periods", &self.periods())
            .field("active", &self.active())
            .finish()
    }
}

//! Retention of every dispatched entry for later queries.
//!
//! Each [`Hub`][crate::Hub] owns one [`History`], subscribed before any other listener.
//! Reporters use it to pick up entries logged before they were set up.

use std::sync::{Mutex, PoisonError};

use crate::entry::{LogEntry, Timestamp};
use crate::level::LevelSpec;

/// An unbounded, insertion-ordered store of log entries.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<LogEntry>>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&[LogEntry]) -> T) -> T {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        f(&entries)
    }

    /// Appends an entry.
    pub fn record(&self, entry: &LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
    }

    /// Returns the entries selected by `levels` that are strictly newer than `since`, oldest first.
    ///
    /// The wildcard selects every level. The returned vector is a copy, the history itself cannot be modified
    /// through it.
    pub fn get(&self, levels: &LevelSpec, since: Option<Timestamp>) -> Vec<LogEntry> {
        self.read(|entries| {
            entries
                .iter()
                .filter(|entry| since.is_none_or(|since| entry.timestamp > since))
                .filter(|entry| levels.matches(&entry.level))
                .cloned()
                .collect()
        })
    }

    /// Returns the number of retained entries.
    pub fn len(&self) -> usize {
        self.read(<[LogEntry]>::len)
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Log entries and the clock that timestamps them.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::level::Level;

/// A point in time with millisecond resolution, counted from the Unix epoch.
#[derive(Debug, Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the milliseconds since the Unix epoch.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns the current system time.
    ///
    /// A system clock set before the Unix epoch yields [`Timestamp::default`].
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A single dispatched log call.
///
/// Entries are created once per dispatch, before fan-out, so every listener observes the same timestamp.
/// Listeners receive a shared reference and clone whatever they keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the log call was made.
    pub timestamp: Timestamp,
    /// The level the entry was dispatched to.
    pub level: Level,
    /// The formatted message.
    pub message: String,
    /// Structured context attached by adapters, e.g. the location of a panic.
    ///
    /// Only listeners in this process see it, submitted records are `{timestamp, level, message}`.
    #[serde(skip)]
    pub detail: Option<Value>,
}

impl LogEntry {
    /// Creates an entry without detail.
    pub fn new(timestamp: Timestamp, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            detail: None,
        }
    }
}

/// A source of timestamps for new entries.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

impl<F> Clock for F
where
    F: Fn() -> Timestamp + Send + Sync,
{
    fn now(&self) -> Timestamp {
        self()
    }
}

/// The wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{LogEntry, Timestamp};
    use crate::level::Level;

    #[test]
    fn entry_wire_format() {
        let entry = LogEntry::new(Timestamp(1_700_000_000_123), Level::WARN, "disk almost full");

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "timestamp": 1_700_000_000_123u64,
                "level": "warn",
                "message": "disk almost full",
            })
        );
    }

    #[test]
    fn detail_is_not_serialized() {
        let mut entry = LogEntry::new(Timestamp(5), Level::ERROR, "boom");
        entry.detail = Some(json!({ "line": 12 }));

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({ "timestamp": 5, "level": "error", "message": "boom" })
        );
    }

    #[test]
    fn system_time_is_after_2020() {
        assert!(Timestamp::now() > Timestamp(1_577_836_800_000));
    }
}

//! Listeners and the per-level listener table.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::entry::LogEntry;
use crate::level::{BuiltinLevel, Level, LevelSpec};

/// A subscriber to one or more levels.
///
/// Every closure taking a `&LogEntry` is a listener.
/// The entry carries the level and the formatted message; listeners clone whatever they want to keep.
///
/// Listeners are invoked synchronously, in subscription order, from the thread making the log call.
/// A panicking listener is isolated: the panic is swallowed and the remaining listeners still run.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use logrelay::{Hub, LogEntry, args};
///
/// let hub = Hub::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// hub.on("warn error", {
///     let seen = seen.clone();
///     move |entry: &LogEntry| seen.lock().unwrap().push(entry.message.clone())
/// });
///
/// hub.warn(&args!["low disk"]);
/// hub.info(&args!["ignored"]);
///
/// assert_eq!(*seen.lock().unwrap(), ["low disk"]);
/// ```
pub trait Listener: Send + Sync {
    /// Handles a dispatched entry.
    fn notify(&self, entry: &LogEntry);
}

impl<F> Listener for F
where
    F: Fn(&LogEntry) + Send + Sync,
{
    fn notify(&self, entry: &LogEntry) {
        self(entry)
    }
}

/// A listener shared between all the levels it is subscribed to.
pub type SharedListener = Arc<dyn Listener>;

/// The registered levels and their listeners, in registration order.
///
/// Listener lists are append-only; there is no way to unsubscribe.
#[derive(Default)]
pub struct ListenerTable {
    levels: IndexMap<Level, Vec<SharedListener>>,
}

impl ListenerTable {
    /// Creates a table containing the built-in levels without listeners.
    pub fn with_builtin_levels() -> Self {
        let mut table = Self::default();
        for level in BuiltinLevel::ALL {
            table.insert_level(level.into());
        }
        table
    }

    /// Whether `level` is registered.
    pub fn contains(&self, level: &str) -> bool {
        self.levels.keys().any(|registered| registered == level)
    }

    /// Returns the registered level named `name`.
    pub fn get(&self, name: &str) -> Option<&Level> {
        self.levels.keys().find(|registered| *registered == name)
    }

    /// Registers `level` with an empty listener list.
    ///
    /// Returns `false` if it was already registered.
    pub fn insert_level(&mut self, level: Level) -> bool {
        if self.levels.contains_key(&level) {
            return false;
        }
        self.levels.insert(level, Vec::new());
        true
    }

    /// Appends `listener` to every registered level selected by `spec` and returns how many levels it was added to.
    ///
    /// Unknown names are skipped, the wildcard only covers the built-in levels.
    pub fn subscribe(&mut self, spec: &LevelSpec, listener: &SharedListener) -> usize {
        let mut subscribed = 0;
        for level in spec.subscription_levels() {
            if let Some(listeners) = self.levels.get_mut(&level) {
                listeners.push(Arc::clone(listener));
                subscribed += 1;
            }
        }
        subscribed
    }

    /// Returns a snapshot of the listeners of `level`, in subscription order.
    pub fn listeners(&self, level: &Level) -> Vec<SharedListener> {
        self.levels.get(level).cloned().unwrap_or_default()
    }

    /// Returns all registered levels, built-in levels first.
    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.keys()
    }
}

impl fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.levels
                    .iter()
                    .map(|(level, listeners)| (level.as_str(), listeners.len())),
            )
            .finish()
    }
}

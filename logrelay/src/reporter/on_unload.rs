use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FlushOutcome, ReporterQueue, resolve_levels};
use crate::entry::LogEntry;
use crate::hub::Hub;
use crate::level::LevelSpec;

/// Settings of an [`OnUnloadReporter`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OnUnloadConfig {
    /// The levels to report, the hub's default level if unset or empty.
    pub level: Option<LevelSpec>,
    /// The endpoint to submit to instead of the hub's.
    pub url: Option<String>,
}

/// Collects entries until teardown and submits them all at once.
#[derive(Debug)]
pub struct OnUnloadReporter {
    queue: ReporterQueue,
}

impl OnUnloadReporter {
    /// Creates a reporter, subscribes it to its levels and registers its teardown flush.
    pub fn init(hub: &Hub, config: OnUnloadConfig) -> Arc<Self> {
        let levels = resolve_levels(hub, config.level);
        let reporter = Arc::new(Self {
            queue: ReporterQueue::seeded(hub, levels.clone(), config.url),
        });

        hub.on_teardown({
            let reporter = Arc::clone(&reporter);
            move || {
                reporter.flush_on_teardown();
            }
        });

        hub.on(levels, {
            let reporter = Arc::clone(&reporter);
            move |entry: &LogEntry| {
                reporter.queue.push(entry);
            }
        });

        reporter
    }

    /// Submits the queue synchronously.
    ///
    /// Calling this again only submits entries queued since.
    pub fn flush_on_teardown(&self) -> FlushOutcome {
        self.queue.flush_on_teardown()
    }

    /// Returns the number of queued entries.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{FlushOutcome, ReporterQueue, resolve_levels};
use crate::entry::LogEntry;
use crate::hub::Hub;
use crate::level::LevelSpec;
use crate::submit::Delivery;

/// The flush period used when an interval reporter does not set one, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// Settings of an [`IntervalReporter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntervalConfig {
    /// The levels to report, the hub's default level if unset or empty.
    pub level: Option<LevelSpec>,
    /// The endpoint to submit to instead of the hub's.
    pub url: Option<String>,
    /// The flush period in milliseconds; `0` means [`DEFAULT_INTERVAL_MS`].
    pub interval: u64,
    /// Whether to submit what is left at teardown.
    #[serde(alias = "flushOnUnload")]
    pub flush_on_unload: bool,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            level: None,
            url: None,
            interval: DEFAULT_INTERVAL_MS,
            flush_on_unload: true,
        }
    }
}

impl IntervalConfig {
    fn period(&self) -> Duration {
        match self.interval {
            0 => Duration::from_millis(DEFAULT_INTERVAL_MS),
            millis => Duration::from_millis(millis),
        }
    }
}

/// Submits its queue every period, in the background.
///
/// # Examples
///
/// ```rust
/// use logrelay::Hub;
/// use logrelay::reporter::{IntervalConfig, IntervalReporter};
///
/// let hub = Hub::builder().submit_url("https://logs.example.com/ingest").build();
/// let _teardown = hub.teardown_guard();
///
/// IntervalReporter::init(
///     &hub,
///     IntervalConfig {
///         level: Some("error warn".into()),
///         interval: 30_000,
///         ..IntervalConfig::default()
///     },
/// );
/// ```
#[derive(Debug)]
pub struct IntervalReporter {
    queue: ReporterQueue,
}

impl IntervalReporter {
    /// Creates a reporter, subscribes it to its levels and starts its timer on the hub's scheduler.
    pub fn init(hub: &Hub, config: IntervalConfig) -> Arc<Self> {
        let period = config.period();
        let levels = resolve_levels(hub, config.level);
        let reporter = Arc::new(Self {
            queue: ReporterQueue::seeded(hub, levels.clone(), config.url),
        });

        if config.flush_on_unload {
            let reporter = Arc::clone(&reporter);
            hub.on_teardown(move || {
                reporter.flush_on_teardown();
            });
        }

        let timer = hub.scheduler().schedule_repeating(period, {
            let reporter = Arc::downgrade(&reporter);
            Box::new(move || {
                if let Some(reporter) = reporter.upgrade() {
                    reporter.flush_now();
                }
            })
        });
        reporter.queue.set_timer(timer);

        hub.on(levels, {
            let reporter = Arc::clone(&reporter);
            move |entry: &LogEntry| {
                reporter.queue.push(entry);
            }
        });

        reporter
    }

    /// Submits the queue in the background, as a timer tick does.
    pub fn flush_now(&self) -> FlushOutcome {
        self.queue.flush(Delivery::Background)
    }

    /// Stops the timer and submits the queue synchronously.
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

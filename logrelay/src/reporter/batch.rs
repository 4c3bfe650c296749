use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use super::{FlushOutcome, ReporterQueue, resolve_levels};
use crate::config::DEFAULT_BATCH_SIZE;
use crate::entry::LogEntry;
use crate::hub::Hub;
use crate::level::LevelSpec;
use crate::submit::Delivery;

/// Settings of a [`BatchReporter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// The levels to report, the hub's default level if unset or empty.
    pub level: Option<LevelSpec>,
    /// The endpoint to submit to instead of the hub's.
    pub url: Option<String>,
    /// The queue length that triggers a submission; the hub's batch size if unset or `0`.
    pub size: Option<usize>,
    /// Whether to submit what is left at teardown.
    #[serde(alias = "flushOnUnload")]
    pub flush_on_unload: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            level: None,
            url: None,
            size: None,
            flush_on_unload: true,
        }
    }
}

/// Submits its queue in the background whenever it reaches the batch size.
///
/// A failed submission keeps the entries queued. They are submitted again, together with the newer ones, once
/// another full batch has been queued or at teardown.
///
/// # Examples
///
/// ```rust
/// use logrelay::reporter::{BatchConfig, BatchReporter};
/// use logrelay::{Hub, args};
///
/// let hub = Hub::builder().submit_url("https://logs.example.com/ingest").build();
/// let reporter = BatchReporter::init(&hub, BatchConfig { size: Some(3), ..BatchConfig::default() });
///
/// hub.error(&args!["one"]);
/// hub.error(&args!["two"]);
/// assert_eq!(reporter.len(), 2);
/// ```
#[derive(Debug)]
pub struct BatchReporter {
    queue: ReporterQueue,
    size: usize,
    // Queue length that triggers the next flush, moved up by `size` after a failed one.
    flush_at: AtomicUsize,
}

impl BatchReporter {
    /// Creates a reporter and subscribes it to its levels.
    ///
    /// If the backlog taken over from the history already fills a batch, it is submitted right away.
    pub fn init(hub: &Hub, config: BatchConfig) -> Arc<Self> {
        let size = config
            .size
            .filter(|size| *size > 0)
            .or_else(|| Some(hub.config().batch_size).filter(|size| *size > 0))
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let levels = resolve_levels(hub, config.level);
        let reporter = Arc::new(Self {
            queue: ReporterQueue::seeded(hub, levels.clone(), config.url),
            size,
            flush_at: AtomicUsize::new(size),
        });

        if reporter.queue.len() >= size {
            reporter.flush(Delivery::Background);
        }

        if config.flush_on_unload {
            let reporter = Arc::clone(&reporter);
            hub.on_teardown(move || {
                reporter.flush_on_teardown();
            });
        }

        hub.on(levels, {
            let reporter = Arc::clone(&reporter);
            move |entry: &LogEntry| reporter.append(entry)
        });

        reporter
    }

    fn append(&self, entry: &LogEntry) {
        if self.queue.push(entry) >= self.flush_at.load(Ordering::SeqCst) {
            self.flush(Delivery::Background);
        }
    }

    fn flush(&self, delivery: Delivery) -> FlushOutcome {
        let outcome = self.queue.flush(delivery);
        let flush_at = match outcome {
            FlushOutcome::Failed(queued) => queued + self.size,
            FlushOutcome::Empty | FlushOutcome::Submitted(_) => self.size,
        };
        self.flush_at.store(flush_at, Ordering::SeqCst);
        outcome
    }

    /// Returns the batch size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Submits the queue synchronously.
    ///
    /// Calling this again only submits entries queued since.
    pub fn flush_on_teardown(&self) -> FlushOutcome {
        self.flush(Delivery::Blocking)
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

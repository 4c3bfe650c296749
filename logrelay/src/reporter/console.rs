use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::resolve_levels;
use crate::entry::LogEntry;
use crate::hub::Hub;
use crate::level::LevelSpec;

/// Settings of a [`ConsoleReporter`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// The levels to report, the hub's default level if unset or empty.
    pub level: Option<LevelSpec>,
}

/// Writes every entry of its levels as a `[level] message` line.
pub struct ConsoleReporter {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleReporter {
    /// Creates a reporter writing to stderr and subscribes it to its levels.
    pub fn init(hub: &Hub, config: ConsoleConfig) -> Arc<Self> {
        Self::with_writer(hub, config, io::stderr())
    }

    /// Creates a reporter writing to `writer` and subscribes it to its levels.
    pub fn with_writer(
        hub: &Hub,
        config: ConsoleConfig,
        writer: impl Write + Send + 'static,
    ) -> Arc<Self> {
        let reporter = Arc::new(Self {
            writer: Mutex::new(Box::new(writer)),
        });

        hub.on(resolve_levels(hub, config.level), {
            let reporter = Arc::clone(&reporter);
            move |entry: &LogEntry| reporter.write(entry)
        });

        reporter
    }

    fn write(&self, entry: &LogEntry) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = writeln!(writer, "[{}] {}", entry.level, entry.message) {
            tracing::trace!(?error, "failed to write log entry to console");
        }
    }
}

impl fmt::Debug for ConsoleReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleReporter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::{ConsoleConfig, ConsoleReporter};
    use crate::args;
    use crate::hub::Hub;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(bytes)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn writes_one_line_per_entry() {
        let hub = Hub::new();
        let buffer = Buffer::default();
        ConsoleReporter::with_writer(
            &hub,
            ConsoleConfig {
                level: Some("error warn".into()),
            },
            buffer.clone(),
        );

        hub.error(&args!["disk %s", "full"]);
        hub.info(&args!["not reported"]);
        hub.warn(&args!["retry", 3]);

        assert_eq!(
            buffer.text(),
            indoc! {"
                [error] disk full
                [warn] retry 3
            "}
        );
    }

    #[test]
    fn defaults_to_the_hub_default_level() {
        let hub = Hub::builder().default_level("debug").build();
        let buffer = Buffer::default();
        ConsoleReporter::with_writer(&hub, ConsoleConfig::default(), buffer.clone());

        hub.error(&args!["skipped"]);
        hub.debug(&args!["kept"]);

        assert_eq!(buffer.text(), "[debug] kept\n");
    }
}

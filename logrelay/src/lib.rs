//! # `logrelay`
//!
//! A level-based log dispatcher: log calls are formatted into messages and fanned out to the listeners of their
//! level, some of which buffer entries and submit them to a remote endpoint.
//!
//! ## Features
//!
//! - **Named levels**: the built-in `error`, `warn`, `info`, `log` and `debug` levels plus custom levels added at
//!   runtime, each subscribed to independently
//! - **Placeholder formatting**: `%s`, `%i`, `%n` and `%o` are substituted left to right, structured arguments go
//!   through a replaceable serializer
//! - **History**: every dispatched entry is retained and can be queried by level and time
//! - **Buffering reporters**: interval, batch and teardown-only reporters that submit through a pluggable
//!   [`Transport`][submit::Transport]
//! - **Teardown flush**: buffered entries are submitted synchronously before the process goes away
//!
//! ## Feature Flags
//!
//! - `tokio` - Enable [`TokioScheduler`][schedule::TokioScheduler] to run periodic flushes on a tokio runtime
//!
//! ## Basic Usage
//!
//! Configure the global hub and attach reporters in your application:
//!
//! ```rust
//! use logrelay::reporter::{BatchConfig, BatchReporter, ConsoleConfig, ConsoleReporter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hub = logrelay::Hub::builder()
//!     .submit_url("https://logs.example.com/ingest")
//!     .set_global()?;
//! let _teardown = hub.teardown_guard();
//!
//! ConsoleReporter::init(hub, ConsoleConfig::default());
//! BatchReporter::init(hub, BatchConfig { level: Some("error warn".into()), ..BatchConfig::default() });
//! # Ok(())
//! # }
//! ```
//!
//! Then log through the macros:
//!
//! ```rust
//! use logrelay::{error, info};
//!
//! info!("listening on %s", "127.0.0.1:8080");
//! error!("request %s failed", "r-17", serde_json::json!({ "status": 503 }));
//! ```
//!
//! Listeners are plain closures:
//!
//! ```rust
//! use logrelay::LogEntry;
//!
//! logrelay::global().on("warn error", |entry: &LogEntry| eprintln!("{}: {}", entry.level, entry.message));
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod entry;
pub mod format;
mod global;
pub mod history;
pub mod hub;
mod isolate;
pub mod level;
pub mod listener;
#[doc(hidden)]
pub mod macro_helpers;
mod macros;
pub mod panic_trap;
pub mod reporter;
pub mod schedule;
pub mod submit;
pub mod teardown;
#[doc(hidden)]
pub mod test_helpers;

pub use entry::{LogEntry, Timestamp};
pub use global::{SetGlobalError, global, set_global};
pub use hub::{AddLevelError, Hub, HubBuilder, LevelHandle, WeakHub};
pub use level::{BuiltinLevel, Level, LevelSpec};
pub use listener::Listener;
pub use submit::Delivery;

//! Macros for building argument lists and logging to the global hub.
//!
//! - `args!`: Builds a `Vec` of log call arguments from any `Serialize` expressions
//! - `error!`, `warn!`, `info!`, `log!`, `debug!`: Dispatch to the matching built-in level of the
//!   [global hub][crate::global]
//!
//! Structured values are passed as-is and go through the hub's serializer, so `info!("user %o", user)` works for
//! any `user: impl Serialize`.

/// Builds a list of log call arguments.
///
/// # Examples
///
/// ```rust
/// use logrelay::args;
/// use serde_json::json;
///
/// let arguments = args!["request %s took %i ms", "/health", 12, json!({ "status": 200 })];
/// assert_eq!(arguments.len(), 4);
/// assert_eq!(arguments[2], json!(12));
/// ```
#[macro_export]
macro_rules! args {
    ($($argument:expr),* $(,)?) => {{
        let arguments: ::std::vec::Vec<$crate::macro_helpers::Value> =
            ::std::vec![$($crate::macro_helpers::to_argument(&$argument)),*];
        arguments
    }};
}

/// Logs to the `error` level of the global hub.
///
/// ```rust
/// logrelay::error!("payment %s failed", "p-1001");
/// ```
#[macro_export]
macro_rules! error {
    ($($argument:expr),* $(,)?) => {
        $crate::global().error(&$crate::args![$($argument),*])
    };
}

/// Logs to the `warn` level of the global hub.
///
/// ```rust
/// logrelay::warn!("retrying in %i ms", 250);
/// ```
#[macro_export]
macro_rules! warn {
    ($($argument:expr),* $(,)?) => {
        $crate::global().warn(&$crate::args![$($argument),*])
    };
}

/// Logs to the `info` level of the global hub.
///
/// ```rust
/// logrelay::info!("listening on", "127.0.0.1:8080");
/// ```
#[macro_export]
macro_rules! info {
    ($($argument:expr),* $(,)?) => {
        $crate::global().info(&$crate::args![$($argument),*])
    };
}

/// Logs to the `log` level of the global hub.
///
/// ```rust
/// logrelay::log!("cache size %i", 42);
/// ```
#[macro_export]
macro_rules! log {
    ($($argument:expr),* $(,)?) => {
        $crate::global().log(&$crate::args![$($argument),*])
    };
}

/// Logs to the `debug` level of the global hub.
///
/// ```rust
/// logrelay::debug!("state %o", serde_json::json!({ "open": true }));
/// ```
#[macro_export]
macro_rules! debug {
    ($($argument:expr),* $(,)?) => {
        $crate::global().debug(&$crate::args![$($argument),*])
    };
}

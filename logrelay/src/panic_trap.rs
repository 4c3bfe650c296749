//! Reporting of uncaught panics.
//!
//! [`install`] chains a panic hook in front of the current one. Every panic is logged at the `error` level of the
//! hub, with a detail record describing where it happened, before the previous hook runs:
//!
//! ```json
//! { "file": "src/main.rs", "line": 12, "source": "panic hook", "stacktrace": "..." }
//! ```
//!
//! `stacktrace` is only present when a backtrace was captured, see [`std::backtrace::Backtrace::capture`].
//!
//! Panics of listeners, serializers and teardown hooks are already caught by the hub and are not reported.
//! A listener that panics while handling the entry produced by the hook itself aborts the process, as does every
//! panic raised from inside a panic hook.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, PanicHookInfo};

use serde_json::{Map, Value};

use crate::hub::Hub;
use crate::isolate::is_isolating;
use crate::level::Level;

/// The `source` of the detail records.
pub const SOURCE: &str = "panic hook";

/// Installs a panic hook that logs to `hub`, then calls the previously installed hook.
///
/// The hook only holds a weak handle: once `hub` is dropped, panics go straight to the previous hook.
pub fn install(hub: &Hub) {
    let hub = hub.downgrade();
    let previous = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        if !is_isolating()
            && let Some(hub) = hub.upgrade()
        {
            let detail = detail(info);
            hub.dispatch_with_detail(
                &Level::ERROR,
                &[Value::String(message(info)), detail.clone()],
                Some(detail),
            );
        }

        previous(info);
    }));
}

fn message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

fn detail(info: &PanicHookInfo<'_>) -> Value {
    let mut detail = Map::new();
    if let Some(location) = info.location() {
        detail.insert("file".into(), location.file().into());
        detail.insert("line".into(), location.line().into());
    }
    detail.insert("source".into(), SOURCE.into());

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        detail.insert("stacktrace".into(), backtrace.to_string().into());
    }

    Value::Object(detail)
}

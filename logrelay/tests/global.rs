#![expect(missing_docs, reason = "tests")]

use logrelay::{Hub, LogEntry};
use pretty_assertions::assert_eq;
use serial_test::serial;

#[test]
#[serial]
fn global_hub_is_created_on_first_use() {
    let hub = logrelay::global();

    assert!(hub.ptr_eq(logrelay::global()));
    assert_eq!(
        logrelay::set_global(Hub::new()).unwrap_err().to_string(),
        "a global hub has already been set"
    );
}

#[test]
#[serial]
fn macros_dispatch_to_the_global_hub() {
    let before = logrelay::global().history().len();

    logrelay::error!("payment %s failed", "p-1001");
    logrelay::warn!("retrying in %i ms", 250);
    logrelay::info!("state", serde_json::json!({ "open": true }));
    logrelay::log!();
    logrelay::debug!("done");

    let entries: Vec<LogEntry> = logrelay::global().get("*", None).split_off(before);
    let lines: Vec<_> = entries
        .iter()
        .map(|entry| format!("{}: {}", entry.level, entry.message))
        .collect();
    assert_eq!(
        lines,
        [
            "error: payment p-1001 failed",
            "warn: retrying in 250 ms",
            r#"info: state {"open":true}"#,
            "log: ",
            "debug: done",
        ]
    );
}

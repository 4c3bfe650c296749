#![expect(missing_docs, reason = "tests")]

use std::panic;
use std::sync::{Arc, Mutex};

use logrelay::{Hub, LogEntry, args, panic_trap};
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;

#[test]
#[serial]
fn panics_are_logged_and_the_previous_hook_still_runs() {
    let previous_calls = Arc::new(Mutex::new(0));
    let calls = previous_calls.clone();
    panic::set_hook(Box::new(move |_| *calls.lock().unwrap() += 1));

    let hub = Hub::new();
    panic_trap::install(&hub);

    let line = line!() + 1;
    let result = panic::catch_unwind(|| -> u8 { panic!("invariant broken: {}", 42) });
    assert!(result.is_err());

    let errors = hub.get("error", None);
    assert_eq!(errors.len(), 1);

    let detail = errors[0].detail.clone().unwrap();
    assert_eq!(detail["file"], json!(file!()));
    assert_eq!(detail["line"], json!(line));
    assert_eq!(detail["source"], json!(panic_trap::SOURCE));
    assert!(errors[0].message.starts_with("invariant broken: 42 {"));
    assert_eq!(*previous_calls.lock().unwrap(), 1);

    let _ = panic::take_hook();
}

fn panicking_listener(_: &LogEntry) {
    panic!("listener bug");
}

#[test]
#[serial]
fn listener_panics_are_not_reported() {
    let hub = Hub::new();
    panic::set_hook(Box::new(|_| {}));
    panic_trap::install(&hub);

    hub.on("info", panicking_listener);
    hub.info(&args!["hello"]);

    assert!(hub.get("error", None).is_empty());
    assert_eq!(hub.get("info", None).len(), 1);

    let _ = panic::take_hook();
}

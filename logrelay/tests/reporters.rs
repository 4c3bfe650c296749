#![expect(missing_docs, reason = "tests")]

use std::time::Duration;

use logrelay::reporter::{
    BatchConfig, BatchReporter, FlushOutcome, IntervalConfig, IntervalReporter, OnUnloadConfig,
    OnUnloadReporter,
};
use logrelay::test_helpers::{ManualScheduler, RecordingTransport, TransportHandle};
use logrelay::{Delivery, Hub, args};
use pretty_assertions::assert_eq;

fn hub() -> (Hub, TransportHandle, ManualScheduler) {
    let (transport, handle) = RecordingTransport::new();
    let scheduler = ManualScheduler::new();
    let hub = Hub::builder()
        .transport(transport)
        .scheduler(scheduler.clone())
        .submit_url("https://logs.example.com/ingest")
        .build();
    (hub, handle, scheduler)
}

#[test]
fn batch_submits_once_when_full() {
    let (hub, transport, _) = hub();
    let reporter = BatchReporter::init(
        &hub,
        BatchConfig {
            size: Some(3),
            ..BatchConfig::default()
        },
    );

    hub.info(&args!["one"]);
    hub.warn(&args!["two"]);
    assert!(transport.is_empty());

    hub.error(&args!["three"]);

    let submissions = transport.take();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].delivery, Delivery::Background);
    assert_eq!(submissions[0].messages(), ["one", "two", "three"]);
    assert!(reporter.is_empty());
}

#[test]
fn batch_size_falls_back_to_hub_config() {
    let (transport, _handle) = RecordingTransport::new();
    let hub = Hub::builder().transport(transport).batch_size(25).build();

    let configured = BatchReporter::init(&hub, BatchConfig::default());
    let zero = BatchReporter::init(
        &hub,
        BatchConfig {
            size: Some(0),
            ..BatchConfig::default()
        },
    );

    assert_eq!(configured.size(), 25);
    assert_eq!(zero.size(), 25);
}

#[test]
fn batch_flushes_a_full_backlog_immediately() {
    let (hub, transport, _) = hub();
    for index in 0..4 {
        hub.log(&args!["backlog", index]);
    }

    let reporter = BatchReporter::init(
        &hub,
        BatchConfig {
            size: Some(4),
            ..BatchConfig::default()
        },
    );

    assert_eq!(transport.len(), 1);
    assert!(reporter.is_empty());
}

#[test]
fn batch_keeps_entries_when_submission_fails() {
    let (hub, transport, _) = hub();
    transport.set_failing(true);
    let reporter = BatchReporter::init(
        &hub,
        BatchConfig {
            size: Some(2),
            ..BatchConfig::default()
        },
    );

    hub.info(&args!["a"]);
    hub.info(&args!["b"]);
    assert_eq!(reporter.len(), 2);

    transport.set_failing(false);
    hub.info(&args!["c"]);
    assert_eq!(transport.len(), 1);
    hub.info(&args!["d"]);

    let submissions = transport.take();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[1].messages(), ["a", "b", "c", "d"]);
    assert!(reporter.is_empty());
}

#[test]
fn batch_only_resubmits_after_another_full_batch() {
    let (hub, transport, _) = hub();
    transport.set_failing(true);
    let reporter = BatchReporter::init(
        &hub,
        BatchConfig {
            size: Some(2),
            ..BatchConfig::default()
        },
    );

    for index in 0..50 {
        hub.info(&args!["entry", index]);
    }

    let attempts: Vec<usize> = transport
        .take()
        .iter()
        .map(|submission| submission.entries().len())
        .collect();
    assert_eq!(attempts, (1..=25).map(|batch| batch * 2).collect::<Vec<_>>());
    assert_eq!(reporter.len(), 50);

    transport.set_failing(false);
    assert_eq!(reporter.flush_on_teardown(), FlushOutcome::Submitted(50));
    hub.info(&args!["fresh"]);
    hub.info(&args!["batch"]);
    assert_eq!(transport.take()[1].messages(), ["fresh", "batch"]);
}

#[test]
fn teardown_submits_synchronously_once() {
    let (hub, transport, _) = hub();
    let reporter = BatchReporter::init(&hub, BatchConfig::default());
    hub.error(&args!["pending"]);

    hub.teardown();
    hub.teardown();

    let submissions = transport.take();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].delivery, Delivery::Blocking);
    assert_eq!(submissions[0].messages(), ["pending"]);
    assert_eq!(reporter.flush_on_teardown(), FlushOutcome::Empty);
}

#[test]
fn teardown_flush_can_be_disabled() {
    let (hub, transport, _) = hub();
    BatchReporter::init(
        &hub,
        BatchConfig {
            flush_on_unload: false,
            ..BatchConfig::default()
        },
    );
    IntervalReporter::init(
        &hub,
        IntervalConfig {
            flush_on_unload: false,
            ..IntervalConfig::default()
        },
    );
    hub.error(&args!["pending"]);

    hub.teardown();

    assert!(transport.is_empty());
}

#[test]
fn interval_submits_on_each_tick_with_entries() {
    let (hub, transport, scheduler) = hub();
    let reporter = IntervalReporter::init(
        &hub,
        IntervalConfig {
            interval: 2_500,
            ..IntervalConfig::default()
        },
    );
    assert_eq!(scheduler.periods(), [Duration::from_millis(2_500)]);

    scheduler.fire();
    assert!(transport.is_empty());

    hub.warn(&args!["first"]);
    scheduler.fire();
    hub.warn(&args!["second"]);
    scheduler.fire();

    let submissions = transport.take();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].messages(), ["first"]);
    assert_eq!(submissions[1].messages(), ["second"]);
    assert!(submissions.iter().all(|submission| submission.delivery == Delivery::Background));
    assert!(reporter.is_empty());
}

#[test]
fn interval_zero_uses_the_default_period() {
    let (hub, _, scheduler) = hub();
    IntervalReporter::init(
        &hub,
        IntervalConfig {
            interval: 0,
            ..IntervalConfig::default()
        },
    );

    assert_eq!(scheduler.periods(), [Duration::from_secs(10)]);
}

#[test]
fn interval_teardown_cancels_the_timer() {
    let (hub, transport, scheduler) = hub();
    let reporter = IntervalReporter::init(&hub, IntervalConfig::default());
    hub.info(&args!["pending"]);

    hub.teardown();
    assert_eq!(scheduler.active(), 0);
    assert_eq!(transport.take()[0].delivery, Delivery::Blocking);

    hub.info(&args!["late"]);
    assert_eq!(scheduler.fire(), 0);
    assert_eq!(reporter.len(), 1);
    // A second teardown only submits what was queued since.
    assert_eq!(reporter.flush_on_teardown(), FlushOutcome::Submitted(1));
}

#[test]
fn reporters_pick_up_the_backlog_of_their_levels() {
    let (hub, transport, _) = hub();
    hub.error(&args!["early error"]);
    hub.debug(&args!["early debug"]);

    let reporter = OnUnloadReporter::init(
        &hub,
        OnUnloadConfig {
            level: Some("error".into()),
            ..OnUnloadConfig::default()
        },
    );
    hub.error(&args!["late error"]);
    hub.debug(&args!["late debug"]);
    assert_eq!(reporter.len(), 2);

    hub.teardown();

    assert_eq!(transport.take()[0].messages(), ["early error", "late error"]);
}

#[test]
fn interval_submits_its_backlog_on_the_first_tick() {
    let (hub, transport, scheduler) = hub();
    hub.warn(&args!["early"]);
    hub.debug(&args!["not subscribed"]);

    let reporter = IntervalReporter::init(
        &hub,
        IntervalConfig {
            level: Some("warn error".into()),
            ..IntervalConfig::default()
        },
    );
    assert_eq!(reporter.len(), 1);

    hub.error(&args!["late"]);
    scheduler.fire();

    let submissions = transport.take();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].messages(), ["early", "late"]);
    assert!(reporter.is_empty());
}

#[test]
fn reporters_use_the_hub_default_level() {
    let (transport, handle) = RecordingTransport::new();
    let hub = Hub::builder()
        .transport(transport)
        .submit_url("/log")
        .default_level("warn")
        .build();
    let reporter = OnUnloadReporter::init(&hub, OnUnloadConfig::default());

    hub.info(&args!["skipped"]);
    hub.warn(&args!["kept"]);
    hub.teardown();

    assert!(reporter.is_empty());
    assert_eq!(handle.take()[0].messages(), ["kept"]);
}

#[test]
fn reporter_url_only_affects_that_reporter() {
    let (hub, transport, _) = hub();
    OnUnloadReporter::init(
        &hub,
        OnUnloadConfig {
            level: Some("error".into()),
            url: Some("https://audit.example.com".into()),
        },
    );
    OnUnloadReporter::init(
        &hub,
        OnUnloadConfig {
            level: Some("warn".into()),
            url: None,
        },
    );
    hub.error(&args!["a"]);
    hub.warn(&args!["b"]);

    hub.teardown();

    let endpoints: Vec<_> = transport
        .take()
        .into_iter()
        .map(|submission| submission.endpoint)
        .collect();
    assert_eq!(
        endpoints,
        ["https://audit.example.com", "https://logs.example.com/ingest"]
    );
    assert_eq!(
        hub.config().submit_url.as_deref(),
        Some("https://logs.example.com/ingest")
    );
}

#[test]
fn configs_accept_camel_case_keys() {
    let json = r#"{ "level": "error warn", "interval": 500, "flushOnUnload": false }"#;
    let config: IntervalConfig = serde_json::from_str(json).unwrap();

    assert_eq!(
        config,
        IntervalConfig {
            level: Some("error warn".into()),
            url: None,
            interval: 500,
            flush_on_unload: false,
        }
    );
    assert_eq!(
        serde_json::from_str::<BatchConfig>("{}").unwrap(),
        BatchConfig::default()
    );
}

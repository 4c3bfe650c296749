#![expect(missing_docs, reason = "example")]

use logrelay::reporter::{
    BatchConfig, BatchReporter, ConsoleConfig, ConsoleReporter, IntervalConfig, IntervalReporter,
};
use logrelay::submit::{Delivery, Transport, TransportError};
use logrelay::{Hub, args};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Prints request bodies instead of sending them.
#[derive(Debug)]
struct PrintTransport;

impl Transport for PrintTransport {
    fn send(&self, endpoint: &str, body: String, delivery: Delivery) -> Result<(), TransportError> {
        println!("{delivery:?} POST {endpoint}: {body}");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::DEBUG.into())
                    .with_env_var("LOGRELAY_LOG")
                    .from_env()?,
            )
            .with_writer(std::io::stderr)
            .compact()
            .finish(),
    )?;

    let hub = Hub::builder()
        .transport(PrintTransport)
        .submit_url("https://logs.example.com/ingest")
        .set_global()?;
    let _teardown = hub.teardown_guard();
    logrelay::panic_trap::install(hub);

    logrelay::info!("starting up, %i workers", 4);

    ConsoleReporter::init(hub, ConsoleConfig::default());
    BatchReporter::init(
        hub,
        BatchConfig {
            level: Some("error".into()),
            size: Some(2),
            ..BatchConfig::default()
        },
    );
    IntervalReporter::init(
        hub,
        IntervalConfig {
            level: Some("warn info".into()),
            interval: 200,
            ..IntervalConfig::default()
        },
    );

    let audit = hub.add_level("audit")?;
    hub.on(audit.as_str(), |entry: &logrelay::LogEntry| {
        println!("audit trail: {}", entry.message)
    });
    hub.level(audit.as_str())
        .ok_or("audit level was just added")?
        .call(&args!["user %s logged in", "ada"]);

    logrelay::warn!("cache miss rate %n percent", 12.5);
    logrelay::error!("request %s failed", "r-17", serde_json::json!({ "status": 503 }));
    logrelay::error!("request %s failed", "r-18");

    std::thread::sleep(std::time::Duration::from_millis(300));
    logrelay::info!("shutting down");

    Ok(())
}

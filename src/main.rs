// src/main.rs

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use drift_sentry::bridge;
use drift_sentry::browser::TabRegistry;
use drift_sentry::config::CONFIG;
use drift_sentry::dispatch::EventDispatcher;
use drift_sentry::tracker::{spawn_tracker, SessionManager};

/// Session-tracking host: reads browser tracker events on stdin and
/// forwards finalized page sessions to the local collector.
#[derive(Parser)]
#[command(name = "drift-sentry", version)]
struct Cli {
    /// Collector endpoint receiving PAGE_SESSION events
    #[arg(long, env = "DRIFT_COLLECTOR_URL")]
    collector_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(CONFIG.max_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let collector_url = cli
        .collector_url
        .unwrap_or_else(|| CONFIG.collector_url.clone());

    info!("Starting drift-sentry session tracker");
    info!("Collector endpoint: {}", collector_url);
    info!("Flush period: {}ms", CONFIG.flush_interval_ms);

    let registry = Arc::new(TabRegistry::new());
    let dispatcher = Arc::new(EventDispatcher::new(&collector_url, CONFIG.http_timeout())?);
    let manager = SessionManager::new(registry.clone(), dispatcher);
    let (events, tracker) = spawn_tracker(manager);

    // stdout belongs to the messaging host protocol; all logging goes to
    // stderr above. The bridge owns the only event sender, so EOF on stdin
    // drains the tracker and ends the process.
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    bridge::run_bridge(stdin, registry, events).await?;
    tracker.await?;

    info!("drift-sentry shut down");
    Ok(())
}

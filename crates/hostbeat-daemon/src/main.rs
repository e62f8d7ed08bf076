//! Hostbeat Daemon - main entry point
//!
//! Probes the configured hosts on a recurring schedule and emits a log line
//! for every presence report.

mod config;

use anyhow::Result;
use clap::Parser;
use hostbeat_core::{PresenceReport, PresenceSink};
use hostbeat_tracker::{ScanScheduler, SystemRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "hostbeat")]
#[command(about = "Ping/ARP presence tracking daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "hostbeat.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run a single probe pass and exit
    #[arg(long)]
    scan_once: bool,

    /// Write a starter configuration file and exit
    #[arg(long)]
    init_config: bool,
}

/// Sink that logs each report; stands in for the consuming presence service
struct LogSink;

impl PresenceSink for LogSink {
    fn report(&self, report: PresenceReport) {
        info!(
            device = %report.device_id,
            source = ?report.source,
            seen_at = %report.seen_at,
            "Device present"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Hostbeat v{}", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        config::save_default_config(&args.config)?;
        println!("Wrote starter configuration to {}", args.config.display());
        return Ok(());
    }

    let config = config::load_config(&args.config)?;
    config.validate()?;

    let scheduler = ScanScheduler::new(
        config.to_scan_config(),
        Arc::new(SystemRunner),
        Arc::new(LogSink),
    );

    if args.scan_once {
        // Single pass mode
        info!("Running single probe pass");
        let seen = scheduler.tick().await;
        println!("{} of {} hosts present", seen, scheduler.host_count());
    } else {
        scheduler.run().await?;
    }

    Ok(())
}

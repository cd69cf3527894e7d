//! Daily ARGO archive extractor.
//!
//! Keeps a local mirror of recent month listings current with:
//! - A durable per-filename ledger (new / updated / previously-failed logic)
//! - Automatic retry with exponential backoff and size verification
//! - SHA-256 digests of completed files
//! - `.failed` sidecars for exhausted downloads
//! - HTTP status API with Prometheus metrics

mod config;
mod download;
mod extractor;
mod ledger;
mod retry;
mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use archive_listing::ListingClient;
use config::ExtractorConfig;
use download::Downloader;
use extractor::{Extractor, RunCounts};
use ledger::Ledger;
use server::ServerState;

#[derive(Parser, Debug)]
#[command(name = "daily-extractor")]
#[command(about = "Incremental ARGO archive mirror with a durable download ledger")]
struct Args {
    /// Base folder for daily downloads and the ledger
    #[arg(long, default_value = "daily_dataset")]
    base_dir: PathBuf,

    /// Optional YAML config file (archive URL, retries, concurrency)
    #[arg(long, env = "EXTRACTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds between checks in continuous mode
    #[arg(long, default_value = "3600")]
    interval: u64,

    /// Run once and exit (vs continuous polling)
    #[arg(long)]
    once: bool,

    /// Print the status report and exit
    #[arg(long)]
    status: bool,

    /// Port for the status HTTP server
    #[arg(long, env = "STATUS_PORT", default_value = "8081")]
    status_port: u16,

    /// Disable the status HTTP server
    #[arg(long)]
    no_status_server: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
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
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting daily ARGO extractor");

    let config = ExtractorConfig::load_or_default(args.config.as_deref());

    tokio::fs::create_dir_all(&args.base_dir)
        .await
        .with_context(|| format!("Cannot create base folder {}", args.base_dir.display()))?;

    // Open the ledger; a held lock or corrupt file is fatal configuration.
    let ledger_path = args.base_dir.join("file_tracking.json");
    let ledger = Arc::new(Mutex::new(Ledger::open(&ledger_path)?));

    if args.status {
        let report = ledger.lock().await.report();
        info!(
            total_files = report.total_files,
            successful = report.successful,
            failed = report.failed,
            "Extraction status report"
        );
        for (date, stats) in &report.by_date {
            info!(
                date = %date,
                successful = stats.successful,
                failed = stats.failed,
                "Files by date"
            );
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let listing = ListingClient::new(
        &config.base_url,
        &config.file_suffix,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let downloader = Downloader::new(
        Duration::from_secs(config.request_timeout_secs),
        config.max_retries,
        Duration::from_secs(config.max_backoff_secs),
    )?;

    let extractor = Extractor::new(
        listing,
        downloader,
        ledger.clone(),
        args.base_dir.clone(),
        config.concurrency,
    );

    if args.once {
        info!("Running single extraction cycle");
        let counts = extractor.run_once().await?;
        let stats = ledger.lock().await.stats();
        info!(
            downloaded = counts.downloaded,
            failed = counts.failed,
            tracked = stats.tracked,
            "Extraction session complete"
        );
        return Ok(());
    }

    // Continuous polling mode
    info!(interval_secs = args.interval, "Starting continuous monitoring");

    let last_run = Arc::new(RwLock::new(RunCounts::default()));

    if !args.no_status_server {
        // Prometheus recorder feeds the /metrics endpoint.
        let prometheus = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;

        let server_state = Arc::new(ServerState {
            ledger: ledger.clone(),
            last_run: last_run.clone(),
            prometheus,
        });
        let status_port = args.status_port;
        tokio::spawn(async move {
            if let Err(e) = server::run_server(server_state, status_port).await {
                error!(error = %e, "Status server failed");
            }
        });
    }

    // Shutdown signal
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send(()).ok();
    });

    loop {
        let wait = match extractor.run_once().await {
            Ok(counts) => {
                *last_run.write().await = counts;
                if counts.downloaded > 0 {
                    info!(downloaded = counts.downloaded, "Downloaded new files");
                } else {
                    info!("No new data available");
                }
                Duration::from_secs(args.interval)
            }
            Err(e) => {
                // Errors here are unexpected; per-file failures are already
                // absorbed inside the run. Back off briefly and keep going.
                error!(error = %e, "Extraction cycle failed");
                Duration::from_secs(300)
            }
        };

        info!(wait_secs = wait.as_secs(), "Waiting until next check");
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Monitoring stopped");
                break;
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }

    let stats = ledger.lock().await.stats();
    info!(
        tracked = stats.tracked,
        successful = stats.successful,
        failed = stats.failed,
        "Extractor shut down"
    );

    Ok(())
}

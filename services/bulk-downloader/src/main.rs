//! Bulk ARGO archive downloader.
//!
//! One-shot mirror of month directories into `Dataset/{year}/{month:02}/`.
//! No durable state: a file already present by name and folder is trusted
//! as complete, and each missing file gets exactly one download attempt.
//! This tool is intentionally disjoint from the daily extractor's ledger;
//! neither reads the other's state.

mod fetch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use archive_listing::ListingClient;
use fetch::{download_month, MonthSummary};

#[derive(Parser, Debug)]
#[command(name = "bulk-downloader")]
#[command(about = "One-shot bulk mirror of ARGO month directories")]
struct Args {
    /// Year to download
    #[arg(long)]
    year: i32,

    /// Month to download (1-12); omit for the whole year
    #[arg(long)]
    month: Option<u32>,

    /// Base folder for the Dataset tree
    #[arg(long, default_value = "Dataset")]
    base_dir: PathBuf,

    /// Archive root URL
    #[arg(long, default_value = "https://data-argo.ifremer.fr/geo/indian_ocean/")]
    base_url: String,

    /// Filename suffix of files to mirror
    #[arg(long, default_value = "_prof.nc")]
    suffix: String,

    /// Concurrent downloads
    #[arg(long, default_value = "3")]
    concurrency: usize,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

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

    if let Some(month) = args.month {
        if !(1..=12).contains(&month) {
            anyhow::bail!("Month must be 1-12, got {}", month);
        }
    }

    tokio::fs::create_dir_all(&args.base_dir)
        .await
        .with_context(|| format!("Cannot create base folder {}", args.base_dir.display()))?;

    let listing = ListingClient::new(
        &args.base_url,
        &args.suffix,
        Duration::from_secs(args.timeout),
    )?;

    let months: Vec<u32> = match args.month {
        Some(m) => vec![m],
        None => (1..=12).collect(),
    };

    info!(year = args.year, months = months.len(), "Starting bulk download");

    let start = std::time::Instant::now();
    let mut total = MonthSummary::default();

    for month in months {
        match download_month(
            &listing,
            args.year,
            month,
            &args.base_dir,
            args.concurrency,
            Duration::from_secs(args.timeout),
        )
        .await
        {
            Ok(summary) => {
                info!(
                    year = args.year,
                    month = month,
                    downloaded = summary.downloaded,
                    skipped_existing = summary.skipped_existing,
                    failed = summary.failed,
                    bytes = summary.bytes,
                    "Month complete"
                );
                total.merge(&summary);
            }
            Err(e) => {
                error!(year = args.year, month = month, error = %e, "Month download failed");
            }
        }

        // Brief pause between months, like between any two archive sweeps.
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    info!(
        year = args.year,
        downloaded = total.downloaded,
        skipped_existing = total.skipped_existing,
        failed = total.failed,
        total_mb = total.bytes / (1024 * 1024),
        elapsed_secs = start.elapsed().as_secs(),
        "Bulk download complete"
    );

    Ok(())
}

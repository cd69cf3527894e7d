//! ARGO profile summarizer.
//!
//! Walks the downloaded `Dataset/` tree, samples one value per variable
//! from each NetCDF file, asks the chat model for a two-line description
//! per variable, and writes one JSON summary record plus one flat vector
//! index per file. Records and indices are rebuilt whole, together.

mod convert;
mod indexer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use walkdir::WalkDir;

use llm_client::{ChatClient, ChatConfig, EmbeddingClient, EmbeddingConfig};
use profile_summary::{index_path_for, json_path_for, SummaryRecord};

#[derive(Parser, Debug)]
#[command(name = "profile-summarizer")]
#[command(about = "Convert downloaded profiles to JSON summaries with vector indices")]
struct Args {
    /// Root of downloaded NetCDF files
    #[arg(long, default_value = "Dataset")]
    data_root: PathBuf,

    /// Root of the JSON summary tree
    #[arg(long, default_value = "Datasetjson")]
    json_root: PathBuf,

    /// Root of the vector index tree
    #[arg(long, default_value = "VectorIndex")]
    index_root: PathBuf,

    /// Restrict to one year subtree
    #[arg(long)]
    year: Option<i32>,

    /// Restrict to one month subtree (requires --year)
    #[arg(long)]
    month: Option<u32>,

    /// Rebuild even when the summary is newer than the source
    #[arg(long)]
    force: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Default)]
struct RunCounts {
    processed: u64,
    skipped_up_to_date: u64,
    conversion_errors: u64,
    index_errors: u64,
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

    info!("Starting profile summarizer");

    // Missing API credentials are unrecoverable configuration.
    let chat = ChatClient::new(ChatConfig::from_env()?)?;
    let embeddings = EmbeddingClient::new(EmbeddingConfig::from_env()?)?;

    let search_root = scoped_root(&args.data_root, args.year, args.month);
    if !search_root.exists() {
        anyhow::bail!("No files found under {}", search_root.display());
    }

    let mut nc_files: Vec<PathBuf> = WalkDir::new(&search_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "nc"))
        .map(|e| e.into_path())
        .collect();
    nc_files.sort();

    info!(count = nc_files.len(), root = %search_root.display(), "Found NetCDF files");

    let mut counts = RunCounts::default();

    for nc_path in &nc_files {
        let json_path = match json_path_for(&args.data_root, &args.json_root, nc_path) {
            Some(path) => path,
            None => {
                warn!(path = %nc_path.display(), "File outside the data root, skipping");
                counts.conversion_errors += 1;
                continue;
            }
        };
        let index_path = match index_path_for(&args.json_root, &args.index_root, &json_path) {
            Some(path) => path,
            None => {
                warn!(path = %json_path.display(), "Summary outside the JSON root, skipping");
                counts.conversion_errors += 1;
                continue;
            }
        };

        if !args.force && up_to_date(nc_path, &json_path) {
            counts.skipped_up_to_date += 1;
            continue;
        }

        match process_file(&chat, &embeddings, nc_path, &json_path, &index_path).await {
            Ok(indexed) => {
                counts.processed += 1;
                if !indexed {
                    counts.index_errors += 1;
                }
            }
            Err(e) => {
                warn!(path = %nc_path.display(), error = %e, "Conversion failed");
                counts.conversion_errors += 1;
            }
        }
    }

    info!(
        processed = counts.processed,
        skipped_up_to_date = counts.skipped_up_to_date,
        conversion_errors = counts.conversion_errors,
        index_errors = counts.index_errors,
        "Summarizer run complete"
    );

    Ok(())
}

/// Subtree to walk for the year/month restriction.
fn scoped_root(data_root: &Path, year: Option<i32>, month: Option<u32>) -> PathBuf {
    match (year, month) {
        (Some(y), Some(m)) => data_root.join(y.to_string()).join(format!("{:02}", m)),
        (Some(y), None) => data_root.join(y.to_string()),
        _ => data_root.to_path_buf(),
    }
}

/// Skip rule: the summary exists and is newer than its source file.
fn up_to_date(nc_path: &Path, json_path: &Path) -> bool {
    let nc_mtime = match std::fs::metadata(nc_path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return false,
    };
    match std::fs::metadata(json_path).and_then(|m| m.modified()) {
        Ok(json_mtime) => json_mtime > nc_mtime,
        Err(_) => false,
    }
}

/// Convert one file: sample, summarize, write the record, build the index.
/// Returns whether the index was written; an embedding failure leaves the
/// record without an index rather than aborting the run.
async fn process_file(
    chat: &ChatClient,
    embeddings: &EmbeddingClient,
    nc_path: &Path,
    json_path: &Path,
    index_path: &Path,
) -> Result<bool> {
    info!(path = %nc_path.display(), "Processing profile");

    let samples = convert::sample_variables(nc_path)?;

    let filename = nc_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown.nc");
    let mut record = SummaryRecord::new(filename);
    record.samples = samples;
    record.summaries = convert::summarize_samples(chat, &record.samples).await;

    // The record and its index must change together. Drop the stale index
    // first so a crash or embed failure can never leave a mismatched pair.
    if index_path.exists() {
        std::fs::remove_file(index_path)
            .with_context(|| format!("Cannot remove stale index {}", index_path.display()))?;
    }

    record.store(json_path)?;
    info!(path = %json_path.display(), variables = record.summaries.len(), "Summary saved");

    match indexer::build_index(embeddings, &record, index_path).await {
        Ok(()) => Ok(true),
        Err(e) => {
            warn!(path = %index_path.display(), error = %e, "Index build failed; record left unindexed");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_root() {
        let root = Path::new("Dataset");
        assert_eq!(scoped_root(root, None, None), Path::new("Dataset"));
        assert_eq!(scoped_root(root, Some(2025), None), Path::new("Dataset/2025"));
        assert_eq!(
            scoped_root(root, Some(2025), Some(9)),
            Path::new("Dataset/2025/09")
        );
    }

    #[test]
    fn test_up_to_date_missing_summary() {
        let dir = tempfile::tempdir().unwrap();
        let nc = dir.path().join("20250911_prof.nc");
        std::fs::write(&nc, b"x").unwrap();

        assert!(!up_to_date(&nc, &dir.path().join("missing.json")));
    }

    #[test]
    fn test_up_to_date_newer_summary() {
        let dir = tempfile::tempdir().unwrap();
        let nc = dir.path().join("20250911_prof.nc");
        let json = dir.path().join("20250911_prof.json");
        std::fs::write(&nc, b"x").unwrap();
        std::fs::write(&json, b"{}").unwrap();

        let older = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        let file = std::fs::File::open(&nc).unwrap();
        file.set_modified(older).unwrap();

        assert!(up_to_date(&nc, &json));
    }
}

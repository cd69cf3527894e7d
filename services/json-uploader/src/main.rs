//! JSON tree uploader.
//!
//! Recursively pushes every `*.json` under the source root to object
//! storage, preserving relative paths under a key prefix. Blobs are pushed
//! wholesale; there is no partial-update or delta path.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use futures::stream::{self, StreamExt};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use walkdir::WalkDir;

use argo_store::{ObjectStorage, ObjectStorageConfig, StoragePath};

#[derive(Parser, Debug)]
#[command(name = "json-uploader")]
#[command(about = "Recursive upload of the JSON summary tree to object storage")]
struct Args {
    /// Local root of the JSON tree
    #[arg(long, default_value = "Datasetjson")]
    source_dir: PathBuf,

    /// Object key prefix
    #[arg(long, default_value = "Datasetjson/")]
    prefix: String,

    /// Concurrent uploads
    #[arg(long, default_value = "4")]
    concurrency: usize,

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

    if !args.source_dir.exists() {
        anyhow::bail!("Source directory not found: {}", args.source_dir.display());
    }

    // Missing bucket/credentials configuration aborts before any work.
    let config = ObjectStorageConfig::from_env()?;
    let storage = Arc::new(ObjectStorage::new(&config)?);

    let files = collect_json_files(&args.source_dir);
    let total_bytes: u64 = files
        .iter()
        .filter_map(|f| std::fs::metadata(f).ok())
        .map(|m| m.len())
        .sum();

    info!(
        files = files.len(),
        total_mb = total_bytes / (1024 * 1024),
        bucket = %storage.bucket(),
        prefix = %args.prefix,
        "Starting upload"
    );

    let start = std::time::Instant::now();
    let done = Arc::new(AtomicU64::new(0));
    let total = files.len() as u64;

    let results: Vec<Option<u64>> = stream::iter(files)
        .map(|path| {
            let storage = storage.clone();
            let done = done.clone();
            let source_dir = args.source_dir.clone();
            let prefix = args.prefix.clone();
            async move {
                let result = upload_one(&storage, &source_dir, &prefix, &path).await;
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if finished % 10 == 0 || finished == total {
                    info!(done = finished, total = total, "Upload progress");
                }
                match result {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Upload failed");
                        None
                    }
                }
            }
        })
        .buffer_unordered(args.concurrency.max(1))
        .collect()
        .await;

    let uploaded = results.iter().filter(|r| r.is_some()).count();
    let failed = results.len() - uploaded;
    let bytes: u64 = results.iter().flatten().sum();

    info!(
        uploaded = uploaded,
        failed = failed,
        total_mb = bytes / (1024 * 1024),
        elapsed_secs = start.elapsed().as_secs(),
        "Upload complete"
    );

    if failed > 0 {
        anyhow::bail!("{} of {} uploads failed", failed, results.len());
    }

    Ok(())
}

/// Every `*.json` under the root, sorted for stable progress output.
fn collect_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Object key for one file: prefix + path relative to the source root.
fn object_key(source_dir: &Path, prefix: &str, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(source_dir).ok()?;
    Some(StoragePath::json_object(
        prefix,
        &relative.to_string_lossy(),
    ))
}

async fn upload_one(
    storage: &ObjectStorage,
    source_dir: &Path,
    prefix: &str,
    path: &Path,
) -> Result<u64> {
    let key = object_key(source_dir, prefix, path)
        .with_context(|| format!("Path outside source root: {}", path.display()))?;

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let len = data.len() as u64;

    storage.put(&key, Bytes::from(data)).await?;
    Ok(len)
}

//! Concurrent month download without durable state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use archive_listing::{ListingClient, RemoteEntry};

/// Counts for one month sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthSummary {
    pub downloaded: u64,
    pub skipped_existing: u64,
    pub failed: u64,
    pub bytes: u64,
}

impl MonthSummary {
    pub fn merge(&mut self, other: &MonthSummary) {
        self.downloaded += other.downloaded;
        self.skipped_existing += other.skipped_existing;
        self.failed += other.failed;
        self.bytes += other.bytes;
    }
}

/// Target path for a listing entry: `{base}/{year}/{month:02}/{filename}`.
pub fn target_path(base_dir: &Path, year: i32, month: u32, filename: &str) -> PathBuf {
    base_dir
        .join(year.to_string())
        .join(format!("{:02}", month))
        .join(filename)
}

/// List one month directory and download every file not already present.
pub async fn download_month(
    listing: &ListingClient,
    year: i32,
    month: u32,
    base_dir: &Path,
    concurrency: usize,
    timeout: Duration,
) -> Result<MonthSummary> {
    let scan = listing.scan(year, month).await?;

    if !scan.skipped.is_empty() {
        warn!(
            year = year,
            month = month,
            skipped = scan.skipped.len(),
            "Listing entries skipped as malformed"
        );
    }

    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")?;

    let mut summary = MonthSummary::default();
    let mut to_fetch = Vec::new();

    for entry in scan.entries {
        let dest = target_path(base_dir, year, month, &entry.filename);
        if dest.exists() {
            let size = std::fs::metadata(&dest).map(|m| m.len()).unwrap_or(0);
            debug!(filename = %entry.filename, bytes = size, "Already exists, skipping");
            summary.skipped_existing += 1;
            continue;
        }
        to_fetch.push((entry, dest));
    }

    if to_fetch.is_empty() {
        info!(year = year, month = month, "All files already present");
        return Ok(summary);
    }

    let results: Vec<Option<u64>> = stream::iter(to_fetch)
        .map(|(entry, dest)| {
            let client = client.clone();
            async move { download_single(&client, &entry, &dest).await }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for result in results {
        match result {
            Some(bytes) => {
                summary.downloaded += 1;
                summary.bytes += bytes;
            }
            None => summary.failed += 1,
        }
    }

    Ok(summary)
}

/// One attempt, no retry. Partial files are removed so the next run retries
/// them via the not-present check.
async fn download_single(client: &Client, entry: &RemoteEntry, dest: &Path) -> Option<u64> {
    match stream_to_file(client, &entry.url, dest).await {
        Ok(bytes) => {
            info!(filename = %entry.filename, bytes = bytes, "Downloaded");
            Some(bytes)
        }
        Err(e) => {
            warn!(filename = %entry.filename, error = %e, "Download failed");
            if fs::try_exists(dest).await.unwrap_or(false) {
                let _ = fs::remove_file(dest).await;
            }
            None
        }
    }
}

async fn stream_to_file(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let response = client.get(url).send().await.context("HTTP request failed")?;
    if !response.status().is_success() {
        return Err(anyhow!("HTTP error: {}", response.status()));
    }

    let mut file = fs::File::create(dest)
        .await
        .context("Failed to create output file")?;

    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Error reading response chunk")?;
        file.write_all(&chunk)
            .await
            .context("Error writing to file")?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_path_layout() {
        let path = target_path(Path::new("Dataset"), 2025, 9, "20250911_prof.nc");
        assert_eq!(path, Path::new("Dataset/2025/09/20250911_prof.nc"));
    }

    #[test]
    fn test_month_summary_merge() {
        let mut total = MonthSummary::default();
        total.merge(&MonthSummary {
            downloaded: 2,
            skipped_existing: 1,
            failed: 1,
            bytes: 4096,
        });
        total.merge(&MonthSummary {
            downloaded: 3,
            skipped_existing: 0,
            failed: 0,
            bytes: 1024,
        });
        assert_eq!(total.downloaded, 5);
        assert_eq!(total.skipped_existing, 1);
        assert_eq!(total.failed, 1);
        assert_eq!(total.bytes, 5120);
    }
}

//! Extraction cycle: scan recent month listings, decide against the
//! ledger, download what is new, and record every outcome.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use metrics::counter;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use archive_listing::{ListingClient, RemoteEntry};
use argo_common::time::{date_folder_name, months_to_check};

use crate::download::{hash_file, Downloader};
use crate::ledger::{Decision, Ledger};
use crate::retry::RetryState;

/// Counts from one extraction run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunCounts {
    pub downloaded: u64,
    pub failed: u64,
    pub skipped_existing: u64,
    pub skipped_malformed: u64,
}

/// One extraction pass over the recent-month window.
pub struct Extractor {
    listing: ListingClient,
    downloader: Downloader,
    ledger: Arc<Mutex<Ledger>>,
    base_dir: PathBuf,
    concurrency: usize,
}

impl Extractor {
    pub fn new(
        listing: ListingClient,
        downloader: Downloader,
        ledger: Arc<Mutex<Ledger>>,
        base_dir: PathBuf,
        concurrency: usize,
    ) -> Self {
        Self {
            listing,
            downloader,
            ledger,
            base_dir,
            concurrency: concurrency.max(1),
        }
    }

    /// Scan the month window and download everything the ledger calls new.
    pub async fn run_once(&self) -> Result<RunCounts> {
        let today = Utc::now().date_naive();
        let mut counts = RunCounts::default();

        for (year, month) in months_to_check(today) {
            info!(year = year, month = month, "Checking month for new files");

            // A failed listing yields an empty work list for the month; the
            // run carries on.
            let scan = match self.listing.scan(year, month).await {
                Ok(scan) => scan,
                Err(e) => {
                    error!(year = year, month = month, error = %e, "Listing scan failed");
                    counter!("argo_listing_failures_total").increment(1);
                    continue;
                }
            };

            for skipped in &scan.skipped {
                warn!(href = %skipped.href, reason = ?skipped.reason, "Skipping malformed listing entry");
            }
            counts.skipped_malformed += scan.skipped.len() as u64;
            counter!("argo_listing_skips_total").increment(scan.skipped.len() as u64);

            let to_fetch: Vec<RemoteEntry> = {
                let ledger = self.ledger.lock().await;
                scan.entries
                    .iter()
                    .filter(|entry| matches!(ledger.decide(entry), Decision::Fetch(_)))
                    .cloned()
                    .collect()
            };
            counts.skipped_existing += (scan.entries.len() - to_fetch.len()) as u64;

            if to_fetch.is_empty() {
                info!(year = year, month = month, "No new data found");
                continue;
            }

            info!(
                year = year,
                month = month,
                count = to_fetch.len(),
                "Found new files to download"
            );

            let results: Vec<bool> = stream::iter(to_fetch)
                .map(|entry| self.fetch_one(entry))
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            for ok in results {
                if ok {
                    counts.downloaded += 1;
                } else {
                    counts.failed += 1;
                }
            }
        }

        info!(
            downloaded = counts.downloaded,
            failed = counts.failed,
            skipped_existing = counts.skipped_existing,
            skipped_malformed = counts.skipped_malformed,
            "Extraction run complete"
        );

        Ok(counts)
    }

    /// Download one file and record the outcome in the ledger. Never
    /// propagates an error; per-file failures must not abort the batch.
    async fn fetch_one(&self, entry: RemoteEntry) -> bool {
        let folder = self.base_dir.join(date_folder_name(entry.date));
        let dest = folder.join(&entry.filename);

        match self.downloader.fetch_with_retry(&entry, &dest).await {
            RetryState::Succeeded { attempts } => {
                let digest = match hash_file(&dest) {
                    Ok(digest) => digest,
                    Err(e) => {
                        warn!(filename = %entry.filename, error = %e, "Failed to hash downloaded file");
                        String::new()
                    }
                };

                let mut ledger = self.ledger.lock().await;
                if let Err(e) = ledger.record_success(&entry, &dest, digest, attempts) {
                    error!(filename = %entry.filename, error = %e, "Failed to persist ledger");
                }
                counter!("argo_files_downloaded_total").increment(1);
                true
            }
            RetryState::Failed { attempts, error } => {
                if let Err(e) = self.write_failed_sidecar(&entry).await {
                    warn!(filename = %entry.filename, error = %e, "Failed to write .failed sidecar");
                }

                let mut ledger = self.ledger.lock().await;
                if let Err(e) = ledger.record_failure(&entry, error, attempts) {
                    error!(filename = %entry.filename, error = %e, "Failed to persist ledger");
                }
                counter!("argo_download_failures_total").increment(1);
                false
            }
            other => {
                // fetch_with_retry only returns terminal states.
                error!(filename = %entry.filename, state = ?other, "Non-terminal download state");
                false
            }
        }
    }

    /// Keep the original listing entry next to the failure for offline
    /// inspection.
    async fn write_failed_sidecar(&self, entry: &RemoteEntry) -> Result<()> {
        let folder = self.base_dir.join("failed_downloads");
        tokio::fs::create_dir_all(&folder).await?;

        let path = folder.join(format!("{}.failed", entry.filename));
        let body = serde_json::to_string_pretty(entry)?;
        tokio::fs::write(&path, body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_sidecar_holds_listing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(Mutex::new(
            Ledger::open(&dir.path().join("file_tracking.json")).unwrap(),
        ));
        let listing =
            ListingClient::new("https://example.org/", "_prof.nc", Duration::from_secs(5))
                .unwrap();
        let downloader =
            Downloader::new(Duration::from_secs(5), 0, Duration::from_secs(1)).unwrap();
        let extractor = Extractor::new(listing, downloader, ledger, dir.path().to_path_buf(), 1);

        let entry = RemoteEntry {
            filename: "20250911_prof.nc".to_string(),
            url: "https://example.org/2025/09/20250911_prof.nc".to_string(),
            size: "2.0M".to_string(),
            last_modified: "11-Sep-2025 10:00".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 9, 11).unwrap(),
        };

        extractor.write_failed_sidecar(&entry).await.unwrap();

        let sidecar = dir
            .path()
            .join("failed_downloads")
            .join("20250911_prof.nc.failed");
        let text = std::fs::read_to_string(&sidecar).unwrap();
        let parsed: RemoteEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, entry);
    }
}

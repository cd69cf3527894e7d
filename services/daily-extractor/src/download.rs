//! Streaming file download with retry, size verification, and digesting.
//!
//! Each attempt streams the response body to the destination path and
//! verifies declared content-length against bytes written; a mismatch is a
//! transport error like any other and goes through the same retry path.
//! Partial files are removed before a retry or a terminal failure.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use reqwest::{header, Client};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use archive_listing::RemoteEntry;

use crate::retry::{advance, backoff, AttemptOutcome, RetryState};

/// Downloads one file at a time with bounded retries.
pub struct Downloader {
    client: Client,
    max_retries: u32,
    max_backoff: Duration,
}

impl Downloader {
    pub fn new(request_timeout: Duration, max_retries: u32, max_backoff: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_retries,
            max_backoff,
        })
    }

    /// Download with retry and exponential backoff. Always returns a
    /// terminal [`RetryState`]; the caller records it in the ledger.
    pub async fn fetch_with_retry(&self, entry: &RemoteEntry, dest: &Path) -> RetryState {
        let mut state = RetryState::Pending;

        loop {
            let attempt_number = match &state {
                RetryState::Pending => 1,
                RetryState::Retrying(n) => n + 1,
                terminal => return terminal.clone(),
            };

            info!(
                filename = %entry.filename,
                attempt = attempt_number,
                max_attempts = self.max_retries + 1,
                "Downloading file"
            );

            match self.attempt(entry, dest).await {
                Ok(bytes) => {
                    info!(
                        filename = %entry.filename,
                        bytes = bytes,
                        path = %dest.display(),
                        "Download verified complete"
                    );
                    return advance(&state, AttemptOutcome::Success, self.max_retries);
                }
                Err(e) => {
                    warn!(
                        filename = %entry.filename,
                        attempt = attempt_number,
                        error = %e,
                        "Download attempt failed"
                    );

                    // Remove the partial file before deciding what is next.
                    if fs::try_exists(dest).await.unwrap_or(false) {
                        let _ = fs::remove_file(dest).await;
                    }

                    state = advance(&state, AttemptOutcome::Error(e.to_string()), self.max_retries);
                    match &state {
                        RetryState::Retrying(failures) => {
                            let delay = backoff(*failures, self.max_backoff);
                            info!(
                                filename = %entry.filename,
                                delay_secs = delay.as_secs(),
                                "Retrying after backoff"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryState::Failed { attempts, .. } => {
                            warn!(
                                filename = %entry.filename,
                                attempts = attempts,
                                "Retries exhausted, recording failure"
                            );
                            return state;
                        }
                        _ => unreachable!("advance() on an error yields Retrying or Failed"),
                    }
                }
            }
        }
    }

    /// One streaming attempt: GET, write chunks, verify declared size.
    async fn attempt(&self, entry: &RemoteEntry, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(&entry.url)
            .send()
            .await
            .context("HTTP request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {}", response.status()));
        }

        let declared: Option<u64> = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

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
        file.sync_all().await?;

        verify_length(declared, written)
    }
}

/// Declared content-length must match bytes written; a missing header
/// passes (nothing to verify against).
fn verify_length(declared: Option<u64>, written: u64) -> Result<u64> {
    if let Some(expected) = declared {
        if written != expected {
            return Err(anyhow!(
                "Download incomplete: {}/{} bytes",
                written,
                expected
            ));
        }
    }
    Ok(written)
}

/// Streaming SHA-256 over 4 KiB reads of a completed file. The digest is
/// stored in the ledger as a change-detection aid; no reference value
/// exists to verify it against.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_length_match() {
        assert_eq!(verify_length(Some(2_048_000), 2_048_000).unwrap(), 2_048_000);
    }

    #[test]
    fn test_verify_length_mismatch_is_error() {
        let err = verify_length(Some(2_048_000), 1_024_000).unwrap_err();
        assert!(err.to_string().contains("1024000/2048000"));
    }

    #[test]
    fn test_verify_length_without_header_passes() {
        assert_eq!(verify_length(None, 42).unwrap(), 42);
    }

    #[test]
    fn test_hash_file_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"abc").unwrap();

        // SHA-256("abc")
        assert_eq!(
            hash_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_file_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        // Larger than one 4 KiB read.
        std::fs::write(&path, vec![0x5au8; 10_000]).unwrap();

        let digest = hash_file(&path).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}

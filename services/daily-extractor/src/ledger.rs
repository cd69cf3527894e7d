//! Durable per-filename download ledger.
//!
//! A single JSON object keyed by filename records the last known outcome of
//! every download. One process owns the ledger at a time: opening acquires a
//! `.lock` sidecar, and persistence is write-temp-then-rename after every
//! single file, so a crash loses at most the last file's update.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use argo_common::{ArgoError, ArgoResult};
use archive_listing::RemoteEntry;

/// Ledger record for one remote filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Profile date as `YYYYMMDD`.
    pub date: String,
    /// When the last attempt finished.
    pub download_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    /// Size text as reported by the listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Listing last-modified string at the time of the attempt. Compared as
    /// an opaque string on later scans.
    pub last_modified: String,
    pub download_successful: bool,
    /// SHA-256 hex digest of the completed file. Stored for change
    /// detection across runs; never compared against a remote reference
    /// (the archive publishes none).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    /// Total attempts made in the run that produced this record.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Why an entry must be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    /// Not present in the ledger.
    NotTracked,
    /// Listing last-modified differs from the stored string.
    Modified,
    /// The stored record's success flag is false.
    PreviousFailure,
}

/// Outcome of checking an entry against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fetch(FetchReason),
    Skip,
}

/// Aggregate counts over the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStats {
    pub tracked: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Per-date successful/failed counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DateStats {
    pub successful: usize,
    pub failed: usize,
}

/// Status report over the whole ledger.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub by_date: BTreeMap<String, DateStats>,
}

/// The persistent ledger. Owns its file and the single-writer lock.
pub struct Ledger {
    path: PathBuf,
    lock_path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    /// Open the ledger, acquiring the single-writer lock. Fails fast when
    /// another process holds the lock for this ledger path.
    pub fn open(path: &Path) -> ArgoResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = path.with_extension("lock");
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut lock) => {
                let _ = write!(lock, "{}", std::process::id());
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(ArgoError::LedgerLocked(lock_path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        // The lock is held from here on; release it before surfacing any
        // load error.
        let entries = match Self::load_entries(path) {
            Ok(entries) => entries,
            Err(e) => {
                let _ = fs::remove_file(&lock_path);
                return Err(e);
            }
        };

        info!(path = %path.display(), tracked = entries.len(), "Opened download ledger");

        Ok(Self {
            path: path.to_path_buf(),
            lock_path,
            entries,
        })
    }

    fn load_entries(path: &Path) -> ArgoResult<BTreeMap<String, LedgerEntry>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| ArgoError::Ledger(format!("Corrupt ledger {}: {}", path.display(), e)))
    }

    /// Check a listing entry against the ledger. A file is fetched when it
    /// is not tracked, OR its last-modified string changed, OR the stored
    /// record is a failure — any one condition forces the download.
    pub fn decide(&self, entry: &RemoteEntry) -> Decision {
        match self.entries.get(&entry.filename) {
            None => Decision::Fetch(FetchReason::NotTracked),
            Some(stored) if stored.last_modified != entry.last_modified => {
                Decision::Fetch(FetchReason::Modified)
            }
            Some(stored) if !stored.download_successful => {
                Decision::Fetch(FetchReason::PreviousFailure)
            }
            Some(_) => Decision::Skip,
        }
    }

    /// Record a verified-complete download and persist.
    pub fn record_success(
        &mut self,
        entry: &RemoteEntry,
        local_path: &Path,
        file_hash: String,
        attempts: u32,
    ) -> ArgoResult<()> {
        self.entries.insert(
            entry.filename.clone(),
            LedgerEntry {
                date: entry.date.format("%Y%m%d").to_string(),
                download_time: Utc::now(),
                local_path: Some(local_path.display().to_string()),
                size: Some(entry.size.clone()),
                last_modified: entry.last_modified.clone(),
                download_successful: true,
                file_hash: Some(file_hash),
                attempts,
                error: None,
            },
        );
        self.save()
    }

    /// Record a permanently failed download and persist.
    pub fn record_failure(
        &mut self,
        entry: &RemoteEntry,
        error: String,
        attempts: u32,
    ) -> ArgoResult<()> {
        self.entries.insert(
            entry.filename.clone(),
            LedgerEntry {
                date: entry.date.format("%Y%m%d").to_string(),
                download_time: Utc::now(),
                local_path: None,
                size: Some(entry.size.clone()),
                last_modified: entry.last_modified.clone(),
                download_successful: false,
                file_hash: None,
                attempts,
                error: Some(error),
            },
        );
        self.save()
    }

    /// Look up the stored record for a filename.
    pub fn get(&self, filename: &str) -> Option<&LedgerEntry> {
        self.entries.get(filename)
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregate counts.
    pub fn stats(&self) -> LedgerStats {
        let successful = self
            .entries
            .values()
            .filter(|e| e.download_successful)
            .count();
        LedgerStats {
            tracked: self.entries.len(),
            successful,
            failed: self.entries.len() - successful,
        }
    }

    /// Per-date breakdown for the status report.
    pub fn report(&self) -> StatusReport {
        let mut by_date: BTreeMap<String, DateStats> = BTreeMap::new();
        for entry in self.entries.values() {
            let stats = by_date.entry(entry.date.clone()).or_default();
            if entry.download_successful {
                stats.successful += 1;
            } else {
                stats.failed += 1;
            }
        }

        let stats = self.stats();
        StatusReport {
            total_files: stats.tracked,
            successful: stats.successful,
            failed: stats.failed,
            by_date,
        }
    }

    /// Persist the whole ledger. Temp-write + rename keeps the file intact
    /// under crashes; called after every single file, not batched.
    fn save(&self) -> ArgoResult<()> {
        let tmp = self.path.with_extension("tmp");
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(filename: &str, last_modified: &str) -> RemoteEntry {
        RemoteEntry {
            filename: filename.to_string(),
            url: format!("https://example.org/2025/09/{}", filename),
            size: "2.0M".to_string(),
            last_modified: last_modified.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 9, 11).unwrap(),
        }
    }

    #[test]
    fn test_decide_untracked_is_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::open(&dir.path().join("file_tracking.json")).unwrap();

        let decision = ledger.decide(&entry("20250911_prof.nc", "11-Sep-2025 10:00"));
        assert_eq!(decision, Decision::Fetch(FetchReason::NotTracked));
    }

    #[test]
    fn test_decide_unchanged_success_is_skip() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::open(&dir.path().join("file_tracking.json")).unwrap();

        let remote = entry("20250911_prof.nc", "11-Sep-2025 10:00");
        ledger
            .record_success(&remote, Path::new("daily/11sep2025/20250911_prof.nc"), "ab".into(), 1)
            .unwrap();

        assert_eq!(ledger.decide(&remote), Decision::Skip);
    }

    #[test]
    fn test_decide_modified_is_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::open(&dir.path().join("file_tracking.json")).unwrap();

        let remote = entry("20250911_prof.nc", "11-Sep-2025 10:00");
        ledger
            .record_success(&remote, Path::new("x"), "ab".into(), 1)
            .unwrap();

        let updated = entry("20250911_prof.nc", "12-Sep-2025 03:30");
        assert_eq!(
            ledger.decide(&updated),
            Decision::Fetch(FetchReason::Modified)
        );
    }

    #[test]
    fn test_decide_prior_failure_is_fetch_regardless_of_modified() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::open(&dir.path().join("file_tracking.json")).unwrap();

        let remote = entry("20250911_prof.nc", "11-Sep-2025 10:00");
        ledger
            .record_failure(&remote, "HTTP 503".to_string(), 4)
            .unwrap();

        // Same last-modified string, but the stored record is a failure.
        assert_eq!(
            ledger.decide(&remote),
            Decision::Fetch(FetchReason::PreviousFailure)
        );
    }

    #[test]
    fn test_failure_record_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::open(&dir.path().join("file_tracking.json")).unwrap();

        let remote = entry("20250911_prof.nc", "11-Sep-2025 10:00");
        ledger
            .record_failure(&remote, "HTTP 503".to_string(), 4)
            .unwrap();

        let stored = ledger.get("20250911_prof.nc").unwrap();
        assert!(!stored.download_successful);
        assert_eq!(stored.attempts, 4);
        assert_eq!(stored.error.as_deref(), Some("HTTP 503"));
        assert!(stored.file_hash.is_none());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_tracking.json");

        {
            let mut ledger = Ledger::open(&path).unwrap();
            let remote = entry("20250911_prof.nc", "11-Sep-2025 10:00");
            ledger
                .record_success(&remote, Path::new("x"), "deadbeef".into(), 2)
                .unwrap();
        }

        let reopened = Ledger::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        let stored = reopened.get("20250911_prof.nc").unwrap();
        assert!(stored.download_successful);
        assert_eq!(stored.attempts, 2);
        assert_eq!(stored.file_hash.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_idempotent_decide_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_tracking.json");

        let remote_a = entry("20250910_prof.nc", "10-Sep-2025 08:12");
        let remote_b = entry("20250911_prof.nc", "11-Sep-2025 10:00");

        {
            let mut ledger = Ledger::open(&path).unwrap();
            ledger
                .record_success(&remote_a, Path::new("a"), "aa".into(), 1)
                .unwrap();
            ledger
                .record_success(&remote_b, Path::new("b"), "bb".into(), 1)
                .unwrap();
        }

        // Second run over an unchanged listing: zero fetch decisions.
        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.decide(&remote_a), Decision::Skip);
        assert_eq!(ledger.decide(&remote_b), Decision::Skip);
    }

    #[test]
    fn test_lock_blocks_second_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_tracking.json");

        let _first = Ledger::open(&path).unwrap();
        let second = Ledger::open(&path);
        assert!(matches!(second, Err(ArgoError::LedgerLocked(_))));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_tracking.json");

        {
            let _ledger = Ledger::open(&path).unwrap();
        }
        assert!(Ledger::open(&path).is_ok());
    }

    #[test]
    fn test_report_groups_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::open(&dir.path().join("file_tracking.json")).unwrap();

        let mut a = entry("20250910_prof.nc", "10-Sep-2025 08:12");
        a.date = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let b = entry("20250911_prof.nc", "11-Sep-2025 10:00");

        ledger
            .record_success(&a, Path::new("a"), "aa".into(), 1)
            .unwrap();
        ledger.record_failure(&b, "timeout".to_string(), 4).unwrap();

        let report = ledger.report();
        assert_eq!(report.total_files, 2);
        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.by_date["20250910"].successful, 1);
        assert_eq!(report.by_date["20250911"].failed, 1);
    }
}

//! In-memory corpus of summary records.
//!
//! Loaded once at startup. Corpus order is the sorted walk of the JSON
//! tree; scoring ties preserve this order.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};
use walkdir::WalkDir;

use argo_common::region::classify;
use argo_common::time::profile_date;
use profile_summary::SummaryRecord;

/// One loaded record plus derived lookup fields.
#[derive(Debug, Clone)]
pub struct ProfileDoc {
    pub record: SummaryRecord,
    pub json_path: PathBuf,
    /// Profile date derived from the source filename.
    pub date: Option<NaiveDate>,
    /// Regions containing the profile's sampled position.
    pub regions: Vec<&'static str>,
}

impl ProfileDoc {
    fn from_record(record: SummaryRecord, json_path: PathBuf) -> Self {
        let date = profile_date(&record.file);
        let regions = match (record.sample("LATITUDE"), record.sample("LONGITUDE")) {
            (Some(lat), Some(lon)) => classify(lat, lon),
            _ => Vec::new(),
        };
        Self {
            record,
            json_path,
            date,
            regions,
        }
    }
}

/// Load every summary record under the JSON root. Unreadable records are
/// skipped with a warning, never fatal.
pub fn load_corpus(json_root: &Path) -> Result<Vec<ProfileDoc>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(json_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        match SummaryRecord::load(&path) {
            Ok(record) => docs.push(ProfileDoc::from_record(record, path)),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
        }
    }

    info!(count = docs.len(), root = %json_root.display(), "Loaded summary corpus");
    Ok(docs)
}

//! Summary-record data model and JSON tree path conventions.
//!
//! One summary record per source profile file, written whole and
//! overwritten whole. The record's `summaries` list is positionally coupled
//! to the paired vector index file: vector `i` is the embedding of
//! `summaries[i]`'s text. The pairing is carried purely by filename — the
//! three trees mirror each other apart from root directory and extension:
//!
//! ```text
//! Dataset/2025/09/20250911_prof.nc
//! Datasetjson/2025/09/20250911_prof.json
//! VectorIndex/2025/09/20250911_prof.index
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use argo_common::{ArgoError, ArgoResult};

/// Default root of downloaded profile files.
pub const DATA_DIR: &str = "Dataset";
/// Default root of the JSON summary tree.
pub const JSON_DIR: &str = "Datasetjson";
/// Default root of the vector index tree.
pub const INDEX_DIR: &str = "VectorIndex";

/// One sampled value: the first element of a variable along every dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSample {
    pub variable: String,
    pub value: f64,
}

/// One generated natural-language description of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSummary {
    pub variable: String,
    pub summary: String,
}

/// The JSON record written for one source profile file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Source filename, e.g. `20250911_prof.nc`.
    pub file: String,
    pub generated_at: DateTime<Utc>,
    pub samples: Vec<VariableSample>,
    pub summaries: Vec<VariableSummary>,
}

impl SummaryRecord {
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            generated_at: Utc::now(),
            samples: Vec::new(),
            summaries: Vec::new(),
        }
    }

    /// Texts to embed, in storage order. Vector `i` of the paired index must
    /// be the embedding of element `i` of this list.
    pub fn summary_texts(&self) -> Vec<String> {
        self.summaries
            .iter()
            .map(|s| format!("{}: {}", s.variable, s.summary))
            .collect()
    }

    /// Sampled value of a variable, if present.
    pub fn sample(&self, variable: &str) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.variable == variable)
            .map(|s| s.value)
    }

    /// Whether the record carries a summary for the given variable.
    pub fn has_variable(&self, variable: &str) -> bool {
        self.summaries.iter().any(|s| s.variable == variable)
    }

    /// Load a record from disk.
    pub fn load(path: &Path) -> ArgoResult<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            ArgoError::SummaryRecord(format!("{}: {}", path.display(), e))
        })
    }

    /// Write the whole record, creating parent directories. Rebuilding a
    /// record means overwriting it; there is no partial-update path.
    pub fn store(&self, path: &Path) -> ArgoResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// Map a profile path under the data root to its summary path under the
/// JSON root. Returns `None` when the path is not under the data root.
pub fn json_path_for(data_root: &Path, json_root: &Path, nc_path: &Path) -> Option<PathBuf> {
    let relative = nc_path.strip_prefix(data_root).ok()?;
    Some(json_root.join(relative.with_extension("json")))
}

/// Map a summary path under the JSON root to its index path under the index
/// root. This filename correspondence is the only link between a record and
/// its vectors.
pub fn index_path_for(json_root: &Path, index_root: &Path, json_path: &Path) -> Option<PathBuf> {
    let relative = json_path.strip_prefix(json_root).ok()?;
    Some(index_root.join(relative.with_extension("index")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SummaryRecord {
        let mut record = SummaryRecord::new("20250911_prof.nc");
        record.samples.push(VariableSample {
            variable: "TEMP".to_string(),
            value: 28.4,
        });
        record.samples.push(VariableSample {
            variable: "PSAL".to_string(),
            value: 35.1,
        });
        record.summaries.push(VariableSummary {
            variable: "TEMP".to_string(),
            summary: "Sea water temperature near the surface.".to_string(),
        });
        record.summaries.push(VariableSummary {
            variable: "PSAL".to_string(),
            summary: "Practical salinity of the upper ocean.".to_string(),
        });
        record
    }

    #[test]
    fn test_summary_texts_order() {
        let record = sample_record();
        let texts = record.summary_texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], "TEMP: Sea water temperature near the surface.");
        assert_eq!(texts[1], "PSAL: Practical salinity of the upper ocean.");
    }

    #[test]
    fn test_sample_lookup() {
        let record = sample_record();
        assert_eq!(record.sample("TEMP"), Some(28.4));
        assert_eq!(record.sample("DOXY"), None);
        assert!(record.has_variable("PSAL"));
        assert!(!record.has_variable("DOXY"));
    }

    #[test]
    fn test_store_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2025").join("09").join("20250911_prof.json");

        let record = sample_record();
        record.store(&path).unwrap();

        let loaded = SummaryRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_json_path_mapping() {
        let mapped = json_path_for(
            Path::new("Dataset"),
            Path::new("Datasetjson"),
            Path::new("Dataset/2025/09/20250911_prof.nc"),
        )
        .unwrap();
        assert_eq!(
            mapped,
            Path::new("Datasetjson/2025/09/20250911_prof.json")
        );
    }

    #[test]
    fn test_index_path_mapping() {
        let mapped = index_path_for(
            Path::new("Datasetjson"),
            Path::new("VectorIndex"),
            Path::new("Datasetjson/2025/09/20250911_prof.json"),
        )
        .unwrap();
        assert_eq!(
            mapped,
            Path::new("VectorIndex/2025/09/20250911_prof.index")
        );
    }

    #[test]
    fn test_path_mapping_outside_root() {
        assert!(json_path_for(
            Path::new("Dataset"),
            Path::new("Datasetjson"),
            Path::new("Elsewhere/20250911_prof.nc"),
        )
        .is_none());
    }
}

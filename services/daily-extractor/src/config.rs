//! Service configuration for the daily extractor.
//!
//! Loaded from an optional YAML file; every field has a default matching
//! the public Indian Ocean archive.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

/// Archive and retry settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Archive root; month pages live at `{base_url}/{year}/{month:02}/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Filename suffix of files to mirror.
    #[serde(default = "default_suffix")]
    pub file_suffix: String,

    /// Retries after the first failed attempt (total attempts = retries + 1).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Concurrent downloads per run.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cap on the exponential backoff delay in seconds.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

fn default_base_url() -> String {
    "https://data-argo.ifremer.fr/geo/indian_ocean/".to_string()
}

fn default_suffix() -> String {
    "_prof.nc".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_concurrency() -> usize {
    3
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_backoff_secs() -> u64 {
    120
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            file_suffix: default_suffix(),
            max_retries: default_max_retries(),
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ExtractorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(path = %path.display(), base_url = %config.base_url, "Loaded extractor config");
        Ok(config)
    }

    /// Load from a file when given, defaults otherwise. A broken config file
    /// logs a warning and falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load(p).unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::default();
        assert_eq!(config.file_suffix, "_prof.nc");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
base_url: "https://mirror.example.org/geo/indian_ocean/"
max_retries: 5
"#;
        let config: ExtractorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.base_url, "https://mirror.example.org/geo/indian_ocean/");
        assert_eq!(config.max_retries, 5);
        // Unspecified fields keep their defaults
        assert_eq!(config.file_suffix, "_prof.nc");
        assert_eq!(config.request_timeout_secs, 60);
    }
}

//! Error types for argo-float-services.

use thiserror::Error;

/// Result type alias using ArgoError.
pub type ArgoResult<T> = Result<T, ArgoError>;

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum ArgoError {
    // === Listing Errors ===
    #[error("Failed to fetch listing: {0}")]
    ListingFetch(String),

    #[error("Failed to parse listing: {0}")]
    ListingParse(String),

    // === Download Errors ===
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Size mismatch: expected {expected} bytes, wrote {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    // === Ledger Errors ===
    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Ledger is locked by another process: {0}")]
    LedgerLocked(String),

    // === Data Errors ===
    #[error("Invalid NetCDF data: {0}")]
    NetCdf(String),

    #[error("Invalid summary record: {0}")]
    SummaryRecord(String),

    #[error("Invalid index file: {0}")]
    IndexFormat(String),

    // === Hosted API Errors ===
    #[error("Model API error: {0}")]
    ModelApi(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimension { expected: usize, actual: usize },

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    Storage(String),

    // === Infrastructure Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

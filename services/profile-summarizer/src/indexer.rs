//! Paired vector index build.
//!
//! The index is only ever written with exactly one vector per summary, in
//! summary order; rebuilding a record without its index (or vice versa)
//! breaks the positional mapping, so callers remove the old index before
//! rewriting the record and call this immediately after.

use std::path::Path;

use argo_common::{ArgoError, ArgoResult};
use llm_client::EmbeddingClient;
use profile_summary::SummaryRecord;
use vector_index::FlatIndex;

/// Embed every summary text and write the paired index file.
pub async fn build_index(
    embeddings: &EmbeddingClient,
    record: &SummaryRecord,
    index_path: &Path,
) -> ArgoResult<()> {
    let texts = record.summary_texts();

    let mut index = FlatIndex::new(embeddings.dim());
    if !texts.is_empty() {
        let vectors = embeddings.embed(&texts).await?;
        for vector in &vectors {
            index
                .add(vector)
                .map_err(|e| ArgoError::IndexFormat(e.to_string()))?;
        }
    }

    debug_assert_eq!(index.len(), record.summaries.len());

    if let Some(parent) = index_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    index
        .write_to(index_path)
        .map_err(|e| ArgoError::IndexFormat(e.to_string()))?;

    Ok(())
}

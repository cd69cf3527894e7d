//! Object storage interface for pipeline output (S3-compatible).
//!
//! The JSON summary tree and ecosystem assessments are pushed wholesale to
//! a bucket; there is no partial-update API.

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use argo_common::{ArgoError, ArgoResult};

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl ObjectStorageConfig {
    /// Read connection settings from `ARGO_S3_*` environment variables.
    /// A missing bucket is unrecoverable configuration.
    pub fn from_env() -> ArgoResult<Self> {
        let bucket = std::env::var("ARGO_S3_BUCKET")
            .map_err(|_| ArgoError::InvalidConfig("ARGO_S3_BUCKET is not set".to_string()))?;

        Ok(Self {
            endpoint: std::env::var("ARGO_S3_ENDPOINT")
                .unwrap_or_else(|_| "http://minio:9000".to_string()),
            bucket,
            access_key_id: std::env::var("ARGO_S3_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: std::env::var("ARGO_S3_SECRET_ACCESS_KEY").unwrap_or_default(),
            region: std::env::var("ARGO_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            allow_http: std::env::var("ARGO_S3_ALLOW_HTTP")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

/// Object storage client for pipeline output.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    pub fn new(config: &ObjectStorageConfig) -> ArgoResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| ArgoError::Storage(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// Bucket this client writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Write bytes to a path in the bucket.
    #[instrument(skip(self, data), fields(bucket = %self.bucket, path = %path))]
    pub async fn put(&self, path: &str, data: Bytes) -> ArgoResult<()> {
        let location = Path::from(path);
        debug!(size = data.len(), "Writing object");

        self.store
            .put(&location, data.into())
            .await
            .map_err(|e| ArgoError::Storage(format!("Failed to write {}: {}", path, e)))?;

        Ok(())
    }

    /// Read bytes from a path.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn get(&self, path: &str) -> ArgoResult<Bytes> {
        let location = Path::from(path);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| ArgoError::Storage(format!("Failed to read {}: {}", path, e)))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| ArgoError::Storage(format!("Failed to read bytes: {}", e)))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// Check if an object exists.
    pub async fn exists(&self, path: &str) -> ArgoResult<bool> {
        let location = Path::from(path);

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(ArgoError::Storage(format!(
                "Failed to check {}: {}",
                path, e
            ))),
        }
    }

    /// List objects with a given prefix.
    pub async fn list(&self, prefix: &str) -> ArgoResult<Vec<String>> {
        use futures::TryStreamExt;

        let prefix_path = Path::from(prefix);
        let mut paths = Vec::new();

        let mut stream = self.store.list(Some(&prefix_path));
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|e| ArgoError::Storage(format!("List failed: {}", e)))?
        {
            paths.push(meta.location.to_string());
        }

        Ok(paths)
    }
}

/// Path builder for consistent bucket layout.
pub struct StoragePath;

impl StoragePath {
    /// Object key for a summary JSON file mirrored from the local tree.
    /// Format: `{prefix}{relative_path}` with forward slashes.
    pub fn json_object(prefix: &str, relative_path: &str) -> String {
        format!("{}{}", prefix, relative_path.replace('\\', "/"))
    }

    /// Object key for a per-region ecosystem assessment.
    /// Format: `{prefix}{region}/{date}.json`
    pub fn assessment_object(prefix: &str, region: &str, date: &str) -> String {
        format!("{}{}/{}.json", prefix, region, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_paths() {
        assert_eq!(
            StoragePath::json_object("Datasetjson/", "2025/09/20250911_prof.json"),
            "Datasetjson/2025/09/20250911_prof.json"
        );

        assert_eq!(
            StoragePath::json_object("Datasetjson/", "2025\\09\\20250911_prof.json"),
            "Datasetjson/2025/09/20250911_prof.json"
        );

        assert_eq!(
            StoragePath::assessment_object("assessments/", "Arabian_Sea", "20250911"),
            "assessments/Arabian_Sea/20250911.json"
        );
    }
}

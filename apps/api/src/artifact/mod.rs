//! Artifact store — remote object storage for resume binaries.
//!
//! `upload` returns a stable `public_id` that is the only handle needed to
//! delete the object later. Deletes are best-effort everywhere: callers go
//! through [`delete_best_effort`], which logs and swallows failures.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::resume::ArtifactRef;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Delete failed: {0}")]
    Delete(String),
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Result<ArtifactRef, ArtifactError>;

    async fn delete(&self, public_id: &str) -> Result<(), ArtifactError>;
}

/// Deletes a remote artifact, logging instead of failing.
pub async fn delete_best_effort(artifacts: &dyn ArtifactStore, public_id: &str) -> bool {
    match artifacts.delete(public_id).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to delete artifact {public_id}: {e}");
            false
        }
    }
}

/// S3 / MinIO implementation. Objects live under `resumes/` keyed by the
/// local file stem, so re-uploading the same file overwrites in place.
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ArtifactStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, endpoint: &str) -> Self {
        let public_base_url = format!("{}/{}", endpoint.trim_end_matches('/'), bucket);
        Self {
            client,
            bucket,
            public_base_url,
        }
    }
}

pub fn object_key_for(local_path: &Path) -> String {
    let stem = local_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("resume");
    format!("resumes/{stem}.pdf")
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn upload(&self, local_path: &Path) -> Result<ArtifactRef, ArtifactError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|source| ArtifactError::Read {
                path: local_path.display().to_string(),
                source,
            })?;
        let key = object_key_for(local_path);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| ArtifactError::Upload(e.to_string()))?;

        info!("Uploaded resume artifact to s3://{}/{}", self.bucket, key);

        Ok(ArtifactRef {
            url: format!("{}/{}", self.public_base_url, key),
            public_id: key,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), ArtifactError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(public_id)
            .send()
            .await
            .map_err(|e| ArtifactError::Delete(e.to_string()))?;
        Ok(())
    }
}

//! Blob store client.
//!
//! The blob store is an external collaborator: content goes up by path and
//! comes back as a retrievable URL. Only logos and screenshots use it, under
//! `tools/{id}/logo` and `tools/{id}/screenshot-{index}`.

use async_trait::async_trait;
use axum::body::Bytes;

use crate::errors::AppError;

/// Placeholder shown when a tool has no uploaded logo.
pub const DEFAULT_LOGO_PLACEHOLDER: &str =
    "https://placehold.co/100x100/e2e8f0/64748b?text=No+Logo";

/// Blob path for a tool's logo.
pub fn logo_path(tool_id: &str) -> String {
    format!("tools/{}/logo", tool_id)
}

/// Blob path for one of a tool's screenshots.
pub fn screenshot_path(tool_id: &str, index: usize) -> String {
    format!("tools/{}/screenshot-{}", tool_id, index)
}

/// External blob store contract.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<(), AppError>;

    /// URL from which an uploaded blob can be retrieved.
    fn download_url(&self, path: &str) -> String;
}

/// REST client for the blob store.
pub struct RestBlobStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestBlobStore {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<(), AppError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.post(&url).body(bytes).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Blob upload to {} failed with {}",
                path,
                response.status()
            )));
        }

        Ok(())
    }

    fn download_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// In-memory blob store for tests.
#[cfg(test)]
pub struct MemoryBlobStore {
    blobs: std::sync::Mutex<std::collections::HashMap<String, Bytes>>,
}

#[cfg(test)]
impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }
}

#[cfg(test)]
#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<(), AppError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes);
        Ok(())
    }

    fn download_url(&self, path: &str) -> String {
        format!("memory://{}", path)
    }
}

//! In-process stores for deployments without S3 / Postgres.
//!
//! Keys are fresh UUID-derived paths, so writers never contend on the same
//! entry; the lock only protects the map itself.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::resume::ResumeArtifact;
use crate::storage::{BlobStore, MetadataStore, StorageError};

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn get(&self, path: &str) -> Option<StoredBlob> {
        self.blobs.read().await.get(path).cloned()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.blobs.write().await.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(path).map(|blob| {
            debug!("Serving {path} from memory ({})", blob.content_type);
            blob.bytes.clone()
        }))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.read().await.contains_key(path))
    }

    async fn create_signed_url(
        &self,
        _path: &str,
        _ttl: Duration,
    ) -> Result<Option<String>, StorageError> {
        Ok(None)
    }
}

#[derive(Default)]
pub struct MemoryMetadataStore {
    records: RwLock<HashMap<Uuid, ResumeArtifact>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, artifact: &ResumeArtifact) -> Result<(), StorageError> {
        self.records
            .write()
            .await
            .insert(artifact.id, artifact.clone());
        Ok(())
    }

    async fn select_by_id(&self, id: Uuid) -> Result<Option<ResumeArtifact>, StorageError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn set_pdf_path(&self, id: Uuid, pdf_path: &str) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or(StorageError::MissingRecord(id))?;
        record.pdf_path = Some(pdf_path.to_string());
        Ok(())
    }
}

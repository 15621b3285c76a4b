//! Artifact storage seams.
//!
//! Blobs (HTML / PDF documents) and metadata rows sit behind two traits so the
//! resume service can run against S3 + Postgres in production and against
//! in-process maps in tests or demo deployments. Implementations are chosen
//! at startup and handed to the service explicitly.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::ResumeArtifact;

pub mod memory;
pub mod postgres;
pub mod s3;

pub use memory::{MemoryBlobStore, MemoryMetadataStore};
pub use postgres::PgMetadataStore;
pub use s3::S3BlobStore;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob store error: {0}")]
    Blob(String),

    #[error("metadata store error: {0}")]
    Metadata(String),

    #[error("metadata record {0} not found")]
    MissingRecord(Uuid),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Metadata(e.to_string())
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// `Ok(None)` when nothing is stored under `path`.
    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Time-limited URL for `path`, or `Ok(None)` when the backend cannot
    /// issue URLs and content must be served inline.
    async fn create_signed_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<Option<String>, StorageError>;
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert(&self, artifact: &ResumeArtifact) -> Result<(), StorageError>;

    async fn select_by_id(&self, id: Uuid) -> Result<Option<ResumeArtifact>, StorageError>;

    async fn set_pdf_path(&self, id: Uuid, pdf_path: &str) -> Result<(), StorageError>;
}

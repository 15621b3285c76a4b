//! Resolves an artifact id to something a client can open.
//!
//! Lookup order: the stored metadata row, then the path derived from the id.
//! The fallback keeps blobs reachable when the metadata insert failed during
//! generation. URLs issued here use the short preview lifetime.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::{pdf_preview_path, preview_path};
use crate::models::resume::ResumeArtifact;
use crate::storage::{BlobStore, MetadataStore, HTML_CONTENT_TYPE, PDF_CONTENT_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Html,
    Pdf,
}

impl ArtifactKind {
    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Html => HTML_CONTENT_TYPE,
            ArtifactKind::Pdf => PDF_CONTENT_TYPE,
        }
    }

    fn default_path(self, id: Uuid) -> String {
        match self {
            ArtifactKind::Html => ResumeArtifact::html_path_for(id),
            ArtifactKind::Pdf => ResumeArtifact::pdf_path_for(id),
        }
    }

    fn recorded_path(self, artifact: &ResumeArtifact) -> Option<String> {
        match self {
            ArtifactKind::Html => Some(artifact.html_path.clone()),
            ArtifactKind::Pdf => artifact.pdf_path.clone(),
        }
    }

    fn direct_handle(self, id: Uuid) -> String {
        match self {
            ArtifactKind::Html => preview_path(id),
            ArtifactKind::Pdf => pdf_preview_path(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deliverable {
    Redirect(String),
    Inline {
        bytes: Vec<u8>,
        content_type: &'static str,
    },
}

/// Artifact record plus freshly issued access URLs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDescription {
    pub resume: ResumeArtifact,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

pub struct Retrieval {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    preview_ttl: Duration,
}

impl Retrieval {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        preview_ttl: Duration,
    ) -> Self {
        Self {
            blobs,
            metadata,
            preview_ttl,
        }
    }

    /// Short-lived signed URL when the store can sign, otherwise the content.
    pub async fn resolve(&self, id: Uuid, kind: ArtifactKind) -> Result<Deliverable, AppError> {
        let (_, path) = self.locate(id, kind).await?;

        match self.blobs.create_signed_url(&path, self.preview_ttl).await {
            Ok(Some(url)) => return Ok(Deliverable::Redirect(url)),
            Ok(None) => {}
            Err(e) => warn!("Signing {path} failed, serving inline: {e}"),
        }

        self.inline(id, &path, kind).await
    }

    /// Always returns the content itself.
    pub async fn resolve_inline(
        &self,
        id: Uuid,
        kind: ArtifactKind,
    ) -> Result<Deliverable, AppError> {
        let (_, path) = self.locate(id, kind).await?;
        self.inline(id, &path, kind).await
    }

    /// Record (stored or reconstructed) with fresh URLs for HTML and, when
    /// present, PDF.
    pub async fn describe(&self, id: Uuid) -> Result<ResumeDescription, AppError> {
        let (record, html_path) = self.locate(id, ArtifactKind::Html).await?;
        let mut resume = record.unwrap_or_else(|| ResumeArtifact::reconstructed(id));

        let pdf_path = match self.locate(id, ArtifactKind::Pdf).await {
            Ok((_, path)) => Some(path),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        resume.html_path = html_path.clone();
        resume.pdf_path = pdf_path.clone();

        let url = self.url_or_handle(&html_path, id, ArtifactKind::Html).await;
        let pdf_url = match &pdf_path {
            Some(path) => Some(self.url_or_handle(path, id, ArtifactKind::Pdf).await),
            None => None,
        };

        Ok(ResumeDescription {
            resume,
            url,
            pdf_url,
        })
    }

    /// Finds the metadata row (if readable) and the first candidate path that
    /// actually holds a blob.
    async fn locate(
        &self,
        id: Uuid,
        kind: ArtifactKind,
    ) -> Result<(Option<ResumeArtifact>, String), AppError> {
        let record = match self.metadata.select_by_id(id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Metadata lookup for resume {id} failed, using default path: {e}");
                None
            }
        };

        let mut candidates = Vec::with_capacity(2);
        if let Some(path) = record.as_ref().and_then(|r| kind.recorded_path(r)) {
            candidates.push(path);
        }
        let fallback = kind.default_path(id);
        if !candidates.contains(&fallback) {
            candidates.push(fallback);
        }

        for path in candidates {
            if self.blobs.exists(&path).await? {
                debug!("Resume {id} {kind:?} resolved to {path}");
                return Ok((record, path));
            }
        }

        Err(AppError::NotFound(format!("Resume {id} not found")))
    }

    async fn inline(
        &self,
        id: Uuid,
        path: &str,
        kind: ArtifactKind,
    ) -> Result<Deliverable, AppError> {
        match self.blobs.download(path).await? {
            Some(bytes) => Ok(Deliverable::Inline {
                bytes,
                content_type: kind.content_type(),
            }),
            None => Err(AppError::NotFound(format!("Resume {id} not found"))),
        }
    }

    async fn url_or_handle(&self, path: &str, id: Uuid, kind: ArtifactKind) -> String {
        match self.blobs.create_signed_url(path, self.preview_ttl).await {
            Ok(Some(url)) => url,
            Ok(None) => kind.direct_handle(id),
            Err(e) => {
                warn!("Signing {path} failed, using direct handle: {e}");
                kind.direct_handle(id)
            }
        }
    }
}

//! Resume Generation: orchestrates the per-request pipeline.
//!
//! Flow: normalize → enhance summary (best-effort) → render HTML →
//!       store HTML blob (fatal on failure) → insert metadata (best-effort) →
//!       render + store PDF (only when enabled, best-effort) → issue URLs.
//!
//! Every blob path derives from the artifact id, which is generated before
//! the first write. Nothing is retried here.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::summary::{Enhancement, SummaryEnhancer};
use crate::models::resume::{ResumeArtifact, ResumeRequest};
use crate::pdf::PdfRenderer;
use crate::render::{render_resume, Template};
use crate::storage::{BlobStore, MetadataStore, HTML_CONTENT_TYPE, PDF_CONTENT_TYPE};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Pipeline stages, logged as the request moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    SummaryEnhanced,
    Rendered,
    Stored,
    PdfAttempted,
    Complete,
}

/// Outcome of the optional PDF branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfStatus {
    Disabled,
    Stored { path: String },
    Failed { reason: String },
}

/// Outcome of the metadata insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataStatus {
    Stored,
    Failed { reason: String },
}

/// How much of the pipeline landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Full,
    WithoutPdf,
    WithoutMetadata,
    WithoutPdfOrMetadata,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub artifact: ResumeArtifact,
    pub template: Template,
    pub html: String,
    /// Signed URL when the blob store can sign, otherwise the direct handle.
    pub url: String,
    /// Present only when the PDF branch stored a document.
    pub pdf_url: Option<String>,
    pub pdf: PdfStatus,
    pub metadata: MetadataStatus,
    pub summary_improved: bool,
}

impl GenerationOutcome {
    /// `Disabled` PDFs count as complete; only a failed attempt is a gap.
    pub fn completeness(&self) -> Completeness {
        let pdf_ok = !matches!(self.pdf, PdfStatus::Failed { .. });
        let metadata_ok = matches!(self.metadata, MetadataStatus::Stored);
        match (pdf_ok, metadata_ok) {
            (true, true) => Completeness::Full,
            (false, true) => Completeness::WithoutPdf,
            (true, false) => Completeness::WithoutMetadata,
            (false, false) => Completeness::WithoutPdfOrMetadata,
        }
    }
}

/// Direct retrieval handle served by this API, used when no signed URL exists.
pub fn preview_path(id: Uuid) -> String {
    format!("/resume/{id}")
}

pub fn pdf_preview_path(id: Uuid) -> String {
    format!("/resume/{id}/pdf")
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

/// Resume Service. Collaborators are injected at construction; an absent
/// enhancer or PDF renderer switches that step off.
pub struct ResumeService {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    enhancer: Option<Arc<dyn SummaryEnhancer>>,
    pdf: Option<Arc<dyn PdfRenderer>>,
    signed_url_ttl: Duration,
}

impl ResumeService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            blobs,
            metadata,
            enhancer: None,
            pdf: None,
            signed_url_ttl,
        }
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn SummaryEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_pdf_renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.pdf = Some(renderer);
        self
    }

    pub fn pdf_enabled(&self) -> bool {
        self.pdf.is_some()
    }

    /// Runs the full pipeline once. Only a failed HTML upload is an error;
    /// metadata and PDF problems are reported in the outcome.
    pub async fn generate(
        &self,
        request: ResumeRequest,
        owner: Option<Uuid>,
    ) -> Result<GenerationOutcome, AppError> {
        let request = request.normalized();
        log_stage(Stage::Received, None);

        // Step 1: Summary (advisory; never fails)
        let enhancement = match &self.enhancer {
            Some(enhancer) => enhancer.enhance(&request.summary).await,
            None => Enhancement::Fallback {
                text: request.summary.clone(),
                reason: "enhancer disabled".to_string(),
            },
        };
        let summary_improved = enhancement.is_improved();
        log_stage(Stage::SummaryEnhanced, None);

        // Step 2: Render
        let rendered = render_resume(&request, enhancement.text(), request.resolved_template());
        let template = rendered.template;
        log_stage(Stage::Rendered, None);

        // Step 3: Store HTML under a fresh id (fatal on failure)
        let id = Uuid::new_v4();
        let html_path = ResumeArtifact::html_path_for(id);
        self.blobs
            .upload(&html_path, rendered.html.clone().into_bytes(), HTML_CONTENT_TYPE)
            .await
            .map_err(|e| {
                error!("HTML upload for resume {id} failed: {e}");
                AppError::Storage(e)
            })?;
        log_stage(Stage::Stored, Some(id));

        let mut artifact = ResumeArtifact {
            id,
            user_id: owner,
            template: template.id().to_string(),
            html_path: html_path.clone(),
            pdf_path: None,
            metadata: request.metadata(),
            created_at: rendered.created_at,
        };

        // Step 4: Metadata (best-effort; retrieval falls back to the id-derived path)
        let metadata = match self.metadata.insert(&artifact).await {
            Ok(()) => MetadataStatus::Stored,
            Err(e) => {
                warn!("Metadata insert for resume {id} failed, continuing: {e}");
                MetadataStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        // Step 5: PDF (only when enabled, best-effort)
        let pdf = match &self.pdf {
            Some(renderer) => {
                let status = self.store_pdf(renderer.as_ref(), id, &rendered.html).await;
                log_stage(Stage::PdfAttempted, Some(id));
                status
            }
            None => PdfStatus::Disabled,
        };

        if let PdfStatus::Stored { path } = &pdf {
            artifact.pdf_path = Some(path.clone());
            if metadata == MetadataStatus::Stored {
                // Single attempt; a stale row still resolves through the fallback path.
                if let Err(e) = self.metadata.set_pdf_path(id, path).await {
                    warn!("Recording PDF path for resume {id} failed: {e}");
                }
            }
        }

        // Step 6: Retrieval handles
        let url = self
            .issue_url(&html_path)
            .await
            .unwrap_or_else(|| preview_path(id));
        let pdf_url = match &pdf {
            PdfStatus::Stored { path } => Some(
                self.issue_url(path)
                    .await
                    .unwrap_or_else(|| pdf_preview_path(id)),
            ),
            _ => None,
        };

        let outcome = GenerationOutcome {
            artifact,
            template,
            html: rendered.html,
            url,
            pdf_url,
            pdf,
            metadata,
            summary_improved,
        };

        info!(
            "Generated resume {} (template={}, completeness={:?}, owner={:?})",
            id,
            template,
            outcome.completeness(),
            owner
        );
        log_stage(Stage::Complete, Some(id));

        Ok(outcome)
    }

    async fn store_pdf(&self, renderer: &dyn PdfRenderer, id: Uuid, html: &str) -> PdfStatus {
        let bytes = match renderer.render(html).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("PDF render for resume {id} failed: {e}");
                return PdfStatus::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let path = ResumeArtifact::pdf_path_for(id);
        match self.blobs.upload(&path, bytes, PDF_CONTENT_TYPE).await {
            Ok(()) => PdfStatus::Stored { path },
            Err(e) => {
                warn!("PDF upload for resume {id} failed: {e}");
                PdfStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Signed URL with the generation-time lifetime. `None` when the store
    /// cannot sign or signing failed.
    async fn issue_url(&self, path: &str) -> Option<String> {
        match self.blobs.create_signed_url(path, self.signed_url_ttl).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Signed URL for {path} failed, using direct handle: {e}");
                None
            }
        }
    }
}

fn log_stage(stage: Stage, id: Option<Uuid>) {
    match id {
        Some(id) => tracing::debug!("Resume {id}: {stage:?}"),
        None => tracing::debug!("Resume pipeline: {stage:?}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::generation::summary::LlmSummaryEnhancer;
    use crate::generation::summary::tests::StubCompletion;
    use crate::pdf::PdfError;
    use crate::render::html::escape_html;
    use crate::storage::{MemoryBlobStore, MemoryMetadataStore, StorageError};

    pub(crate) const TTL: Duration = Duration::from_secs(3600);

    pub(crate) struct StubPdf {
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl StubPdf {
        pub(crate) fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PdfRenderer for StubPdf {
        async fn render(&self, html: &str) -> Result<Vec<u8>, PdfError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PdfError::Timeout { secs: 60 })
            } else {
                Ok(format!("%PDF-1.7 {}", html.len()).into_bytes())
            }
        }
    }

    /// Metadata store whose inserts always fail.
    pub(crate) struct BrokenMetadata;

    #[async_trait]
    impl MetadataStore for BrokenMetadata {
        async fn insert(&self, _artifact: &ResumeArtifact) -> Result<(), StorageError> {
            Err(StorageError::Metadata("connection refused".to_string()))
        }

        async fn select_by_id(&self, _id: Uuid) -> Result<Option<ResumeArtifact>, StorageError> {
            Err(StorageError::Metadata("connection refused".to_string()))
        }

        async fn set_pdf_path(&self, _id: Uuid, _path: &str) -> Result<(), StorageError> {
            Err(StorageError::Metadata("connection refused".to_string()))
        }
    }

    /// Blob store that rejects uploads, optionally only for PDFs.
    struct RejectingBlobs {
        inner: MemoryBlobStore,
        only_pdf: bool,
    }

    #[async_trait]
    impl BlobStore for RejectingBlobs {
        async fn upload(
            &self,
            path: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<(), StorageError> {
            if !self.only_pdf || content_type == PDF_CONTENT_TYPE {
                return Err(StorageError::Blob("bucket not found".to_string()));
            }
            self.inner.upload(path, bytes, content_type).await
        }

        async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
            self.inner.download(path).await
        }

        async fn exists(&self, path: &str) -> Result<bool, StorageError> {
            self.inner.exists(path).await
        }

        async fn create_signed_url(
            &self,
            path: &str,
            ttl: Duration,
        ) -> Result<Option<String>, StorageError> {
            self.inner.create_signed_url(path, ttl).await
        }
    }

    /// Memory blob store that pretends to sign URLs.
    pub(crate) struct SigningBlobs {
        pub inner: MemoryBlobStore,
    }

    #[async_trait]
    impl BlobStore for SigningBlobs {
        async fn upload(
            &self,
            path: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<(), StorageError> {
            self.inner.upload(path, bytes, content_type).await
        }

        async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
            self.inner.download(path).await
        }

        async fn exists(&self, path: &str) -> Result<bool, StorageError> {
            self.inner.exists(path).await
        }

        async fn create_signed_url(
            &self,
            path: &str,
            ttl: Duration,
        ) -> Result<Option<String>, StorageError> {
            Ok(Some(format!(
                "https://storage.test/{path}?expires_in={}",
                ttl.as_secs()
            )))
        }
    }

    fn ada() -> ResumeRequest {
        ResumeRequest {
            name: "Ada".to_string(),
            summary: "Built things".to_string(),
            ..Default::default()
        }
    }

    fn memory_service() -> (ResumeService, Arc<MemoryBlobStore>, Arc<MemoryMetadataStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let metadata = Arc::new(MemoryMetadataStore::new());
        let service = ResumeService::new(blobs.clone(), metadata.clone(), TTL);
        (service, blobs, metadata)
    }

    #[tokio::test]
    async fn test_default_template_and_placeholders() {
        let (service, blobs, metadata) = memory_service();
        let outcome = service.generate(ada(), None).await.unwrap();

        assert_eq!(outcome.template, Template::Classic);
        assert_eq!(outcome.artifact.template, "classic");
        assert!(outcome.html.contains("No experience listed"));
        assert!(outcome.html.contains("No education listed"));
        assert!(outcome.html.contains("No skills listed"));
        assert_eq!(outcome.completeness(), Completeness::Full);

        let id = outcome.artifact.id;
        let stored = blobs.get(&ResumeArtifact::html_path_for(id)).await.unwrap();
        assert_eq!(stored.bytes, outcome.html.as_bytes());
        assert_eq!(stored.content_type, HTML_CONTENT_TYPE);
        assert!(metadata.select_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unsigned_store_returns_direct_handle() {
        let (service, _, _) = memory_service();
        let outcome = service.generate(ada(), None).await.unwrap();
        assert_eq!(outcome.url, format!("/resume/{}", outcome.artifact.id));
    }

    #[tokio::test]
    async fn test_signing_store_returns_generation_ttl_url() {
        let blobs = Arc::new(SigningBlobs {
            inner: MemoryBlobStore::new(),
        });
        let service = ResumeService::new(blobs, Arc::new(MemoryMetadataStore::new()), TTL);
        let outcome = service.generate(ada(), None).await.unwrap();
        assert!(outcome.url.starts_with("https://storage.test/resumes/"));
        assert!(outcome.url.ends_with("expires_in=3600"));
    }

    #[tokio::test]
    async fn test_pdf_disabled_means_no_pdf_url() {
        let (service, blobs, _) = memory_service();
        assert!(!service.pdf_enabled());
        let outcome = service.generate(ada(), None).await.unwrap();
        assert_eq!(outcome.pdf, PdfStatus::Disabled);
        assert!(outcome.pdf_url.is_none());
        assert_eq!(blobs.len().await, 1);
    }

    #[tokio::test]
    async fn test_pdf_success_attaches_path_and_url() {
        let (service, blobs, metadata) = memory_service();
        let service = service.with_pdf_renderer(Arc::new(StubPdf::new(false)));
        let outcome = service.generate(ada(), None).await.unwrap();

        let id = outcome.artifact.id;
        let pdf_path = ResumeArtifact::pdf_path_for(id);
        assert_eq!(outcome.pdf, PdfStatus::Stored { path: pdf_path.clone() });
        assert_eq!(outcome.pdf_url, Some(format!("/resume/{id}/pdf")));
        assert_eq!(
            blobs.get(&pdf_path).await.unwrap().content_type,
            PDF_CONTENT_TYPE
        );
        let record = metadata.select_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.pdf_path, Some(pdf_path));
    }

    #[tokio::test]
    async fn test_pdf_render_failure_is_not_fatal() {
        let (service, blobs, metadata) = memory_service();
        let pdf = Arc::new(StubPdf::new(true));
        let service = service.with_pdf_renderer(pdf.clone());
        let outcome = service.generate(ada(), None).await.unwrap();

        assert_eq!(pdf.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(outcome.pdf, PdfStatus::Failed { .. }));
        assert!(outcome.pdf_url.is_none());
        assert_eq!(outcome.completeness(), Completeness::WithoutPdf);
        assert_eq!(blobs.len().await, 1);
        let record = metadata
            .select_by_id(outcome.artifact.id)
            .await
            .unwrap()
            .unwrap();
        assert!(record.pdf_path.is_none());
    }

    #[tokio::test]
    async fn test_pdf_upload_failure_is_not_fatal() {
        let blobs = Arc::new(RejectingBlobs {
            inner: MemoryBlobStore::new(),
            only_pdf: true,
        });
        let service = ResumeService::new(blobs, Arc::new(MemoryMetadataStore::new()), TTL)
            .with_pdf_renderer(Arc::new(StubPdf::new(false)));
        let outcome = service.generate(ada(), None).await.unwrap();
        assert!(matches!(outcome.pdf, PdfStatus::Failed { .. }));
        assert!(outcome.pdf_url.is_none());
    }

    #[tokio::test]
    async fn test_html_upload_failure_is_fatal() {
        let blobs = Arc::new(RejectingBlobs {
            inner: MemoryBlobStore::new(),
            only_pdf: false,
        });
        let metadata = Arc::new(MemoryMetadataStore::new());
        let pdf = Arc::new(StubPdf::new(false));
        let service =
            ResumeService::new(blobs, metadata, TTL).with_pdf_renderer(pdf.clone());

        let err = service.generate(ada(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(pdf.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_still_returns_usable_id() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = ResumeService::new(blobs.clone(), Arc::new(BrokenMetadata), TTL);
        let outcome = service.generate(ada(), None).await.unwrap();

        assert!(matches!(outcome.metadata, MetadataStatus::Failed { .. }));
        assert_eq!(outcome.completeness(), Completeness::WithoutMetadata);
        assert_eq!(outcome.url, preview_path(outcome.artifact.id));
        assert!(blobs
            .exists(&ResumeArtifact::html_path_for(outcome.artifact.id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_enhancer_failure_keeps_escaped_raw_summary() {
        let (service, _, _) = memory_service();
        let service = service.with_enhancer(Arc::new(LlmSummaryEnhancer::new(Arc::new(
            StubCompletion::failing(503),
        ))));
        let request = ResumeRequest {
            summary: "Ships <fast> & \"safe\"".to_string(),
            ..ada()
        };

        let outcome = service.generate(request, None).await.unwrap();
        assert!(!outcome.summary_improved);
        let expected = format!(
            "<div class=\"summary\">{}</div>",
            escape_html("Ships <fast> & \"safe\"")
        );
        assert!(outcome.html.contains(&expected));
    }

    #[tokio::test]
    async fn test_enhancer_success_replaces_summary() {
        let (service, _, _) = memory_service();
        let service = service.with_enhancer(Arc::new(LlmSummaryEnhancer::new(Arc::new(
            StubCompletion::ok("Seasoned engineer."),
        ))));
        let outcome = service.generate(ada(), None).await.unwrap();
        assert!(outcome.summary_improved);
        assert!(outcome.html.contains("Seasoned engineer."));
        assert!(!outcome.html.contains("Built things"));
    }

    #[tokio::test]
    async fn test_deterministic_enhancer_gives_identical_html() {
        let (service, _, _) = memory_service();
        let service = service.with_enhancer(Arc::new(LlmSummaryEnhancer::new(Arc::new(
            StubCompletion::ok("Same every time."),
        ))));
        let first = service.generate(ada(), None).await.unwrap();
        let second = service.generate(ada(), None).await.unwrap();
        assert_eq!(first.html, second.html);
        assert_ne!(first.artifact.id, second.artifact.id);
    }

    #[tokio::test]
    async fn test_unknown_template_falls_back_and_owner_is_recorded() {
        let (service, _, metadata) = memory_service();
        let owner = Uuid::new_v4();
        let request = ResumeRequest {
            template: Some("Holographic".to_string()),
            ..ada()
        };
        let outcome = service.generate(request, Some(owner)).await.unwrap();
        assert_eq!(outcome.template, Template::Classic);
        let record = metadata
            .select_by_id(outcome.artifact.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.user_id, Some(owner));
    }
}

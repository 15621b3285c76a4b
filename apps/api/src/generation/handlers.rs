//! Axum route handlers for the Resume API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::auth::OptionalUser;
use crate::errors::AppError;
use crate::generation::retrieval::{ArtifactKind, Deliverable, ResumeDescription};
use crate::models::resume::ResumeRequest;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub id: Uuid,
    pub template: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl IntoResponse for Deliverable {
    fn into_response(self) -> Response {
        match self {
            Deliverable::Redirect(url) => Redirect::temporary(&url).into_response(),
            Deliverable::Inline {
                bytes,
                content_type,
            } => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/resume/generate
///
/// Renders, stores and (optionally) exports a resume. Responds 201 as soon as
/// the HTML is stored; metadata and PDF problems are logged, not returned.
pub async fn handle_generate(
    State(state): State<AppState>,
    OptionalUser(owner): OptionalUser,
    payload: Result<Json<ResumeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerateResponse>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let include_html = request.include_html;

    let outcome = state.resumes.generate(request, owner).await?;
    debug!(
        "Resume {} generated ({:?}, summary improved: {})",
        outcome.artifact.id,
        outcome.completeness(),
        outcome.summary_improved
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            id: outcome.artifact.id,
            template: outcome.template.id().to_string(),
            url: outcome.url,
            pdf_url: outcome.pdf_url,
            html: include_html.then_some(outcome.html),
        }),
    ))
}

/// GET /resume/:id
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Deliverable, AppError> {
    state.retrieval.resolve(parse_id(&id)?, ArtifactKind::Html).await
}

/// GET /resume/:id/pdf
pub async fn handle_preview_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Deliverable, AppError> {
    state.retrieval.resolve(parse_id(&id)?, ArtifactKind::Pdf).await
}

/// GET /api/resume/:id
///
/// Artifact record plus fresh short-lived URLs. Works without a metadata row.
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResumeDescription>, AppError> {
    state.retrieval.describe(parse_id(&id)?).await.map(Json)
}

/// GET /api/resume/:id/html
pub async fn handle_get_html(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Deliverable, AppError> {
    state
        .retrieval
        .resolve_inline(parse_id(&id)?, ArtifactKind::Html)
        .await
}

/// Malformed ids can never name an artifact, so they are reported as missing.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Resume {raw} not found")))
}

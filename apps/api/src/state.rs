use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::generation::generator::ResumeService;
use crate::generation::retrieval::Retrieval;
use crate::llm_client::Completion;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub resumes: Arc<ResumeService>,
    pub retrieval: Arc<Retrieval>,
    /// Backs the AI assistant route. Unconfigured clients answer with `MissingApiKey`.
    pub completion: Arc<dyn Completion>,
    /// Absent when `JWT_SECRET` is unset; every caller is then anonymous.
    pub auth: Option<Arc<TokenVerifier>>,
}

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::CompletionOptions;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssistantRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub reply: String,
}

/// POST /api/ai/assistant
///
/// Forwards a free-form prompt to the completion client using its default
/// system prompt and limits.
pub async fn assistant_handler(
    State(state): State<AppState>,
    payload: Result<Json<AssistantRequest>, JsonRejection>,
) -> Result<Json<AssistantResponse>, AppError> {
    let prompt = match payload {
        Ok(Json(request)) => request.prompt,
        Err(e) => {
            debug!("Unreadable assistant body: {}", e.body_text());
            String::new()
        }
    };
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::PromptRequired);
    }

    let reply = state
        .completion
        .complete(prompt, &CompletionOptions::default())
        .await?;

    Ok(Json(AssistantResponse { reply }))
}

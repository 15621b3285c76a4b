//! LLM Client: the single point of entry for all chat-completion calls.
//!
//! No other module talks to the OpenAI API directly; callers depend on the
//! [`Completion`] trait so the client can be swapped for a stub in tests.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const BACKOFF_BASE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the failure comes from missing configuration rather than the
    /// remote service.
    pub fn is_missing_config(&self) -> bool {
        matches!(self, LlmError::MissingApiKey)
    }
}

/// Per-call tuning. Unset fields use the client's defaults.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub system: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Text-completion collaborator.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    n: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Trimmed text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// Model and sampling defaults applied when a call leaves them unset.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Chat Completions client with retry logic. The API key is optional so the
/// service can start without it; calls then fail with
/// [`LlmError::MissingApiKey`].
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    settings: LlmSettings,
    base_url: String,
    /// First retry delay; doubles on each further attempt.
    backoff_base: Duration,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("settings", &self.settings)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LlmClient {
    pub fn new(api_key: Option<String>, settings: LlmSettings) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            settings,
            base_url: OPENAI_API_URL.to_string(),
            backoff_base: BACKOFF_BASE,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Makes a raw call to the Chat Completions API.
    /// Retries on 429 (rate limit), 5xx and transport errors with exponential backoff.
    pub async fn call(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<ChatResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let request_body = self.build_request(prompt, options);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = backoff_delay(self.backoff_base, attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .bearer_auth(api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e.without_url()));
                    continue;
                }
            };

            let status = response.status();

            if is_retryable_status(status.as_u16()) {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            let chat_response: ChatResponse = serde_json::from_slice(&response.bytes().await?)?;

            if let Some(usage) = &chat_response.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(chat_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    fn build_request<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a CompletionOptions,
    ) -> ChatRequest<'a> {
        let system = options
            .system
            .as_deref()
            .unwrap_or(prompts::DEFAULT_SYSTEM);
        ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: options.max_tokens.unwrap_or(self.settings.max_tokens),
            temperature: options.temperature.unwrap_or(self.settings.temperature),
            n: 1,
        }
    }
}

#[async_trait]
impl Completion for LlmClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let response = self.call(prompt, options).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1 << attempt.saturating_sub(1))
}

/// Pulls the human-readable message out of an OpenAI error body.
fn error_message(body: String) -> String {
    serde_json::from_str::<OpenAiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;

    const SECRET: &str = "sk-test-secret-value";

    fn client(api_key: Option<&str>) -> LlmClient {
        LlmClient::new(api_key.map(str::to_string), LlmSettings::default()).unwrap()
    }

    /// Local completions endpoint answering hit `n` with `statuses[n]`
    /// (the last entry repeats). Returns the URL and the hit counter.
    async fn scripted_endpoint(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = (Arc::new(statuses), hits.clone());

        async fn respond(
            State((statuses, hits)): State<(Arc<Vec<u16>>, Arc<AtomicUsize>)>,
        ) -> (StatusCode, Json<Value>) {
            let n = hits.fetch_add(1, Ordering::SeqCst);
            let code = statuses[n.min(statuses.len() - 1)];
            let status = StatusCode::from_u16(code).unwrap();
            if status.is_success() {
                (
                    status,
                    Json(json!({ "choices": [{ "message": { "content": "ok" } }] })),
                )
            } else {
                (status, Json(json!({ "error": { "message": "x" } })))
            }
        }

        let app = Router::new()
            .route("/v1/chat/completions", post(respond))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/v1/chat/completions"), hits)
    }

    fn local_client(url: String) -> LlmClient {
        let mut c = client(Some(SECRET));
        c.base_url = url;
        c.backoff_base = Duration::from_millis(5);
        c
    }

    #[tokio::test]
    async fn test_retries_server_error_then_succeeds() {
        let (url, hits) = scripted_endpoint(vec![503, 200]).await;
        let reply = local_client(url)
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, hits) = scripted_endpoint(vec![400]).await;
        let err = local_client(url)
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 400, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persistent_server_error_gives_up_after_max_retries() {
        let (url, hits) = scripted_endpoint(vec![503]).await;
        let err = local_client(url)
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let (url, hits) = scripted_endpoint(vec![429, 429, 200]).await;
        let reply = local_client(url)
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let err = client(None)
            .complete("hello", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_missing_config());
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        assert!(!client(Some("   ")).is_configured());
        assert!(client(Some(SECRET)).is_configured());
    }

    #[test]
    fn test_request_uses_defaults_and_overrides() {
        let c = client(Some(SECRET));
        let defaults = CompletionOptions::default();
        let body = serde_json::to_value(c.build_request("hi", &defaults)).unwrap();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");

        let custom = CompletionOptions {
            system: Some("be brief".to_string()),
            max_tokens: Some(150),
            temperature: Some(0.7),
        };
        let body = serde_json::to_value(c.build_request("hi", &custom)).unwrap();
        assert_eq!(body["max_tokens"], 150);
        assert_eq!(body["messages"][0]["content"], "be brief");
    }

    #[test]
    fn test_debug_output_redacts_key() {
        let rendered = format!("{:?}", client(Some(SECRET)));
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(BACKOFF_BASE, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(BACKOFF_BASE, 2), Duration::from_secs(2));
    }

    #[test]
    fn test_error_message_extracts_openai_shape() {
        let body = r#"{"error":{"message":"Invalid request","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body.to_string()), "Invalid request");
        assert_eq!(error_message("plain".to_string()), "plain");
    }

    #[test]
    fn test_response_text_trims_and_rejects_empty() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"  Improved.  "}}],"usage":null}"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("Improved."));

        let empty: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert_eq!(empty.text(), None);
    }
}

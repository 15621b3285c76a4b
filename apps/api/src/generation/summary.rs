//! Summary Enhancer: best-effort rewrite of the professional summary.
//!
//! Never fails: any problem (missing key, API error, empty reply) yields the
//! raw summary back as [`Enhancement::Fallback`] with the reason attached.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::generation::prompts::{SUMMARY_MAX_TOKENS, SUMMARY_PROMPT_TEMPLATE, SUMMARY_SYSTEM};
use crate::llm_client::{Completion, CompletionOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enhancement {
    Improved(String),
    Fallback { text: String, reason: String },
}

impl Enhancement {
    pub fn text(&self) -> &str {
        match self {
            Enhancement::Improved(text) => text,
            Enhancement::Fallback { text, .. } => text,
        }
    }

    pub fn is_improved(&self) -> bool {
        matches!(self, Enhancement::Improved(_))
    }
}

#[async_trait]
pub trait SummaryEnhancer: Send + Sync {
    async fn enhance(&self, raw: &str) -> Enhancement;
}

/// Enhancer backed by the chat-completion collaborator.
pub struct LlmSummaryEnhancer {
    completion: Arc<dyn Completion>,
}

impl LlmSummaryEnhancer {
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl SummaryEnhancer for LlmSummaryEnhancer {
    async fn enhance(&self, raw: &str) -> Enhancement {
        if raw.trim().is_empty() {
            return Enhancement::Fallback {
                text: raw.to_string(),
                reason: "empty summary".to_string(),
            };
        }

        let prompt = SUMMARY_PROMPT_TEMPLATE.replace("{summary}", raw);
        let options = CompletionOptions {
            system: Some(SUMMARY_SYSTEM.to_string()),
            max_tokens: Some(SUMMARY_MAX_TOKENS),
            temperature: None,
        };

        match self.completion.complete(&prompt, &options).await {
            Ok(improved) if !improved.trim().is_empty() => {
                debug!("Summary improved ({} -> {} chars)", raw.len(), improved.len());
                Enhancement::Improved(improved.trim().to_string())
            }
            Ok(_) => {
                warn!("AI summary improve returned empty text, using original summary");
                Enhancement::Fallback {
                    text: raw.to_string(),
                    reason: "empty completion".to_string(),
                }
            }
            Err(e) => {
                warn!("AI summary improve failed, using original summary: {e}");
                Enhancement::Fallback {
                    text: raw.to_string(),
                    reason: if e.is_missing_config() {
                        "missing configuration".to_string()
                    } else {
                        e.to_string()
                    },
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::llm_client::LlmError;

    /// Completion stub returning a fixed result and counting calls.
    pub(crate) struct StubCompletion {
        pub reply: Result<String, u16>,
        pub calls: AtomicUsize,
    }

    impl StubCompletion {
        pub(crate) fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Completion for StubCompletion {
        async fn complete(
            &self,
            prompt: &str,
            options: &CompletionOptions,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(!prompt.is_empty());
            assert_eq!(options.max_tokens, Some(SUMMARY_MAX_TOKENS));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(0) => Err(LlmError::MissingApiKey),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_successful_completion_is_used() {
        let enhancer = LlmSummaryEnhancer::new(Arc::new(StubCompletion::ok("  Better summary. ")));
        let result = enhancer.enhance("I built things").await;
        assert_eq!(result, Enhancement::Improved("Better summary.".to_string()));
    }

    #[tokio::test]
    async fn test_api_failure_falls_back_to_raw() {
        let enhancer = LlmSummaryEnhancer::new(Arc::new(StubCompletion::failing(500)));
        let result = enhancer.enhance("I built <things>").await;
        assert!(!result.is_improved());
        assert_eq!(result.text(), "I built <things>");
    }

    #[tokio::test]
    async fn test_missing_key_reports_configuration_reason() {
        let enhancer = LlmSummaryEnhancer::new(Arc::new(StubCompletion::failing(0)));
        match enhancer.enhance("raw").await {
            Enhancement::Fallback { text, reason } => {
                assert_eq!(text, "raw");
                assert_eq!(reason, "missing configuration");
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_summary_skips_collaborator() {
        let stub = Arc::new(StubCompletion::ok("unused"));
        let enhancer = LlmSummaryEnhancer::new(stub.clone());
        let result = enhancer.enhance("   ").await;
        assert!(!result.is_improved());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_completion_falls_back() {
        let enhancer = LlmSummaryEnhancer::new(Arc::new(StubCompletion::ok("   ")));
        assert_eq!(enhancer.enhance("raw").await.text(), "raw");
    }
}

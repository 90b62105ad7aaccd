//! OpenAI-compatible chat completions client
//!
//! Sends `instructions` as the system message and `prompt` as the user
//! message. Transport errors, timeouts, 429 and 5xx responses are retried
//! with exponential backoff.

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::generator::{GenerationRequest, TextGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const BACKOFF_BASE_MS: u64 = 100;
const BACKOFF_MAX_MS: u64 = 10_000;

/// Delay before retry number `retry` (zero-based): 100ms * 2^retry, capped at 10s
fn backoff(retry: u32) -> Duration {
    let factor = 2u64.checked_pow(retry).unwrap_or(u64::MAX);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor).min(BACKOFF_MAX_MS))
}

/// Chat completions client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create client from configuration
    ///
    /// # Errors
    /// - `LlmError::Config` if no endpoint is configured or the HTTP client cannot be built
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let endpoint = config
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| LlmError::Config("no endpoint configured".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            http,
            url: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
            api_key: config.api_key,
            model: config.model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        })
    }

    /// Target URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send_once(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.instructions,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let mut builder = self.http.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.map_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport(&e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    fn map_transport(&self, error: &reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            LlmError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                debug!(name = %request.name, attempt, "retrying generation request");
                tokio::time::sleep(backoff(attempt - 1)).await;
            }

            match self.send_once(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    warn!(name = %request.name, attempt, error = %e, "generation request failed");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff(0), Duration::from_millis(100));
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(3), Duration::from_millis(800));
        assert_eq!(backoff(7), Duration::from_millis(10_000));
        assert_eq!(backoff(200), Duration::from_millis(10_000));
    }

    #[test]
    fn requires_endpoint() {
        let err = OpenAiClient::new(LlmConfig::new()).unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[test]
    fn builds_completions_url() {
        let client =
            OpenAiClient::new(LlmConfig::new().with_endpoint("http://localhost:9/v1/")).unwrap();
        assert_eq!(client.url(), "http://localhost:9/v1/chat/completions");
    }

    #[test]
    fn request_shape() {
        let body = ChatRequest {
            model: "m",
            messages: [
                ChatMessage { role: "system", content: "be terse" },
                ChatMessage { role: "user", content: "hi" },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let config = LlmConfig {
            max_retries: 0,
            timeout_secs: 2,
            ..LlmConfig::new().with_endpoint("http://127.0.0.1:9/v1")
        };
        let client = OpenAiClient::new(config).unwrap();
        let err = client
            .generate(GenerationRequest::new("t", "i", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Transport(_) | LlmError::Timeout { .. }));
    }
}

//! Generative service configuration

use serde::{Deserialize, Serialize};

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub endpoint: Option<String>,
    /// Bearer token
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
}

impl LlmConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration overridden by the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `TKF_LLM_*` variables, falling back to `OPENAI_*` ones
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(endpoint) = env_any(&["TKF_LLM_ENDPOINT", "OPENAI_API_ENDPOINT"]) {
            self.endpoint = Some(endpoint);
        }
        if let Some(key) = env_any(&["TKF_LLM_API_KEY", "OPENAI_API_KEY"]) {
            self.api_key = Some(key);
        }
        if let Some(model) = env_any(&["TKF_LLM_MODEL"]) {
            self.model = model;
        }
        self
    }

    /// With endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LlmConfig::new();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_secs, 60);
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn builder() {
        let config = LlmConfig::new()
            .with_endpoint("http://localhost:8080/v1")
            .with_model("local");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.model, "local");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: LlmConfig = serde_json::from_str(r#"{ "model": "gpt-4o" }"#).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_retries, 2);
    }
}

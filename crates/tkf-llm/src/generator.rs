//! The generative text service trait

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One named call to the generative service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Logical caller name (e.g. `tkf_duplicate_checker`), used for tracing and routing
    pub name: String,
    /// System-level instructions
    pub instructions: String,
    /// User prompt
    pub prompt: String,
}

impl GenerationRequest {
    /// Create new request
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            prompt: prompt.into(),
        }
    }
}

/// Generative text service
///
/// Calls have non-trivial latency and a non-zero failure rate; every call is
/// a suspension point for the caller.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation and return the raw text output
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        (**self).generate(request).await
    }
}

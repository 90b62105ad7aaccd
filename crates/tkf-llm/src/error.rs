//! Error types for generative service calls

/// Generative service errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Request never produced an HTTP response
    #[error("transport error: {0}")]
    Transport(String),

    /// Service answered with a non-success status
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Call exceeded its deadline
    #[error("request timed out after {secs}s")]
    Timeout {
        /// Deadline in seconds
        secs: u64,
    },

    /// Service answered without any text
    #[error("service returned an empty response")]
    EmptyResponse,

    /// Judge-style reply did not follow the boolean contract
    #[error("unparseable verdict: {0:?}")]
    UnparseableVerdict(String),

    /// Client is misconfigured
    #[error("configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Check if a retry may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::EmptyResponse | Self::UnparseableVerdict(_) | Self::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(LlmError::Transport("reset".into()).is_retryable());
        assert!(LlmError::Timeout { secs: 5 }.is_retryable());
        assert!(LlmError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(LlmError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(!LlmError::Status { status: 401, body: String::new() }.is_retryable());
        assert!(!LlmError::UnparseableVerdict("maybe".into()).is_retryable());
    }

    #[test]
    fn display() {
        let err = LlmError::Status { status: 500, body: "boom".into() };
        assert_eq!(err.to_string(), "service returned 500: boom");
    }
}

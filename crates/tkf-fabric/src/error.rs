//! Error types for the admission engine
//!
//! Duplicate and conflict rejections are not errors; they are reported as
//! [`AdmissionOutcome`](crate::AdmissionOutcome) values.

use tkf_llm::LlmError;

/// Admission engine errors
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// Update history reached its fixed capacity
    #[error("TKF store is full (max={max}); cannot add more updates")]
    StoreFull {
        /// Configured capacity
        max: usize,
    },

    /// A semantic check or the seed formatter failed
    #[error("semantic check failed: {0}")]
    Check(#[from] LlmError),

    /// The check phase exceeded its deadline
    #[error("semantic checks timed out after {secs}s")]
    Timeout {
        /// Deadline in seconds
        secs: u64,
    },
}

impl FabricError {
    /// Check if this is a capacity failure
    #[inline]
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::StoreFull { .. })
    }

    /// Check if resubmitting the update may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Check(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            Self::StoreFull { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(FabricError::StoreFull { max: 1 }.is_capacity());
        assert!(!FabricError::StoreFull { max: 1 }.is_retryable());
        assert!(FabricError::Timeout { secs: 1 }.is_retryable());
        assert!(!FabricError::Check(LlmError::UnparseableVerdict("?".into())).is_retryable());
        assert!(FabricError::Check(LlmError::Transport("reset".into())).is_retryable());
    }

    #[test]
    fn display() {
        let err = FabricError::StoreFull { max: 3 };
        assert!(err.to_string().contains("max=3"));
    }
}

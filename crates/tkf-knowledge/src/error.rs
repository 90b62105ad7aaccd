//! Error types for knowledge generation and persona loading

use std::path::PathBuf;
use tkf_llm::LlmError;

/// Knowledge generation errors
///
/// Validator failures are not errors; a candidate the validator cannot
/// judge is rejected.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// The generation call failed
    #[error("generation call failed: {0}")]
    Generation(#[from] LlmError),

    /// The generation reply was not a JSON array of statements
    #[error("malformed generation output: {reason}")]
    MalformedGeneration {
        /// Parser message
        reason: String,
    },

    /// An accepted statement could not be re-encoded
    #[error("failed to encode statement: {0}")]
    Encode(#[from] serde_json::Error),
}

impl KnowledgeError {
    /// Check if retrying the batch may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_retryable(),
            Self::MalformedGeneration { .. } => true,
            Self::Encode(_) => false,
        }
    }
}

/// Persona directory errors
#[derive(Debug, thiserror::Error)]
pub enum PersonaError {
    /// Directory or file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A profile is not valid persona JSON
    #[error("invalid persona profile {path}: {source}")]
    Parse {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

//! Error types for the orchestration layer
//!
//! Covers:
//! - editor sessions (malformed agent replies, step limits)
//! - run-artifact ingestion
//! - application configuration
//! - whole-run workflow failures

use std::path::PathBuf;
use tkf_events::EventLogError;
use tkf_fabric::FabricError;
use tkf_knowledge::PersonaError;
use tkf_llm::LlmError;

/// Knowledge editor errors
///
/// Admission failures are reported back to the agent as tool results and
/// never surface here.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The agent call itself failed
    #[error("editor agent call failed: {0}")]
    Llm(#[from] LlmError),

    /// The agent replied with something other than a known action
    #[error("malformed editor action: {reason}")]
    MalformedAction {
        /// Parser message
        reason: String,
    },

    /// The agent never finished
    #[error("editor did not finish within {max} steps")]
    StepLimit {
        /// Configured step budget
        max: usize,
    },
}

/// Run-artifact ingestion errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Directory or file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// `events.json` is not an array of step records
    #[error("invalid events file {path}: {source}")]
    Parse {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A step record carries a value the event model cannot hold
    #[error("invalid record in {path}: {reason}")]
    InvalidRecord {
        /// Offending path
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// The event log refused an event
    #[error("event log rejected event: {0}")]
    Log(#[from] EventLogError),
}

/// Application configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
}

/// Workflow errors
///
/// Failures inside one persona's pipeline are isolated into the run report;
/// only failures that affect the whole run surface here.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Seeding or another fabric operation failed
    #[error("fabric error: {0}")]
    Fabric(#[from] FabricError),

    /// Run artifacts could not be ingested
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    /// Persona profiles could not be loaded
    #[error("persona directory error: {0}")]
    Persona(#[from] PersonaError),

    /// Seed artifact could not be read
    #[error("failed to read seed knowledge {path}: {source}")]
    SeedIo {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

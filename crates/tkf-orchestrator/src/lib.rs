//! TKF Orchestrator - from browser runs to curated knowledge
//!
//! Wires the pipeline together:
//! - [`ingest_runs_dir`]: load browser-run artifacts into the event log
//! - [`Workflow`]: group events by persona, generate candidates, edit the TKF
//! - [`KnowledgeEditor`]: tool-using agent submitting updates to the store
//! - [`AppConfig`]: configuration of the `tkf` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use tkf_orchestrator::Workflow;
//!
//! let workflow = Workflow::new(events, store, personas, llm);
//! workflow.initialize_from_file("data/tkf_init_knowledge.json").await?;
//! for report in workflow.process_runs_dir("playwright-runs").await? {
//!     println!("{}: {} admitted", report.group_id, report.admitted());
//! }
//! ```

#![warn(unreachable_pub)]

mod config;
mod editor;
mod error;
mod ingest;
mod workflow;

pub use config::AppConfig;
pub use editor::{
    EditorAction, EditorConfig, EditorReport, KnowledgeEditor, ToolCall, DEFAULT_MAX_STEPS, EDITOR,
};
pub use error::{ConfigError, EditorError, IngestError, WorkflowError};
pub use ingest::{ingest_runs_dir, read_events_file};
pub use workflow::{
    PersonaOutcome, PersonaReport, RunReport, Workflow, GROUP_TAG, PERSONA_TAG,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

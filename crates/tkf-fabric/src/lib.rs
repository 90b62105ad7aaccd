//! TKF Fabric - the knowledge admission engine
//!
//! The Trusted Knowledge Fabric is a single knowledge text plus an ordered
//! history of every update that was attempted against it. Each submitted
//! update ends in exactly one terminal [`AdmissionOutcome`]:
//!
//! - `RejectedEmpty`: the new text is blank
//! - `Replaced`: an explicit `old_text` was found and swapped for the new text
//! - `RejectedDuplicate` / `RejectedConflict`: a semantic check flagged it
//! - `Appended`: it was added as a new paragraph
//!
//! # Consistency window
//!
//! Semantic checks call a slow generative service, so they run against a
//! snapshot taken under the lock and *without* holding it. Two concurrent
//! admissions can therefore both pass their checks against the same snapshot
//! and both append, even if they duplicate or contradict each other. Use
//! [`AdmissionMode::Serializable`] when that window is not acceptable; it
//! queues admissions behind a single writer at the cost of throughput.
//!
//! # Example
//!
//! ```rust,ignore
//! use tkf_fabric::{FabricConfig, InMemoryKnowledgeStore, KnowledgeStore};
//! use tkf_core::KnowledgeUpdate;
//!
//! let store = InMemoryKnowledgeStore::new(FabricConfig::new(), generator);
//! let outcome = store
//!     .add_update(KnowledgeUpdate::append("Users prefer short forms", "seen in 4 runs"))
//!     .await?;
//! println!("{outcome}");
//! ```

#![warn(unreachable_pub)]

mod checks;
mod config;
mod error;
mod outcome;
mod store;

pub use checks::{CheckVerdict, SemanticChecker, CONFLICT_CHECKER, DUPLICATE_CHECKER, FORMATTER};
pub use config::{AdmissionMode, FabricConfig, DEFAULT_MAX_UPDATES};
pub use error::FabricError;
pub use outcome::AdmissionOutcome;
pub use store::{InMemoryKnowledgeStore, KnowledgeStore};

/// Labels of the prompt sections the semantic checks render
pub mod sections {
    /// Current fabric content
    pub const EXISTING: &str = "Existing knowledge";
    /// Knowledge under evaluation
    pub const CANDIDATE: &str = "New knowledge to check";
    /// Seed facts to be merged
    pub const FACTS: &str = "Facts";
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

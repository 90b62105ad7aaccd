//! TKF Core - shared domain types
//!
//! Types passed between the knowledge pipeline components:
//! - [`InteractionEvent`]: one observed persona action in a browser run
//! - [`KnowledgeUpdate`]: a requested mutation of the knowledge fabric
//! - [`Persona`]: a simulated user profile
//! - [`KnowledgeStatement`]: a `{statement, reasoning}` pair
//! - [`Page`]: offset/limit pagination shared by the stores

#![warn(unreachable_pub)]

pub mod event;
pub mod page;
pub mod persona;
pub mod statement;
pub mod update;

pub use event::{BrowserAction, EventId, InteractionEvent, Sentiment};
pub use page::Page;
pub use persona::{Persona, PersonaMeta, PersonaPrompt};
pub use statement::KnowledgeStatement;
pub use update::{metadata_matches, KnowledgeUpdate, Metadata, UpdateId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

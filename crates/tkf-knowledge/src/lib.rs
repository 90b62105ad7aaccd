//! TKF Knowledge - candidate generation from persona runs
//!
//! Turns the interaction events of one persona in one run into validated,
//! reusable UX knowledge statements, and resolves persona profiles.
//!
//! # Example
//!
//! ```rust,ignore
//! use tkf_knowledge::{GeneratorConfig, KnowledgeGenerator};
//!
//! let generator = KnowledgeGenerator::new(llm, GeneratorConfig::new());
//! let statements = generator.generate(&persona, &events).await?;
//! ```

#![warn(unreachable_pub)]

mod error;
mod generator;
mod personas;

pub use error::{KnowledgeError, PersonaError};
pub use generator::{GeneratorConfig, KnowledgeGenerator, GENERATOR, VALIDATOR};
pub use personas::{InMemoryPersonaDirectory, PersonaDirectory};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

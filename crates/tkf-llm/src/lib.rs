//! TKF LLM - generative text service seam
//!
//! Everything the knowledge pipeline knows about language models goes
//! through [`TextGenerator`]: a named call with instructions and a prompt,
//! returning free text. On top of that seam this crate provides:
//! - [`PromptBuilder`]: labeled-section prompts that can be parsed back
//! - [`strip_code_fences`]: unwraps fenced model output
//! - [`parse_verdict`]: strict boolean contract for judge-style calls
//! - [`OpenAiClient`]: an OpenAI-compatible chat completions client
//!
//! # Example
//!
//! ```rust,ignore
//! use tkf_llm::{GenerationRequest, LlmConfig, OpenAiClient, TextGenerator, parse_verdict};
//!
//! let client = OpenAiClient::new(LlmConfig::from_env())?;
//! let reply = client
//!     .generate(GenerationRequest::new("judge", "Answer true or false.", "Is water wet?"))
//!     .await?;
//! let verdict = parse_verdict(&reply)?;
//! ```

#![warn(unreachable_pub)]

mod client;
mod config;
mod error;
mod generator;
mod parse;
mod prompt;

pub use client::OpenAiClient;
pub use config::LlmConfig;
pub use error::LlmError;
pub use generator::{GenerationRequest, TextGenerator};
pub use parse::{parse_verdict, strip_code_fences};
pub use prompt::{extract_section, PromptBuilder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

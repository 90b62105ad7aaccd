//! Semantic checks against the generative service
//!
//! Both checks answer a single boolean under the strict verdict contract of
//! [`tkf_llm::parse_verdict`]. A reply outside that contract is an error, and
//! the caller fails closed.

use crate::sections;
use std::sync::Arc;
use tkf_core::KnowledgeStatement;
use tkf_llm::{
    parse_verdict, strip_code_fences, GenerationRequest, LlmError, PromptBuilder, TextGenerator,
};
use tracing::debug;

/// Request name of the duplicate check
pub const DUPLICATE_CHECKER: &str = "tkf_duplicate_checker";
/// Request name of the conflict check
pub const CONFLICT_CHECKER: &str = "tkf_conflict_checker";
/// Request name of the seed formatter
pub const FORMATTER: &str = "tkf_formatter";

const VERDICT_CONTRACT: &str =
    "Reply with exactly one JSON boolean: true or false. No other text.";

/// Result of both semantic checks for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckVerdict {
    /// Candidate conveys nothing beyond existing knowledge
    pub duplicate: bool,
    /// Candidate contradicts existing knowledge
    pub conflict: bool,
}

/// Runs duplicate / conflict checks and the seed formatter
#[derive(Clone)]
pub struct SemanticChecker {
    generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for SemanticChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticChecker").finish_non_exhaustive()
    }
}

impl SemanticChecker {
    /// Create checker over a generative service
    #[inline]
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Run both checks concurrently against `existing`
    ///
    /// Blank `existing` content trivially passes both checks without any call.
    ///
    /// # Errors
    /// Returns the first failing call's error.
    pub async fn evaluate(&self, candidate: &str, existing: &str) -> Result<CheckVerdict, LlmError> {
        if existing.trim().is_empty() {
            return Ok(CheckVerdict::default());
        }

        let (duplicate, conflict) = tokio::try_join!(
            self.is_duplicate(candidate, existing),
            self.has_conflict(candidate, existing),
        )?;
        Ok(CheckVerdict {
            duplicate,
            conflict,
        })
    }

    /// Does `candidate` repeat, or form a strict subset of, `existing`?
    ///
    /// # Errors
    /// Service failure or a reply outside the verdict contract.
    pub async fn is_duplicate(&self, candidate: &str, existing: &str) -> Result<bool, LlmError> {
        if existing.trim().is_empty() {
            return Ok(false);
        }

        let instructions = format!(
            "You are a knowledge deduplication expert. {VERDICT_CONTRACT}"
        );
        let prompt = PromptBuilder::new()
            .text("Determine if the new knowledge is semantically duplicate or redundant with existing knowledge.")
            .bullets(
                "Answer true if",
                [
                    "the new knowledge conveys essentially the same information as existing knowledge",
                    "the new knowledge is a subset of existing knowledge",
                    "adding the new knowledge would be redundant",
                ],
            )
            .bullets(
                "Answer false if",
                [
                    "the new knowledge adds new information or perspective",
                    "the new knowledge is complementary but not redundant",
                    "the new knowledge provides additional detail or context",
                ],
            )
            .section(sections::EXISTING, existing)
            .section(sections::CANDIDATE, candidate)
            .build();

        let reply = self
            .generator
            .generate(GenerationRequest::new(DUPLICATE_CHECKER, instructions, prompt))
            .await?;
        let verdict = parse_verdict(&reply)?;
        debug!(duplicate = verdict, "duplicate check answered");
        Ok(verdict)
    }

    /// Does `candidate` contradict `existing`?
    ///
    /// # Errors
    /// Service failure or a reply outside the verdict contract.
    pub async fn has_conflict(&self, candidate: &str, existing: &str) -> Result<bool, LlmError> {
        if existing.trim().is_empty() {
            return Ok(false);
        }

        let instructions = format!(
            "You are a knowledge consistency validator. {VERDICT_CONTRACT}"
        );
        let prompt = PromptBuilder::new()
            .text("Determine if the new knowledge contradicts or conflicts with existing knowledge.")
            .bullets(
                "Answer true if",
                [
                    "the new knowledge directly contradicts existing knowledge",
                    "the new knowledge makes opposing claims",
                    "adding the new knowledge would create inconsistency",
                ],
            )
            .bullets(
                "Answer false if",
                [
                    "the new knowledge is consistent with existing knowledge",
                    "the new knowledge offers a different perspective without contradiction",
                    "the new knowledge can coexist with existing knowledge",
                ],
            )
            .section(sections::EXISTING, existing)
            .section(sections::CANDIDATE, candidate)
            .build();

        let reply = self
            .generator
            .generate(GenerationRequest::new(CONFLICT_CHECKER, instructions, prompt))
            .await?;
        let verdict = parse_verdict(&reply)?;
        debug!(conflict = verdict, "conflict check answered");
        Ok(verdict)
    }

    /// Merge seed facts into coherent prose
    ///
    /// # Errors
    /// Service failure or an empty reply.
    pub async fn format_facts(&self, facts: &[KnowledgeStatement]) -> Result<String, LlmError> {
        let instructions = "You are a knowledge base editor. Merge the given facts into one coherent \
            knowledge text. Preserve every fact, remove redundancy, and return only the resulting text.";
        let prompt = PromptBuilder::new()
            .bullets(
                sections::FACTS,
                facts.iter().map(|fact| {
                    if fact.reasoning.trim().is_empty() {
                        fact.statement.clone()
                    } else {
                        format!("{} (why: {})", fact.statement, fact.reasoning)
                    }
                }),
            )
            .build();

        let reply = self
            .generator
            .generate(GenerationRequest::new(FORMATTER, instructions, prompt))
            .await?;
        let text = strip_code_fences(&reply);
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

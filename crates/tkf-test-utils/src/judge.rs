//! Deterministic semantic judge

use crate::names::{CANDIDATE_SECTION, CONFLICT_CHECKER, DUPLICATE_CHECKER, EXISTING_SECTION};
use crate::ScriptedGenerator;
use std::sync::Arc;
use tkf_llm::{extract_section, GenerationRequest, LlmError};

/// Answers duplicate / conflict prompts by reading their labeled sections
///
/// - duplicate: the normalized candidate occurs in the normalized existing text
/// - conflict: the candidate carries one side of a registered contradiction
///   and the existing text carries the other
#[derive(Debug, Clone, Default)]
pub struct SemanticJudge {
    contradictions: Vec<(String, String)>,
}

impl SemanticJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register two phrases that contradict each other
    #[must_use]
    pub fn contradicting(mut self, a: &str, b: &str) -> Self {
        self.contradictions.push((normalize(a), normalize(b)));
        self
    }

    pub fn is_duplicate(&self, candidate: &str, existing: &str) -> bool {
        let candidate = normalize(candidate);
        !candidate.is_empty() && normalize(existing).contains(&candidate)
    }

    pub fn has_conflict(&self, candidate: &str, existing: &str) -> bool {
        let candidate = normalize(candidate);
        let existing = normalize(existing);
        self.contradictions.iter().any(|(a, b)| {
            (candidate.contains(a.as_str()) && existing.contains(b.as_str()))
                || (candidate.contains(b.as_str()) && existing.contains(a.as_str()))
        })
    }

    /// Register this judge for both semantic checks
    pub fn install(self, generator: ScriptedGenerator) -> ScriptedGenerator {
        let judge = Arc::new(self);
        let duplicate = judge.clone();
        generator
            .on(DUPLICATE_CHECKER, move |request| {
                let (candidate, existing) = sections(request)?;
                Ok(duplicate.is_duplicate(candidate, existing).to_string())
            })
            .on(CONFLICT_CHECKER, move |request| {
                let (candidate, existing) = sections(request)?;
                Ok(judge.has_conflict(candidate, existing).to_string())
            })
    }
}

fn sections(request: &GenerationRequest) -> Result<(&str, &str), LlmError> {
    let candidate = extract_section(&request.prompt, CANDIDATE_SECTION);
    let existing = extract_section(&request.prompt, EXISTING_SECTION);
    candidate
        .zip(existing)
        .ok_or_else(|| LlmError::Config(format!("`{}` prompt lacks sections", request.name)))
}

fn normalize(text: &str) -> String {
    text.trim().trim_end_matches('.').to_lowercase()
}

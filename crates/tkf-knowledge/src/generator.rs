//! Knowledge candidate generator
//!
//! One generation call turns a persona's events into candidate statements;
//! one validator call per candidate keeps only those worth storing. A
//! malformed generation reply fails the whole batch. A validator that fails
//! or answers outside the verdict contract rejects its candidate.

use crate::error::KnowledgeError;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tkf_core::{BrowserAction, InteractionEvent, KnowledgeStatement, Persona, Sentiment};
use tkf_llm::{parse_verdict, strip_code_fences, GenerationRequest, PromptBuilder, TextGenerator};
use tracing::{debug, info, info_span, warn, Instrument};

/// Request name of the generation call
pub const GENERATOR: &str = "knowledge_generator";
/// Request name of the per-candidate validator call
pub const VALIDATOR: &str = "knowledge_validator";

const GENERATION_INSTRUCTIONS: &str = "Take the following browser events and generate a list of \
    knowledge statements that are universal to the user experience. Use the persona's goals, \
    preferences, and pain points to generate the knowledge statements. Return only a JSON array \
    of objects with the fields \"statement\" and \"reasoning\".";

const VALIDATOR_INSTRUCTIONS: &str = "You are a UX research reviewer deciding whether a knowledge \
    statement belongs in a long-lived knowledge base. Reply with exactly one JSON boolean: true \
    or false. No other text.";

/// Generator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Run validator calls for one batch concurrently
    pub validate_concurrently: bool,
}

impl GeneratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With validator concurrency
    #[inline]
    #[must_use]
    pub fn with_validate_concurrently(mut self, concurrent: bool) -> Self {
        self.validate_concurrently = concurrent;
        self
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            validate_concurrently: true,
        }
    }
}

/// Compact event view embedded in the generation prompt
#[derive(Serialize)]
struct EventView<'a> {
    screen: &'a str,
    action: BrowserAction,
    target: &'a str,
    sentiment: Sentiment,
    reasoning: &'a str,
}

impl<'a> From<&'a InteractionEvent> for EventView<'a> {
    fn from(event: &'a InteractionEvent) -> Self {
        Self {
            screen: &event.screen_id,
            action: event.action,
            target: &event.target_selector,
            sentiment: event.sentiment,
            reasoning: &event.reasoning_text,
        }
    }
}

/// Turns persona events into validated knowledge statements
#[derive(Clone)]
pub struct KnowledgeGenerator {
    generator: Arc<dyn TextGenerator>,
    config: GeneratorConfig,
}

impl std::fmt::Debug for KnowledgeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl KnowledgeGenerator {
    /// Create generator over a generative service
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, config: GeneratorConfig) -> Self {
        Self { generator, config }
    }

    /// Generate and validate knowledge for one persona's events
    ///
    /// Returns accepted statements, each encoded as a JSON object string, in
    /// generation order.
    ///
    /// # Errors
    /// - `KnowledgeError::Generation` when the generation call fails
    /// - `KnowledgeError::MalformedGeneration` when its reply is not a JSON array
    pub async fn generate(
        &self,
        persona: &Persona,
        events: &[InteractionEvent],
    ) -> Result<Vec<String>, KnowledgeError> {
        let span = info_span!("tkf.generation", persona_id = %persona.id, events = events.len());
        async move {
            let candidates = self.candidates(persona, events).await?;
            let accepted = self.validate_all(candidates).await;
            info!(accepted = accepted.len(), "knowledge generated");
            accepted
                .iter()
                .map(KnowledgeStatement::to_json)
                .collect::<Result<Vec<_>, _>>()
                .map_err(KnowledgeError::from)
        }
        .instrument(span)
        .await
    }

    /// Unvalidated candidates from a single generation call
    ///
    /// # Errors
    /// See [`KnowledgeGenerator::generate`].
    pub async fn candidates(
        &self,
        persona: &Persona,
        events: &[InteractionEvent],
    ) -> Result<Vec<KnowledgeStatement>, KnowledgeError> {
        let prompt = generation_prompt(persona, events)?;
        let reply = self
            .generator
            .generate(GenerationRequest::new(GENERATOR, GENERATION_INSTRUCTIONS, prompt))
            .await?;

        let candidates = KnowledgeStatement::parse_list(strip_code_fences(&reply)).map_err(|e| {
            KnowledgeError::MalformedGeneration {
                reason: e.to_string(),
            }
        })?;
        debug!(candidates = candidates.len(), "generation parsed");
        Ok(candidates)
    }

    /// Ask the validator about one candidate; any failure rejects it
    pub async fn validate(&self, candidate: &KnowledgeStatement) -> bool {
        let prompt = PromptBuilder::new()
            .text("Decide whether this knowledge statement should be kept.")
            .bullets(
                "Accept only if the statement is",
                [
                    "universal: not tied to one specific UI, page or element",
                    "general: reusable across products and contexts",
                    "actionable: it can guide future design decisions",
                    "lasting: it has long-term professional value and is not ephemeral",
                ],
            )
            .section("Statement", &candidate.statement)
            .section("Reasoning", &candidate.reasoning)
            .build();

        let reply = match self
            .generator
            .generate(GenerationRequest::new(VALIDATOR, VALIDATOR_INSTRUCTIONS, prompt))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, statement = %candidate.statement, "validator failed; rejecting");
                return false;
            }
        };

        match parse_verdict(&reply) {
            Ok(accepted) => {
                debug!(accepted, statement = %candidate.statement, "validator answered");
                accepted
            }
            Err(e) => {
                warn!(error = %e, statement = %candidate.statement, "validator reply unusable; rejecting");
                false
            }
        }
    }

    async fn validate_all(&self, candidates: Vec<KnowledgeStatement>) -> Vec<KnowledgeStatement> {
        let verdicts = if self.config.validate_concurrently {
            join_all(candidates.iter().map(|candidate| self.validate(candidate))).await
        } else {
            let mut verdicts = Vec::with_capacity(candidates.len());
            for candidate in &candidates {
                verdicts.push(self.validate(candidate).await);
            }
            verdicts
        };

        candidates
            .into_iter()
            .zip(verdicts)
            .filter_map(|(candidate, accepted)| accepted.then_some(candidate))
            .collect()
    }
}

fn generation_prompt(persona: &Persona, events: &[InteractionEvent]) -> Result<String, KnowledgeError> {
    let events: Vec<EventView<'_>> = events.iter().map(EventView::from).collect();
    let events = serde_json::to_string_pretty(&events)?;
    let pain_points = serde_json::to_string(&persona.behavior)?;

    Ok(PromptBuilder::new()
        .text("Generate universal UX knowledge statements based on these events and the persona's characteristics.")
        .section("Persona", &persona.display_name)
        .section("Description", &persona.description)
        .bullets("Goals", persona.goals())
        .section("Pain Points", pain_points)
        .section("Browser Events", events)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tkf_llm::{extract_section, LlmError};
    use tkf_test_utils::{generation_reply, names, sample_events, sample_persona, ScriptedGenerator};

    #[test]
    fn request_names_match_test_doubles() {
        assert_eq!(GENERATOR, names::GENERATOR);
        assert_eq!(VALIDATOR, names::VALIDATOR);
    }

    fn generator(scripted: ScriptedGenerator) -> (KnowledgeGenerator, Arc<ScriptedGenerator>) {
        let scripted = Arc::new(scripted);
        (
            KnowledgeGenerator::new(scripted.clone(), GeneratorConfig::new()),
            scripted,
        )
    }

    #[test]
    fn prompt_carries_persona_and_events() {
        let persona = sample_persona("pm");
        let prompt = generation_prompt(&persona, &sample_events("pm", "g1", 2)).unwrap();

        assert_eq!(extract_section(&prompt, "Persona"), Some("Persona pm"));
        assert_eq!(extract_section(&prompt, "Goals"), Some("- Finish onboarding quickly"));
        assert!(extract_section(&prompt, "Pain Points").unwrap().contains("patienceLevel"));
        let events = extract_section(&prompt, "Browser Events").unwrap();
        assert!(events.contains("button#continue"));
        assert!(events.contains("step-1"));
    }

    #[tokio::test]
    async fn keeps_only_accepted_candidates_in_order() {
        let (generator, scripted) = generator(
            ScriptedGenerator::new()
                .reply(
                    GENERATOR,
                    format!(
                        "```json\n{}\n```",
                        generation_reply(&[
                            ("Users skim long forms", "confusion on step 3"),
                            ("The blue button on /signup is small", "one page"),
                            ("Progress indicators reduce drop-off", "relief at the end"),
                        ])
                    ),
                )
                .on(VALIDATOR, |request| {
                    let statement = extract_section(&request.prompt, "Statement").unwrap_or_default();
                    Ok((!statement.contains("/signup")).to_string())
                }),
        );

        let accepted = generator
            .generate(&sample_persona("pm"), &sample_events("pm", "g1", 3))
            .await
            .unwrap();

        let statements: Vec<KnowledgeStatement> = accepted
            .iter()
            .map(|json| serde_json::from_str(json).unwrap())
            .collect();
        assert_eq!(
            statements,
            vec![
                KnowledgeStatement::new("Users skim long forms", "confusion on step 3"),
                KnowledgeStatement::new("Progress indicators reduce drop-off", "relief at the end"),
            ]
        );
        assert_eq!(scripted.calls_named(VALIDATOR).len(), 3);
    }

    #[tokio::test]
    async fn malformed_generation_fails_the_batch() {
        let (generator, scripted) = generator(
            ScriptedGenerator::new().reply(GENERATOR, "Here are some insights: users skim."),
        );

        let err = generator
            .generate(&sample_persona("pm"), &sample_events("pm", "g1", 1))
            .await
            .unwrap_err();

        assert!(matches!(err, KnowledgeError::MalformedGeneration { .. }));
        assert!(scripted.calls_named(VALIDATOR).is_empty());
    }

    #[tokio::test]
    async fn validator_failures_reject() {
        let (generator, _) = generator(
            ScriptedGenerator::new()
                .reply(GENERATOR, generation_reply(&[("A", "a"), ("B", "b")]))
                .on(VALIDATOR, |request| {
                    match extract_section(&request.prompt, "Statement") {
                        Some("A") => Err(LlmError::Timeout { secs: 1 }),
                        _ => Ok("yes, true".to_string()),
                    }
                }),
        );

        let accepted = generator
            .generate(&sample_persona("pm"), &sample_events("pm", "g1", 1))
            .await
            .unwrap();
        assert!(accepted.is_empty());
    }

    #[tokio::test]
    async fn sequential_validation_matches_concurrent() {
        let scripted = Arc::new(
            ScriptedGenerator::new()
                .reply(GENERATOR, generation_reply(&[("A", "a"), ("B", "b")]))
                .replies(VALIDATOR, ["true", "false"]),
        );
        let generator = KnowledgeGenerator::new(
            scripted.clone(),
            GeneratorConfig::new().with_validate_concurrently(false),
        );

        let accepted = generator
            .generate(&sample_persona("pm"), &sample_events("pm", "g1", 1))
            .await
            .unwrap();
        assert_eq!(accepted, vec![r#"{"statement":"A","reasoning":"a"}"#.to_string()]);
    }

    #[tokio::test]
    async fn empty_array_is_valid() {
        let (generator, scripted) = generator(ScriptedGenerator::new().reply(GENERATOR, "[]"));

        let accepted = generator
            .generate(&sample_persona("pm"), &[])
            .await
            .unwrap();
        assert!(accepted.is_empty());
        assert_eq!(scripted.call_count(), 1);
    }
}

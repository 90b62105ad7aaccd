//! Testing utilities for the TKF workspace
//!
//! Shared test doubles and fixtures:
//! - [`ScriptedGenerator`]: a [`TextGenerator`] answering by request name
//! - [`SemanticJudge`]: deterministic duplicate / conflict verdicts
//! - persona, event and statement fixtures

#![allow(missing_docs)]

mod judge;
mod scripted;

pub use judge::SemanticJudge;
pub use scripted::ScriptedGenerator;

use tkf_core::{BrowserAction, InteractionEvent, KnowledgeStatement, Persona, Sentiment};

/// Request names and prompt labels used across the pipeline
///
/// Kept as literals: the crates that own them dev-depend on this one. Each
/// owner asserts its constants equal these in its own tests.
pub mod names {
    pub const DUPLICATE_CHECKER: &str = "tkf_duplicate_checker";
    pub const CONFLICT_CHECKER: &str = "tkf_conflict_checker";
    pub const FORMATTER: &str = "tkf_formatter";
    pub const GENERATOR: &str = "knowledge_generator";
    pub const VALIDATOR: &str = "knowledge_validator";
    pub const EDITOR: &str = "tkf_editor";

    /// Section holding the current fabric content in a semantic check
    pub const EXISTING_SECTION: &str = "Existing knowledge";
    /// Section holding the candidate in a semantic check
    pub const CANDIDATE_SECTION: &str = "New knowledge to check";
}

pub fn sample_persona(id: &str) -> Persona {
    Persona::new(id, format!("Persona {id}"))
        .with_description("Busy professional evaluating a SaaS product")
        .with_rule("Finish onboarding quickly")
        .with_trait("patienceLevel", "low")
        .with_trait("readingStyle", "skim")
}

pub fn sample_event(persona_id: &str, group_id: &str) -> InteractionEvent {
    InteractionEvent::new(
        format!("run-{persona_id}"),
        persona_id,
        group_id,
        BrowserAction::Click,
        Sentiment::Confused,
    )
    .with_screen("signup")
    .with_reasoning("The continue button is hard to find")
    .with_target("button#continue")
}

/// `n` events for one persona in one group
pub fn sample_events(persona_id: &str, group_id: &str, n: usize) -> Vec<InteractionEvent> {
    (0..n)
        .map(|i| sample_event(persona_id, group_id).with_screen(format!("step-{i}")))
        .collect()
}

/// JSON array reply for the knowledge generator
pub fn generation_reply(statements: &[(&str, &str)]) -> String {
    let list: Vec<KnowledgeStatement> = statements
        .iter()
        .map(|(statement, reasoning)| KnowledgeStatement::new(*statement, *reasoning))
        .collect();
    serde_json::to_string(&list).unwrap()
}

/// Editor reply submitting one append
pub fn update_action(new_text: &str, reasoning: &str) -> String {
    serde_json::json!({
        "action": "update_tkf",
        "new_text": new_text,
        "reasoning": reasoning,
    })
    .to_string()
}

/// Editor reply ending the session
pub fn finish_action(message: &str) -> String {
    serde_json::json!({ "action": "finish", "message": message }).to_string()
}

/// Generator wired with a judge for both semantic checks
pub fn judged_generator(judge: SemanticJudge) -> ScriptedGenerator {
    judge.install(ScriptedGenerator::new())
}

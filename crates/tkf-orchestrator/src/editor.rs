//! Knowledge editor agent
//!
//! A bounded tool-use loop. Each step asks the generative service for one
//! JSON action, runs it against the [`KnowledgeStore`] and feeds the result
//! back in the next prompt. The store does its own duplicate and conflict
//! checks; the editor only decides what to submit and how to phrase it.

use crate::error::EditorError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tkf_core::{KnowledgeUpdate, Metadata};
use tkf_fabric::{AdmissionOutcome, KnowledgeStore};
use tkf_llm::{strip_code_fences, GenerationRequest, PromptBuilder, TextGenerator};
use tracing::{debug, info, info_span, warn, Instrument};

/// Request name of the editor agent call
pub const EDITOR: &str = "tkf_editor";

/// Default step budget of one editor session
pub const DEFAULT_MAX_STEPS: usize = 8;

const POLICY: &str = "You are a knowledge base editor agent. You are responsible for updating the \
knowledge base with the given information.
Perform the following steps:
- Check the new information against the current TKF content and decide if it should be added.
- In case of conflict between the new information and the current TKF, ALWAYS rely on the current TKF content.
- Update the TKF with the given information using the update_tkf tool.
Rules for update_tkf:
- new_text contains ONLY the new knowledge to add, never the entire TKF.
- old_text is empty unless you are explicitly replacing existing text.
- reasoning must explain why the knowledge belongs in the TKF.
- The store appends new content and rejects duplicates and conflicts on its own.
NEVER ask clarifying questions. ONLY use the tools.";

const PROTOCOL: &str = "Reply with exactly one JSON object and no other text:
{\"action\": \"get_tkf\"}
{\"action\": \"update_tkf\", \"new_text\": \"...\", \"reasoning\": \"...\", \"old_text\": \"\"}
{\"action\": \"finish\", \"message\": \"...\"}";

/// One action requested by the editor agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    /// Read the current TKF content
    GetTkf,
    /// Submit an update
    UpdateTkf {
        /// Knowledge to add, or the replacement text
        new_text: String,
        /// Why it belongs in the TKF
        reasoning: String,
        /// Text to replace; empty appends
        #[serde(default)]
        old_text: String,
    },
    /// End the session
    Finish {
        /// Final message to the caller
        #[serde(default)]
        message: String,
    },
}

impl EditorAction {
    /// Parse one agent reply, tolerating a code fence around it
    ///
    /// # Errors
    /// `EditorError::MalformedAction` when the reply is not a known action.
    pub fn parse(reply: &str) -> Result<Self, EditorError> {
        serde_json::from_str(strip_code_fences(reply)).map_err(|e| EditorError::MalformedAction {
            reason: e.to_string(),
        })
    }
}

/// A tool invocation and what the agent was told
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCall {
    /// Requested action
    pub action: EditorAction,
    /// Admission outcome, for accepted `update_tkf` calls
    pub outcome: Option<AdmissionOutcome>,
    /// Result text fed back to the agent
    pub result: String,
}

/// Result of one editor session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditorReport {
    /// The agent's final message
    pub message: String,
    /// Every tool invocation, in order
    pub calls: Vec<ToolCall>,
}

impl EditorReport {
    /// Admission outcomes of the session's updates
    #[must_use]
    pub fn outcomes(&self) -> Vec<AdmissionOutcome> {
        self.calls.iter().filter_map(|call| call.outcome).collect()
    }

    /// Number of updates that changed the TKF
    #[must_use]
    pub fn admitted(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| call.outcome.is_some_and(|o| o.is_admitted()))
            .count()
    }
}

/// Editor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum agent calls per session
    pub max_steps: usize,
}

impl EditorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With step budget
    #[inline]
    #[must_use]
    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Tool-using agent that submits knowledge to a [`KnowledgeStore`]
#[derive(Clone)]
pub struct KnowledgeEditor {
    llm: Arc<dyn TextGenerator>,
    store: Arc<dyn KnowledgeStore>,
    config: EditorConfig,
    metadata: Metadata,
}

impl std::fmt::Debug for KnowledgeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeEditor")
            .field("config", &self.config)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl KnowledgeEditor {
    /// Create editor over a generative service and a store
    #[must_use]
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        store: Arc<dyn KnowledgeStore>,
        config: EditorConfig,
    ) -> Self {
        Self {
            llm,
            store,
            config,
            metadata: Metadata::new(),
        }
    }

    /// With one metadata tag attached to every submitted update
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Run one session over `input`
    ///
    /// # Errors
    /// - `EditorError::Llm` when an agent call fails
    /// - `EditorError::MalformedAction` when the agent replies outside the protocol
    /// - `EditorError::StepLimit` when the agent does not finish in time
    pub async fn run(&self, input: &str) -> Result<EditorReport, EditorError> {
        let span = info_span!("tkf.editor", tags = ?self.metadata);
        async move {
            let content = self.store.full_content().await;
            let instructions = PromptBuilder::new()
                .text(POLICY)
                .section("Tool protocol", PROTOCOL)
                .section("Current TKF content", content)
                .build();

            let mut report = EditorReport::default();
            for step in 0..self.config.max_steps {
                let prompt = transcript(input, &report.calls);
                let reply = self
                    .llm
                    .generate(GenerationRequest::new(EDITOR, instructions.as_str(), prompt))
                    .await?;
                let action = EditorAction::parse(&reply)?;
                debug!(step, ?action, "editor action");

                if let EditorAction::Finish { message } = action {
                    info!(
                        steps = step + 1,
                        admitted = report.admitted(),
                        "editor finished"
                    );
                    report.message = message;
                    return Ok(report);
                }

                let call = self.dispatch(action).await;
                report.calls.push(call);
            }

            warn!(max = self.config.max_steps, "editor ran out of steps");
            Err(EditorError::StepLimit {
                max: self.config.max_steps,
            })
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, action: EditorAction) -> ToolCall {
        match &action {
            EditorAction::GetTkf => {
                let result = self.store.full_content().await;
                ToolCall {
                    action,
                    outcome: None,
                    result,
                }
            }
            EditorAction::UpdateTkf {
                new_text,
                reasoning,
                old_text,
            } => {
                if reasoning.trim().is_empty() {
                    return ToolCall {
                        action,
                        outcome: None,
                        result: "error: reasoning must not be empty".to_string(),
                    };
                }

                let update = KnowledgeUpdate::replace(old_text.as_str(), new_text.as_str(), reasoning.as_str())
                    .with_metadata(&self.metadata);
                match self.store.add_update(update).await {
                    Ok(outcome) => ToolCall {
                        action,
                        outcome: Some(outcome),
                        result: outcome.to_string(),
                    },
                    Err(e) => {
                        warn!(error = %e, "update_tkf failed");
                        ToolCall {
                            action,
                            outcome: None,
                            result: format!("error: {e}"),
                        }
                    }
                }
            }
            EditorAction::Finish { .. } => ToolCall {
                action,
                outcome: None,
                result: String::new(),
            },
        }
    }
}

/// Prompt for the next step: the input plus every tool call so far
fn transcript(input: &str, calls: &[ToolCall]) -> String {
    let mut prompt = PromptBuilder::new().section("New information", input);
    if !calls.is_empty() {
        let history = calls
            .iter()
            .map(|call| {
                let action = serde_json::to_string(&call.action).unwrap_or_default();
                format!("{action}\n=> {}", call.result)
            })
            .collect::<Vec<_>>()
            .join("\n");
        prompt = prompt.section("Tool results", history);
    }
    prompt.build()
}

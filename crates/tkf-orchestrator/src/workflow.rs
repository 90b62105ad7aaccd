//! Run workflow
//!
//! One run (group) flows through three stages:
//! 1. its events are grouped by persona, in first-appearance order
//! 2. each persona's events go through the candidate generator, concurrently
//! 3. each persona's accepted statements go to a knowledge editor session
//!
//! A failure in one persona's pipeline is recorded in the [`RunReport`] and
//! does not stop its siblings.

use crate::editor::{EditorConfig, EditorReport, KnowledgeEditor};
use crate::error::WorkflowError;
use crate::ingest::ingest_runs_dir;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tkf_core::InteractionEvent;
use tkf_events::EventRepository;
use tkf_fabric::KnowledgeStore;
use tkf_knowledge::{GeneratorConfig, KnowledgeGenerator, PersonaDirectory};
use tkf_llm::TextGenerator;
use tracing::{error, info, info_span, warn, Instrument};

/// Metadata key tagging updates with their run
pub const GROUP_TAG: &str = "group_id";
/// Metadata key tagging updates with their persona
pub const PERSONA_TAG: &str = "persona_id";

/// What happened to one persona within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersonaOutcome {
    /// Statements were handed to an editor session
    Edited {
        /// Accepted statements
        statements: usize,
        /// The editor session
        report: EditorReport,
    },
    /// The generator accepted nothing
    NoKnowledge,
    /// Persona id not in the directory
    UnknownPersona,
    /// Generation or editing failed
    Failed {
        /// Error text
        error: String,
    },
}

/// Per-persona line of a run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonaReport {
    /// Persona id
    pub persona_id: String,
    /// Events the persona produced in this run
    pub events: usize,
    /// Result
    pub outcome: PersonaOutcome,
}

/// Result of processing one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Run / group id
    pub group_id: String,
    /// One line per persona, in first-appearance order
    pub personas: Vec<PersonaReport>,
}

impl RunReport {
    /// Updates admitted into the TKF during this run
    #[must_use]
    pub fn admitted(&self) -> usize {
        self.personas
            .iter()
            .map(|p| match &p.outcome {
                PersonaOutcome::Edited { report, .. } => report.admitted(),
                _ => 0,
            })
            .sum()
    }

    /// Personas whose pipeline failed
    #[must_use]
    pub fn failures(&self) -> usize {
        self.personas
            .iter()
            .filter(|p| matches!(p.outcome, PersonaOutcome::Failed { .. }))
            .count()
    }
}

/// The knowledge pipeline over shared stores
#[derive(Clone)]
pub struct Workflow {
    events: Arc<dyn EventRepository>,
    store: Arc<dyn KnowledgeStore>,
    personas: Arc<dyn PersonaDirectory>,
    llm: Arc<dyn TextGenerator>,
    generator: KnowledgeGenerator,
    editor_config: EditorConfig,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("generator", &self.generator)
            .field("editor_config", &self.editor_config)
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// Create workflow with default generator and editor settings
    #[must_use]
    pub fn new(
        events: Arc<dyn EventRepository>,
        store: Arc<dyn KnowledgeStore>,
        personas: Arc<dyn PersonaDirectory>,
        llm: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            generator: KnowledgeGenerator::new(llm.clone(), GeneratorConfig::default()),
            events,
            store,
            personas,
            llm,
            editor_config: EditorConfig::default(),
        }
    }

    /// With generator settings
    #[must_use]
    pub fn with_generator_config(mut self, config: GeneratorConfig) -> Self {
        self.generator = KnowledgeGenerator::new(self.llm.clone(), config);
        self
    }

    /// With editor settings
    #[inline]
    #[must_use]
    pub fn with_editor_config(mut self, config: EditorConfig) -> Self {
        self.editor_config = config;
        self
    }

    /// Knowledge store the workflow writes to
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    /// Seed the TKF from the initial-knowledge artifact
    ///
    /// # Errors
    /// `WorkflowError::Fabric` when the seed formatter fails.
    pub async fn initialize(&self, raw: &str) -> Result<(), WorkflowError> {
        self.store.seed(raw).await?;
        Ok(())
    }

    /// Seed the TKF from an artifact file
    ///
    /// # Errors
    /// - `WorkflowError::SeedIo` when the file cannot be read
    /// - `WorkflowError::Fabric` when the seed formatter fails
    pub async fn initialize_from_file(&self, path: impl AsRef<Path>) -> Result<(), WorkflowError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| WorkflowError::SeedIo {
                path: path.to_path_buf(),
                source,
            })?;
        self.initialize(&raw).await
    }

    /// Turn one run's events into TKF updates
    ///
    /// # Errors
    /// Never fails for per-persona problems; those land in the report.
    pub async fn process_run(&self, group_id: &str) -> Result<RunReport, WorkflowError> {
        let span = info_span!("tkf.workflow.run", group_id);
        async move {
            let by_persona = group_by_persona(self.events.events_by_group(group_id).await);
            info!(personas = by_persona.len(), "processing run");

            let generated = join_all(by_persona.iter().map(|(persona_id, events)| async move {
                match self.personas.get(persona_id) {
                    Some(persona) => Some(self.generator.generate(&persona, events).await),
                    None => None,
                }
            }))
            .await;

            let mut personas = Vec::with_capacity(by_persona.len());
            for ((persona_id, events), generated) in by_persona.iter().zip(generated) {
                let outcome = match generated {
                    None => {
                        warn!(persona_id = %persona_id, "persona not found; skipped");
                        PersonaOutcome::UnknownPersona
                    }
                    Some(Err(e)) => {
                        error!(persona_id = %persona_id, error = %e, "knowledge generation failed");
                        PersonaOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                    Some(Ok(statements)) if statements.is_empty() => PersonaOutcome::NoKnowledge,
                    Some(Ok(statements)) => self.edit(group_id, persona_id, &statements).await,
                };
                personas.push(PersonaReport {
                    persona_id: persona_id.clone(),
                    events: events.len(),
                    outcome,
                });
            }

            let report = RunReport {
                group_id: group_id.to_string(),
                personas,
            };
            info!(
                admitted = report.admitted(),
                failures = report.failures(),
                "run processed"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Ingest every run under `runs_dir` and process each discovered group
    ///
    /// # Errors
    /// `WorkflowError::Ingest` when the runs cannot be loaded.
    pub async fn process_runs_dir(
        &self,
        runs_dir: impl AsRef<Path>,
    ) -> Result<Vec<RunReport>, WorkflowError> {
        let groups = ingest_runs_dir(runs_dir, self.events.as_ref()).await?;
        let mut reports = Vec::with_capacity(groups.len());
        for group_id in &groups {
            reports.push(self.process_run(group_id).await?);
        }
        Ok(reports)
    }

    async fn edit(&self, group_id: &str, persona_id: &str, statements: &[String]) -> PersonaOutcome {
        let editor = KnowledgeEditor::new(self.llm.clone(), self.store.clone(), self.editor_config)
            .with_tag(GROUP_TAG, group_id)
            .with_tag(PERSONA_TAG, persona_id);

        match editor.run(&statements.join("\n")).await {
            Ok(report) => PersonaOutcome::Edited {
                statements: statements.len(),
                report,
            },
            Err(e) => {
                error!(persona_id = %persona_id, error = %e, "editor session failed");
                PersonaOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Events keyed by persona, in first-appearance order
fn group_by_persona(events: Vec<InteractionEvent>) -> IndexMap<String, Vec<InteractionEvent>> {
    let mut grouped: IndexMap<String, Vec<InteractionEvent>> = IndexMap::new();
    for event in events {
        grouped.entry(event.persona_id.clone()).or_default().push(event);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tkf_test_utils::sample_event;

    #[test]
    fn groups_in_first_appearance_order() {
        let events = vec![
            sample_event("dev", "g1").with_screen("1"),
            sample_event("pm", "g1").with_screen("2"),
            sample_event("dev", "g1").with_screen("3"),
        ];

        let grouped = group_by_persona(events);
        let order: Vec<&str> = grouped.keys().map(String::as_str).collect();
        assert_eq!(order, ["dev", "pm"]);

        let screens: Vec<&str> = grouped["dev"].iter().map(|e| e.screen_id.as_str()).collect();
        assert_eq!(screens, ["1", "3"]);
    }

    #[test]
    fn report_counts() {
        let report = RunReport {
            group_id: "g1".into(),
            personas: vec![
                PersonaReport {
                    persona_id: "pm".into(),
                    events: 2,
                    outcome: PersonaOutcome::Failed {
                        error: "boom".into(),
                    },
                },
                PersonaReport {
                    persona_id: "dev".into(),
                    events: 1,
                    outcome: PersonaOutcome::NoKnowledge,
                },
            ],
        };
        assert_eq!(report.failures(), 1);
        assert_eq!(report.admitted(), 0);
    }
}

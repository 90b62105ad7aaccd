//! The knowledge store and its admission algorithm
//!
//! `add_update` locks, records the attempt, handles the cheap paths (blank
//! text, explicit replacement) and snapshots the content. The semantic
//! checks then run unlocked against that snapshot. If both pass, the lock is
//! taken again and the new text is appended to the content as it is *now*,
//! which may already include admissions decided in the meantime.

use crate::checks::SemanticChecker;
use crate::config::{AdmissionMode, FabricConfig};
use crate::error::FabricError;
use crate::outcome::AdmissionOutcome;
use async_trait::async_trait;
use std::sync::Arc;
use tkf_core::{metadata_matches, KnowledgeStatement, KnowledgeUpdate, Metadata, Page};
use tkf_llm::TextGenerator;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, info_span, warn, Instrument};

/// Knowledge store capability
///
/// Consumers (the editor agent, the workflow) depend on this trait only.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Submit an update and wait for its terminal outcome
    ///
    /// The attempt is recorded in the history before any decision is made.
    ///
    /// # Errors
    /// - `FabricError::StoreFull` when the history is at capacity
    /// - `FabricError::Check` / `FabricError::Timeout` when the semantic checks
    ///   fail; the attempt stays recorded and the content is untouched
    async fn add_update(&self, update: KnowledgeUpdate) -> Result<AdmissionOutcome, FabricError>;

    /// Current full knowledge text
    async fn full_content(&self) -> String;

    /// Page through the update history in submission order
    async fn updates(&self, offset: usize, limit: usize) -> Page<KnowledgeUpdate>;

    /// Every recorded update whose metadata carries all pairs of `filter`
    async fn updates_by_metadata(&self, filter: &Metadata) -> Vec<KnowledgeUpdate>;

    /// Establish baseline content and clear the history
    ///
    /// `raw` is either ready-made content or a JSON array of
    /// `{statement, reasoning}` facts, which is merged into prose first. In
    /// `Serializable` mode it waits for admissions in flight.
    ///
    /// # Errors
    /// - `FabricError::Check` when the fact formatter fails
    async fn seed(&self, raw: &str) -> Result<(), FabricError>;
}

#[derive(Debug, Default)]
struct FabricState {
    full_content: String,
    updates: Vec<KnowledgeUpdate>,
}

/// What the locked phase decided
enum Admission {
    Decided(AdmissionOutcome),
    Check { candidate: String, snapshot: String },
}

/// In-memory [`KnowledgeStore`]
pub struct InMemoryKnowledgeStore {
    config: FabricConfig,
    checker: SemanticChecker,
    state: Mutex<FabricState>,
    /// Held for a whole admission in `Serializable` mode; tokio's mutex is FIFO
    writer: Mutex<()>,
}

impl std::fmt::Debug for InMemoryKnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKnowledgeStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl InMemoryKnowledgeStore {
    /// Create empty store
    #[must_use]
    pub fn new(config: FabricConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config,
            checker: SemanticChecker::new(generator),
            state: Mutex::new(FabricState::default()),
            writer: Mutex::new(()),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    /// Number of recorded attempts
    pub async fn update_count(&self) -> usize {
        self.state.lock().await.updates.len()
    }

    /// Writer gate guard in `Serializable` mode
    async fn gate(&self) -> Option<MutexGuard<'_, ()>> {
        match self.config.admission_mode {
            AdmissionMode::Serializable => Some(self.writer.lock().await),
            AdmissionMode::Concurrent => None,
        }
    }

    async fn admit(&self, update: KnowledgeUpdate) -> Result<AdmissionOutcome, FabricError> {
        let (candidate, snapshot) = match self.record_and_decide(update).await? {
            Admission::Decided(outcome) => return Ok(outcome),
            Admission::Check {
                candidate,
                snapshot,
            } => (candidate, snapshot),
        };

        // Unlocked: concurrent admissions may decide against the same snapshot.
        let checks = self.checker.evaluate(&candidate, &snapshot);
        let verdict = match self.config.check_timeout() {
            Some(deadline) => tokio::time::timeout(deadline, checks)
                .await
                .map_err(|_| FabricError::Timeout {
                    secs: deadline.as_secs(),
                })??,
            None => checks.await?,
        };

        if verdict.duplicate {
            debug!(conflict = verdict.conflict, "duplicate takes precedence");
            return Ok(AdmissionOutcome::RejectedDuplicate);
        }
        if verdict.conflict {
            return Ok(AdmissionOutcome::RejectedConflict);
        }

        let mut state = self.state.lock().await;
        append_paragraph(&mut state.full_content, &candidate);
        Ok(AdmissionOutcome::Appended)
    }

    /// Locked phase of an admission
    async fn record_and_decide(&self, update: KnowledgeUpdate) -> Result<Admission, FabricError> {
        let mut state = self.state.lock().await;

        if state.updates.len() >= self.config.max_updates {
            return Err(FabricError::StoreFull {
                max: self.config.max_updates,
            });
        }

        let candidate = update.new_text.trim().to_string();
        let old_text = update.old_text.trim().to_string();
        state.updates.push(update);

        if candidate.is_empty() {
            return Ok(Admission::Decided(AdmissionOutcome::RejectedEmpty));
        }

        if !old_text.is_empty() && state.full_content.contains(&old_text) {
            state.full_content = state.full_content.replacen(&old_text, &candidate, 1);
            return Ok(Admission::Decided(AdmissionOutcome::Replaced));
        }

        Ok(Admission::Check {
            candidate,
            snapshot: state.full_content.clone(),
        })
    }
}

/// Append `text` as a new paragraph, or make it the whole content if blank
fn append_paragraph(content: &mut String, text: &str) {
    let kept = content.trim_end().len();
    content.truncate(kept);
    if content.trim().is_empty() {
        content.clear();
    } else {
        content.push_str("\n\n");
    }
    content.push_str(text);
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn add_update(&self, update: KnowledgeUpdate) -> Result<AdmissionOutcome, FabricError> {
        let span = info_span!("tkf.admission", update_id = %update.id);
        async move {
            let _writer = self.gate().await;

            let result = self.admit(update).await;
            match &result {
                Ok(outcome) => info!(%outcome, "admission decided"),
                Err(e) => warn!(error = %e, "admission failed; content untouched"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn full_content(&self) -> String {
        self.state.lock().await.full_content.clone()
    }

    async fn updates(&self, offset: usize, limit: usize) -> Page<KnowledgeUpdate> {
        let state = self.state.lock().await;
        Page::slice(&state.updates, offset, limit)
    }

    async fn updates_by_metadata(&self, filter: &Metadata) -> Vec<KnowledgeUpdate> {
        let state = self.state.lock().await;
        state
            .updates
            .iter()
            .filter(|update| metadata_matches(&update.metadata, filter))
            .cloned()
            .collect()
    }

    async fn seed(&self, raw: &str) -> Result<(), FabricError> {
        // A new baseline must not land between an admission's check and its append.
        let _writer = self.gate().await;

        let content = match KnowledgeStatement::parse_list(raw) {
            Ok(facts) if facts.is_empty() => String::new(),
            Ok(facts) => {
                info!(facts = facts.len(), "formatting seed facts");
                self.checker.format_facts(&facts).await?
            }
            Err(_) => raw.trim().to_string(),
        };

        let mut state = self.state.lock().await;
        state.full_content = content;
        state.updates.clear();
        info!(bytes = state.full_content.len(), "fabric seeded");
        Ok(())
    }
}

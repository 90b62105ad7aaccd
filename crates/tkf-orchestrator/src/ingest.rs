//! Browser-run artifact ingestion
//!
//! A runs directory holds one sub-directory per browser run, each with an
//! `events.json` array of step records written by the automation driver.

use crate::error::IngestError;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tkf_core::{BrowserAction, EventId, InteractionEvent, Sentiment};
use tkf_events::EventRepository;
use tracing::{debug, info};

/// One step record as written by the automation driver
#[derive(Debug, Deserialize)]
struct StepRecord {
    run_id: String,
    persona_id: String,
    run_group_id: String,
    /// Unix seconds, fractional
    timestamp: f64,
    status: String,
    #[serde(default)]
    screen_id: Option<String>,
    #[serde(default)]
    reasoning_text: String,
    action: String,
    #[serde(default)]
    target_selector: String,
}

impl StepRecord {
    fn into_event(self, path: &Path) -> Result<InteractionEvent, IngestError> {
        let invalid = |reason: String| IngestError::InvalidRecord {
            path: path.to_path_buf(),
            reason,
        };

        let action: BrowserAction = parse_label(&self.action)
            .ok_or_else(|| invalid(format!("unknown action `{}`", self.action)))?;
        let sentiment: Sentiment = parse_label(&self.status)
            .ok_or_else(|| invalid(format!("unknown status `{}`", self.status)))?;
        let created_at = timestamp(self.timestamp)
            .ok_or_else(|| invalid(format!("timestamp {} out of range", self.timestamp)))?;

        Ok(InteractionEvent {
            id: EventId::new(),
            session_id: self.run_id,
            persona_id: self.persona_id,
            group_id: self.run_group_id,
            created_at,
            sentiment,
            screen_id: self.screen_id.unwrap_or_default(),
            reasoning_text: self.reasoning_text,
            action,
            target_selector: self.target_selector,
        })
    }
}

/// Case-insensitive enum label, e.g. `CLICK` or `confused`
fn parse_label<T: serde::de::DeserializeOwned>(label: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(label.trim().to_lowercase())).ok()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn timestamp(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Read one `events.json` file
///
/// # Errors
/// Returns `IngestError` when the file is unreadable or a record is invalid.
pub fn read_events_file(path: &Path) -> Result<Vec<InteractionEvent>, IngestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<StepRecord> =
        serde_json::from_str(&raw).map_err(|source| IngestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    records
        .into_iter()
        .map(|record| record.into_event(path))
        .collect()
}

/// Paths of every `<run>/events.json` under `runs_dir`, sorted
fn events_files(runs_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_err = |source| IngestError::Io {
        path: runs_dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(runs_dir).map_err(io_err)? {
        let dir = entry.map_err(io_err)?.path();
        if !dir.is_dir() {
            continue;
        }
        let file = dir.join("events.json");
        if file.is_file() {
            files.push(file);
        } else {
            debug!(run = %dir.display(), "run without events.json skipped");
        }
    }
    files.sort();
    Ok(files)
}

/// Load every run under `runs_dir` into the event log
///
/// Returns the distinct group ids in first-seen order.
///
/// # Errors
/// - `IngestError::Io` when `runs_dir` does not exist or cannot be read
/// - `IngestError::Parse` / `InvalidRecord` for a malformed events file
/// - `IngestError::Log` when the event log refuses an event
pub async fn ingest_runs_dir(
    runs_dir: impl AsRef<Path>,
    log: &dyn EventRepository,
) -> Result<Vec<String>, IngestError> {
    let runs_dir = runs_dir.as_ref();
    let mut groups = IndexSet::new();
    let mut total = 0usize;

    for file in events_files(runs_dir)? {
        let events = read_events_file(&file)?;
        debug!(file = %file.display(), events = events.len(), "events file read");
        for event in events {
            groups.insert(event.group_id.clone());
            log.add_event(event).await?;
            total += 1;
        }
    }

    info!(dir = %runs_dir.display(), events = total, groups = groups.len(), "runs ingested");
    Ok(groups.into_iter().collect())
}

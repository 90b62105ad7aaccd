//! In-memory event log
//!
//! A single lock guards the primary sequence and all indices. Reads take the
//! lock too; the log is light on traffic compared to the model-bound
//! knowledge pipeline, so read parallelism is not worth the complexity.

use crate::error::EventLogError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tkf_core::{EventId, InteractionEvent, Page};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default capacity of the event log
pub const DEFAULT_MAX_EVENTS: usize = 100_000;

/// Event log configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Maximum number of stored events
    pub max_events: usize,
}

impl EventLogConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With capacity
    #[inline]
    #[must_use]
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

/// Interaction event storage
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append an event to the log and all indices
    ///
    /// # Errors
    /// - `EventLogError::StoreFull` when capacity is reached
    /// - `EventLogError::DuplicateId` when the id is already stored
    async fn add_event(&self, event: InteractionEvent) -> Result<(), EventLogError>;

    /// Page through events in insertion order
    async fn events(&self, offset: usize, limit: usize) -> Page<InteractionEvent>;

    /// Events of one run / batch
    async fn events_by_group(&self, group_id: &str) -> Vec<InteractionEvent>;

    /// Events of one persona
    async fn events_by_persona(&self, persona_id: &str) -> Vec<InteractionEvent>;

    /// Events of one browser session
    async fn events_by_session(&self, session_id: &str) -> Vec<InteractionEvent>;
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<InteractionEvent>,
    by_id: HashMap<EventId, usize>,
    by_group: HashMap<String, Vec<usize>>,
    by_persona: HashMap<String, Vec<usize>>,
    by_session: HashMap<String, Vec<usize>>,
}

impl Inner {
    fn collect(&self, positions: Option<&Vec<usize>>) -> Vec<InteractionEvent> {
        positions
            .map(|idx| idx.iter().map(|&i| self.events[i].clone()).collect())
            .unwrap_or_default()
    }
}

/// Bounded in-memory [`EventRepository`]
#[derive(Debug)]
pub struct InMemoryEventLog {
    max_events: usize,
    inner: Mutex<Inner>,
}

impl InMemoryEventLog {
    /// Create log with default capacity
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EventLogConfig::default())
    }

    /// Create log from configuration
    #[inline]
    #[must_use]
    pub fn with_config(config: EventLogConfig) -> Self {
        Self {
            max_events: config.max_events,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Number of stored events
    pub async fn len(&self) -> usize {
        self.inner.lock().await.events.len()
    }

    /// Whether the log is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventLog {
    async fn add_event(&self, event: InteractionEvent) -> Result<(), EventLogError> {
        let mut inner = self.inner.lock().await;

        if inner.events.len() >= self.max_events {
            warn!(max = self.max_events, "event store is full");
            return Err(EventLogError::StoreFull {
                max: self.max_events,
            });
        }
        if inner.by_id.contains_key(&event.id) {
            return Err(EventLogError::DuplicateId(event.id));
        }

        let position = inner.events.len();
        inner.by_id.insert(event.id, position);
        inner
            .by_group
            .entry(event.group_id.clone())
            .or_default()
            .push(position);
        inner
            .by_persona
            .entry(event.persona_id.clone())
            .or_default()
            .push(position);
        inner
            .by_session
            .entry(event.session_id.clone())
            .or_default()
            .push(position);

        debug!(event_id = %event.id, group_id = %event.group_id, persona_id = %event.persona_id, "event added");
        inner.events.push(event);
        Ok(())
    }

    async fn events(&self, offset: usize, limit: usize) -> Page<InteractionEvent> {
        let inner = self.inner.lock().await;
        Page::slice(&inner.events, offset, limit)
    }

    async fn events_by_group(&self, group_id: &str) -> Vec<InteractionEvent> {
        let inner = self.inner.lock().await;
        inner.collect(inner.by_group.get(group_id))
    }

    async fn events_by_persona(&self, persona_id: &str) -> Vec<InteractionEvent> {
        let inner = self.inner.lock().await;
        inner.collect(inner.by_persona.get(persona_id))
    }

    async fn events_by_session(&self, session_id: &str) -> Vec<InteractionEvent> {
        let inner = self.inner.lock().await;
        inner.collect(inner.by_session.get(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tkf_core::{BrowserAction, Sentiment};

    fn event(session: &str, persona: &str, group: &str) -> InteractionEvent {
        InteractionEvent::new(session, persona, group, BrowserAction::Click, Sentiment::Success)
    }

    #[tokio::test]
    async fn add_and_lookup_by_indices() {
        let log = InMemoryEventLog::new();
        log.add_event(event("s1", "p1", "g1")).await.unwrap();
        log.add_event(event("s2", "p2", "g1")).await.unwrap();
        log.add_event(event("s3", "p1", "g2")).await.unwrap();

        assert_eq!(log.events_by_group("g1").await.len(), 2);
        assert_eq!(log.events_by_persona("p1").await.len(), 2);
        assert_eq!(log.events_by_session("s3").await.len(), 1);
        assert_eq!(log.events_by_session("s3").await[0].group_id, "g2");
    }

    #[tokio::test]
    async fn index_lookups_preserve_insertion_order() {
        let log = InMemoryEventLog::new();
        let first = event("s1", "p1", "g1").with_screen("one");
        let second = event("s1", "p1", "g1").with_screen("two");
        log.add_event(first).await.unwrap();
        log.add_event(event("s9", "p9", "g9")).await.unwrap();
        log.add_event(second).await.unwrap();

        let screens: Vec<_> = log
            .events_by_group("g1")
            .await
            .into_iter()
            .map(|e| e.screen_id)
            .collect();
        assert_eq!(screens, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn unknown_keys_are_empty() {
        let log = InMemoryEventLog::new();
        log.add_event(event("s1", "p1", "g1")).await.unwrap();

        assert!(log.events_by_group("nope").await.is_empty());
        assert!(log.events_by_persona("nope").await.is_empty());
        assert!(log.events_by_session("nope").await.is_empty());
    }

    #[tokio::test]
    async fn capacity_is_a_hard_stop() {
        let log = InMemoryEventLog::with_config(EventLogConfig::new().with_max_events(2));
        log.add_event(event("s", "p", "g")).await.unwrap();
        log.add_event(event("s", "p", "g")).await.unwrap();

        let err = log.add_event(event("s", "p", "g")).await.unwrap_err();
        assert_eq!(err, EventLogError::StoreFull { max: 2 });
        assert!(err.is_capacity());

        // Existing state untouched, nothing evicted
        assert_eq!(log.len().await, 2);
        assert_eq!(log.events_by_group("g").await.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_id_rejected_without_touching_indices() {
        let log = InMemoryEventLog::new();
        let original = event("s1", "p1", "g1");
        let mut copy = event("s2", "p2", "g2");
        copy.id = original.id;

        log.add_event(original).await.unwrap();
        let err = log.add_event(copy).await.unwrap_err();

        assert!(matches!(err, EventLogError::DuplicateId(_)));
        assert_eq!(log.len().await, 1);
        assert!(log.events_by_group("g2").await.is_empty());
        assert!(log.events_by_session("s2").await.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_page_is_empty() {
        let log = InMemoryEventLog::new();
        log.add_event(event("s", "p", "g")).await.unwrap();

        let page = log.events(5, 10).await;
        assert!(page.is_empty());
        assert_eq!(page.total, 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_pagination(n in 0usize..40, offset in 0usize..50, limit in 0usize..50) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let page = rt.block_on(async {
                let log = InMemoryEventLog::new();
                for i in 0..n {
                    log.add_event(event(&format!("s{i}"), "p", "g")).await.unwrap();
                }
                log.events(offset, limit).await
            });

            prop_assert_eq!(page.total, n);
            prop_assert_eq!(page.len(), limit.min(n.saturating_sub(offset)));
            if let Some(first) = page.items.first() {
                prop_assert_eq!(&first.session_id, &format!("s{offset}"));
            }
        }
    }
}

//! Interaction events
//!
//! One [`InteractionEvent`] is produced per executed automation step. Events
//! are immutable once created and only ever read through indexed lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique event identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub Ulid);

impl EventId {
    /// Generate new event ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the persona felt about the step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Step went as expected
    Success,
    /// Persona was unsure what to do
    Confused,
    /// Persona could not continue
    Blocked,
    /// Persona was pleasantly surprised
    Delighted,
}

/// Browser action performed by the persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserAction {
    Click,
    Hover,
    Type,
    Wait,
    Navigate,
    Select,
    Scroll,
}

/// One observed agent action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Unique identifier
    pub id: EventId,
    /// Browser session (one persona run)
    pub session_id: String,
    /// Persona that acted
    pub persona_id: String,
    /// Run / batch identifier
    pub group_id: String,
    /// When the step executed
    pub created_at: DateTime<Utc>,
    /// Persona sentiment
    pub sentiment: Sentiment,
    /// Screen the step happened on
    pub screen_id: String,
    /// Persona reasoning, free text
    pub reasoning_text: String,
    /// Action taken
    pub action: BrowserAction,
    /// Element the action targeted
    pub target_selector: String,
}

impl InteractionEvent {
    /// Create an event with a fresh id, stamped now
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        persona_id: impl Into<String>,
        group_id: impl Into<String>,
        action: BrowserAction,
        sentiment: Sentiment,
    ) -> Self {
        Self {
            id: EventId::new(),
            session_id: session_id.into(),
            persona_id: persona_id.into(),
            group_id: group_id.into(),
            created_at: Utc::now(),
            sentiment,
            screen_id: String::new(),
            reasoning_text: String::new(),
            action,
            target_selector: String::new(),
        }
    }

    /// With screen id
    #[inline]
    #[must_use]
    pub fn with_screen(mut self, screen_id: impl Into<String>) -> Self {
        self.screen_id = screen_id.into();
        self
    }

    /// With reasoning text
    #[inline]
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning_text = reasoning.into();
        self
    }

    /// With target selector
    #[inline]
    #[must_use]
    pub fn with_target(mut self, selector: impl Into<String>) -> Self {
        self.target_selector = selector.into();
        self
    }

    /// With explicit timestamp
    #[inline]
    #[must_use]
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Sentiment::Delighted).unwrap(), "\"delighted\"");
        assert_eq!(serde_json::to_string(&BrowserAction::Navigate).unwrap(), "\"navigate\"");

        let parsed: BrowserAction = serde_json::from_str("\"scroll\"").unwrap();
        assert_eq!(parsed, BrowserAction::Scroll);
    }

    #[test]
    fn event_builder() {
        let event = InteractionEvent::new("s1", "p1", "g1", BrowserAction::Click, Sentiment::Confused)
            .with_screen("signup")
            .with_target("#submit")
            .with_reasoning("The button label is unclear");

        assert_eq!(event.screen_id, "signup");
        assert_eq!(event.target_selector, "#submit");
        assert_eq!(event.sentiment, Sentiment::Confused);
    }

    #[test]
    fn event_ids_are_unique() {
        assert_ne!(EventId::new(), EventId::new());
    }
}

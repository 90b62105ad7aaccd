//! Persona profiles
//!
//! A persona is a simulated user whose goals and behavioral traits drive a
//! browser run. Profiles are stored as camelCase JSON documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prompt configuration used when the persona drives a browser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaPrompt {
    /// System prompt
    #[serde(default)]
    pub system: String,
    /// Behavioral rules, used as the persona's goals
    #[serde(default)]
    pub behavioral_rules: Vec<String>,
}

/// Authoring metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaMeta {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A simulated user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Behavioral traits (goal orientation, patience, reading style, ...)
    #[serde(default)]
    pub behavior: Map<String, Value>,
    /// Prompt configuration
    #[serde(default)]
    pub llm_prompt: PersonaPrompt,
    /// Authoring metadata
    #[serde(default)]
    pub meta: PersonaMeta,
}

impl Persona {
    /// Create a persona with empty traits
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: String::new(),
            behavior: Map::new(),
            llm_prompt: PersonaPrompt::default(),
            meta: PersonaMeta::default(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With one behavioral rule appended
    #[inline]
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.llm_prompt.behavioral_rules.push(rule.into());
        self
    }

    /// With one behavior trait
    #[inline]
    #[must_use]
    pub fn with_trait(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.behavior.insert(key.into(), value.into());
        self
    }

    /// The persona's goals
    #[inline]
    #[must_use]
    pub fn goals(&self) -> &[String] {
        &self.llm_prompt.behavioral_rules
    }
}

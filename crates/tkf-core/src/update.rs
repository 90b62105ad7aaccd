//! Knowledge updates
//!
//! A [`KnowledgeUpdate`] records one requested mutation of the knowledge
//! fabric. Being recorded in the update history means the update was
//! *attempted*; it does not imply the content changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ulid::Ulid;

/// Open key-value bag attached to updates (session / persona tags)
pub type Metadata = BTreeMap<String, String>;

/// Unique update identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UpdateId(pub Ulid);

impl UpdateId {
    /// Generate new update ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for UpdateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A requested or admitted mutation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeUpdate {
    /// Unique identifier
    pub id: UpdateId,
    /// When the update was requested
    pub created_at: DateTime<Utc>,
    /// Text to replace; empty means append
    pub old_text: String,
    /// Candidate knowledge text
    pub new_text: String,
    /// Why this knowledge should be added
    pub reasoning: String,
    /// Tags used for filtering
    pub metadata: Metadata,
}

impl KnowledgeUpdate {
    /// Create an append request
    #[must_use]
    pub fn append(new_text: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            id: UpdateId::new(),
            created_at: Utc::now(),
            old_text: String::new(),
            new_text: new_text.into(),
            reasoning: reasoning.into(),
            metadata: Metadata::new(),
        }
    }

    /// Create a replace request
    #[must_use]
    pub fn replace(
        old_text: impl Into<String>,
        new_text: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            old_text: old_text.into(),
            ..Self::append(new_text, reasoning)
        }
    }

    /// Add one metadata tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge a set of metadata tags
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, metadata: &Metadata) -> Self {
        self.metadata
            .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Whether this update asks for a replacement rather than an append
    #[inline]
    #[must_use]
    pub fn is_replacement(&self) -> bool {
        !self.old_text.trim().is_empty()
    }
}

/// Whether `metadata` carries every key/value pair of `filter`
///
/// A missing key never matches; an empty filter matches everything.
#[must_use]
pub fn metadata_matches(metadata: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, value)| metadata.get(key) == Some(value))
}

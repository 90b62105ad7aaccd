//! Admission outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal state of one submitted update
///
/// There is no retry state; callers that want a retry resubmit a new update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionOutcome {
    /// Added as a new paragraph
    Appended,
    /// Explicit `old_text` replaced by the new text
    Replaced,
    /// Conveys nothing beyond existing knowledge
    RejectedDuplicate,
    /// Contradicts existing knowledge; existing knowledge wins
    RejectedConflict,
    /// New text was blank
    RejectedEmpty,
}

impl AdmissionOutcome {
    /// Whether the fabric content changed
    #[inline]
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Appended | Self::Replaced)
    }

    /// Stable snake_case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appended => "appended",
            Self::Replaced => "replaced",
            Self::RejectedDuplicate => "rejected_duplicate",
            Self::RejectedConflict => "rejected_conflict",
            Self::RejectedEmpty => "rejected_empty",
        }
    }
}

impl fmt::Display for AdmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Knowledge statements
//!
//! The `{statement, reasoning}` pair is the unit produced by the candidate
//! generator and the shape of the bundled initial-knowledge artifact.

use serde::{Deserialize, Serialize};

/// A knowledge statement with its justification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeStatement {
    /// The knowledge itself
    pub statement: String,
    /// Why it holds
    #[serde(default)]
    pub reasoning: String,
}

impl KnowledgeStatement {
    /// Create new statement
    #[inline]
    #[must_use]
    pub fn new(statement: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            reasoning: reasoning.into(),
        }
    }

    /// Parse a JSON array of statements
    ///
    /// # Errors
    /// Returns the JSON error if `text` is not an array of `{statement, reasoning}` objects.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(text.trim())
    }

    /// Encode as a single-line JSON object
    ///
    /// # Errors
    /// Returns the JSON error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_of_facts() {
        let facts = KnowledgeStatement::parse_list(
            r#"[{"statement": "Users skim", "reasoning": "seen in runs"}, {"statement": "Short forms win"}]"#,
        )
        .unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[1].reasoning, "");
    }

    #[test]
    fn non_array_is_error() {
        assert!(KnowledgeStatement::parse_list("Users skim.").is_err());
        assert!(KnowledgeStatement::parse_list(r#"{"statement": "x"}"#).is_err());
    }

    #[test]
    fn json_encoding() {
        let fact = KnowledgeStatement::new("a", "b");
        assert_eq!(fact.to_json().unwrap(), r#"{"statement":"a","reasoning":"b"}"#);
    }
}

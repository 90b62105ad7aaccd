//! Labeled-section prompts
//!
//! Prompts are rendered as `Label:` header lines followed by a body, with a
//! blank line between sections. [`extract_section`] reads a body back out,
//! which lets test doubles answer based on what a prompt actually carries.

use std::fmt::Write as _;

/// Builder for labeled-section prompts
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    out: String,
}

impl PromptBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append free text without a label
    #[must_use]
    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.separate();
        self.out.push_str(text.as_ref().trim_end());
        self
    }

    /// Append a `Label:` section
    #[must_use]
    pub fn section(mut self, label: &str, body: impl AsRef<str>) -> Self {
        self.separate();
        let _ = write!(self.out, "{label}:\n{}", body.as_ref().trim_end());
        self
    }

    /// Append a `Label:` section rendering each item as a `- ` bullet
    #[must_use]
    pub fn bullets<I, S>(self, label: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let body = items
            .into_iter()
            .map(|item| format!("- {}", item.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");
        self.section(label, body)
    }

    /// Finish and return the prompt text
    #[inline]
    #[must_use]
    pub fn build(self) -> String {
        self.out
    }

    fn separate(&mut self) {
        if !self.out.is_empty() {
            self.out.push_str("\n\n");
        }
    }
}

/// Read the body of the `label` section back out of a rendered prompt
///
/// The body runs until the next blank-line-separated `Something:` header
/// line, or the end of text.
#[must_use]
pub fn extract_section<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    let header = format!("{label}:\n");
    let start = if prompt.starts_with(&header) {
        header.len()
    } else {
        prompt.find(&format!("\n\n{header}"))? + 2 + header.len()
    };

    let rest = &prompt[start..];
    let end = rest
        .match_indices("\n\n")
        .map(|(idx, _)| idx)
        .find(|&idx| is_header_line(&rest[idx + 2..]))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn is_header_line(text: &str) -> bool {
    let line = text.lines().next().unwrap_or_default();
    line.ends_with(':')
        && line.len() > 1
        && line[..line.len() - 1]
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_')
}

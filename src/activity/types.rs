//! History value types.
//!
//! [`HistoryEntry`] is one logged event stored as plain text with its
//! timestamp embedded, and [`ContextWindow`] is the slice of history surfaced
//! to prompt construction.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Shown instead of history when the log has no entries at all.
pub const EMPTY_CONTEXT_PLACEHOLDER: &str = "No activity yet—start by logging something!";

/// One past event. Serialized as a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry(String);

impl HistoryEntry {
    /// Wrap already-formatted text as an entry.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Format `text` as `"<text> at <timestamp>"` using a local ISO-8601 timestamp.
    pub fn stamped(text: &str, at: DateTime<Local>) -> Self {
        Self(format!(
            "{} at {}",
            text.trim(),
            at.format("%Y-%m-%dT%H:%M:%S%.6f")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HistoryEntry {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The history subset chosen to ground one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextWindow {
    /// The log is empty.
    Placeholder,
    /// The most recent entries, oldest first.
    Recent(Vec<String>),
    /// Nearest neighbours of the seed query, in backend order.
    Similar(Vec<String>),
}

impl ContextWindow {
    /// Newline-joined text for the prompt.
    pub fn render(&self) -> String {
        match self {
            Self::Placeholder => EMPTY_CONTEXT_PLACEHOLDER.to_string(),
            Self::Recent(lines) | Self::Similar(lines) => lines.join("\n"),
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::Placeholder => "placeholder",
            Self::Recent(_) => "recent",
            Self::Similar(_) => "similar",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamped_entry_embeds_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let entry = HistoryEntry::stamped("  Cloned llama.cpp ", at);
        assert_eq!(entry.as_str(), "Cloned llama.cpp at 2024-03-09T14:05:00.000000");
    }

    #[test]
    fn entry_serializes_as_plain_string() {
        let entries = vec![HistoryEntry::new("a"), HistoryEntry::new("b")];
        let json = serde_json::to_string(&entries).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
        let back: Vec<HistoryEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn placeholder_renders_fixed_text() {
        assert_eq!(ContextWindow::Placeholder.render(), EMPTY_CONTEXT_PLACEHOLDER);
        assert_eq!(
            ContextWindow::Recent(vec!["x".into(), "y".into()]).render(),
            "x\ny"
        );
    }
}

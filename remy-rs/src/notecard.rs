//! Notecard representation.

use crate::parser::content::{self, ContentNode};
use serde::Serialize;
use std::path::PathBuf;

/// A labeled record read from a notecard file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notecard {
    /// All labels from the start line. Never empty.
    pub labels: Vec<String>,

    /// Everything after the start line, up to the next start line.
    pub content: String,

    /// File the card was read from.
    pub source: PathBuf,

    /// 0-based line number of the start line.
    pub line: usize,
}

impl Notecard {
    pub fn new(
        labels: Vec<String>,
        content: impl Into<String>,
        source: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self {
            labels,
            content: content.into(),
            source: source.into(),
            line,
        }
    }

    /// The first label.
    pub fn primary_label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or_default()
    }

    pub fn nodes(&self) -> Vec<ContentNode> {
        content::parse_content(&self.content)
    }

    /// `(label, value)` of every field line.
    pub fn fields(&self) -> Vec<(String, String)> {
        content::parse_fields(&self.content)
    }

    pub fn references(&self) -> Vec<String> {
        content::parse_references(&self.content)
    }

    /// The card as notecard file text, start line included.
    pub fn to_text(&self) -> String {
        format!("NOTECARD {}\n{}", self.labels.join(" "), self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Notecard {
        Notecard::new(
            vec!["task1".to_string(), "inbox-task".to_string()],
            ":TAG: inbox\nSee [ file:///x ]\n",
            "tasks.ntc",
            4,
        )
    }

    #[test]
    fn test_primary_label() {
        assert_eq!(card().primary_label(), "task1");
    }

    #[test]
    fn test_to_text() {
        assert_eq!(
            card().to_text(),
            "NOTECARD task1 inbox-task\n:TAG: inbox\nSee [ file:///x ]\n"
        );
    }

    #[test]
    fn test_fields_and_references() {
        let card = card();
        assert_eq!(card.fields(), vec![("TAG".to_string(), " inbox".to_string())]);
        assert_eq!(card.references(), vec!["file:///x".to_string()]);
        assert_eq!(card.nodes().len(), 4);
    }
}

//! Splitting notecard content into field, reference and text nodes.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Field line `:LABEL:value` or reference `[ url ]`.
static ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?P<field>^:(?P<label>[-_0-9a-zA-Z]+):(?P<value>[^\r\n]*)(?:\r\n|\n|$))|(?P<reference>\[\s*(?P<url>[^\]]+?)\s*\])",
    )
    .unwrap()
});

/// A piece of notecard content. Concatenating every node's `text` gives the
/// content back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentNode {
    Field {
        text: String,
        label: String,
        value: String,
    },
    Reference {
        text: String,
        url: String,
    },
    Text {
        text: String,
    },
}

impl ContentNode {
    /// The raw source text of this node.
    pub fn text(&self) -> &str {
        match self {
            ContentNode::Field { text, .. }
            | ContentNode::Reference { text, .. }
            | ContentNode::Text { text } => text,
        }
    }
}

/// Parse content into nodes, in source order.
pub fn parse_content(content: &str) -> Vec<ContentNode> {
    let mut nodes = Vec::new();
    let mut offset = 0;

    for caps in ELEMENT_RE.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() != offset {
            nodes.push(ContentNode::Text {
                text: content[offset..whole.start()].to_string(),
            });
        }
        offset = whole.end();

        if caps.name("field").is_some() {
            nodes.push(ContentNode::Field {
                text: whole.as_str().to_string(),
                label: caps["label"].to_string(),
                value: caps["value"].to_string(),
            });
        } else if let Some(url) = caps.name("url") {
            nodes.push(ContentNode::Reference {
                text: whole.as_str().to_string(),
                url: url.as_str().to_string(),
            });
        }
    }

    if offset < content.len() {
        nodes.push(ContentNode::Text {
            text: content[offset..].to_string(),
        });
    }

    nodes
}

/// `(label, value)` of every field line, in source order.
pub fn parse_fields(content: &str) -> Vec<(String, String)> {
    parse_content(content)
        .into_iter()
        .filter_map(|node| match node {
            ContentNode::Field { label, value, .. } => Some((label, value)),
            _ => None,
        })
        .collect()
}

/// URL of every reference, in source order.
pub fn parse_references(content: &str) -> Vec<String> {
    parse_content(content)
        .into_iter()
        .filter_map(|node| match node {
            ContentNode::Reference { url, .. } => Some(url),
            _ => None,
        })
        .collect()
}

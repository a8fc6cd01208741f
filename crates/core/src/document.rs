//! Rich-text document tree.
//!
//! A document is a strict tree of [`Node`]s. Every node carries a type tag, a
//! bag of type-specific attributes and an ordered list of owned children. The
//! serialized form mirrors the editor state hosts exchange: attributes sit
//! next to `type` and `children` in the same JSON object.

use crate::error::{DocumentError, ParseDiagnostics};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node type tags understood by the default transformer set.
pub mod kinds {
    /// Document root.
    pub const ROOT: &str = "root";
    /// Paragraph of inline content.
    pub const PARAGRAPH: &str = "paragraph";
    /// ATX heading; `level` attribute 1-6.
    pub const HEADING: &str = "heading";
    /// Block quote of inline content.
    pub const QUOTE: &str = "quote";
    /// Fenced code block; optional `language` attribute.
    pub const CODE: &str = "code";
    /// List; `listType` attribute and `start` for numbered lists.
    pub const LIST: &str = "list";
    /// List item; `checked` attribute inside check lists.
    pub const LIST_ITEM: &str = "listitem";
    /// Thematic break.
    pub const HORIZONTAL_RULE: &str = "horizontalrule";
    /// Literal text; `text` attribute.
    pub const TEXT: &str = "text";
    /// Strong emphasis.
    pub const STRONG: &str = "strong";
    /// Emphasis.
    pub const EMPHASIS: &str = "emphasis";
    /// Strikethrough.
    pub const STRIKETHROUGH: &str = "strikethrough";
    /// Inline code span; `text` attribute.
    pub const INLINE_CODE: &str = "inlinecode";
    /// Hyperlink; `url` and optional `title` attributes.
    pub const LINK: &str = "link";
}

/// A single node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Type tag (e.g. `paragraph`, `text`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific attributes.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    /// Ordered children; empty for leaves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Creates a node of `kind` with no attributes and no children.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Map::new(),
            children: Vec::new(),
        }
    }

    /// Creates a container node of `kind` holding `children`.
    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            children,
            ..Self::new(kind)
        }
    }

    /// Creates a `root` node.
    pub fn root(children: Vec<Node>) -> Self {
        Self::element(kinds::ROOT, children)
    }

    /// Creates a `text` node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(kinds::TEXT).with_attr("text", text.into())
    }

    /// Creates a `paragraph` node.
    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::element(kinds::PARAGRAPH, children)
    }

    /// Creates a `heading` node; `level` is clamped to 1-6.
    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        Self::element(kinds::HEADING, children).with_attr("level", level.clamp(1, 6))
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Returns true when this node has the given type tag.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// String attribute lookup.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Unsigned integer attribute lookup.
    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        self.attributes.get(key).and_then(Value::as_u64)
    }

    /// Boolean attribute lookup.
    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(Value::as_bool)
    }

    /// Concatenated literal text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Returns a copy with empty text nodes dropped and adjacent text nodes
    /// merged, recursively.
    pub fn normalized(&self) -> Node {
        let mut children: Vec<Node> = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let child = child.normalized();
            if child.is(kinds::TEXT) {
                let text = child.attr_str("text").unwrap_or_default();
                if text.is_empty() && child.attributes.len() == 1 {
                    continue;
                }
                if let Some(last) = children.last_mut() {
                    if last.is(kinds::TEXT) && mergeable(last, &child) {
                        let merged =
                            format!("{}{}", last.attr_str("text").unwrap_or_default(), text);
                        last.attributes.insert("text".to_string(), Value::String(merged));
                        continue;
                    }
                }
            }
            children.push(child);
        }
        Node {
            kind: self.kind.clone(),
            attributes: self.attributes.clone(),
            children,
        }
    }

    /// Structural equivalence: equal after [`Node::normalized`].
    pub fn equivalent(&self, other: &Node) -> bool {
        self.normalized() == other.normalized()
    }
}

fn mergeable(a: &Node, b: &Node) -> bool {
    a.attributes.len() == 1 && b.attributes.len() == 1
}

fn collect_text(node: &Node, out: &mut String) {
    if let Some(text) = node.attr_str("text") {
        out.push_str(text);
    }
    for child in &node.children {
        collect_text(child, out);
    }
}

/// Serialized editor state: a wrapper around the root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The `root` node.
    pub root: Node,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            root: Node::root(vec![Node::paragraph(Vec::new())]),
        }
    }
}

impl Document {
    /// Wraps a root node.
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Decodes editor state from JSON. Accepts both `{"root": {...}}` and a
    /// bare root node.
    pub fn from_json(value: Value) -> Result<Self, DocumentError> {
        let root = match value {
            Value::Object(mut map) if map.contains_key("root") && !map.contains_key("type") => {
                let root = map.remove("root").unwrap_or(Value::Null);
                serde_json::from_value::<Node>(root)?
            }
            other => serde_json::from_value::<Node>(other)?,
        };
        if !root.is(kinds::ROOT) {
            return Err(DocumentError::NotARoot(root.kind));
        }
        Ok(Self { root })
    }

    /// Decodes editor state, falling back to the default empty document.
    ///
    /// Failures are logged and recorded in the returned diagnostics.
    pub fn from_json_lossy(value: Value) -> (Self, ParseDiagnostics) {
        let mut diagnostics = ParseDiagnostics::new();
        match Self::from_json(value) {
            Ok(document) => (document, diagnostics),
            Err(err) => {
                log::error!("ERROR parsing editor state: {}", err);
                diagnostics.add_error_at(err.to_string(), 1, 1);
                (Self::default(), diagnostics)
            }
        }
    }

    /// Encodes the state as `{"root": {...}}` JSON.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

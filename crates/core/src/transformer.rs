//! Transformer traits and the ordered registry.
//!
//! A transformer is one bidirectional rule between a node type and a piece of
//! markdown syntax. Rules come in two flavours: block rules claim whole lines,
//! inline rules claim spans inside a line. The position of a rule inside a
//! [`TransformerSet`] is its priority, and both directions of conversion scan
//! the set in that same order, first match wins.

use crate::document::Node;
use crate::error::RegistryError;
use crate::parse::ParseContext;
use crate::serialize::{Children, RenderContext};
use crate::transformers;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// A block rule claimed lines starting at the current position.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMatch {
    /// Node built from the claimed lines.
    pub node: Node,
    /// Number of lines claimed (at least one).
    pub consumed: usize,
}

/// An inline rule claimed a span starting at the current byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineMatch {
    /// Node built from the span.
    pub node: Node,
    /// Byte offset just past the span.
    pub end: usize,
}

/// Rule for a block-level node.
pub trait BlockTransformer: Send + Sync {
    /// Rule name, unique within a set.
    fn name(&self) -> &str;

    /// Editor feature this rule belongs to.
    fn feature(&self) -> &str {
        self.name()
    }

    /// Export predicate.
    fn handles(&self, node: &Node) -> bool;

    /// Renders `node` given its already rendered children.
    fn render(&self, node: &Node, children: &Children<'_>, ctx: &RenderContext<'_>) -> String;

    /// Whether children of handled nodes sit at block level. Only affects
    /// children that no rule handles.
    fn children_are_blocks(&self) -> bool {
        false
    }

    /// Cheap import precheck: may a block of this kind begin at `line`?
    fn can_start(&self, line: &str) -> bool;

    /// Whether `line` ends a running paragraph because this block begins.
    fn interrupts_paragraph(&self, line: &str) -> bool {
        self.can_start(line)
    }

    /// Builds a node from `lines[0..]`, reporting how many lines it claimed.
    fn parse(&self, lines: &[&str], ctx: &ParseContext<'_>) -> Option<BlockMatch>;
}

/// Rule for an inline node.
pub trait InlineTransformer: Send + Sync {
    /// Rule name, unique within a set.
    fn name(&self) -> &str;

    /// Editor feature this rule belongs to.
    fn feature(&self) -> &str {
        self.name()
    }

    /// Export predicate.
    fn handles(&self, node: &Node) -> bool;

    /// Renders `node` given its already rendered children.
    fn render(&self, node: &Node, children: &Children<'_>, ctx: &RenderContext<'_>) -> String;

    /// Tries to claim a span of `text` beginning exactly at byte `at`.
    fn parse(&self, text: &str, at: usize, ctx: &ParseContext<'_>) -> Option<InlineMatch>;
}

/// A rule of either flavour.
#[derive(Clone)]
pub enum Transformer {
    /// Block-level rule.
    Block(Arc<dyn BlockTransformer>),
    /// Inline rule.
    Inline(Arc<dyn InlineTransformer>),
}

impl Transformer {
    /// Wraps a block rule.
    pub fn block<T: BlockTransformer + 'static>(rule: T) -> Self {
        Transformer::Block(Arc::new(rule))
    }

    /// Wraps an inline rule.
    pub fn inline<T: InlineTransformer + 'static>(rule: T) -> Self {
        Transformer::Inline(Arc::new(rule))
    }

    /// Rule name.
    pub fn name(&self) -> &str {
        match self {
            Transformer::Block(rule) => rule.name(),
            Transformer::Inline(rule) => rule.name(),
        }
    }

    /// Feature the rule belongs to.
    pub fn feature(&self) -> &str {
        match self {
            Transformer::Block(rule) => rule.feature(),
            Transformer::Inline(rule) => rule.feature(),
        }
    }

    /// Export predicate of the wrapped rule.
    pub fn handles(&self, node: &Node) -> bool {
        match self {
            Transformer::Block(rule) => rule.handles(node),
            Transformer::Inline(rule) => rule.handles(node),
        }
    }

    /// True for block rules.
    pub fn is_block(&self) -> bool {
        matches!(self, Transformer::Block(_))
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flavour = if self.is_block() { "Block" } else { "Inline" };
        write!(f, "{}({})", flavour, self.name())
    }
}

/// Ordered set of transformers; earlier rules win.
#[derive(Clone, Default, Debug)]
pub struct TransformerSet {
    rules: Vec<Transformer>,
}

static DEFAULT_TRANSFORMERS: Lazy<TransformerSet> = Lazy::new(transformers::default_set);

/// The shared default set: every built-in rule in canonical order.
pub fn default_transformers() -> &'static TransformerSet {
    &DEFAULT_TRANSFORMERS
}

impl TransformerSet {
    /// Creates an empty set. Everything then goes through the literal text
    /// fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, rule: Transformer) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a rule at the lowest priority.
    pub fn push(&mut self, rule: Transformer) {
        self.rules.push(rule);
    }

    /// Inserts a rule at `index`, shifting later rules down in priority.
    pub fn insert(&mut self, index: usize, rule: Transformer) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    /// Selects built-in rules by feature name, keeping canonical order.
    pub fn from_features<S: AsRef<str>>(features: &[S]) -> Result<Self, RegistryError> {
        let all = transformers::default_set();
        for feature in features {
            let feature = feature.as_ref();
            if !all.rules.iter().any(|rule| rule.feature() == feature) {
                return Err(RegistryError::UnknownFeature(feature.to_string()));
            }
        }
        let rules = all
            .rules
            .into_iter()
            .filter(|rule| features.iter().any(|f| f.as_ref() == rule.feature()))
            .collect();
        Ok(Self { rules })
    }

    /// Rules in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, Transformer> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the set holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(Transformer::name).collect()
    }

    /// First rule whose export predicate accepts `node`.
    pub fn find_for_node(&self, node: &Node) -> Option<&Transformer> {
        self.rules.iter().find(|rule| rule.handles(node))
    }

    /// Block rules in priority order.
    pub fn blocks(&self) -> impl Iterator<Item = &dyn BlockTransformer> + '_ {
        self.rules.iter().filter_map(|rule| match rule {
            Transformer::Block(rule) => Some(rule.as_ref()),
            Transformer::Inline(_) => None,
        })
    }

    /// Inline rules in priority order.
    pub fn inlines(&self) -> impl Iterator<Item = &dyn InlineTransformer> + '_ {
        self.rules.iter().filter_map(|rule| match rule {
            Transformer::Inline(rule) => Some(rule.as_ref()),
            Transformer::Block(_) => None,
        })
    }

    /// Whether any block rule would end a paragraph at `line`.
    pub fn interrupts_paragraph(&self, line: &str) -> bool {
        self.blocks().any(|rule| rule.interrupts_paragraph(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::kinds;

    #[test]
    fn default_order_is_canonical() {
        assert_eq!(
            default_transformers().names(),
            vec![
                "code",
                "heading",
                "horizontalrule",
                "quote",
                "list",
                "listitem",
                "paragraph",
                "inlinecode",
                "link",
                "strong",
                "emphasis",
                "strikethrough",
            ]
        );
    }

    #[test]
    fn selects_features_in_canonical_order() {
        let set = TransformerSet::from_features(&["emphasis", "list", "paragraph"]).unwrap();
        assert_eq!(set.names(), vec!["list", "listitem", "paragraph", "emphasis"]);
    }

    #[test]
    fn rejects_unknown_feature() {
        let err = TransformerSet::from_features(&["heading", "tables"]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownFeature(name) if name == "tables"));
    }

    #[test]
    fn finds_first_matching_rule() {
        let set = default_transformers();
        let heading = Node::heading(1, vec![]);
        assert_eq!(set.find_for_node(&heading).map(Transformer::name), Some("heading"));
        assert!(set.find_for_node(&Node::text("x")).is_none());
        assert!(set.find_for_node(&Node::new("mention")).is_none());
        assert!(set.find_for_node(&Node::new(kinds::LIST_ITEM)).is_some());
    }

    #[test]
    fn insert_changes_priority() {
        let mut set = TransformerSet::from_features(&["paragraph"]).unwrap();
        let heading = TransformerSet::from_features(&["heading"]).unwrap();
        for rule in heading.iter().cloned() {
            set.insert(0, rule);
        }
        assert_eq!(set.names(), vec!["heading", "paragraph"]);
    }
}

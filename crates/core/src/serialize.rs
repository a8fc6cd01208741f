//! Tree-to-text serializer.
//!
//! Children are rendered before their parent so block rules can wrap text
//! that is already formatted. The first matching rule renders a node; nodes
//! without a rule degrade to their literal text.

use crate::document::{Node, kinds};
use crate::error::{ParseDiagnostics, ParseWarning};
use crate::transformer::{Transformer, TransformerSet};
use crate::transformers::scan::code_spans;
use std::cell::RefCell;

/// Deeper subtrees are emitted as escaped literal text.
const MAX_RENDER_DEPTH: usize = 256;

/// Leading spaces that keep a line from starting a block.
const VERBATIM_INDENT: &str = "    ";

/// Characters that carry meaning for the default inline rules.
const ESCAPED: [char; 7] = ['\\', '*', '_', '`', '~', '[', ']'];

/// Rendered text of one child plus whether it sits at block level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Markdown text.
    pub text: String,
    /// True when the child is a block.
    pub block: bool,
}

/// Already rendered children of the node being rendered.
#[derive(Debug, Clone, Copy)]
pub struct Children<'a> {
    parts: &'a [Rendered],
}

impl<'a> Children<'a> {
    /// Wraps rendered parts.
    pub fn new(parts: &'a [Rendered]) -> Self {
        Self { parts }
    }

    /// One part per child, in order.
    pub fn parts(&self) -> &'a [Rendered] {
        self.parts
    }

    /// True when there are no children.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All parts concatenated.
    pub fn inline(&self) -> String {
        self.parts.iter().map(|part| part.text.as_str()).collect()
    }

    /// Non-empty parts separated by blank lines.
    pub fn blocks(&self) -> String {
        self.parts
            .iter()
            .filter(|part| !part.text.is_empty())
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Inline runs concatenated, with a blank line around every block.
    pub fn flow(&self) -> String {
        let mut out = String::new();
        let mut previous_block = false;
        for part in self.parts.iter().filter(|part| !part.text.is_empty()) {
            if !out.is_empty() && (part.block || previous_block) {
                out.push_str("\n\n");
            }
            out.push_str(&part.text);
            previous_block = part.block;
        }
        out
    }
}

/// State shared by one serialization pass.
pub struct RenderContext<'a> {
    transformers: &'a TransformerSet,
    diagnostics: RefCell<ParseDiagnostics>,
    /// Nodes whose children are being rendered, outermost first.
    ancestors: RefCell<Vec<&'a Node>>,
}

impl<'a> RenderContext<'a> {
    /// Creates a context over `transformers`.
    pub fn new(transformers: &'a TransformerSet) -> Self {
        Self {
            transformers,
            diagnostics: RefCell::new(ParseDiagnostics::new()),
            ancestors: RefCell::new(Vec::new()),
        }
    }

    /// The rules in use.
    pub fn transformers(&self) -> &'a TransformerSet {
        self.transformers
    }

    /// Parent of the node being rendered; `None` for the root.
    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestors.borrow().last().copied()
    }

    /// Siblings that come before `node` under the current parent.
    pub fn preceding_siblings(&self, node: &Node) -> &'a [Node] {
        let Some(parent) = self.parent() else {
            return &[];
        };
        let index = parent
            .children
            .iter()
            .position(|child| std::ptr::eq(child, node))
            .unwrap_or(0);
        &parent.children[..index]
    }

    /// Backslash-escapes characters the inline rules would read as syntax.
    pub fn escape_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if ESCAPED.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    /// Escapes every line that a block rule would claim, so the text reads
    /// back as the same paragraph. Where the marker sits inside a code span
    /// the line is indented instead.
    pub fn escape_line_starts(&self, text: &str) -> String {
        let verbatim = code_spans(text);
        let mut out = String::with_capacity(text.len());
        let mut start = 0;
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let marker = line.char_indices().find(|(_, c)| c.is_ascii_punctuation());
            match marker {
                Some((at, c)) if self.transformers.interrupts_paragraph(line) => {
                    if verbatim.iter().any(|span| span.contains(&(start + at))) {
                        out.push_str(VERBATIM_INDENT);
                        out.push_str(line);
                    } else if c == '\\' {
                        out.push_str(line);
                    } else {
                        out.push_str(&line[..at]);
                        out.push('\\');
                        out.push_str(&line[at..]);
                    }
                }
                _ => out.push_str(line),
            }
            start += line.len() + 1;
        }
        out
    }

    /// Records a diagnostic.
    pub fn warn(&self, warning: ParseWarning) {
        self.diagnostics.borrow_mut().add_warning(warning);
    }

    fn into_diagnostics(self) -> ParseDiagnostics {
        self.diagnostics.into_inner()
    }

    fn render_root(&self, root: &'a Node) -> String {
        if root.is(kinds::ROOT) {
            let parts = self.render_children(root, true, 1);
            Children::new(&parts).flow()
        } else {
            self.render(root, true, 1).text
        }
    }

    fn render_children(&self, node: &'a Node, at_block: bool, depth: usize) -> Vec<Rendered> {
        self.ancestors.borrow_mut().push(node);
        let parts = node
            .children
            .iter()
            .map(|child| self.render(child, at_block, depth + 1))
            .collect();
        self.ancestors.borrow_mut().pop();
        parts
    }

    fn render(&self, node: &'a Node, at_block: bool, depth: usize) -> Rendered {
        if depth > MAX_RENDER_DEPTH {
            return Rendered {
                text: Self::escape_text(&node.text_content()),
                block: at_block,
            };
        }

        match self.transformers.find_for_node(node) {
            Some(Transformer::Block(rule)) => {
                let parts = self.render_children(node, rule.children_are_blocks(), depth);
                Rendered {
                    text: rule.render(node, &Children::new(&parts), self),
                    block: true,
                }
            }
            Some(Transformer::Inline(rule)) => {
                let parts = self.render_children(node, false, depth);
                Rendered {
                    text: rule.render(node, &Children::new(&parts), self),
                    block: false,
                }
            }
            None => self.render_fallback(node, at_block, depth),
        }
    }

    fn render_fallback(&self, node: &'a Node, at_block: bool, depth: usize) -> Rendered {
        if !node.is(kinds::TEXT) {
            log::warn!(
                "No transformer for node type `{}`; emitting literal text",
                node.kind
            );
            self.warn(ParseWarning::UnhandledNode {
                kind: node.kind.clone(),
            });
        }

        let mut text = node
            .attr_str("text")
            .map(Self::escape_text)
            .unwrap_or_default();
        if !node.children.is_empty() {
            let inline_children = node
                .children
                .iter()
                .any(|child| child.attr_str("text").is_some());
            let parts = self.render_children(node, at_block && !inline_children, depth);
            text.push_str(&Children::new(&parts).flow());
        }
        Rendered {
            text,
            block: at_block,
        }
    }
}

/// Serializes a tree to markdown.
pub fn serialize(root: &Node, transformers: &TransformerSet) -> String {
    serialize_with_diagnostics(root, transformers).0
}

/// Serializes a tree to markdown, also returning diagnostics for nodes that
/// fell back to literal text.
pub fn serialize_with_diagnostics(
    root: &Node,
    transformers: &TransformerSet,
) -> (String, ParseDiagnostics) {
    let ctx = RenderContext::new(transformers);
    let text = ctx.render_root(root);
    (text, ctx.into_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::default_transformers;

    fn part(text: &str, block: bool) -> Rendered {
        Rendered {
            text: text.to_string(),
            block,
        }
    }

    #[test]
    fn flow_separates_blocks_and_joins_inline_runs() {
        let parts = [
            part("a", false),
            part("b", false),
            part("# c", true),
            part("", true),
            part("d", false),
        ];
        assert_eq!(Children::new(&parts).flow(), "ab\n\n# c\n\nd");
        assert_eq!(Children::new(&parts).blocks(), "a\n\nb\n\n# c\n\nd");
        assert_eq!(Children::new(&parts).inline(), "ab# cd");
    }

    #[test]
    fn empty_tree_is_empty_text() {
        assert_eq!(serialize(&Node::root(vec![]), default_transformers()), "");
        assert_eq!(
            serialize(&Node::root(vec![Node::paragraph(vec![])]), default_transformers()),
            ""
        );
    }

    #[test]
    fn escapes_inline_syntax_in_text() {
        assert_eq!(
            RenderContext::escape_text("a*b_c`d~e[f]g\\h"),
            "a\\*b\\_c\\`d\\~e\\[f\\]g\\\\h"
        );
    }

    #[test]
    fn escapes_lines_that_would_start_blocks() {
        let ctx = RenderContext::new(default_transformers());
        assert_eq!(
            ctx.escape_line_starts("# not a heading\n1. not a list\nplain\n> nope"),
            "\\# not a heading\n1\\. not a list\nplain\n\\> nope"
        );
    }

    #[test]
    fn lines_starting_inside_code_spans_are_indented() {
        let ctx = RenderContext::new(default_transformers());
        assert_eq!(ctx.escape_line_starts("`a\n# b`"), "`a\n    # b`");
        assert_eq!(ctx.escape_line_starts("`a`\n# b"), "`a`\n\\# b");
        assert_eq!(ctx.escape_line_starts("\\`a\n# b`"), "\\`a\n\\# b`");
    }

    #[test]
    fn unknown_nodes_degrade_to_text() {
        let root = Node::root(vec![
            Node::element("callout", vec![Node::text("Careful "), Node::text("now")]),
            Node::new("mention").with_attr("text", "@sam"),
            Node::new("embed"),
        ]);
        let (text, diagnostics) = serialize_with_diagnostics(&root, default_transformers());
        assert_eq!(text, "Careful now\n\n@sam");
        let kinds: Vec<_> = diagnostics
            .warnings
            .iter()
            .map(|warning| match warning {
                ParseWarning::UnhandledNode { kind } => kind.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(kinds, vec!["callout", "mention", "embed"]);
    }

    #[test]
    fn empty_set_emits_literal_text() {
        let root = Node::root(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("*body*")]),
        ]);
        assert_eq!(serialize(&root, &TransformerSet::new()), "Title\n\n\\*body\\*");
    }
}

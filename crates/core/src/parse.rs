//! Text-to-tree parser.
//!
//! The core only walks lines and bytes. Where a block starts and ends, and
//! what an inline span looks like, is decided by the rules of the
//! [`TransformerSet`] in priority order.

use crate::document::Node;
use crate::error::{ParseDiagnostics, ParseWarning};
use crate::transformer::TransformerSet;
use crate::transformers::scan::InlineScan;
use std::cell::{Cell, RefCell};

/// Nesting deeper than this is taken literally.
const MAX_DEPTH: usize = 64;

/// State shared by one parse pass. Rules receive it to recurse into
/// captured sub-text.
pub struct ParseContext<'a> {
    transformers: &'a TransformerSet,
    diagnostics: RefCell<ParseDiagnostics>,
    depth: Cell<usize>,
    line: Cell<usize>,
    /// One entry per inline run being parsed, innermost last.
    scans: RefCell<Vec<InlineScan>>,
}

impl<'a> ParseContext<'a> {
    /// Creates a context over `transformers`.
    pub fn new(transformers: &'a TransformerSet) -> Self {
        Self {
            transformers,
            diagnostics: RefCell::new(ParseDiagnostics::new()),
            depth: Cell::new(0),
            line: Cell::new(1),
            scans: RefCell::new(Vec::new()),
        }
    }

    /// The rules in use.
    pub fn transformers(&self) -> &'a TransformerSet {
        self.transformers
    }

    /// Whether any block rule would end a running paragraph at `line`.
    pub fn interrupts_paragraph(&self, line: &str) -> bool {
        self.transformers.interrupts_paragraph(line)
    }

    /// 1-based line where the current top-level block starts.
    pub fn line_number(&self) -> usize {
        self.line.get()
    }

    /// Records a diagnostic.
    pub fn warn(&self, warning: ParseWarning) {
        self.diagnostics.borrow_mut().add_warning(warning);
    }

    fn into_diagnostics(self) -> ParseDiagnostics {
        self.diagnostics.into_inner()
    }

    /// Runs `f` against the pairing tables of the inline run being parsed.
    pub(crate) fn with_scan<R>(&self, f: impl FnOnce(&mut InlineScan) -> R) -> R {
        match self.scans.borrow_mut().last_mut() {
            Some(scan) => f(scan),
            None => f(&mut InlineScan::default()),
        }
    }

    /// Parses `lines` into a sequence of block nodes.
    pub fn parse_blocks(&self, lines: &[&str]) -> Vec<Node> {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            return literal_paragraphs(lines);
        }
        self.depth.set(depth + 1);

        let mut nodes = Vec::new();
        let mut index = 0;
        while index < lines.len() {
            if lines[index].trim().is_empty() {
                index += 1;
                continue;
            }
            if depth == 0 {
                self.line.set(index + 1);
            }
            let (node, consumed) = self.parse_block(&lines[index..]);
            nodes.push(node);
            index += consumed;
        }

        self.depth.set(depth);
        nodes
    }

    fn parse_block(&self, lines: &[&str]) -> (Node, usize) {
        for rule in self.transformers.blocks() {
            if !rule.can_start(lines[0]) {
                continue;
            }
            if let Some(found) = rule.parse(lines, self).filter(|found| found.consumed > 0) {
                let consumed = found.consumed.min(lines.len());
                return (found.node, consumed);
            }
        }
        self.fallback_paragraph(lines)
    }

    fn fallback_paragraph(&self, lines: &[&str]) -> (Node, usize) {
        let mut consumed = 1;
        while consumed < lines.len() {
            let line = lines[consumed];
            if line.trim().is_empty() || self.interrupts_paragraph(line) {
                break;
            }
            consumed += 1;
        }
        let text = join_trimmed(&lines[..consumed]);
        (Node::paragraph(self.parse_inline(&text)), consumed)
    }

    /// Parses inline content. Adjacent literal characters become one text
    /// node.
    pub fn parse_inline(&self, text: &str) -> Vec<Node> {
        if text.is_empty() {
            return Vec::new();
        }
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            return vec![Node::text(text)];
        }
        self.depth.set(depth + 1);
        self.scans.borrow_mut().push(InlineScan::default());

        let bytes = text.as_bytes();
        let mut nodes = Vec::new();
        let mut literal = String::new();
        let mut index = 0;
        'scan: while index < text.len() {
            if bytes[index] == b'\\'
                && index + 1 < bytes.len()
                && bytes[index + 1].is_ascii_punctuation()
            {
                literal.push(bytes[index + 1] as char);
                index += 2;
                continue;
            }

            for rule in self.transformers.inlines() {
                let found = rule.parse(text, index, self).filter(|found| {
                    found.end > index && found.end <= text.len() && text.is_char_boundary(found.end)
                });
                if let Some(found) = found {
                    if !literal.is_empty() {
                        nodes.push(Node::text(std::mem::take(&mut literal)));
                    }
                    nodes.push(found.node);
                    index = found.end;
                    continue 'scan;
                }
            }

            match text[index..].chars().next() {
                Some(c) => {
                    literal.push(c);
                    index += c.len_utf8();
                }
                None => break,
            }
        }
        if !literal.is_empty() {
            nodes.push(Node::text(literal));
        }

        self.scans.borrow_mut().pop();
        self.depth.set(depth);
        nodes
    }
}

/// Trims every line and joins them with `\n`.
pub(crate) fn join_trimmed(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

fn literal_paragraphs(lines: &[&str]) -> Vec<Node> {
    let text = join_trimmed(lines);
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Node::paragraph(vec![Node::text(text)])]
    }
}

/// Parses markdown into a `root` node.
pub fn parse(text: &str, transformers: &TransformerSet) -> Node {
    parse_with_diagnostics(text, transformers).0
}

/// Parses markdown into a `root` node, also returning diagnostics.
///
/// Never fails: blank input yields `root[paragraph[]]` and text no rule
/// claims lands in literal paragraphs.
pub fn parse_with_diagnostics(
    text: &str,
    transformers: &TransformerSet,
) -> (Node, ParseDiagnostics) {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let ctx = ParseContext::new(transformers);
    let mut children = ctx.parse_blocks(&lines);
    if children.is_empty() {
        children.push(Node::paragraph(Vec::new()));
    }
    (Node::root(children), ctx.into_diagnostics())
}

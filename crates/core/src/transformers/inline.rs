//! Built-in inline rules.
//!
//! Bracket and delimiter pairing comes from [`super::scan`]; the rules here
//! only turn a pairing into nodes.

use super::scan::{code_span_end, is_escape, is_escaped, run_length};
use crate::document::{Node, kinds};
use crate::parse::ParseContext;
use crate::serialize::{Children, RenderContext};
use crate::transformer::{InlineMatch, InlineTransformer};

fn escape_chars(text: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_punctuation() {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Code span. The content is literal text.
pub struct InlineCode;

impl InlineTransformer for InlineCode {
    fn name(&self) -> &str {
        "inlinecode"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::INLINE_CODE)
    }

    fn render(&self, node: &Node, _children: &Children<'_>, _ctx: &RenderContext<'_>) -> String {
        let text = node.attr_str("text").unwrap_or_default();
        if text.is_empty() {
            return String::new();
        }
        let longest = text.split(|c: char| c != '`').map(str::len).max().unwrap_or(0);
        let fence = "`".repeat(longest + 1);
        let all_spaces = text.bytes().all(|b| b == b' ');
        let pad = text.starts_with('`')
            || text.ends_with('`')
            || (!all_spaces && text.starts_with(' ') && text.ends_with(' '));
        if pad {
            format!("{fence} {text} {fence}")
        } else {
            format!("{fence}{text}{fence}")
        }
    }

    fn parse(&self, text: &str, at: usize, _ctx: &ParseContext<'_>) -> Option<InlineMatch> {
        let bytes = text.as_bytes();
        if bytes.get(at) != Some(&b'`') {
            return None;
        }
        // Only the start of a backtick run may open a span.
        if at > 0 && bytes[at - 1] == b'`' && !is_escaped(bytes, at - 1) {
            return None;
        }
        let n = run_length(bytes, at, b'`');
        let (close, end) = code_span_end(bytes, at)?;
        let mut content = &text[at + n..close];
        if content.len() >= 2
            && content.starts_with(' ')
            && content.ends_with(' ')
            && !content.bytes().all(|b| b == b' ')
        {
            content = &content[1..content.len() - 1];
        }
        Some(InlineMatch {
            node: Node::new(kinds::INLINE_CODE).with_attr("text", content),
            end,
        })
    }
}

/// Inline link `[label](destination "title")`.
pub struct Link;

fn skip_whitespace(bytes: &[u8], mut at: usize) -> usize {
    while at < bytes.len() && matches!(bytes[at], b' ' | b'\t' | b'\n') {
        at += 1;
    }
    at
}

/// Destination as written and the offset after it.
fn destination(text: &str, at: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(at) == Some(&b'<') {
        let start = at + 1;
        let mut k = start;
        loop {
            match *bytes.get(k)? {
                b'>' => return Some((&text[start..k], k + 1)),
                b'\n' | b'<' => return None,
                _ if is_escape(bytes, k) => k += 2,
                _ => k += 1,
            }
        }
    }

    let mut depth = 0usize;
    let mut k = at;
    while k < bytes.len() {
        if is_escape(bytes, k) {
            k += 2;
            continue;
        }
        match bytes[k] {
            b'(' => depth += 1,
            b')' if depth == 0 => break,
            b')' => depth -= 1,
            b if b.is_ascii_whitespace() => break,
            _ => {}
        }
        k += 1;
    }
    Some((&text[at..k], k))
}

/// Title text as written and the offset after its closing quote.
fn title(text: &str, at: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let quote = *bytes.get(at)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let start = at + 1;
    let mut k = start;
    loop {
        match *bytes.get(k)? {
            b if b == quote => return Some((&text[start..k], k + 1)),
            _ if is_escape(bytes, k) => k += 2,
            _ => k += 1,
        }
    }
}

impl InlineTransformer for Link {
    fn name(&self) -> &str {
        "link"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::LINK)
    }

    fn render(&self, node: &Node, children: &Children<'_>, _ctx: &RenderContext<'_>) -> String {
        let label = children.inline();
        let url = node
            .attr_str("url")
            .unwrap_or_default()
            .replace(['\n', '\r'], " ");
        let needs_angle = url.is_empty()
            || url.contains(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '(' | ')'));
        let destination = if needs_angle {
            format!("<{}>", escape_chars(&url, &['\\', '<', '>']))
        } else {
            escape_chars(&url, &['\\'])
        };
        match node.attr_str("title") {
            Some(title) => {
                let title = escape_chars(&title.replace(['\n', '\r'], " "), &['\\', '"']);
                format!("[{label}]({destination} \"{title}\")")
            }
            None => format!("[{label}]({destination})"),
        }
    }

    fn parse(&self, text: &str, at: usize, ctx: &ParseContext<'_>) -> Option<InlineMatch> {
        let bytes = text.as_bytes();
        if bytes.get(at) != Some(&b'[') {
            return None;
        }
        let close = ctx.with_scan(|scan| scan.label_end(text, at))?;
        if bytes.get(close + 1) != Some(&b'(') {
            return None;
        }

        let start = skip_whitespace(bytes, close + 2);
        let (raw_url, after_url) = destination(text, start)?;
        let mut cursor = skip_whitespace(bytes, after_url);
        let mut raw_title = None;
        if cursor > after_url {
            if let Some((found, after_title)) = title(text, cursor) {
                raw_title = Some(found);
                cursor = skip_whitespace(bytes, after_title);
            }
        }
        if bytes.get(cursor) != Some(&b')') {
            return None;
        }

        let mut node = Node::element(kinds::LINK, ctx.parse_inline(&text[at + 1..close]))
            .with_attr("url", unescape(raw_url));
        if let Some(raw_title) = raw_title {
            node = node.with_attr("title", unescape(raw_title));
        }
        Some(InlineMatch {
            node,
            end: cursor + 1,
        })
    }
}

/// Delimiter-wrapped formatting: strong, emphasis and strikethrough.
pub struct Delimited {
    name: &'static str,
    kind: &'static str,
    /// Accepted delimiters, each a run of one character; the first is
    /// preferred on export.
    markers: &'static [&'static str],
    /// Kind whose delimiters use the same character. As its only content
    /// this rule exports its second marker.
    shares_with: Option<&'static str>,
}

impl Delimited {
    /// `**strong**` or `__strong__`.
    pub const fn strong() -> Self {
        Self {
            name: "strong",
            kind: kinds::STRONG,
            markers: &["**", "__"],
            shares_with: None,
        }
    }

    /// `*emphasis*` or `_emphasis_`.
    pub const fn emphasis() -> Self {
        Self {
            name: "emphasis",
            kind: kinds::EMPHASIS,
            markers: &["*", "_"],
            shares_with: Some(kinds::STRONG),
        }
    }

    /// `~~strikethrough~~`.
    pub const fn strikethrough() -> Self {
        Self {
            name: "strikethrough",
            kind: kinds::STRIKETHROUGH,
            markers: &["~~"],
            shares_with: None,
        }
    }

    /// Whether `node` is all there is inside a parent of the sharing kind,
    /// where the preferred marker would merge with the parent's.
    fn fills_sharing_parent(&self, node: &Node, ctx: &RenderContext<'_>) -> bool {
        let Some(kind) = self.shares_with else {
            return false;
        };
        ctx.parent().is_some_and(|parent| {
            parent.is(kind)
                && parent
                    .children
                    .iter()
                    .all(|child| std::ptr::eq(child, node) || is_blank_text(child))
        })
    }
}

fn is_blank_text(node: &Node) -> bool {
    node.is(kinds::TEXT) && node.attr_str("text").unwrap_or_default().trim().is_empty()
}

impl InlineTransformer for Delimited {
    fn name(&self) -> &str {
        self.name
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(self.kind)
    }

    fn render(&self, node: &Node, children: &Children<'_>, ctx: &RenderContext<'_>) -> String {
        let inner = children.inline();
        let core = inner.trim();
        if core.is_empty() {
            return inner;
        }
        let lead = &inner[..inner.len() - inner.trim_start().len()];
        let trail = &inner[inner.trim_end().len()..];
        let preferred = usize::from(self.fills_sharing_parent(node, ctx));
        let marker = self
            .markers
            .get(preferred)
            .or_else(|| self.markers.first())
            .copied()
            .unwrap_or_default();
        format!("{lead}{marker}{core}{marker}{trail}")
    }

    fn parse(&self, text: &str, at: usize, ctx: &ParseContext<'_>) -> Option<InlineMatch> {
        let byte = *text.as_bytes().get(at)?;
        if !self.markers.iter().any(|marker| marker.as_bytes().first() == Some(&byte)) {
            return None;
        }
        let closing = ctx.with_scan(|scan| scan.closing(text, at, byte))?;
        let accepted = self.markers.iter().any(|marker| {
            marker.len() == closing.width && marker.bytes().all(|b| b == byte)
        });
        if !accepted {
            return None;
        }
        let children = ctx.parse_inline(&text[at + closing.width..closing.close]);
        Some(InlineMatch {
            node: Node::element(self.kind, children),
            end: closing.end(),
        })
    }
}

//! Built-in block rules.

use crate::code_fence::{FenceState, LineRole, advance_fence_state, fence_info, strip_fence_indent};
use crate::document::{Node, kinds};
use crate::error::{ParseWarning, SourceLocation};
use crate::parse::{ParseContext, join_trimmed};
use crate::serialize::{Children, RenderContext};
use crate::transformer::{BlockMatch, BlockTransformer};

/// Leading space count.
fn indent_of(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ').count()
}

/// The line without up to three leading spaces; `None` when indented further.
fn block_start(line: &str) -> Option<&str> {
    let indent = indent_of(line);
    if indent > 3 { None } else { Some(&line[indent..]) }
}

/// Three or more `-`, `*` or `_` of one kind, optionally spaced.
fn is_thematic_break(line: &str) -> bool {
    let Some(rest) = block_start(line) else {
        return false;
    };
    let mut marker = None;
    let mut count = 0;
    for c in rest.chars() {
        match c {
            ' ' | '\t' => {}
            '-' | '*' | '_' if marker.is_none() || marker == Some(c) => {
                marker = Some(c);
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

/// Fenced code block. Content is kept verbatim.
pub struct CodeBlock;

impl BlockTransformer for CodeBlock {
    fn name(&self) -> &str {
        "code"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::CODE)
    }

    fn render(&self, node: &Node, _children: &Children<'_>, _ctx: &RenderContext<'_>) -> String {
        let content = node.text_content();
        let longest = content
            .split(|c: char| c != '`')
            .map(str::len)
            .max()
            .unwrap_or(0);
        let fence = "`".repeat((longest + 1).max(3));
        let language = node
            .attr_str("language")
            .map(|lang| lang.replace(['`', '\n', '\r'], ""))
            .unwrap_or_default();
        if content.is_empty() {
            format!("{fence}{language}\n{fence}")
        } else {
            format!("{fence}{language}\n{content}\n{fence}")
        }
    }

    fn can_start(&self, line: &str) -> bool {
        advance_fence_state(line, FenceState::default()).role == LineRole::Open
    }

    fn parse(&self, lines: &[&str], ctx: &ParseContext<'_>) -> Option<BlockMatch> {
        let open = advance_fence_state(lines.first()?, FenceState::default());
        if open.role != LineRole::Open {
            return None;
        }
        let indent = open.next_state.indent;
        let language = fence_info(lines[0]).and_then(|info| info.split_whitespace().next());

        let mut state = open.next_state;
        let mut content = Vec::new();
        let mut consumed = 1;
        let mut closed = false;
        for line in &lines[1..] {
            consumed += 1;
            let outcome = advance_fence_state(line, state);
            if outcome.role == LineRole::Close {
                closed = true;
                break;
            }
            content.push(strip_fence_indent(line, indent));
            state = outcome.next_state;
        }

        if !closed {
            ctx.warn(ParseWarning::UnclosedCodeFence {
                location: SourceLocation::new(ctx.line_number(), indent + 1),
                marker: open.next_state.marker.unwrap_or('`'),
                context: lines[0].trim().to_string(),
            });
        }

        let mut node = Node::new(kinds::CODE);
        if let Some(language) = language {
            node = node.with_attr("language", language);
        }
        let text = content.join("\n");
        if !text.is_empty() {
            node.children.push(Node::text(text));
        }
        Some(BlockMatch { node, consumed })
    }
}

/// ATX heading, levels 1-6.
pub struct Heading;

fn heading_marker(line: &str) -> Option<(usize, &str)> {
    let rest = block_start(line)?;
    let level = rest.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let after = &rest[level..];
    if after.is_empty() || after.starts_with([' ', '\t']) {
        Some((level, after))
    } else {
        None
    }
}

/// Drops an optional closing `#` run.
fn strip_closing_hashes(content: &str) -> &str {
    let content = content.trim();
    let without = content.trim_end_matches('#');
    if without.is_empty() {
        ""
    } else if without.len() < content.len() && without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        content
    }
}

impl BlockTransformer for Heading {
    fn name(&self) -> &str {
        "heading"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::HEADING)
    }

    fn render(&self, node: &Node, children: &Children<'_>, _ctx: &RenderContext<'_>) -> String {
        let level = node.attr_u64("level").unwrap_or(1).clamp(1, 6) as usize;
        let hashes = "#".repeat(level);
        let mut text = children.inline().replace('\n', " ");
        if text.ends_with('#') {
            let stem = text.trim_end_matches('#').len();
            text.insert(stem, '\\');
        }
        if text.is_empty() {
            hashes
        } else {
            format!("{hashes} {text}")
        }
    }

    fn can_start(&self, line: &str) -> bool {
        heading_marker(line).is_some()
    }

    fn parse(&self, lines: &[&str], ctx: &ParseContext<'_>) -> Option<BlockMatch> {
        let (level, after) = heading_marker(lines.first()?)?;
        let content = strip_closing_hashes(after);
        let node = Node::heading(level as u8, ctx.parse_inline(content));
        Some(BlockMatch { node, consumed: 1 })
    }
}

/// Thematic break, always written as `***`.
pub struct HorizontalRule;

impl BlockTransformer for HorizontalRule {
    fn name(&self) -> &str {
        "horizontalrule"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::HORIZONTAL_RULE)
    }

    fn render(&self, _node: &Node, _children: &Children<'_>, _ctx: &RenderContext<'_>) -> String {
        "***".to_string()
    }

    fn can_start(&self, line: &str) -> bool {
        is_thematic_break(line)
    }

    fn parse(&self, lines: &[&str], _ctx: &ParseContext<'_>) -> Option<BlockMatch> {
        if !is_thematic_break(lines.first()?) {
            return None;
        }
        Some(BlockMatch {
            node: Node::new(kinds::HORIZONTAL_RULE),
            consumed: 1,
        })
    }
}

/// Block quote holding inline content. Every line carries its own `>`.
pub struct Quote;

fn quote_line(line: &str) -> Option<&str> {
    let rest = block_start(line)?.strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

impl BlockTransformer for Quote {
    fn name(&self) -> &str {
        "quote"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::QUOTE)
    }

    fn render(&self, _node: &Node, children: &Children<'_>, _ctx: &RenderContext<'_>) -> String {
        children
            .inline()
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn can_start(&self, line: &str) -> bool {
        quote_line(line).is_some()
    }

    fn parse(&self, lines: &[&str], ctx: &ParseContext<'_>) -> Option<BlockMatch> {
        let body: Vec<&str> = lines.iter().map_while(|line| quote_line(line)).collect();
        if body.is_empty() {
            return None;
        }
        let text = join_trimmed(&body);
        let node = Node::element(kinds::QUOTE, ctx.parse_inline(text.trim()));
        Some(BlockMatch {
            node,
            consumed: body.len(),
        })
    }
}

/// A list item marker found at the start of a line.
#[derive(Debug, Clone, Copy)]
struct Marker {
    ordered: bool,
    /// Bullet character, or the delimiter after the number.
    symbol: u8,
    number: u64,
    indent: usize,
    /// Columns from the marker to the item content.
    width: usize,
    /// Byte offset of the item content.
    content: usize,
}

fn list_marker(line: &str) -> Option<Marker> {
    let indent = indent_of(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let bytes = rest.as_bytes();

    let (ordered, symbol, number, marker_len) = match *bytes.first()? {
        bullet @ (b'-' | b'*' | b'+') => (false, bullet, 0, 1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            let delimiter = *bytes.get(digits).filter(|b| matches!(b, b'.' | b')'))?;
            if digits > 9 {
                return None;
            }
            let number = rest[..digits].parse().ok()?;
            (true, delimiter, number, digits + 1)
        }
        _ => return None,
    };

    let content = match bytes.get(marker_len) {
        None => marker_len,
        Some(b' ') | Some(b'\t') => marker_len + 1,
        Some(_) => return None,
    };
    Some(Marker {
        ordered,
        symbol,
        number,
        indent,
        width: marker_len + 1,
        content: indent + content,
    })
}

/// Splits a leading task checkbox off item content.
fn checkbox(content: &str) -> Option<(bool, &str)> {
    let checked = match content.get(..3)? {
        "[ ]" => false,
        "[x]" | "[X]" => true,
        _ => return None,
    };
    let rest = &content[3..];
    if rest.is_empty() {
        Some((checked, rest))
    } else {
        rest.strip_prefix(' ').map(|rest| (checked, rest))
    }
}

/// Lines of a paragraph-like run with blank lines dropped, since a blank
/// line would end the block.
fn collapse_blank_lines(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Removes up to `columns` leading spaces.
fn dedent(line: &str, columns: usize) -> &str {
    let spaces = indent_of(line).min(columns);
    &line[spaces..]
}

fn is_ordered(list: &Node) -> bool {
    list.attr_str("listType") == Some("number")
}

/// True when an odd run of lists of the same family directly precedes
/// `node`. Adjacent lists alternate markers so they stay apart on import.
fn follows_same_family(node: &Node, ctx: &RenderContext<'_>) -> bool {
    let run = ctx
        .preceding_siblings(node)
        .iter()
        .rev()
        .filter(|sibling| !renders_empty(sibling))
        .take_while(|sibling| sibling.is(kinds::LIST) && is_ordered(sibling) == is_ordered(node))
        .count();
    run % 2 == 1
}

/// Blocks that leave no line between their neighbours.
fn renders_empty(node: &Node) -> bool {
    (node.is(kinds::PARAGRAPH) && node.text_content().trim().is_empty())
        || (node.is(kinds::LIST) && node.children.is_empty())
}

/// Bullet, numbered and check lists. Items are imported here too.
pub struct List;

struct ItemLines<'a> {
    marker: Marker,
    lines: Vec<&'a str>,
}

impl Marker {
    fn continues(&self, first: &Marker) -> bool {
        self.ordered == first.ordered && self.symbol == first.symbol
    }
}

impl List {
    fn collect_items<'a>(lines: &[&'a str]) -> Option<(Vec<ItemLines<'a>>, usize)> {
        let first = list_marker(lines.first()?)?;
        let mut items = Vec::new();
        let mut index = 0;

        'items: while index < lines.len() {
            let Some(marker) = list_marker(lines[index]) else {
                break;
            };
            if !marker.continues(&first) {
                break;
            }
            let opening: &'a str = lines[index];
            let mut body = vec![&opening[marker.content..]];
            index += 1;

            while index < lines.len() {
                let line = lines[index];
                if line.trim().is_empty() {
                    let Some(next) = (index..lines.len()).find(|&i| !lines[i].trim().is_empty())
                    else {
                        items.push(ItemLines { marker, lines: body });
                        break 'items;
                    };
                    let upcoming = lines[next];
                    if indent_of(upcoming) > marker.indent {
                        body.extend(std::iter::repeat_n("", next - index));
                        index = next;
                        continue;
                    }
                    let sibling = !is_thematic_break(upcoming)
                        && list_marker(upcoming).is_some_and(|m| m.continues(&first));
                    items.push(ItemLines { marker, lines: body });
                    if sibling {
                        index = next;
                        continue 'items;
                    }
                    break 'items;
                }
                if indent_of(line) > marker.indent {
                    body.push(dedent(line, marker.indent + marker.width));
                    index += 1;
                    continue;
                }
                if is_thematic_break(line) {
                    items.push(ItemLines { marker, lines: body });
                    break 'items;
                }
                match list_marker(line) {
                    Some(next) if next.continues(&first) => {
                        items.push(ItemLines { marker, lines: body });
                        continue 'items;
                    }
                    _ => {
                        items.push(ItemLines { marker, lines: body });
                        break 'items;
                    }
                }
            }
            if index >= lines.len() {
                items.push(ItemLines { marker, lines: body });
                break;
            }
        }

        Some((items, index))
    }
}

impl BlockTransformer for List {
    fn name(&self) -> &str {
        "list"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::LIST)
    }

    fn children_are_blocks(&self) -> bool {
        true
    }

    fn render(&self, node: &Node, children: &Children<'_>, ctx: &RenderContext<'_>) -> String {
        let list_type = node.attr_str("listType").unwrap_or("bullet");
        let start = node.attr_u64("start").unwrap_or(1);
        let (bullet, delimiter) = if follows_same_family(node, ctx) {
            ('*', ')')
        } else {
            ('-', '.')
        };

        let mut items = Vec::with_capacity(children.parts().len());
        for (index, part) in children.parts().iter().enumerate() {
            let (marker, width) = match list_type {
                "number" => {
                    let number = start.saturating_add(index as u64);
                    let marker = format!("{number}{delimiter} ");
                    let width = marker.len();
                    (marker, width)
                }
                "check" => {
                    let checked = node
                        .children
                        .get(index)
                        .and_then(|item| item.attr_bool("checked"))
                        .unwrap_or(false);
                    let state = if checked { 'x' } else { ' ' };
                    (format!("{bullet} [{state}] "), 2)
                }
                _ => (format!("{bullet} "), 2),
            };

            let mut lines = part.text.split('\n');
            let head = lines.next().unwrap_or_default();
            let mut item = if head.is_empty() {
                marker.trim_end().to_string()
            } else {
                format!("{marker}{head}")
            };
            for line in lines {
                item.push('\n');
                if !line.is_empty() {
                    item.push_str(&" ".repeat(width));
                    item.push_str(line);
                }
            }
            items.push(item);
        }
        items.join("\n")
    }

    fn can_start(&self, line: &str) -> bool {
        list_marker(line).is_some()
    }

    fn parse(&self, lines: &[&str], ctx: &ParseContext<'_>) -> Option<BlockMatch> {
        let (items, consumed) = Self::collect_items(lines)?;
        let first = items.first()?.marker;

        let check = !first.ordered
            && items
                .first()
                .and_then(|item| item.lines.first())
                .is_some_and(|line| checkbox(line).is_some());

        let mut list = Node::new(kinds::LIST);
        list = if first.ordered {
            list.with_attr("listType", "number")
                .with_attr("start", first.number)
        } else if check {
            list.with_attr("listType", "check")
        } else {
            list.with_attr("listType", "bullet")
        };

        for mut item in items {
            let mut node = Node::new(kinds::LIST_ITEM);
            if check {
                let mut checked = false;
                if let Some(head) = item.lines.first_mut() {
                    if let Some((state, rest)) = checkbox(head) {
                        checked = state;
                        *head = rest;
                    }
                }
                node = node.with_attr("checked", checked);
            }
            let mut blocks = ctx.parse_blocks(&item.lines);
            if blocks.first().is_some_and(|block| block.is(kinds::PARAGRAPH)) {
                let paragraph = blocks.remove(0);
                node.children.extend(paragraph.children);
            }
            node.children.extend(blocks);
            list.children.push(node);
        }

        Some(BlockMatch {
            node: list,
            consumed,
        })
    }
}

/// List item export. Items are only ever imported through [`List`].
pub struct ListItem;

impl BlockTransformer for ListItem {
    fn name(&self) -> &str {
        "listitem"
    }

    fn feature(&self) -> &str {
        "list"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::LIST_ITEM)
    }

    fn render(&self, _node: &Node, children: &Children<'_>, ctx: &RenderContext<'_>) -> String {
        let head: String = children
            .parts()
            .iter()
            .filter(|part| !part.block)
            .map(|part| part.text.as_str())
            .collect();
        let mut out = ctx.escape_line_starts(&collapse_blank_lines(&head));

        let mut after_head = true;
        for part in children
            .parts()
            .iter()
            .filter(|part| part.block && !part.text.is_empty())
        {
            if !out.is_empty() {
                let first_line = part.text.split('\n').next().unwrap_or_default();
                if after_head && ctx.transformers().interrupts_paragraph(first_line) {
                    out.push('\n');
                } else {
                    out.push_str("\n\n");
                }
            }
            out.push_str(&part.text);
            after_head = false;
        }
        out
    }

    fn can_start(&self, _line: &str) -> bool {
        false
    }

    fn parse(&self, _lines: &[&str], _ctx: &ParseContext<'_>) -> Option<BlockMatch> {
        None
    }
}

/// Paragraph of inline content. Claims any non-blank line, so it belongs
/// last among the block rules.
pub struct Paragraph;

impl BlockTransformer for Paragraph {
    fn name(&self) -> &str {
        "paragraph"
    }

    fn handles(&self, node: &Node) -> bool {
        node.is(kinds::PARAGRAPH)
    }

    fn render(&self, _node: &Node, children: &Children<'_>, ctx: &RenderContext<'_>) -> String {
        ctx.escape_line_starts(&collapse_blank_lines(&children.inline()))
    }

    fn can_start(&self, line: &str) -> bool {
        !line.trim().is_empty()
    }

    fn interrupts_paragraph(&self, _line: &str) -> bool {
        false
    }

    fn parse(&self, lines: &[&str], ctx: &ParseContext<'_>) -> Option<BlockMatch> {
        let mut consumed = 1;
        while consumed < lines.len() {
            let line = lines[consumed];
            if line.trim().is_empty() || ctx.interrupts_paragraph(line) {
                break;
            }
            consumed += 1;
        }
        let text = join_trimmed(&lines[..consumed]);
        Some(BlockMatch {
            node: Node::paragraph(ctx.parse_inline(&text)),
            consumed,
        })
    }
}

//! Fenced code block line tracking.
//!
//! The code block transformer feeds lines through [`advance_fence_state`] to
//! find where a fence opens, which lines belong to it and where it closes.

/// Where a line scan currently is relative to a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FencePhase {
    /// Between fences.
    #[default]
    Outside,
    /// After an opener, before its closer.
    InsideFence,
}

/// State carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceState {
    /// Current phase.
    pub phase: FencePhase,
    /// Opening marker, `` ` `` or `~`.
    pub marker: Option<char>,
    /// Indent columns of the opening line.
    pub indent: usize,
    /// Marker count of the opening run.
    pub length: usize,
}

/// What a single line did to the fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// Ordinary line outside any fence.
    Text,
    /// Line opened a fence.
    Open,
    /// Line is fence content.
    Content,
    /// Line closed the fence.
    Close,
}

/// Result of feeding one line to [`advance_fence_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParseOutcome {
    /// State for the following line.
    pub next_state: FenceState,
    /// Role of this line.
    pub role: LineRole,
}

/// Classifies `line` given the state left by the previous one.
pub fn advance_fence_state(line: &str, state: FenceState) -> LineParseOutcome {
    let (columns, offset) = leading_blanks(line);
    let rest = &line[offset..];
    let run = if columns <= 3 { fence_run(rest) } else { None };

    let (next_state, role) = match (state.phase, run) {
        (FencePhase::Outside, Some((marker, length)))
            if marker != '`' || !rest[length..].contains('`') =>
        {
            let opened = FenceState {
                phase: FencePhase::InsideFence,
                marker: Some(marker),
                indent: columns,
                length,
            };
            (opened, LineRole::Open)
        }
        (FencePhase::Outside, _) => (state, LineRole::Text),
        (FencePhase::InsideFence, Some((marker, length)))
            if state.marker == Some(marker)
                && length >= state.length
                && rest[length..].trim().is_empty() =>
        {
            (FenceState::default(), LineRole::Close)
        }
        (FencePhase::InsideFence, _) => (state, LineRole::Content),
    };
    LineParseOutcome { next_state, role }
}

/// Info string of an opening fence line (`rust` in "```rust"), if any.
pub fn fence_info(line: &str) -> Option<&str> {
    let rest = &line[leading_blanks(line).1..];
    let (_, length) = fence_run(rest)?;
    Some(rest[length..].trim()).filter(|info| !info.is_empty())
}

/// Removes up to `indent` columns of leading spaces from a content line.
pub fn strip_fence_indent(line: &str, indent: usize) -> &str {
    let spaces = line.bytes().take(indent).take_while(|b| *b == b' ').count();
    &line[spaces..]
}

/// Columns and bytes of leading blanks. Tabs stop at multiples of four.
fn leading_blanks(line: &str) -> (usize, usize) {
    line.bytes()
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .fold((0, 0), |(columns, bytes), b| {
            let columns = if b == b'\t' { columns + 4 - columns % 4 } else { columns + 1 };
            (columns, bytes + 1)
        })
}

/// Marker and length of a run of three or more backticks or tildes.
fn fence_run(text: &str) -> Option<(char, usize)> {
    let marker = text.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let length = text.chars().take_while(|&c| c == marker).count();
    (length >= 3).then_some((marker, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_closes_backtick_fence() {
        let start = advance_fence_state("```js", FenceState::default());
        assert_eq!(start.role, LineRole::Open);
        assert_eq!(start.next_state.marker, Some('`'));

        let inner = advance_fence_state("console.log('hi');", start.next_state);
        assert_eq!(inner.role, LineRole::Content);

        let end = advance_fence_state("```", inner.next_state);
        assert_eq!(end.role, LineRole::Close);
        assert_eq!(end.next_state, FenceState::default());
    }

    #[test]
    fn deeply_indented_fence_not_opened() {
        let outcome = advance_fence_state("    ```js", FenceState::default());
        assert_eq!(outcome.role, LineRole::Text);
        let outcome = advance_fence_state("\t```js", FenceState::default());
        assert_eq!(outcome.role, LineRole::Text);
    }

    #[test]
    fn backtick_info_string_cannot_contain_backticks() {
        let outcome = advance_fence_state("``` a`b", FenceState::default());
        assert_eq!(outcome.role, LineRole::Text);
    }

    #[test]
    fn ignores_mismatched_marker() {
        let start = advance_fence_state("~~~ts", FenceState::default());
        let still_inside = advance_fence_state("```", start.next_state);
        assert_eq!(still_inside.role, LineRole::Content);
        assert_eq!(still_inside.next_state.marker, Some('~'));
    }

    #[test]
    fn four_backtick_fence_contains_three_backtick() {
        let start = advance_fence_state("````markdown", FenceState::default());
        assert_eq!(start.next_state.length, 4);
        let inner_open = advance_fence_state("```js", start.next_state);
        assert_eq!(inner_open.role, LineRole::Content);
        let inner_close = advance_fence_state("```", inner_open.next_state);
        assert_eq!(inner_close.role, LineRole::Content);
        let outer_close = advance_fence_state("````", inner_close.next_state);
        assert_eq!(outer_close.role, LineRole::Close);
    }

    #[test]
    fn fence_with_info_string_does_not_close() {
        let start = advance_fence_state("```", FenceState::default());
        let not_closed = advance_fence_state("```js", start.next_state);
        assert_eq!(not_closed.role, LineRole::Content);
    }

    #[test]
    fn reads_info_string() {
        assert_eq!(fence_info("```rust"), Some("rust"));
        assert_eq!(fence_info("  ~~~ python  "), Some("python"));
        assert_eq!(fence_info("```"), None);
    }

    #[test]
    fn strips_only_opening_indent() {
        assert_eq!(strip_fence_indent("    code", 2), "  code");
        assert_eq!(strip_fence_indent(" code", 3), "code");
        assert_eq!(strip_fence_indent("code", 0), "code");
    }
}

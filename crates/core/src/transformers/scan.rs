//! Whole-text scans behind the inline rules.
//!
//! Bracket and delimiter pairing is worked out once per inline run, the
//! first time a rule asks, and later openers are answered from the table.
//! Scanners compare ASCII bytes only, so every offset they produce is a
//! character boundary.

use std::collections::HashMap;
use std::ops::Range;

pub(crate) fn run_length(bytes: &[u8], at: usize, byte: u8) -> usize {
    bytes[at..].iter().take_while(|b| **b == byte).count()
}

/// True when the byte at `at` is preceded by an odd number of backslashes.
pub(crate) fn is_escaped(bytes: &[u8], at: usize) -> bool {
    bytes[..at].iter().rev().take_while(|b| **b == b'\\').count() % 2 == 1
}

pub(crate) fn is_escape(bytes: &[u8], at: usize) -> bool {
    bytes[at] == b'\\' && bytes.get(at + 1).is_some_and(u8::is_ascii_punctuation)
}

/// Start of the closing backtick run and end of the span opened at `at`.
pub(crate) fn code_span_end(bytes: &[u8], at: usize) -> Option<(usize, usize)> {
    let n = run_length(bytes, at, b'`');
    let mut j = at + n;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let run = run_length(bytes, j, b'`');
            if run == n {
                return Some((j, j + n));
            }
            j += run;
        } else {
            j += 1;
        }
    }
    None
}

/// Offset past an escape or code span starting at `at`; `None` for any other
/// byte.
pub(crate) fn skip_opaque(bytes: &[u8], at: usize) -> Option<usize> {
    if is_escape(bytes, at) {
        return Some(at + 2);
    }
    if bytes[at] == b'`' {
        let end = code_span_end(bytes, at)
            .map(|(_, end)| end)
            .unwrap_or_else(|| at + run_length(bytes, at, b'`'));
        return Some(end);
    }
    None
}

/// Byte ranges of the code spans in `text`, fences included.
pub(crate) fn code_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut j = 0;
    while j < bytes.len() {
        if is_escape(bytes, j) {
            j += 2;
        } else if bytes[j] == b'`' {
            match code_span_end(bytes, j) {
                Some((_, end)) => {
                    spans.push(j..end);
                    j = end;
                }
                None => j += run_length(bytes, j, b'`'),
            }
        } else {
            j += 1;
        }
    }
    spans
}

/// The outermost span a delimiter run opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Closing {
    /// Delimiter characters the span takes on each side.
    pub width: usize,
    /// Offset of its first closing delimiter character.
    pub close: usize,
}

impl Closing {
    /// Offset just past the span.
    pub fn end(&self) -> usize {
        self.close + self.width
    }
}

/// Pairing tables for one inline run, filled on first use.
#[derive(Debug, Default)]
pub(crate) struct InlineScan {
    labels: Option<HashMap<usize, usize>>,
    runs: HashMap<u8, HashMap<usize, Closing>>,
}

impl InlineScan {
    /// Offset of the `]` matching the `[` at `open`.
    pub fn label_end(&mut self, text: &str, open: usize) -> Option<usize> {
        self.labels
            .get_or_insert_with(|| match_brackets(text.as_bytes()))
            .get(&open)
            .copied()
    }

    /// The span opened by the `byte` delimiters starting at `at`.
    pub fn closing(&mut self, text: &str, at: usize, byte: u8) -> Option<Closing> {
        self.runs
            .entry(byte)
            .or_insert_with(|| pair_runs(text, byte))
            .get(&at)
            .copied()
    }
}

fn match_brackets(bytes: &[u8]) -> HashMap<usize, usize> {
    let mut open = Vec::new();
    let mut found = HashMap::new();
    let mut j = 0;
    while j < bytes.len() {
        if let Some(next) = skip_opaque(bytes, j) {
            j = next;
            continue;
        }
        match bytes[j] {
            b'[' => open.push(j),
            b']' => {
                if let Some(start) = open.pop() {
                    found.insert(start, j);
                }
            }
            _ => {}
        }
        j += 1;
    }
    found
}

#[derive(Debug)]
struct Opener {
    start: usize,
    length: usize,
    remaining: usize,
    can_close: bool,
    outer: Option<Closing>,
}

impl Opener {
    /// Runs whose lengths sum to a multiple of three only pair when both are
    /// multiples of three, unless neither side could act the other way.
    fn pairs_with(&self, length: usize, closer_can_open: bool) -> bool {
        let either_way = self.can_close || closer_can_open;
        let sum = self.length + length;
        !(either_way && sum % 3 == 0 && (self.length % 3 != 0 || length % 3 != 0))
    }

    /// Records the span under the characters this opener still holds.
    fn settle(self, found: &mut HashMap<usize, Closing>) {
        if let Some(outer) = self.outer {
            found.insert(self.start + self.remaining, outer);
        }
    }
}

/// Pairs every run of `byte` in `text`. Closers take the nearest compatible
/// opener, two characters at a time while both runs have them; inner
/// spans use the characters nearest the text.
fn pair_runs(text: &str, byte: u8) -> HashMap<usize, Closing> {
    let bytes = text.as_bytes();
    let intraword_guard = byte == b'_';
    let mut stack: Vec<Opener> = Vec::new();
    let mut found = HashMap::new();

    let mut j = 0;
    while j < bytes.len() {
        if let Some(next) = skip_opaque(bytes, j) {
            j = next;
            continue;
        }
        if bytes[j] != byte {
            j += 1;
            continue;
        }
        let length = run_length(bytes, j, byte);
        let before = text[..j].chars().next_back();
        let after = text[j + length..].chars().next();
        let mut can_open = after.is_some_and(|c| !c.is_whitespace());
        let mut can_close = before.is_some_and(|c| !c.is_whitespace());
        if intraword_guard {
            can_open &= !before.is_some_and(char::is_alphanumeric);
            can_close &= !after.is_some_and(char::is_alphanumeric);
        }

        let mut left = length;
        while can_close && left > 0 {
            let Some(k) = stack
                .iter()
                .rposition(|opener| opener.pairs_with(length, can_open))
            else {
                break;
            };
            for skipped in stack.drain(k + 1..) {
                skipped.settle(&mut found);
            }
            let Some(opener) = stack.last_mut() else {
                break;
            };
            let width = if opener.remaining >= 2 && left >= 2 { 2 } else { 1 };
            opener.remaining -= width;
            opener.outer = Some(Closing {
                width,
                close: j + length - left,
            });
            left -= width;
            if opener.remaining == 0 {
                if let Some(done) = stack.pop() {
                    done.settle(&mut found);
                }
            }
        }
        if can_open && left > 0 {
            stack.push(Opener {
                start: j + length - left,
                length,
                remaining: left,
                can_close,
                outer: None,
            });
        }
        j += length;
    }
    for opener in stack {
        opener.settle(&mut found);
    }
    found
}

//! Front-matter codec.
//!
//! Front-matter is an ordered list of `key: value` pairs between two `---`
//! lines at the top of a markup file. Scalars are written plain when YAML
//! reads the plain text back unchanged, and double-quoted otherwise; the
//! reader applies the same rule in reverse, so writing then reading is
//! lossless for every key and value.

use crate::error::{ParseDiagnostics, ParseWarning, SourceLocation};
use serde::{Deserialize, Serialize};

const DELIMITER: &str = "---";

/// A single front-matter pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatterEntry {
    /// Entry key.
    pub key: String,
    /// Entry value.
    pub value: String,
}

impl FrontMatterEntry {
    /// Creates an entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered front-matter entries.
///
/// The list may hold repeated keys when built from host data. Writing and
/// reading both collapse repeats: the last value wins and keeps the position
/// of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter {
    entries: Vec<FrontMatterEntry>,
}

impl FrontMatter {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.value = value,
            None => self.entries.push(FrontMatterEntry { key, value }),
        }
    }

    /// Looks up the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    /// Entries in order.
    pub fn entries(&self) -> &[FrontMatterEntry] {
        &self.entries
    }

    /// Iterates over entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, FrontMatterEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collapses repeated keys (last value wins, first position kept) and
    /// returns the repeated keys in the order they were found.
    pub fn deduplicated(&self) -> (FrontMatter, Vec<String>) {
        let mut out = FrontMatter::new();
        let mut repeated = Vec::new();
        for entry in &self.entries {
            if out.get(&entry.key).is_some() {
                repeated.push(entry.key.clone());
            }
            out.insert(entry.key.clone(), entry.value.clone());
        }
        (out, repeated)
    }
}

impl From<Vec<FrontMatterEntry>> for FrontMatter {
    fn from(entries: Vec<FrontMatterEntry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<FrontMatterEntry> for FrontMatter {
    fn from_iter<T: IntoIterator<Item = FrontMatterEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FrontMatter {
    type Item = &'a FrontMatterEntry;
    type IntoIter = std::slice::Iter<'a, FrontMatterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Result of splitting a markup file into header and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterExtraction<'a> {
    /// Raw text between the delimiter lines, when a block is present.
    pub frontmatter: Option<&'a str>,
    /// Everything after the closing delimiter line, or the whole input.
    pub content: &'a str,
}

/// Splits a leading front-matter block off `input`.
///
/// Without a complete block the input is returned untouched as `content`.
pub fn extract_frontmatter(input: &str) -> FrontmatterExtraction<'_> {
    match find_block(input) {
        Some((header, body_start)) => FrontmatterExtraction {
            frontmatter: Some(header),
            content: &input[body_start..],
        },
        None => FrontmatterExtraction {
            frontmatter: None,
            content: input,
        },
    }
}

/// Renders entries as a delimited block, or an empty string for no entries.
pub fn object_to_frontmatter(front_matter: &FrontMatter) -> String {
    let (entries, repeated) = front_matter.deduplicated();
    for key in &repeated {
        log::warn!("Duplicate front-matter key '{}': keeping the last value", key);
    }
    if entries.is_empty() {
        return String::new();
    }

    let mut out = String::from(DELIMITER);
    out.push('\n');
    for entry in &entries {
        out.push_str(&write_key(&entry.key));
        out.push(':');
        if !entry.value.is_empty() {
            out.push(' ');
            out.push_str(&write_value(&entry.value));
        }
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out
}

/// Parses raw header text into entries, skipping lines it cannot read.
pub fn frontmatter_to_object(header: &str) -> FrontMatter {
    frontmatter_to_object_with_diagnostics(header).0
}

/// Like [`frontmatter_to_object`], also reporting skipped lines and repeated
/// keys. Line numbers count from the first header line.
pub fn frontmatter_to_object_with_diagnostics(header: &str) -> (FrontMatter, ParseDiagnostics) {
    let mut diagnostics = ParseDiagnostics::new();
    let mut front_matter = FrontMatter::new();

    for (index, line) in header.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let location = SourceLocation::new(index + 1, 1);
        match read_line(line) {
            Some((key, value)) => {
                if front_matter.get(&key).is_some() {
                    diagnostics.add_warning(ParseWarning::DuplicateFrontmatterKey {
                        location: Some(location),
                        key: key.clone(),
                    });
                }
                front_matter.insert(key, value);
            }
            None => diagnostics.add_warning(ParseWarning::MalformedFrontmatterLine {
                location,
                line: line.to_string(),
            }),
        }
    }

    (front_matter, diagnostics)
}

/// How a raw scalar reads.
#[derive(Debug, PartialEq, Eq)]
enum Scalar {
    /// YAML reads it as this text.
    Strict(String),
    /// YAML rejects it or reads a structure; taken literally.
    Lenient(String),
    /// Broken quoted scalar.
    Malformed,
}

fn classify(raw: &str) -> Scalar {
    use serde_yaml::Value;

    let raw = raw.trim();
    if raw.is_empty() {
        return Scalar::Strict(String::new());
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::String(text)) => Scalar::Strict(text),
        Ok(Value::Bool(_)) | Ok(Value::Number(_)) => Scalar::Strict(strip_comment(raw).to_string()),
        Ok(Value::Null) => {
            if matches!(raw, "~" | "null" | "Null" | "NULL") {
                Scalar::Strict(raw.to_string())
            } else {
                Scalar::Strict(String::new())
            }
        }
        Ok(Value::Sequence(_)) | Ok(Value::Mapping(_)) if raw.starts_with(['[', '{']) => {
            Scalar::Strict(strip_comment(raw).to_string())
        }
        Ok(_) => Scalar::Lenient(raw.to_string()),
        Err(_) if raw.starts_with(['"', '\'']) => Scalar::Malformed,
        Err(_) => Scalar::Lenient(raw.to_string()),
    }
}

fn read_scalar(raw: &str) -> Option<String> {
    match classify(raw) {
        Scalar::Strict(text) | Scalar::Lenient(text) => Some(text),
        Scalar::Malformed => None,
    }
}

fn strip_comment(raw: &str) -> &str {
    match raw.find(" #") {
        Some(index) => raw[..index].trim_end(),
        None => raw,
    }
}

fn writes_plain(text: &str) -> bool {
    !text.contains(['\n', '\r'])
        && text.trim() == text
        && !text.starts_with(['"', '\''])
        && classify(text) == Scalar::Strict(text.to_string())
}

fn write_value(value: &str) -> String {
    if writes_plain(value) {
        value.to_string()
    } else {
        quote(value)
    }
}

fn write_key(key: &str) -> String {
    let reserved_start = key.starts_with([
        '#', '-', '?', '[', ']', '{', '}', '!', '&', '*', '|', '>', '%', '@', ',', '`',
    ]);
    if key.is_empty() || key.contains(':') || reserved_start || !writes_plain(key) {
        quote(key)
    } else {
        key.to_string()
    }
}

/// Double-quoted YAML scalar with every non-printable character escaped.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if is_yaml_printable(c) => out.push(c),
            c => {
                let code = c as u32;
                if code <= 0xFFFF {
                    out.push_str(&format!("\\u{:04X}", code));
                } else {
                    out.push_str(&format!("\\U{:08X}", code));
                }
            }
        }
    }
    out.push('"');
    out
}

fn is_yaml_printable(c: char) -> bool {
    matches!(c,
        '\u{20}'..='\u{7E}'
        | '\u{A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FEFE}'
        | '\u{FF00}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn read_line(line: &str) -> Option<(String, String)> {
    if line.starts_with([' ', '\t']) {
        return None;
    }
    let (key, rest) = if line.starts_with(['"', '\'']) {
        let end = quoted_end(line)?;
        let key = match read_scalar(&line[..=end])? {
            key if !key.is_empty() => key,
            _ => return None,
        };
        let rest = line[end + 1..].trim_start();
        (key, rest.strip_prefix(':')?)
    } else {
        let colon = line.find(':')?;
        let key = line[..colon].trim();
        if key.is_empty() {
            return None;
        }
        (key.to_string(), &line[colon + 1..])
    };
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let value = read_scalar(rest)?;
    Some((key, value))
}

/// Byte index of the quote closing the quoted scalar at the start of `line`.
fn quoted_end(line: &str) -> Option<usize> {
    let quote_char = line.chars().next()?;
    let bytes = line.as_bytes();
    let mut index = 1;
    while index < bytes.len() {
        let b = bytes[index];
        if quote_char == '"' && b == b'\\' {
            index += 2;
            continue;
        }
        if b == quote_char as u8 {
            if quote_char == '\'' && bytes.get(index + 1) == Some(&b'\'') {
                index += 2;
                continue;
            }
            return Some(index);
        }
        index += 1;
    }
    None
}

/// Finds `(header, body_start)` for a leading block.
fn find_block(input: &str) -> Option<(&str, usize)> {
    let bom_len = if input.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };
    let mut cursor = bom_len;

    loop {
        let (line, next_cursor) = next_line(input, cursor)?;
        if line.trim().is_empty() {
            cursor = next_cursor;
            continue;
        }
        if !is_delimiter(line) {
            return None;
        }

        let block_start = next_cursor;
        let mut scan_cursor = next_cursor;
        loop {
            let (block_line, next_line_cursor) = next_line(input, scan_cursor)?;
            if is_delimiter(block_line) {
                let header = input[block_start..scan_cursor].trim_end_matches(['\r', '\n']);
                return Some((header, next_line_cursor));
            }
            scan_cursor = next_line_cursor;
        }
    }
}

fn next_line(input: &str, start: usize) -> Option<(&str, usize)> {
    if start >= input.len() {
        return None;
    }

    let bytes = &input.as_bytes()[start..];
    if let Some(pos) = bytes.iter().position(|b| *b == b'\n') {
        let line_end = start + pos;
        Some((&input[start..line_end], line_end + 1))
    } else {
        Some((&input[start..], input.len()))
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches('\r').trim_end() == DELIMITER
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> FrontMatter {
        pairs
            .iter()
            .map(|(key, value)| FrontMatterEntry::new(*key, *value))
            .collect()
    }

    #[test]
    fn returns_input_when_no_frontmatter() {
        let input = "\n  # Title\nBody";
        let result = extract_frontmatter(input);
        assert_eq!(result.frontmatter, None);
        assert_eq!(result.content, input);
    }

    #[test]
    fn splits_header_and_body() {
        let input = "---\ntitle: Example\n---\n\n# Content";
        let result = extract_frontmatter(input);
        assert_eq!(result.frontmatter, Some("title: Example"));
        assert_eq!(result.content, "\n# Content");
    }

    #[test]
    fn handles_empty_block() {
        let result = extract_frontmatter("---\n---\n# Body");
        assert_eq!(result.frontmatter, Some(""));
        assert_eq!(result.content, "# Body");
    }

    #[test]
    fn tolerates_bom_blank_lines_and_crlf() {
        let input = "\u{feff}\n   \n---\r\nfoo: bar\r\n---\r\nBody";
        let result = extract_frontmatter(input);
        assert_eq!(result.frontmatter, Some("foo: bar"));
        assert_eq!(result.content, "Body");
    }

    #[test]
    fn unterminated_block_is_left_as_content() {
        let input = "---\ntitle: test";
        let result = extract_frontmatter(input);
        assert_eq!(result.frontmatter, None);
        assert_eq!(result.content, input);
    }

    #[test]
    fn writes_block_with_one_line_per_entry() {
        let text = object_to_frontmatter(&entries(&[("title", "Intro"), ("draft", "true")]));
        assert_eq!(text, "---\ntitle: Intro\ndraft: true\n---\n");
    }

    #[test]
    fn empty_entries_write_nothing() {
        assert_eq!(object_to_frontmatter(&FrontMatter::new()), "");
    }

    #[test]
    fn quotes_values_yaml_would_change() {
        let text = object_to_frontmatter(&entries(&[
            ("a", "Re: hello"),
            ("b", " padded "),
            ("c", "two\nlines"),
            ("d", "say \"hi\" # now"),
            ("e", ""),
            ("f", "42"),
        ]));
        assert_eq!(
            text,
            "---\na: \"Re: hello\"\nb: \" padded \"\nc: \"two\\nlines\"\nd: \"say \\\"hi\\\" # now\"\ne:\nf: 42\n---\n"
        );
    }

    #[test]
    fn quotes_awkward_keys() {
        let text = object_to_frontmatter(&entries(&[("a:b", "x"), ("#tag", "y")]));
        assert_eq!(text, "---\n\"a:b\": x\n\"#tag\": y\n---\n");
        let header = extract_frontmatter(&text).frontmatter.unwrap();
        assert_eq!(
            frontmatter_to_object(header),
            entries(&[("a:b", "x"), ("#tag", "y")])
        );
    }

    #[test]
    fn reads_plain_and_quoted_values_in_order() {
        let header = "title: Intro\nsubtitle: 'It''s here'\nquote: \"a \\\"b\\\"\"\ncount: 3 # items\ntags: [a, b]\nempty:";
        assert_eq!(
            frontmatter_to_object(header),
            entries(&[
                ("title", "Intro"),
                ("subtitle", "It's here"),
                ("quote", "a \"b\""),
                ("count", "3"),
                ("tags", "[a, b]"),
                ("empty", ""),
            ])
        );
    }

    #[test]
    fn keeps_unquoted_colons_literally() {
        assert_eq!(
            frontmatter_to_object("title: Re: hello"),
            entries(&[("title", "Re: hello")])
        );
    }

    #[test]
    fn skips_malformed_lines() {
        let header = "title: Intro\njust words\n  nested: value\n: no key\nbroken: \"open\n# comment\n\nlast: one";
        let (front_matter, diagnostics) = frontmatter_to_object_with_diagnostics(header);
        assert_eq!(front_matter, entries(&[("title", "Intro"), ("last", "one")]));
        assert_eq!(diagnostics.warnings.len(), 4);
        assert!(diagnostics.warnings.iter().all(|warning| matches!(
            warning,
            ParseWarning::MalformedFrontmatterLine { .. }
        )));
        assert_eq!(diagnostics.warnings[0].location().map(|l| l.line), Some(2));
    }

    #[test]
    fn repeated_keys_keep_last_value_at_first_position() {
        let (front_matter, diagnostics) =
            frontmatter_to_object_with_diagnostics("a: 1\nb: 2\na: 3");
        assert_eq!(front_matter, entries(&[("a", "3"), ("b", "2")]));
        assert!(matches!(
            &diagnostics.warnings[..],
            [ParseWarning::DuplicateFrontmatterKey { key, .. }] if key == "a"
        ));

        let text = object_to_frontmatter(&entries(&[("a", "1"), ("b", "2"), ("a", "3")]));
        assert_eq!(text, "---\na: 3\nb: 2\n---\n");
    }

    #[test]
    fn escapes_control_characters() {
        let value = "bell\u{7}tab\tend";
        let text = object_to_frontmatter(&entries(&[("k", value)]));
        assert_eq!(text, "---\nk: \"bell\\u0007tab\\tend\"\n---\n");
        let header = extract_frontmatter(&text).frontmatter.unwrap();
        assert_eq!(frontmatter_to_object(header).get("k"), Some(value));
    }
}

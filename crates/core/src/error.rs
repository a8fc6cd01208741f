use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 1-indexed line and column inside the text being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Line number.
    pub line: usize,
    /// Column number.
    pub column: usize,
}

impl SourceLocation {
    /// Location at `line`, `column`.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised when decoding host-supplied document state.
///
/// Conversion itself never fails; this only covers the JSON boundary where a
/// serialized editor state is turned back into a [`crate::Node`] tree.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The serialized state is not valid document JSON.
    #[error("Invalid document state: {0}")]
    InvalidState(#[from] serde_json::Error),
    /// The top-level node is not a `root` node.
    #[error("Document root must have type `root`, found `{0}`")]
    NotARoot(String),
}

/// Errors raised while assembling a transformer set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A requested editor feature has no built-in transformer.
    #[error("Unknown transformer feature: {0}")]
    UnknownFeature(String),
}

/// Something conversion skipped or degraded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParseWarning {
    /// A code fence runs to the end of the input.
    #[error("{location}: unclosed code fence ({marker}) near '{context}'")]
    UnclosedCodeFence {
        /// Where the fence opened.
        location: SourceLocation,
        /// `` ` `` or `~`.
        marker: char,
        /// The opening line.
        context: String,
    },
    /// A front-matter line that is not `key: value`.
    #[error("{location}: skipped malformed front-matter line '{line}'")]
    MalformedFrontmatterLine {
        /// Line inside the header block.
        location: SourceLocation,
        /// The offending line.
        line: String,
    },
    /// A repeated front-matter key; the later value won.
    #[error("duplicate front-matter key '{key}'")]
    DuplicateFrontmatterKey {
        /// Where the repeat was read, for headers parsed from text.
        location: Option<SourceLocation>,
        /// The repeated key.
        key: String,
    },
    /// No transformer handled a node; its text was emitted literally.
    #[error("no transformer for node type '{kind}', emitted as literal text")]
    UnhandledNode {
        /// Node type tag.
        kind: String,
    },
}

impl ParseWarning {
    /// Where the warning points, if anywhere.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ParseWarning::UnclosedCodeFence { location, .. }
            | ParseWarning::MalformedFrontmatterLine { location, .. } => Some(location),
            ParseWarning::DuplicateFrontmatterKey { location, .. } => location.as_ref(),
            ParseWarning::UnhandledNode { .. } => None,
        }
    }
}

/// A failure conversion recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverableError {
    /// What went wrong.
    pub message: String,
    /// Where it went wrong.
    pub location: SourceLocation,
}

impl RecoverableError {
    /// An error at `line`, `column`.
    pub fn error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }
}

impl fmt::Display for RecoverableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at {}: {}", self.location, self.message)
    }
}

/// Warnings and recovered errors gathered during one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostics {
    /// Warnings, in the order they were raised.
    pub warnings: Vec<ParseWarning>,
    /// Recovered errors, in the order they were raised.
    pub errors: Vec<RecoverableError>,
}

impl ParseDiagnostics {
    /// No diagnostics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn add_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    /// Records a recovered error.
    pub fn add_error(&mut self, error: RecoverableError) {
        self.errors.push(error);
    }

    /// Records a recovered error at `line`, `column`.
    pub fn add_error_at(&mut self, message: impl Into<String>, line: usize, column: usize) {
        self.add_error(RecoverableError::error(message, line, column));
    }

    /// Appends everything in `other`.
    pub fn extend(&mut self, other: ParseDiagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    /// Whether any warning was raised.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether any error was recovered.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether anything at all was raised.
    pub fn has_any(&self) -> bool {
        self.has_warnings() || self.has_errors()
    }

    /// Number of warnings plus errors.
    pub fn count(&self) -> usize {
        self.warnings.len() + self.errors.len()
    }
}

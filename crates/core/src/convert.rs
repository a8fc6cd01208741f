//! Markup file <-> document conversion.
//!
//! These are the two entry points host integrations call. Front-matter and
//! body are each converted best-effort: a bad header never stops the body
//! from loading and the other way round.

use crate::document::Node;
use crate::error::ParseDiagnostics;
use crate::frontmatter::{
    FrontMatter, extract_frontmatter, frontmatter_to_object_with_diagnostics,
    object_to_frontmatter,
};
use crate::parse::parse_with_diagnostics;
use crate::serialize::serialize;
use crate::transformer::TransformerSet;

/// Result of reading a markup file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Parsed body.
    pub root: Node,
    /// Header entries in file order.
    pub front_matter: FrontMatter,
    /// Everything that was skipped or degraded on the way.
    pub diagnostics: ParseDiagnostics,
}

/// Reads a markup file into a tree and its front-matter.
pub fn file_to_document(markup: &str, transformers: &TransformerSet) -> LoadedDocument {
    let extraction = extract_frontmatter(markup);
    let mut diagnostics = ParseDiagnostics::new();

    let front_matter = match extraction.frontmatter {
        Some(header) if !header.trim().is_empty() => {
            let (front_matter, header_diagnostics) = frontmatter_to_object_with_diagnostics(header);
            diagnostics.extend(header_diagnostics);
            front_matter
        }
        _ => FrontMatter::new(),
    };

    let (root, body_diagnostics) = parse_with_diagnostics(extraction.content, transformers);
    diagnostics.extend(body_diagnostics);

    LoadedDocument {
        root,
        front_matter,
        diagnostics,
    }
}

/// Writes a tree and its front-matter as one markup file. An empty header
/// is left out entirely.
pub fn document_to_file(
    root: &Node,
    front_matter: &FrontMatter,
    transformers: &TransformerSet,
) -> String {
    let header = object_to_frontmatter(front_matter);
    let body = serialize(root, transformers);
    if header.is_empty() {
        body
    } else {
        format!("{header}\n{body}")
    }
}

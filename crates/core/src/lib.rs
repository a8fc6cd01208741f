#![deny(missing_docs)]
//! mdxsync core: rich-text document trees <-> markdown with front-matter.
//!
//! Conversion is driven by an ordered [`TransformerSet`]; the same rules, in
//! the same order, serve both directions.

/// Code fence detection utilities.
pub mod code_fence;
/// Markup file <-> document conversion.
pub mod convert;
/// Document tree types.
pub mod document;
/// Core error and diagnostic types.
pub mod error;
/// Front-matter codec.
pub mod frontmatter;
/// Text-to-tree parser.
pub mod parse;
/// Tree-to-text serializer.
pub mod serialize;
/// Transformer traits and the ordered registry.
pub mod transformer;
/// Built-in transformers.
pub mod transformers;

pub use code_fence::{FencePhase, FenceState, LineParseOutcome, LineRole, advance_fence_state};
pub use convert::{LoadedDocument, document_to_file, file_to_document};
pub use document::{Document, Node, kinds};
pub use error::{
    DocumentError, ParseDiagnostics, ParseWarning, RecoverableError, RegistryError, SourceLocation,
};
pub use frontmatter::{
    FrontMatter, FrontMatterEntry, FrontmatterExtraction, extract_frontmatter,
    frontmatter_to_object, frontmatter_to_object_with_diagnostics, object_to_frontmatter,
};
pub use parse::{ParseContext, parse, parse_with_diagnostics};
pub use serialize::{Children, RenderContext, Rendered, serialize, serialize_with_diagnostics};
pub use transformer::{
    BlockMatch, BlockTransformer, InlineMatch, InlineTransformer, Transformer, TransformerSet,
    default_transformers,
};

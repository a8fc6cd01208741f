#![deny(missing_docs)]
//! mdxsync hooks: keep rich-text collection records in sync with markdown
//! files on disk.

/// Parallel batch loading.
pub mod batch;
/// Collection schema.
pub mod config;
/// Hook error types.
pub mod error;
/// Before-change and after-read hooks.
pub mod hooks;
/// Markup file storage.
pub mod store;

pub use batch::{BatchInput, BatchLoadResult, BatchOptions, BatchResult, BatchStats, load_documents};
pub use config::{CollectionConfig, EditorConfig, FieldConfig, all_features};
pub use error::{HookError, Result};
pub use hooks::{EditorJson, FieldNames, HookContext, MarkupHooks, markup_to_editor_json};
pub use store::{FsStore, MarkupStore, MemoryStore};

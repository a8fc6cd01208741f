//! Before-change and after-read hooks.
//!
//! Records keep their rich text on disk as markdown. On save the tree and
//! front-matter are written to the record's file and the database copy is
//! cleared; on read the file is loaded back into the record.

use crate::config::CollectionConfig;
use crate::error::{HookError, Result};
use crate::store::{FsStore, MarkupStore};
use mdxsync_core::{
    Document, FrontMatter, FrontMatterEntry, TransformerSet, document_to_file, file_to_document,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Per-call host context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookContext {
    /// Seeding run: hooks pass records through untouched.
    pub seed: bool,
}

impl HookContext {
    /// Context of a seeding run.
    pub fn seed() -> Self {
        Self { seed: true }
    }
}

/// Record field names the hooks read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    /// Serialized editor state.
    pub rich_text: String,
    /// File path relative to the base directory.
    pub doc_path: String,
    /// Array of `{key, value}` objects.
    pub front_matter: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            rich_text: "richText".to_string(),
            doc_path: "docPath".to_string(),
            front_matter: "frontMatter".to_string(),
        }
    }
}

/// Editor state and front-matter as a host record stores them.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorJson {
    /// `{"root": {...}}` editor state.
    pub editor_state: Value,
    /// Header entries in file order.
    pub front_matter: Vec<FrontMatterEntry>,
}

/// Converts a markup file into record-shaped JSON.
pub fn markup_to_editor_json(markup: &str, transformers: &TransformerSet) -> EditorJson {
    let loaded = file_to_document(markup, transformers);
    for warning in &loaded.diagnostics.warnings {
        log::debug!("{}", warning);
    }
    EditorJson {
        editor_state: Document::new(loaded.root).to_json(),
        front_matter: loaded.front_matter.entries().to_vec(),
    }
}

/// Reads `{key, value}` items, stringifying non-string values. Anything
/// else is ignored.
fn read_front_matter(value: Option<&Value>) -> FrontMatter {
    let Some(Value::Array(items)) = value else {
        return FrontMatter::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let key = item.get("key").and_then(Value::as_str)?;
            let value = match item.get("value") {
                Some(Value::String(text)) => text.clone(),
                None | Some(Value::Null) => String::new(),
                Some(other) => other.to_string(),
            };
            Some(FrontMatterEntry::new(key, value))
        })
        .collect::<Vec<_>>()
        .into()
}

/// Collection hooks backed by a [`MarkupStore`].
#[derive(Debug, Clone)]
pub struct MarkupHooks<S = FsStore> {
    base_dir: PathBuf,
    store: S,
    fields: FieldNames,
}

impl MarkupHooks<FsStore> {
    /// Hooks writing below `base_dir` on the local filesystem.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_store(base_dir, FsStore)
    }
}

impl<S: MarkupStore> MarkupHooks<S> {
    /// Hooks writing below `base_dir` through `store`.
    pub fn with_store(base_dir: impl Into<PathBuf>, store: S) -> Self {
        Self {
            base_dir: base_dir.into(),
            store,
            fields: FieldNames::default(),
        }
    }

    /// Replaces the record field names.
    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    /// Directory record paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Field names in use.
    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    /// Absolute path of the markup file for `record`.
    pub fn path_for(&self, record: &Map<String, Value>) -> Result<PathBuf> {
        let relative = record
            .get(&self.fields.doc_path)
            .and_then(Value::as_str)
            .ok_or_else(|| HookError::MissingField(self.fields.doc_path.clone()))?;
        Ok(self.base_dir.join(relative))
    }

    /// Writes the record's rich text and front-matter to its markup file and
    /// returns the record with the rich-text field cleared.
    ///
    /// Editor state that does not decode is logged and written as an empty
    /// document. Blank markup is not written.
    pub fn before_change(
        &self,
        collection: &CollectionConfig,
        data: Value,
        ctx: &HookContext,
    ) -> Result<Value> {
        if ctx.seed {
            return Ok(data);
        }
        let Value::Object(mut record) = data else {
            return Err(HookError::NotAnObject);
        };

        let transformers = collection.transformers_for(&self.fields.rich_text)?;
        let path = self.path_for(&record)?;

        let state = record
            .get(&self.fields.rich_text)
            .cloned()
            .unwrap_or(Value::Null);
        let (document, _) = Document::from_json_lossy(state);
        let front_matter = read_front_matter(record.get(&self.fields.front_matter));
        let markup = document_to_file(&document.root, &front_matter, &transformers);

        if markup.trim().is_empty() {
            log::debug!("Skipping empty markup for {}", path.display());
        } else {
            self.store.write_text(&path, &markup)?;
        }

        record.insert(self.fields.rich_text.clone(), Value::Null);
        Ok(Value::Object(record))
    }

    /// Loads the record's markup file into its rich-text and front-matter
    /// fields.
    pub fn after_read(
        &self,
        collection: &CollectionConfig,
        doc: Value,
        ctx: &HookContext,
    ) -> Result<Value> {
        if ctx.seed {
            return Ok(doc);
        }
        let Value::Object(mut record) = doc else {
            return Err(HookError::NotAnObject);
        };

        let transformers = collection.transformers_for(&self.fields.rich_text)?;
        let path = self.path_for(&record)?;
        let markup = self.store.read_text(&path)?;
        let loaded = markup_to_editor_json(&markup, &transformers);

        let front_matter = serde_json::to_value(&loaded.front_matter)?;
        record.insert(self.fields.rich_text.clone(), loaded.editor_state);
        record.insert(self.fields.front_matter.clone(), front_matter);
        Ok(Value::Object(record))
    }
}

//! Collection schema as far as the hooks need it.

use crate::error::{HookError, Result};
use mdxsync_core::{RegistryError, Transformer, TransformerSet, default_transformers};
use serde::{Deserialize, Serialize};

/// Feature names of every built-in rule, in canonical order.
pub fn all_features() -> Vec<String> {
    let mut features: Vec<String> = Vec::new();
    for feature in default_transformers().iter().map(Transformer::feature) {
        if !features.iter().any(|known| known == feature) {
            features.push(feature.to_string());
        }
    }
    features
}

/// A collection and its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    /// Collection identifier.
    pub slug: String,
    /// Field definitions.
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// A single field of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Field name inside records.
    pub name: String,
    /// Field type (`richText`, `text`, `array`, ...).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Editor settings for rich-text fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorConfig>,
}

/// Rich-text editor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Enabled features; each maps to one or more transformers.
    #[serde(default = "all_features")]
    pub features: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            features: all_features(),
        }
    }
}

impl EditorConfig {
    /// Transformers for the enabled features, in canonical order.
    pub fn transformers(&self) -> std::result::Result<TransformerSet, RegistryError> {
        TransformerSet::from_features(self.features.as_slice())
    }
}

impl CollectionConfig {
    /// Reads a collection definition from YAML.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Reads a collection definition from JSON.
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Field named `name`.
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Transformers configured for the rich-text field `name`. A field
    /// without editor settings gets every built-in rule.
    pub fn transformers_for(&self, name: &str) -> Result<TransformerSet> {
        let field = self
            .field(name)
            .ok_or_else(|| HookError::MissingField(format!("{}.{}", self.slug, name)))?;
        match &field.editor {
            Some(editor) => Ok(editor.transformers()?),
            None => Ok(default_transformers().clone()),
        }
    }
}

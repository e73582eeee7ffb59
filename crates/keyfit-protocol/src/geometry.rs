use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LayoutMeta {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub notes: String,
}

/// One physical key slot in a layout row.
///
/// An empty `code` marks a placeholder: it takes a column slot (and its
/// `x_offset` still accumulates) but it is never drawn or coloured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDefinition {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub label: String,

    /// Extra gap before this key, in key units. Cumulative across the row.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub x_offset: f32,

    #[serde(default = "default_size")]
    pub width: f32,

    /// Only set for keys spanning more than one row (e.g. the JIS Enter).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

fn default_size() -> f32 {
    1.0
}

fn is_zero(v: &f32) -> bool {
    *v == 0.0
}

impl KeyDefinition {
    pub fn new(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            x_offset: 0.0,
            width: 1.0,
            height: None,
        }
    }

    pub fn placeholder() -> Self {
        Self::new("", "")
    }

    pub fn offset(mut self, x_offset: f32) -> Self {
        self.x_offset = x_offset;
        self
    }

    pub fn wide(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn tall(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.code.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LayoutDefinition {
    #[serde(default)]
    pub meta: LayoutMeta,
    pub rows: Vec<Vec<KeyDefinition>>,
}

impl LayoutDefinition {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of column slots, placeholders included.
    pub fn slot_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Keys that are actually drawn, in row-major order.
    pub fn real_keys(&self) -> impl Iterator<Item = &KeyDefinition> {
        self.rows
            .iter()
            .flatten()
            .filter(|k| !k.is_placeholder())
    }
}

/// The built-in physical layouts. The persisted preference stores the
/// `Display` form ("JP" / "US").
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LayoutVariant {
    #[default]
    #[serde(rename = "JP")]
    #[strum(serialize = "JP")]
    Jp,
    #[serde(rename = "US")]
    #[strum(serialize = "US")]
    Us,
}

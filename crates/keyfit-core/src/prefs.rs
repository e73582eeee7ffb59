use crate::consts::PREF_KEY_LAYOUT;
use crate::error::PreferenceError;
use crate::geometry::LayoutVariant;
use crate::util::atomic_write;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Opaque string key-value store for user preferences.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct StoredValue {
    value: String,
}

/// JSON file of `{ "<key>": { "value": "<string>" } }`, rewritten
/// atomically on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, StoredValue>, PreferenceError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.read_entries()?.remove(key).map(|v| v.value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(PreferenceError::Json(e)) => {
                warn!(path = %self.path.display(), "replacing unreadable preference file: {}", e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
            },
        );
        let json = serde_json::to_string_pretty(&entries)?;
        atomic_write(&self.path, json)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the stored layout variant. Any failure or unknown value falls
/// back to the default variant.
pub fn load_layout(store: &dyn PreferenceStore) -> LayoutVariant {
    match store.get(PREF_KEY_LAYOUT) {
        Ok(Some(raw)) => LayoutVariant::from_str(&raw).unwrap_or_else(|_| {
            warn!(value = %raw, "unknown stored layout, using default");
            LayoutVariant::default()
        }),
        Ok(None) => LayoutVariant::default(),
        Err(e) => {
            warn!("failed to read layout preference: {}", e);
            LayoutVariant::default()
        }
    }
}

pub fn save_layout(
    store: &mut dyn PreferenceStore,
    variant: LayoutVariant,
) -> Result<(), PreferenceError> {
    store.set(PREF_KEY_LAYOUT, &variant.to_string())
}

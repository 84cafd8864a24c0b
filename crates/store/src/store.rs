//! Section stores: a flat map of section name to JSON value.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::StoreError;

/// Well-known section names.
pub mod sections {
    pub const STUDENTS: &str = "students";
    pub const CONSTRAINTS: &str = "constraints";
    pub const LAYOUTS: &str = "layouts";
    pub const SEATING: &str = "seating";
    pub const HISTORY: &str = "history";
    pub const PREFERENCES: &str = "preferences";
    pub const SETTINGS: &str = "settings";

    pub const ALL: [&str; 7] = [
        STUDENTS,
        CONSTRAINTS,
        LAYOUTS,
        SEATING,
        HISTORY,
        PREFERENCES,
        SETTINGS,
    ];
}

/// Key/value persistence of named JSON sections.
pub trait SectionStore {
    /// The stored value, or `None` if the section was never saved.
    fn get_section(&self, name: &str) -> Option<Value>;

    fn save_section(&mut self, name: &str, value: Value) -> Result<(), StoreError>;

    /// Remove every section.
    fn clear(&mut self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Volatile store for tests and one-shot runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sections: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

impl SectionStore for MemoryStore {
    fn get_section(&self, name: &str) -> Option<Value> {
        self.sections.get(name).cloned()
    }

    fn save_section(&mut self, name: &str, value: Value) -> Result<(), StoreError> {
        self.sections.insert(name.to_string(), value);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.sections.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// All sections in one JSON object on disk.
///
/// The document is read once on [`JsonFileStore::open`] and rewritten on
/// every save: the new content goes to a sibling temp file which is then
/// renamed over the original, so a crash never leaves a half-written store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: serde_json::Map<String, Value>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing or empty file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => serde_json::Map::new(),
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(StoreError::Corrupt(format!(
                        "{} does not contain a JSON object",
                        path.display()
                    )))
                }
                Err(e) => {
                    return Err(StoreError::Corrupt(format!(
                        "{} is not valid JSON: {e}",
                        path.display()
                    )))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::Map::new(),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        tracing::debug!(path = %path.display(), sections = document.len(), "Opened JSON store");
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "seatplan.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.document)
            .map_err(|e| StoreError::serde("<document>", e))?;
        let temp = self.temp_path();
        fs::write(&temp, text).map_err(|e| StoreError::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

impl SectionStore for JsonFileStore {
    fn get_section(&self, name: &str) -> Option<Value> {
        self.document.get(name).cloned()
    }

    fn save_section(&mut self, name: &str, value: Value) -> Result<(), StoreError> {
        self.document.insert(name.to_string(), value);
        self.flush()
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.document.clear();
        self.flush()
    }
}

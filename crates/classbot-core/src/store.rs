//! The on-disk JSON document.
//!
//! A single JSON object in a single file. Other subsystems may own keys in
//! the same document, so the whole object is kept in memory and written back
//! as a unit.

use crate::error::{ClassbotError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub struct Store {
    path: PathBuf,
    document: Map<String, Value>,
}

impl Store {
    /// Read the document at `path`.
    ///
    /// A missing file is an empty document; nothing is created until the
    /// first [`Store::write`]. Any other read or parse failure is returned.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<Value>(&data)? {
                Value::Object(map) => map,
                other => {
                    return Err(ClassbotError::InvalidStore(format!(
                        "{} should hold a JSON object, got {}",
                        path.display(),
                        type_name(&other)
                    )))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "storage file {} did not exist, a new one will be created on the next write",
                    path.display()
                );
                tracing::warn!(
                    "if this is not the first run, restore the old file and restart to avoid losing data"
                );
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.document
    }

    /// Write the in-memory document back to disk, creating the file if needed.
    pub fn write(&self) -> Result<()> {
        let data = serde_json::to_vec(&self.document)?;
        crate::io::atomic_write(&self.path, &data)
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_and_not_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = Store::open(&path).unwrap();
        assert!(store.document().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn write_creates_file_and_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"greeting":"hi","count":3}"#).unwrap();

        let mut store = Store::open(&path).unwrap();
        store
            .document_mut()
            .insert("managedClasses".into(), serde_json::json!([["CS", "101"]]));
        store.write().unwrap();

        let reread: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread["greeting"], "hi");
        assert_eq!(reread["count"], 3);
        assert_eq!(reread["managedClasses"][0][1], "101");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Store::open(&path), Err(ClassbotError::Json(_))));
    }

    #[test]
    fn non_object_document_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = Store::open(&path).err().expect("should fail");
        assert!(err.to_string().contains("got array"), "{err}");
    }
}

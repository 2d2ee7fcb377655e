use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StorageError;

/// String key/value store persisted as one JSON object, the same contract as
/// browser local storage.
pub struct LocalStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl LocalStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let items = match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = items.len(), "opened local storage");
        Ok(Self {
            path: path.to_path_buf(),
            items,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let mut items = self.items.clone();
        items.insert(key.to_string(), value);
        self.commit(items)
    }

    pub fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.items.contains_key(key) {
            return Ok(());
        }
        let mut items = self.items.clone();
        items.remove(key);
        self.commit(items)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.commit(BTreeMap::new())
    }

    /// The in-memory map only changes once the file write has succeeded.
    fn commit(&mut self, items: BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&items)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = items.len(), "flushed local storage");
        self.items = items;
        Ok(())
    }
}

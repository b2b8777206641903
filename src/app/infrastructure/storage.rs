//! Client-local key/value persistence.
//!
//! Stores write a namespaced JSON record per key, wrapped in a
//! `{"state": …, "version": 0}` envelope. Readers never fail: an absent
//! or unreadable record yields the caller's defaults.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::error::{AppError, Result};

pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// One JSON file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the platform data directory (cross-platform)
    pub fn default_location() -> Self {
        Self::new(Self::default_dir())
    }

    pub fn default_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("adminx");
        path.push("storage");
        path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, for tests and embedders without a disk.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// Read the persisted subset stored under `key`, or `T::default()`.
pub fn load_persisted<T>(storage: &dyn KeyValueStorage, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::warn!("Failed to read {key}: {e}. Using defaults.");
            return T::default();
        }
    };

    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) => envelope.state,
        Err(e) => {
            tracing::warn!("Failed to parse {key}: {e}. Using defaults.");
            T::default()
        }
    }
}

/// Write the persisted subset under `key`.
pub fn save_persisted<T: Serialize>(
    storage: &dyn KeyValueStorage,
    key: &str,
    state: &T,
) -> Result<()> {
    let json = serde_json::to_string(&Envelope { state, version: 0 })?;
    storage.set_item(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Layout {
        #[serde(default)]
        sidebar_collapsed: bool,
        #[serde(default)]
        width: u32,
    }

    #[test]
    fn test_missing_record_uses_defaults() {
        let storage = MemoryStorage::new();
        let layout: Layout = load_persisted(&storage, "layout-storage");
        assert_eq!(layout, Layout::default());
    }

    #[test]
    fn test_malformed_record_uses_defaults() {
        let storage = MemoryStorage::new();
        storage.set_item("layout-storage", "{not json").unwrap();
        let layout: Layout = load_persisted(&storage, "layout-storage");
        assert_eq!(layout, Layout::default());

        // Valid JSON without the envelope is treated the same way
        storage.set_item("layout-storage", r#"{"width": 3}"#).unwrap();
        let layout: Layout = load_persisted(&storage, "layout-storage");
        assert_eq!(layout, Layout::default());
    }

    #[test]
    fn test_envelope_format() {
        let storage = MemoryStorage::new();
        let layout = Layout {
            sidebar_collapsed: true,
            width: 240,
        };
        save_persisted(&storage, "layout-storage", &layout).unwrap();

        let raw = storage.get_item("layout-storage").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["state"]["sidebarCollapsed"], true);
        assert_eq!(value["version"], 0);

        let loaded: Layout = load_persisted(&storage, "layout-storage");
        assert_eq!(loaded, layout);
    }

    #[test]
    fn test_partial_record() {
        // Older records missing newer fields keep their stored values
        let storage = MemoryStorage::new();
        storage
            .set_item("layout-storage", r#"{"state": {"sidebarCollapsed": true}}"#)
            .unwrap();
        let layout: Layout = load_persisted(&storage, "layout-storage");
        assert!(layout.sidebar_collapsed);
        assert_eq!(layout.width, 0);
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get_item("auth-storage").unwrap(), None);
        storage.set_item("auth-storage", "{}").unwrap();
        assert!(dir.path().join("nested").join("auth-storage.json").exists());
        assert_eq!(storage.get_item("auth-storage").unwrap().as_deref(), Some("{}"));

        storage.remove_item("auth-storage").unwrap();
        storage.remove_item("auth-storage").unwrap();
        assert_eq!(storage.get_item("auth-storage").unwrap(), None);
    }

    #[test]
    fn test_file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let err = storage.set_item("../escape", "{}").unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}

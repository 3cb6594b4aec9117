// Key-value persistence for ledger snapshots. Values are JSON strings; the
// ledgers own the (de)serialization, stores only move text around.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EngineError, EngineResult};

pub const META_KEY: &str = "energy_calc_meta_v2";
pub const ROWS_KEY: &str = "energy_calc_rows_v2";
pub const PRODUCTION_GROUPS_KEY: &str = "energy_production_groups_v1";
pub const PASSPORT_KEY: &str = "passport_section1";

/// What a ledger found under its keys on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    Loaded,
    Absent,
    /// Present but unreadable; saving over it would discard the stored data.
    Corrupt,
}

impl SnapshotStatus {
    pub fn is_corrupt(self) -> bool {
        self == SnapshotStatus::Corrupt
    }
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> EngineResult<()>;
    fn remove(&mut self, key: &str) -> EngineResult<()>;
}

/// In-process store, used by tests and by callers that persist elsewhere.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> EngineResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> EngineResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open(dir: impl AsRef<Path>) -> EngineResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> EngineResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(EngineError::Storage(format!("invalid store key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(text))
    }

    fn set(&mut self, key: &str, value: &str) -> EngineResult<()> {
        let path = self.path_for(key)?;
        // write-then-rename
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(key, path = %path.display(), bytes = value.len(), "Stored snapshot");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> EngineResult<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(META_KEY).unwrap(), None);
        store.set(META_KEY, "{}").unwrap();
        assert_eq!(store.get(META_KEY).unwrap().as_deref(), Some("{}"));
        assert_eq!(store.len(), 1);
        store.remove(META_KEY).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_file_store_persists_between_instances() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path().join("state")).unwrap();
        store.set(ROWS_KEY, "[1,2]").unwrap();
        assert!(dir.path().join("state").join("energy_calc_rows_v2.json").exists());

        let reopened = JsonFileStore::open(dir.path().join("state")).unwrap();
        assert_eq!(reopened.get(ROWS_KEY).unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(reopened.get(PASSPORT_KEY).unwrap(), None);

        store.remove(ROWS_KEY).unwrap();
        store.remove(ROWS_KEY).unwrap();
        assert_eq!(store.get(ROWS_KEY).unwrap(), None);
    }

    #[test]
    fn test_json_file_store_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path()).unwrap();
        assert!(matches!(store.set("../escape", "x"), Err(EngineError::Storage(_))));
        assert!(matches!(store.get(""), Err(EngineError::Storage(_))));
    }
}

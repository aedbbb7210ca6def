// In crates/storage/src/kv.rs

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::{Error, Result};

/// The fixed keys of the durable layout. Values are UTF-8 JSON.
pub mod keys {
    /// A single `DailyReport`.
    pub const CURRENT_REPORT: &str = "market-memo-current-report";
    /// `DailyReport[]`, user-saved reports only (never seed data).
    pub const HISTORICAL_DATA: &str = "market-memo-historical-data";
    /// `SectorRecap[]`, one draft per sector.
    pub const DRAFT_SECTORS: &str = "market-memo-draft-sectors";
    /// A single `ApacComments` draft.
    pub const DRAFT_APAC: &str = "market-memo-draft-apac";

    pub const ALL: [&str; 4] = [CURRENT_REPORT, HISTORICAL_DATA, DRAFT_SECTORS, DRAFT_APAC];
}

/// A durable string-to-string store, the moral equivalent of browser local
/// storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a key that does not exist is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileKvStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    ///
    /// # Arguments
    ///
    /// * `dir`: The directory holding one file per key.
    /// * `quota_bytes`: Optional cap on the total size of all stored values.
    pub fn open(dir: impl Into<PathBuf>, quota_bytes: Option<u64>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, quota_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Total bytes held by every key except `skip`, which is about to be replaced.
    fn used_bytes_excluding(&self, skip: &Path) -> Result<u64> {
        let mut used = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == skip || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            used += fs::metadata(&path)?.len();
        }
        Ok(used)
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_excluding(&path)? + value.len() as u64;
            if needed > quota {
                return Err(Error::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        // Write-then-rename so a crash never leaves a half-written value.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A process-local store. Used in tests and when no storage directory is usable.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path(), None).unwrap();

        assert_eq!(store.get(keys::DRAFT_APAC).unwrap(), None);
        store.set(keys::DRAFT_APAC, r#"{"pnl":1}"#).unwrap();
        assert_eq!(store.get(keys::DRAFT_APAC).unwrap().as_deref(), Some(r#"{"pnl":1}"#));
        assert!(dir.path().join("market-memo-draft-apac.json").exists());

        store.remove(keys::DRAFT_APAC).unwrap();
        store.remove(keys::DRAFT_APAC).unwrap();
        assert_eq!(store.get(keys::DRAFT_APAC).unwrap(), None);
    }

    #[test]
    fn file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileKvStore::open(&nested, None).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.dir(), nested.as_path());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn file_store_enforces_quota_across_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path(), Some(10)).unwrap();

        store.set("a", "123456").unwrap();
        // Replacing a key only counts its new size.
        store.set("a", "1234567").unwrap();

        let err = store.set("b", "abcd").unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { needed: 11, quota: 10, .. }));
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1234567"));
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path(), None).unwrap();
        assert!(matches!(store.set("../escape", "x"), Err(Error::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn memory_store_behaves_like_a_map() {
        let store = MemoryKvStore::new();
        assert!(store.is_empty());
        store.set("k", "1").unwrap();
        store.set("k", "2").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }
}

//! Token persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use gatekeeper_core::config::client::ClientConfig;
use gatekeeper_core::result::AppResult;

/// Key-value storage for opaque token strings.
pub trait TokenStorage: Send + Sync + std::fmt::Debug + 'static {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    entries: DashMap<String, String>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage persisted as a JSON object in a single file.
///
/// The whole file is rewritten on every change. A missing file reads as
/// empty.
#[derive(Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AppResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Access and refresh token accessors over a storage backend.
#[derive(Debug, Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    access_key: String,
    refresh_key: String,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>, config: &ClientConfig) -> Self {
        Self {
            storage,
            access_key: config.storage_token_key_name.clone(),
            refresh_key: config.storage_refresh_token_key_name.clone(),
        }
    }

    pub fn access_token(&self) -> AppResult<Option<String>> {
        self.storage.get(&self.access_key)
    }

    pub fn refresh_token(&self) -> AppResult<Option<String>> {
        self.storage.get(&self.refresh_key)
    }

    pub fn set_access_token(&self, value: &str) -> AppResult<()> {
        self.storage.set(&self.access_key, value)
    }

    pub fn set_refresh_token(&self, value: &str) -> AppResult<()> {
        self.storage.set(&self.refresh_key, value)
    }

    /// Remove both tokens.
    pub fn clear(&self) -> AppResult<()> {
        self.storage.remove(&self.access_key)?;
        self.storage.remove(&self.refresh_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_accessors() {
        let store = TokenStore::new(Arc::new(MemoryTokenStorage::new()), &ClientConfig::default());
        assert_eq!(store.access_token().unwrap(), None);

        store.set_access_token("a1").unwrap();
        store.set_refresh_token("r1").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r1"));

        store.clear().unwrap();
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("tokens.json");
        let config = ClientConfig::default();

        let first = TokenStore::new(Arc::new(FileTokenStorage::new(&path)), &config);
        first.set_access_token("a1").unwrap();
        first.set_refresh_token("r1").unwrap();

        let second = TokenStore::new(Arc::new(FileTokenStorage::new(&path)), &config);
        assert_eq!(second.access_token().unwrap().as_deref(), Some("a1"));

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("refreshToken").map(String::as_str), Some("r1"));
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("none.json"));
        assert_eq!(storage.get("accessToken").unwrap(), None);
        storage.remove("accessToken").unwrap();
    }

    #[test]
    fn test_file_storage_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "not json").unwrap();
        let err = FileTokenStorage::new(&path).get("accessToken").unwrap_err();
        assert_eq!(err.kind, gatekeeper_core::error::ErrorKind::Serialization);
    }
}

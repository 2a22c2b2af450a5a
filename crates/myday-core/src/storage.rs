//! Key-value persistence slots.
//!
//! The task list lives under a single key. `FileStorage` keeps one JSON
//! document per key inside the data directory; `MemoryStorage` keeps them
//! in a map and can simulate a full quota.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Result, TaskError};

pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug)]
pub struct FileStorage {
    pub data_dir: PathBuf,
}

impl FileStorage {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|err| {
            TaskError::Storage(format!("failed to create {}: {err}", data_dir.display()))
        })?;

        info!(data_dir = %data_dir.display(), "opened file storage");
        Ok(Self { data_dir })
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(TaskError::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.data_dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    #[tracing::instrument(skip(self))]
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!(file = %path.display(), "storage slot is empty");
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(|err| {
            TaskError::Storage(format!("failed reading {}: {err}", path.display()))
        })?;
        debug!(file = %path.display(), bytes = raw.len(), "read storage slot");
        Ok(Some(raw))
    }

    #[tracing::instrument(skip(self, value))]
    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        debug!(file = %path.display(), bytes = value.len(), "writing storage slot atomically");

        let storage_err =
            |err: std::io::Error| TaskError::Storage(format!("failed writing {}: {err}", path.display()));

        let mut temp = NamedTempFile::new_in(&self.data_dir).map_err(storage_err)?;
        temp.write_all(value.as_bytes()).map_err(storage_err)?;
        temp.flush().map_err(storage_err)?;
        temp.persist(&path)
            .map_err(|err| TaskError::Storage(format!("failed to persist {}: {}", path.display(), err)))?;

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any write that would push the total stored bytes past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota: Some(bytes),
        }
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(TaskError::Storage(format!(
                    "quota exceeded writing {key}: {needed} > {quota} bytes"
                )));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{FileStorage, KeyValueStorage, MemoryStorage};
    use crate::error::TaskError;

    #[test]
    fn file_storage_reads_back_what_it_wrote() {
        let temp = tempdir().expect("tempdir");
        let mut storage = FileStorage::open(temp.path()).expect("open storage");

        assert_eq!(storage.get_item("allTasks").expect("get"), None);
        storage.set_item("allTasks", "[]").expect("set");
        assert_eq!(
            storage.get_item("allTasks").expect("get"),
            Some("[]".to_string())
        );
        assert!(temp.path().join("allTasks.json").exists());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let temp = tempdir().expect("tempdir");
        let mut storage = FileStorage::open(temp.path()).expect("open storage");
        assert!(matches!(
            storage.set_item("../escape", "[]"),
            Err(TaskError::Storage(_))
        ));
    }

    #[test]
    fn memory_quota_refuses_oversized_writes_and_keeps_old_value() {
        let mut storage = MemoryStorage::with_quota(16);
        storage.set_item("k", "small").expect("fits");

        let err = storage
            .set_item("k", "this value is far too long")
            .expect_err("over quota");
        assert!(matches!(err, TaskError::Storage(_)));
        assert_eq!(storage.get_item("k").expect("get"), Some("small".to_string()));
    }
}

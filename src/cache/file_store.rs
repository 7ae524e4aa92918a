//! File Store Module
//!
//! Durable store that keeps every key in a single JSON document on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::DurableStore;
use crate::error::Result;

// == File Store ==
/// Write-through store persisted to one JSON file.
///
/// The file is read once on open; every mutation rewrites it through a
/// temporary sibling file and a rename so a crash never leaves it half written.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    // == Constructor ==
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content)?,
            Ok(_) => HashMap::new(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!("Opened file store at {} with {} keys", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_string(), value);
        if let Err(err) = self.persist(&entries).await {
            // Keep memory in step with what is on disk.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let Some(old) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.persist(&entries).await {
            entries.insert(key.to_string(), old);
            return Err(err);
        }
        Ok(())
    }

    async fn remove_all(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let removed: Vec<(String, String)> = keys
            .iter()
            .filter_map(|key| entries.remove_entry(key))
            .collect();
        if removed.is_empty() {
            return Ok(());
        }
        if let Err(err) = self.persist(&entries).await {
            entries.extend(removed);
            return Err(err);
        }
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let previous = std::mem::take(&mut *entries);
        if let Err(err) = self.persist(&entries).await {
            *entries = previous;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("nested").join("store.json")
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(store_path(&dir)).await.unwrap();

        assert!(store.list_keys().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        {
            let store = FileStore::open(&path).await.unwrap();
            store.set("movie_details_1", "one".to_string()).await.unwrap();
            store.set("movie_details_2", "two".to_string()).await.unwrap();
            store.remove("movie_details_2").await.unwrap();
        }

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("movie_details_1").await.unwrap().as_deref(),
            Some("one")
        );
        assert!(reopened.get("movie_details_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_all_and_clear_persist() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let store = FileStore::open(&path).await.unwrap();
        for key in ["saved_a", "saved_b", "other"] {
            store.set(key, "v".to_string()).await.unwrap();
        }

        store
            .remove_all(&["saved_a".to_string(), "saved_b".to_string()])
            .await
            .unwrap();
        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.list_keys().await.unwrap(), vec!["other".to_string()]);

        reopened.clear().await.unwrap();
        let cleared = FileStore::open(&path).await.unwrap();
        assert!(cleared.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_corrupt_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(FileStore::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_removals_keep_memory_in_step() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).await.unwrap();
        store.set("saved_a", "a".to_string()).await.unwrap();
        store.set("saved_b", "b".to_string()).await.unwrap();

        // A directory where the temporary file goes makes every persist fail.
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();

        assert!(store.remove("saved_a").await.is_err());
        assert!(store
            .remove_all(&["saved_a".to_string(), "saved_b".to_string()])
            .await
            .is_err());
        assert!(store.clear().await.is_err());

        let mut keys = store.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["saved_a".to_string(), "saved_b".to_string()]);
        assert_eq!(store.get("saved_b").await.unwrap().as_deref(), Some("b"));
    }
}

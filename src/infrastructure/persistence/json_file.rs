//! Single-file JSON entry store

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fd_lock::RwLock as FileLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ports::{EntryQuery, EntryStore, StoreError};
use crate::domain::entry::{Entry, EntryId};
use crate::infrastructure::atomic::write_atomic;

const FILE_NAME: &str = "entries.json";
const LOCK_NAME: &str = "entries.lock";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct EntryFile {
    version: u32,
    entries: Vec<Entry>,
}

fn io_error(e: io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

fn parse(content: &str) -> Result<Vec<Entry>, StoreError> {
    let file: EntryFile =
        serde_json::from_str(content).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    if file.version > FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unsupported format version {}",
            file.version
        )));
    }
    Ok(file.entries)
}

fn read_blocking(path: &Path) -> Result<Vec<Entry>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(io_error(e)),
    }
}

fn write_blocking(path: &Path, entries: Vec<Entry>) -> Result<(), StoreError> {
    let file = EntryFile {
        version: FORMAT_VERSION,
        entries,
    };
    let content =
        serde_json::to_vec_pretty(&file).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    write_atomic(path, &content).map_err(io_error)?;
    debug!(path = %path.display(), entries = file.entries.len(), "Entry file written");
    Ok(())
}

/// Outcome of a change applied to the loaded entries
enum Change<T> {
    Write(T),
    Keep(T),
}

/// Entries kept in `<data_dir>/entries.json`.
///
/// Several processes (the daemon and one-shot commands) share the file.
/// Every change re-reads it and replaces it atomically while holding an
/// exclusive lock on `<data_dir>/entries.lock`, so writers never overwrite
/// each other. Readers need no lock: a rename swaps the whole file.
pub struct JsonEntryStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock: Mutex<()>,
}

impl JsonEntryStore {
    /// Store under `data_dir`; the file is created on first write
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            path: dir.join(FILE_NAME),
            lock_path: dir.join(LOCK_NAME),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<Entry>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(io_error(e)),
        }
    }

    /// Load, change and (if asked) rewrite the file under the cross-process lock
    async fn modify<T, F>(&self, change: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<Entry>) -> Result<Change<T>, StoreError> + Send + 'static,
    {
        let _local = self.lock.lock().await;
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();

        tokio::task::spawn_blocking(move || {
            if let Some(parent) = lock_path.parent() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(io_error)?;
            let mut lock = FileLock::new(file);
            let _held = lock.write().map_err(io_error)?;

            let mut entries = read_blocking(&path)?;
            let value = match change(&mut entries)? {
                Change::Write(value) => {
                    write_blocking(&path, entries)?;
                    value
                }
                Change::Keep(value) => value,
            };
            Ok(value)
        })
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?
    }
}

#[async_trait]
impl EntryStore for JsonEntryStore {
    async fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        let entry = entry.clone();
        self.modify(move |entries| {
            if entries.iter().any(|e| e.id == entry.id) {
                return Err(StoreError::Duplicate(entry.id));
            }
            entries.push(entry);
            Ok(Change::Write(()))
        })
        .await
    }

    async fn update(&self, entry: &Entry) -> Result<(), StoreError> {
        let entry = entry.clone();
        self.modify(move |entries| {
            let slot = entries
                .iter_mut()
                .find(|e| e.id == entry.id)
                .ok_or(StoreError::Missing(entry.id))?;
            *slot = entry;
            Ok(Change::Write(()))
        })
        .await
    }

    async fn delete(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        self.modify(move |entries| {
            Ok(match entries.iter().position(|e| e.id == id) {
                Some(index) => Change::Write(Some(entries.remove(index))),
                None => Change::Keep(None),
            })
        })
        .await
    }

    async fn get(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        Ok(self.read().await?.into_iter().find(|e| e.id == id))
    }

    async fn query(&self, query: &EntryQuery) -> Result<Vec<Entry>, StoreError> {
        Ok(query.apply(self.read().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn entry(text: &str) -> Entry {
        Entry::new(EntryId::new(), Utc::now(), text, vec![]).unwrap()
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonEntryStore::new(dir.path());
        assert!(store.query(&EntryQuery::all()).await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn entries_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry("persisted");
        JsonEntryStore::new(dir.path()).insert(&e).await.unwrap();

        let reopened = JsonEntryStore::new(dir.path());
        assert_eq!(reopened.get(e.id).await.unwrap(), Some(e));
    }

    #[tokio::test]
    async fn creates_data_dir_on_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("journal");
        let store = JsonEntryStore::new(&nested);
        store.insert(&entry("first")).await.unwrap();
        assert!(nested.join("entries.json").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("entries.json"), "{ not json").unwrap();
        let store = JsonEntryStore::new(dir.path());
        assert!(matches!(
            store.query(&EntryQuery::all()).await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonEntryStore::new(dir.path());
        let mut e = entry("draft");
        store.insert(&e).await.unwrap();

        e.trash(Utc::now());
        store.update(&e).await.unwrap();
        let trashed = store.query(&EntryQuery::trashed()).await.unwrap();
        assert_eq!(trashed.len(), 1);

        assert!(store.delete(e.id).await.unwrap().is_some());
        assert!(store.query(&EntryQuery::all()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn separate_instances_do_not_lose_writes() {
        let dir = tempfile::tempdir().unwrap();
        let stores = [
            Arc::new(JsonEntryStore::new(dir.path())),
            Arc::new(JsonEntryStore::new(dir.path())),
        ];

        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&stores[i % 2]);
            tasks.push(tokio::spawn(async move {
                store.insert(&entry(&format!("entry {i}"))).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let reopened = JsonEntryStore::new(dir.path());
        assert_eq!(reopened.query(&EntryQuery::all()).await.unwrap().len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delete_is_not_undone_by_a_concurrent_insert_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let purger = Arc::new(JsonEntryStore::new(dir.path()));
        let writer = Arc::new(JsonEntryStore::new(dir.path()));
        let doomed = entry("doomed");
        purger.insert(&doomed).await.unwrap();

        let inserts = {
            let writer = Arc::clone(&writer);
            tokio::spawn(async move {
                for i in 0..10 {
                    writer.insert(&entry(&format!("kept {i}"))).await.unwrap();
                }
            })
        };
        assert!(purger.delete(doomed.id).await.unwrap().is_some());
        inserts.await.unwrap();

        let left = writer.query(&EntryQuery::all()).await.unwrap();
        assert_eq!(left.len(), 10);
        assert!(left.iter().all(|e| e.id != doomed.id));
    }

    #[tokio::test]
    async fn missing_delete_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonEntryStore::new(dir.path());
        assert!(store.delete(EntryId::new()).await.unwrap().is_none());
        assert!(!store.path().exists());
    }
}

//! In-memory entry store

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{EntryQuery, EntryStore, StoreError};
use crate::domain::entry::{Entry, EntryId};

/// Entry store held in memory, in insertion order.
///
/// Used by tests and as a scratch journal.
#[derive(Default)]
pub struct MemoryEntryStore {
    entries: RwLock<Vec<Entry>>,
    simulate_write_error: AtomicBool,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, for exercising error paths
    pub fn simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(StoreError::Io("Simulated write error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::Duplicate(entry.id));
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn update(&self, entry: &Entry) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut entries = self.entries.write().await;
        let slot = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or(StoreError::Missing(entry.id))?;
        *slot = entry.clone();
        Ok(())
    }

    async fn delete(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        self.check_writable()?;
        let mut entries = self.entries.write().await;
        Ok(entries
            .iter()
            .position(|e| e.id == id)
            .map(|index| entries.remove(index)))
    }

    async fn get(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn query(&self, query: &EntryQuery) -> Result<Vec<Entry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(query.apply(entries.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(text: &str) -> Entry {
        Entry::new(EntryId::new(), Utc::now(), text, vec![]).unwrap()
    }

    #[tokio::test]
    async fn insert_rejects_duplicates() {
        let store = MemoryEntryStore::new();
        let e = entry("one");
        store.insert(&e).await.unwrap();
        assert!(matches!(
            store.insert(&e).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn update_requires_existing_entry() {
        let store = MemoryEntryStore::new();
        assert!(matches!(
            store.update(&entry("ghost")).await,
            Err(StoreError::Missing(_))
        ));
    }

    #[tokio::test]
    async fn delete_returns_removed_entry() {
        let store = MemoryEntryStore::new();
        let e = entry("gone");
        store.insert(&e).await.unwrap();

        assert_eq!(store.delete(e.id).await.unwrap(), Some(e.clone()));
        assert_eq!(store.delete(e.id).await.unwrap(), None);
        assert!(store.get(e.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn simulated_error_blocks_writes_only() {
        let store = MemoryEntryStore::new();
        let e = entry("kept");
        store.insert(&e).await.unwrap();
        store.simulate_write_error(true);

        assert!(store.insert(&entry("new")).await.is_err());
        assert!(store.delete(e.id).await.is_err());
        assert!(store.get(e.id).await.unwrap().is_some());
    }
}

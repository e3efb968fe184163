//! Entry repository use case
//!
//! CRUD and query surface over journal entries. Owns the cascade from an
//! entry to its attachment files.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::entry::{day_bounds, day_of, Attachment, Entry, EntryId};
use crate::domain::error::EmptyEntryError;

use super::ports::{EntryQuery, EntryStore, MediaStore, StoreError};

/// Errors from entry operations
#[derive(Debug, Error)]
pub enum EntryError {
    #[error(transparent)]
    Validation(#[from] EmptyEntryError),

    #[error("No entry with id {0}")]
    NotFound(EntryId),

    #[error("Storage failed: {0}")]
    Store(#[from] StoreError),
}

/// Journal entries on top of a persistence capability and a media store.
///
/// Every mutation runs under one write gate, so a bulk trash operation and
/// a concurrent create never interleave their read-modify-write steps.
pub struct EntryRepository<S, M>
where
    S: EntryStore,
    M: MediaStore,
{
    store: S,
    media: M,
    write_gate: Mutex<()>,
}

impl<S, M> EntryRepository<S, M>
where
    S: EntryStore,
    M: MediaStore,
{
    /// Create a repository over the given adapters
    pub fn new(store: S, media: M) -> Self {
        Self {
            store,
            media,
            write_gate: Mutex::new(()),
        }
    }

    /// The attachment store backing this repository
    pub fn media(&self) -> &M {
        &self.media
    }

    /// Save a new entry.
    ///
    /// Text is trimmed; an entry with neither text nor images is rejected
    /// before anything is written.
    pub async fn create(
        &self,
        timestamp: DateTime<Utc>,
        text: &str,
        images: Vec<Attachment>,
    ) -> Result<Entry, EntryError> {
        let entry = Entry::new(EntryId::new(), timestamp, text, images)?;

        let _gate = self.write_gate.lock().await;
        self.store.insert(&entry).await?;
        info!(id = %entry.id, images = entry.images.len(), "Entry created");
        Ok(entry)
    }

    /// Look up one entry, active or trashed
    pub async fn get(&self, id: EntryId) -> Result<Entry, EntryError> {
        self.store
            .get(id)
            .await?
            .ok_or(EntryError::NotFound(id))
    }

    /// Active entries with timestamps in `[start, end)`, oldest first
    pub async fn query_active(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Entry>, EntryError> {
        let query = EntryQuery::active().between(start, end);
        Ok(self.store.query(&query).await?)
    }

    /// Active entries on one calendar day of `tz`, oldest first
    pub async fn query_active_on<Tz: TimeZone>(
        &self,
        day: NaiveDate,
        tz: &Tz,
    ) -> Result<Vec<Entry>, EntryError> {
        let (start, end) = day_bounds(day, tz);
        self.query_active(start, end).await
    }

    /// Calendar days of `tz` holding at least one active entry
    pub async fn query_active_days<Tz: TimeZone>(
        &self,
        tz: &Tz,
    ) -> Result<BTreeSet<NaiveDate>, EntryError> {
        let entries = self.store.query(&EntryQuery::active()).await?;
        Ok(entries
            .iter()
            .map(|entry| day_of(entry.timestamp, tz))
            .collect())
    }

    /// Every stored entry, active or trashed, oldest first
    pub async fn query_all(&self) -> Result<Vec<Entry>, EntryError> {
        Ok(self.store.query(&EntryQuery::all()).await?)
    }

    /// Trashed entries, newest first
    pub async fn query_trashed(&self) -> Result<Vec<Entry>, EntryError> {
        Ok(self.store.query(&EntryQuery::trashed()).await?)
    }

    /// Move an entry to the trash.
    ///
    /// Returns whether anything changed; trashing a trashed entry keeps its
    /// original trashing time.
    pub async fn soft_delete(&self, id: EntryId) -> Result<bool, EntryError> {
        let _gate = self.write_gate.lock().await;
        let mut entry = self.get(id).await?;
        if !entry.trash(Utc::now()) {
            debug!(%id, "Entry already in trash");
            return Ok(false);
        }
        self.store.update(&entry).await?;
        info!(%id, "Entry moved to trash");
        Ok(true)
    }

    /// Bring an entry back from the trash. Returns whether anything changed.
    pub async fn restore(&self, id: EntryId) -> Result<bool, EntryError> {
        let _gate = self.write_gate.lock().await;
        self.restore_locked(id).await
    }

    /// Restore every listed entry, skipping unknown ids.
    /// Returns how many entries actually left the trash.
    pub async fn restore_all(&self, ids: &[EntryId]) -> Result<usize, EntryError> {
        let _gate = self.write_gate.lock().await;
        let mut restored = 0;
        for &id in ids {
            match self.restore_locked(id).await {
                Ok(true) => restored += 1,
                Ok(false) => {}
                Err(EntryError::NotFound(_)) => debug!(%id, "Skipping unknown entry"),
                Err(e) => return Err(e),
            }
        }
        Ok(restored)
    }

    /// Remove an entry and its attachment files for good.
    ///
    /// Accepted on active entries too. File removal failures are logged and
    /// never keep the record alive.
    pub async fn permanent_delete(&self, id: EntryId) -> Result<(), EntryError> {
        let _gate = self.write_gate.lock().await;
        let entry = self.get(id).await?;
        self.purge_locked(&entry).await
    }

    /// Permanently delete every listed entry, skipping unknown ids.
    /// Returns how many entries were removed.
    pub async fn permanent_delete_all(&self, ids: &[EntryId]) -> Result<usize, EntryError> {
        let _gate = self.write_gate.lock().await;
        let mut removed = 0;
        for &id in ids {
            match self.store.get(id).await? {
                Some(entry) => {
                    self.purge_locked(&entry).await?;
                    removed += 1;
                }
                None => debug!(%id, "Skipping unknown entry"),
            }
        }
        Ok(removed)
    }

    /// Delete media files that no stored entry references.
    ///
    /// Picks up files left behind by failed deletions. Images saved for an
    /// entry that has not been created yet count as unreferenced, so run
    /// this while no entry is being composed.
    pub async fn collect_garbage(&self) -> Result<usize, EntryError> {
        let _gate = self.write_gate.lock().await;

        let entries = self.store.query(&EntryQuery::all()).await?;
        let referenced: HashSet<&str> = entries
            .iter()
            .flat_map(|entry| entry.media_paths())
            .collect();

        let stored = match self.media.list().await {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "Could not list media files");
                return Ok(0);
            }
        };

        let mut removed = 0;
        for path in stored.iter().filter(|p| !referenced.contains(p.as_str())) {
            match self.media.delete(path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(error = %e, "Could not remove orphaned file"),
            }
        }
        if removed > 0 {
            info!(removed, "Orphaned media files removed");
        }
        Ok(removed)
    }

    async fn restore_locked(&self, id: EntryId) -> Result<bool, EntryError> {
        let mut entry = self.get(id).await?;
        if !entry.restore() {
            return Ok(false);
        }
        self.store.update(&entry).await?;
        info!(%id, "Entry restored");
        Ok(true)
    }

    async fn purge_locked(&self, entry: &Entry) -> Result<(), EntryError> {
        for path in entry.media_paths() {
            if let Err(e) = self.media.delete(path).await {
                warn!(id = %entry.id, error = %e, "Attachment file not removed");
            }
        }
        self.store.delete(entry.id).await?;
        info!(id = %entry.id, "Entry permanently deleted");
        Ok(())
    }
}

//! Trash use case: bulk restore and purge for multi-select flows

use tracing::info;

use crate::domain::entry::EntryId;

use super::entries::{EntryError, EntryRepository};
use super::ports::{EntryStore, MediaStore};

/// Bulk operations over the trash.
///
/// Holds no selection of its own; callers pass the ids they have picked.
pub struct TrashCoordinator<'a, S, M>
where
    S: EntryStore,
    M: MediaStore,
{
    repo: &'a EntryRepository<S, M>,
}

impl<'a, S, M> TrashCoordinator<'a, S, M>
where
    S: EntryStore,
    M: MediaStore,
{
    pub fn new(repo: &'a EntryRepository<S, M>) -> Self {
        Self { repo }
    }

    /// Restore the selected entries. Returns how many left the trash.
    pub async fn restore_many(&self, ids: &[EntryId]) -> Result<usize, EntryError> {
        self.repo.restore_all(ids).await
    }

    /// Permanently delete the selected entries. Returns how many were removed.
    pub async fn delete_many(&self, ids: &[EntryId]) -> Result<usize, EntryError> {
        self.repo.permanent_delete_all(ids).await
    }

    /// Restore everything in the trash
    pub async fn restore_all(&self) -> Result<usize, EntryError> {
        let ids = self.trashed_ids().await?;
        let restored = self.repo.restore_all(&ids).await?;
        info!(restored, "Trash restored");
        Ok(restored)
    }

    /// Empty the trash
    pub async fn delete_all(&self) -> Result<usize, EntryError> {
        let ids = self.trashed_ids().await?;
        let removed = self.repo.permanent_delete_all(&ids).await?;
        info!(removed, "Trash emptied");
        Ok(removed)
    }

    async fn trashed_ids(&self) -> Result<Vec<EntryId>, EntryError> {
        Ok(self
            .repo
            .query_trashed()
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .collect())
    }
}

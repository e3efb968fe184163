//! Attachment storage port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entry::{Attachment, AttachmentId, EntryId};

/// Errors from the attachment store
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("Not a readable image: {0}")]
    InvalidImage(String),

    #[error("Failed to write image: {0}")]
    WriteFailed(String),

    #[error("Failed to delete {path}: {message}")]
    DeleteFailed { path: String, message: String },

    #[error("Failed to list media files: {0}")]
    ListFailed(String),
}

/// Both variants of one saved photo, not yet owned by an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub id: AttachmentId,
    pub original_path: String,
    pub thumb_path: String,
    pub created_at: DateTime<Utc>,
}

impl SavedImage {
    /// Both relative paths, original first
    pub fn paths(&self) -> [&str; 2] {
        [&self.original_path, &self.thumb_path]
    }

    /// Hand the files over to an entry
    pub fn into_attachment(self, entry_id: EntryId) -> Attachment {
        Attachment {
            id: self.id,
            entry_id,
            original_path: self.original_path,
            thumb_path: self.thumb_path,
            created_at: self.created_at,
        }
    }
}

/// Port for on-disk photo variants. Knows nothing about entries.
///
/// Every path crossing this boundary is relative to the store's base
/// directory.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Decode `image`, write an original and a thumbnail variant under a
    /// fresh id. Nothing is left on disk when this fails.
    async fn save(&self, image: Vec<u8>) -> Result<SavedImage, MediaError>;

    /// Read a stored file; `None` when it is missing or unreadable
    async fn load(&self, relative_path: &str) -> Option<Vec<u8>>;

    /// Remove a stored file; a missing file is not an error
    async fn delete(&self, relative_path: &str) -> Result<(), MediaError>;

    /// Every stored file, as relative paths
    async fn list(&self) -> Result<Vec<String>, MediaError>;
}

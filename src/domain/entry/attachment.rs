//! Attachment entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AttachmentId, EntryId};

/// One stored photo: an "original" and a "thumbnail" variant.
///
/// Paths are relative to the media store's base directory so the store
/// can be moved without rewriting records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    /// Owning entry. Lookup only; the entry controls the lifetime.
    pub entry_id: EntryId,
    pub original_path: String,
    pub thumb_path: String,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Both backing file paths, original first
    pub fn paths(&self) -> [&str; 2] {
        [&self.original_path, &self.thumb_path]
    }
}

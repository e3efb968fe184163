//! Entry entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::ids::EntryId;
use crate::domain::error::EmptyEntryError;

/// Lifecycle position of a stored entry.
///
/// The third state, Deleted, is terminal and has no representation:
/// a permanently deleted entry simply no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Active,
    Trashed,
}

impl EntryStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trashed => "trashed",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One journal record anchored to an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    /// `None` while active, the trashing instant once soft-deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<Attachment>,
}

/// Trim surrounding whitespace from composed text
pub fn normalize_text(text: &str) -> String {
    text.trim().to_string()
}

impl Entry {
    /// Build a new active entry.
    ///
    /// Text is trimmed. The entry takes ownership of `images`, which are
    /// re-pointed at `id`. Fails when there is neither text nor a photo.
    pub fn new(
        id: EntryId,
        timestamp: DateTime<Utc>,
        text: &str,
        images: Vec<Attachment>,
    ) -> Result<Self, EmptyEntryError> {
        let text = normalize_text(text);
        if text.is_empty() && images.is_empty() {
            return Err(EmptyEntryError);
        }

        let images = images
            .into_iter()
            .map(|mut image| {
                image.entry_id = id;
                image
            })
            .collect();

        Ok(Self {
            id,
            timestamp,
            text,
            deleted_at: None,
            images,
        })
    }

    /// Current lifecycle status
    pub fn status(&self) -> EntryStatus {
        if self.deleted_at.is_some() {
            EntryStatus::Trashed
        } else {
            EntryStatus::Active
        }
    }

    /// Check if the entry is active
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Check if the entry is in the trash
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Move to the trash. Returns false if already trashed (the original
    /// trashing instant is kept).
    pub fn trash(&mut self, now: DateTime<Utc>) -> bool {
        if self.deleted_at.is_some() {
            return false;
        }
        self.deleted_at = Some(now);
        true
    }

    /// Bring back from the trash. Returns false if already active.
    pub fn restore(&mut self) -> bool {
        self.deleted_at.take().is_some()
    }

    /// Every backing file path referenced by this entry's attachments
    pub fn media_paths(&self) -> impl Iterator<Item = &str> {
        self.images.iter().flat_map(|image| image.paths())
    }

    /// First line of the text, clipped for listings
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.text.lines().next().unwrap_or_default();
        if first_line.chars().count() <= max_chars {
            return first_line.to_string();
        }
        let clipped: String = first_line.chars().take(max_chars).collect();
        format!("{}…", clipped)
    }
}

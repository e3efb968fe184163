//! Compose use case: save photos, then the entry that owns them

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::entry::{Entry, EntryId};

use super::entries::{EntryError, EntryRepository};
use super::ports::{EntryStore, MediaError, MediaStore};

/// One photo that could not be stored
#[derive(Debug, Clone)]
pub struct ImageFailure {
    /// Position of the photo in the composed selection
    pub index: usize,
    pub error: MediaError,
}

/// A saved entry plus the photos that were left out of it
#[derive(Debug, Clone)]
pub struct Composed {
    pub entry: Entry,
    pub failed_images: Vec<ImageFailure>,
}

impl Composed {
    /// Whether every requested photo made it into the entry
    pub fn is_complete(&self) -> bool {
        self.failed_images.is_empty()
    }
}

/// Saves a new entry from text and raw photo bytes.
///
/// Photos are stored one by one; a photo that fails is reported and
/// skipped, and the entry is saved with the rest. Manual and voice
/// entries go through the same path.
pub struct EntryComposer<'a, S, M>
where
    S: EntryStore,
    M: MediaStore,
{
    repo: &'a EntryRepository<S, M>,
}

impl<'a, S, M> EntryComposer<'a, S, M>
where
    S: EntryStore,
    M: MediaStore,
{
    pub fn new(repo: &'a EntryRepository<S, M>) -> Self {
        Self { repo }
    }

    /// Store `images`, then create the entry.
    ///
    /// Fails with a validation error when the text is blank and no photo
    /// could be stored. If the entry itself cannot be saved, the photos
    /// stored for it are removed again.
    pub async fn compose(
        &self,
        timestamp: DateTime<Utc>,
        text: &str,
        images: Vec<Vec<u8>>,
    ) -> Result<Composed, EntryError> {
        let mut saved = Vec::with_capacity(images.len());
        let mut failed_images = Vec::new();

        for (index, bytes) in images.into_iter().enumerate() {
            match self.repo.media().save(bytes).await {
                Ok(image) => saved.push(image),
                Err(error) => {
                    warn!(index, error = %error, "Photo not saved");
                    failed_images.push(ImageFailure { index, error });
                }
            }
        }

        let attachments = saved
            .iter()
            .cloned()
            .map(|image| image.into_attachment(EntryId::new()))
            .collect();

        match self.repo.create(timestamp, text, attachments).await {
            Ok(entry) => Ok(Composed {
                entry,
                failed_images,
            }),
            Err(e) => {
                for path in saved.iter().flat_map(|image| image.paths()) {
                    if let Err(err) = self.repo.media().delete(path).await {
                        warn!(error = %err, "Could not roll back photo");
                    }
                }
                Err(e)
            }
        }
    }
}

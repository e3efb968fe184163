//! Filesystem attachment store
//!
//! Layout under the base directory:
//!
//! ```text
//! media/original/<attachment-id>.jpg   long edge <= 2048px
//! media/thumb/<attachment-id>.jpg      long edge <= 320px
//! ```

use std::borrow::Cow;
use std::io::{Cursor, ErrorKind};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader};
use tracing::{debug, warn};

use crate::application::ports::{MediaError, MediaStore, SavedImage};
use crate::domain::entry::AttachmentId;
use crate::infrastructure::atomic::write_atomic;

const MEDIA_DIR: &str = "media";
const EXTENSION: &str = "jpg";

/// The two stored renditions of a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Original,
    Thumb,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Original, Variant::Thumb];

    /// Directory name under `media/`
    pub const fn dir(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Thumb => "thumb",
        }
    }

    /// Longest allowed edge in pixels
    pub const fn max_edge(&self) -> u32 {
        match self {
            Self::Original => 2048,
            Self::Thumb => 320,
        }
    }

    /// JPEG quality (1-100)
    pub const fn quality(&self) -> u8 {
        match self {
            Self::Original => 85,
            Self::Thumb => 70,
        }
    }

    /// Relative path of this variant for `id`
    pub fn relative_path(&self, id: AttachmentId) -> String {
        format!("{}/{}/{}.{}", MEDIA_DIR, self.dir(), id, EXTENSION)
    }
}

fn invalid_image(e: ImageError) -> MediaError {
    MediaError::InvalidImage(e.to_string())
}

/// Decode and turn upright per the EXIF orientation tag. The encoded
/// variants carry no EXIF, so the rotation has to be baked into the pixels.
fn decode_upright(bytes: &[u8]) -> Result<DynamicImage, MediaError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MediaError::InvalidImage(e.to_string()))?
        .into_decoder()
        .map_err(invalid_image)?;
    let orientation = decoder.orientation().map_err(invalid_image)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(invalid_image)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Downscale to the variant bound (never upscale) and encode as JPEG
fn encode_variant(image: &DynamicImage, variant: Variant) -> Result<Vec<u8>, MediaError> {
    let bound = variant.max_edge();
    let scaled = if image.width().max(image.height()) > bound {
        Cow::Owned(image.resize(bound, bound, FilterType::Lanczos3))
    } else {
        Cow::Borrowed(image)
    };

    let rgb = scaled.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, variant.quality())
        .encode_image(&rgb)
        .map_err(|e| MediaError::WriteFailed(format!("{} encoding: {}", variant.dir(), e)))?;
    Ok(buf)
}

/// Attachment store rooted at a data directory
#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
    base: PathBuf,
}

impl FsAttachmentStore {
    /// Store rooted at `base`; directories are created on first save
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory every recorded path is relative to
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Absolute location of a stored path, or `None` if the path is
    /// absolute or tries to leave the base directory.
    pub fn resolve(&self, relative_path: &str) -> Option<PathBuf> {
        let rel = Path::new(relative_path);
        let plain = !relative_path.is_empty()
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        plain.then(|| self.base.join(rel))
    }

    fn write_variant(
        &self,
        variant: Variant,
        id: AttachmentId,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let relative = variant.relative_path(id);
        let path = self.base.join(&relative);
        let write = || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            write_atomic(&path, bytes)
        };
        write().map_err(|e| MediaError::WriteFailed(format!("{}: {}", relative, e)))?;
        Ok(relative)
    }

    fn save_blocking(&self, bytes: &[u8]) -> Result<SavedImage, MediaError> {
        let image = decode_upright(bytes)?;

        let original = encode_variant(&image, Variant::Original)?;
        let thumb = encode_variant(&image, Variant::Thumb)?;

        let id = AttachmentId::new();
        let original_path = self.write_variant(Variant::Original, id, &original)?;
        let thumb_path = match self.write_variant(Variant::Thumb, id, &thumb) {
            Ok(path) => path,
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_file(self.base.join(&original_path)) {
                    warn!(path = %original_path, error = %cleanup, "Rollback of original failed");
                }
                return Err(e);
            }
        };

        debug!(
            %id,
            width = image.width(),
            height = image.height(),
            "Photo stored"
        );
        Ok(SavedImage {
            id,
            original_path,
            thumb_path,
            created_at: Utc::now(),
        })
    }

    fn list_blocking(&self) -> Result<Vec<String>, MediaError> {
        let mut paths = Vec::new();
        for variant in Variant::ALL {
            let dir = self.base.join(MEDIA_DIR).join(variant.dir());
            let listing = match std::fs::read_dir(&dir) {
                Ok(listing) => listing,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(MediaError::ListFailed(e.to_string())),
            };
            for item in listing {
                let item = item.map_err(|e| MediaError::ListFailed(e.to_string()))?;
                if !item.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    continue;
                }
                // Skips temporaries of saves still in flight
                let name = item.file_name();
                let Some(name) = name.to_str() else { continue };
                if Path::new(name).extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                    paths.push(format!("{}/{}/{}", MEDIA_DIR, variant.dir(), name));
                }
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl MediaStore for FsAttachmentStore {
    async fn save(&self, image: Vec<u8>) -> Result<SavedImage, MediaError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save_blocking(&image))
            .await
            .map_err(|e| MediaError::WriteFailed(e.to_string()))?
    }

    async fn load(&self, relative_path: &str) -> Option<Vec<u8>> {
        let Some(path) = self.resolve(relative_path) else {
            warn!(path = relative_path, "Refusing to read outside the media store");
            return None;
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(path = relative_path, error = %e, "Media file unavailable");
                None
            }
        }
    }

    async fn delete(&self, relative_path: &str) -> Result<(), MediaError> {
        let path = self.resolve(relative_path).ok_or_else(|| MediaError::DeleteFailed {
            path: relative_path.to_string(),
            message: "not a path inside the media store".to_string(),
        })?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::DeleteFailed {
                path: relative_path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn list(&self) -> Result<Vec<String>, MediaError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.list_blocking())
            .await
            .map_err(|e| MediaError::ListFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    /// JPEG carrying a big-endian EXIF block with only an Orientation tag
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u8) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([30, 90, 160]));
        let mut plain = Vec::new();
        JpegEncoder::new(&mut plain).encode_image(&img).unwrap();

        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0, 0, 0, 8]);
        app1.extend_from_slice(&[0x00, 0x01]);
        app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0, 0, 0, 1, 0x00, orientation, 0, 0]);
        app1.extend_from_slice(&[0, 0, 0, 0]);

        let mut bytes = plain[..2].to_vec();
        bytes.extend_from_slice(&app1);
        bytes.extend_from_slice(&plain[2..]);
        bytes
    }

    fn dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn variant_paths_are_relative() {
        let id = AttachmentId::new();
        assert_eq!(
            Variant::Original.relative_path(id),
            format!("media/original/{id}.jpg")
        );
        assert_eq!(Variant::Thumb.relative_path(id), format!("media/thumb/{id}.jpg"));
    }

    #[tokio::test]
    async fn large_photo_is_bounded_in_both_variants() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());

        let saved = store.save(png(3000, 1500)).await.unwrap();

        let original = store.load(&saved.original_path).await.unwrap();
        let thumb = store.load(&saved.thumb_path).await.unwrap();
        assert_eq!(dimensions(&original), (2048, 1024));
        assert_eq!(dimensions(&thumb), (320, 160));
    }

    #[tokio::test]
    async fn small_photo_is_not_upscaled() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());

        let saved = store.save(png(200, 100)).await.unwrap();

        let original = store.load(&saved.original_path).await.unwrap();
        let thumb = store.load(&saved.thumb_path).await.unwrap();
        assert_eq!(dimensions(&original), (200, 100));
        assert_eq!(dimensions(&thumb), (200, 100));
    }

    #[tokio::test]
    async fn exif_rotation_is_applied_to_both_variants() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());

        // Orientation 6: stored landscape, shown rotated 90 degrees clockwise
        let saved = store.save(jpeg_with_orientation(40, 20, 6)).await.unwrap();

        let original = store.load(&saved.original_path).await.unwrap();
        let thumb = store.load(&saved.thumb_path).await.unwrap();
        assert_eq!(dimensions(&original), (20, 40));
        assert_eq!(dimensions(&thumb), (20, 40));
    }

    #[tokio::test]
    async fn upright_exif_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());

        let saved = store.save(jpeg_with_orientation(40, 20, 1)).await.unwrap();

        let original = store.load(&saved.original_path).await.unwrap();
        assert_eq!(dimensions(&original), (40, 20));
    }

    #[tokio::test]
    async fn listing_skips_in_flight_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());
        let saved = store.save(png(10, 10)).await.unwrap();

        let originals = dir.path().join("media").join("original");
        std::fs::write(originals.join(".tmpAbC123"), b"partial").unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&saved.original_path));
        assert!(listed.iter().all(|p| p.ends_with(".jpg")));
    }

    #[tokio::test]
    async fn same_bytes_saved_twice_get_new_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());
        let bytes = png(10, 10);

        let a = store.save(bytes.clone()).await.unwrap();
        let b = store.save(bytes).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn invalid_bytes_leave_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());

        let result = store.save(b"not an image".to_vec()).await;
        assert!(matches!(result, Err(MediaError::InvalidImage(_))));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn thumbnail_write_failure_rolls_back_original() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());
        // A file where the thumbnail directory should be
        std::fs::create_dir_all(dir.path().join("media")).unwrap();
        std::fs::write(dir.path().join("media").join("thumb"), b"").unwrap();

        let result = store.save(png(10, 10)).await;

        assert!(matches!(result, Err(MediaError::WriteFailed(_))));
        let originals = std::fs::read_dir(dir.path().join("media").join("original"))
            .unwrap()
            .count();
        assert_eq!(originals, 0);
    }

    #[tokio::test]
    async fn load_missing_or_escaping_path_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path().join("store"));
        std::fs::write(dir.path().join("secret"), b"x").unwrap();

        assert!(store.load("media/original/nope.jpg").await.is_none());
        assert!(store.load("../secret").await.is_none());
        assert!(store.load("").await.is_none());
        let absolute = dir.path().join("secret");
        assert!(store.load(absolute.to_str().unwrap()).await.is_none());
    }

    #[tokio::test]
    async fn delete_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());
        let saved = store.save(png(10, 10)).await.unwrap();

        store.delete(&saved.original_path).await.unwrap();
        store.delete(&saved.original_path).await.unwrap();
        assert!(store.load(&saved.original_path).await.is_none());
        assert!(store.load(&saved.thumb_path).await.is_some());
    }
}

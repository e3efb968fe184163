//! Journal scenarios over the real attachment store

use std::io::Cursor;
use std::path::Path;

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use voicelog::application::ports::MediaStore;
use voicelog::application::{EntryComposer, EntryError, EntryRepository, TrashCoordinator};
use voicelog::domain::entry::{anchor_to_day, day_bounds, EntryId};
use voicelog::infrastructure::{FsAttachmentStore, JsonEntryStore, MemoryEntryStore};

type Journal = EntryRepository<MemoryEntryStore, FsAttachmentStore>;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn journal(dir: &TempDir) -> Journal {
    EntryRepository::new(MemoryEntryStore::new(), FsAttachmentStore::new(dir.path()))
}

fn tokyo() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn created_entry_appears_on_its_day() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);
    let tz = tokyo();
    let timestamp = tz.with_ymd_and_hms(2024, 5, 3, 23, 30, 0).unwrap().with_timezone(&Utc);

    let entry = journal.create(timestamp, "late walk", vec![]).await.unwrap();

    let on_day = journal.query_active_on(day(2024, 5, 3), &tz).await.unwrap();
    assert_eq!(on_day.len(), 1);
    assert_eq!(on_day[0].id, entry.id);
    assert_eq!(on_day[0].text, "late walk");

    let next = journal.query_active_on(day(2024, 5, 4), &tz).await.unwrap();
    assert!(next.is_empty());
}

#[tokio::test]
async fn timeline_is_ascending_and_excludes_trash() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);
    let (start, _) = day_bounds(day(2024, 1, 10), &Utc);

    let later = journal
        .create(start + chrono::Duration::hours(9), "second", vec![])
        .await
        .unwrap();
    let earlier = journal
        .create(start + chrono::Duration::hours(7), "first", vec![])
        .await
        .unwrap();
    let gone = journal
        .create(start + chrono::Duration::hours(8), "oops", vec![])
        .await
        .unwrap();
    journal.soft_delete(gone.id).await.unwrap();

    let ids: Vec<_> = journal
        .query_active_on(day(2024, 1, 10), &Utc)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![earlier.id, later.id]);
}

#[tokio::test]
async fn soft_delete_and_restore_move_between_views() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);
    let now = Utc::now();
    let entry = journal.create(now, "keep me", vec![]).await.unwrap();
    let today = now.date_naive();

    assert!(journal.soft_delete(entry.id).await.unwrap());
    assert!(journal.query_active_on(today, &Utc).await.unwrap().is_empty());
    assert_eq!(journal.query_trashed().await.unwrap()[0].id, entry.id);

    assert!(journal.restore(entry.id).await.unwrap());
    assert_eq!(journal.query_active_on(today, &Utc).await.unwrap()[0].id, entry.id);
    assert!(journal.query_trashed().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_id_is_not_found_and_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);
    journal.create(Utc::now(), "only", vec![]).await.unwrap();

    let result = journal.soft_delete(EntryId::new()).await;

    assert!(matches!(result, Err(EntryError::NotFound(_))));
    assert!(journal.query_trashed().await.unwrap().is_empty());
}

#[tokio::test]
async fn permanent_delete_removes_entry_and_files() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);

    let composed = EntryComposer::new(&journal)
        .compose(Utc::now(), "with photos", vec![png(40, 30), png(50, 50)])
        .await
        .unwrap();
    let paths: Vec<String> = composed.entry.media_paths().map(String::from).collect();
    assert_eq!(paths.len(), 4);
    for path in &paths {
        assert!(dir.path().join(path).exists(), "{} should exist", path);
    }

    journal.soft_delete(composed.entry.id).await.unwrap();
    journal.permanent_delete(composed.entry.id).await.unwrap();

    assert!(journal.query_trashed().await.unwrap().is_empty());
    assert!(matches!(
        journal.get(composed.entry.id).await,
        Err(EntryError::NotFound(_))
    ));
    for path in &paths {
        assert!(!dir.path().join(path).exists(), "{} should be gone", path);
        assert!(journal.media().load(path).await.is_none());
    }
}

#[tokio::test]
async fn permanent_delete_accepts_active_entries() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);
    let entry = journal.create(Utc::now(), "never trashed", vec![]).await.unwrap();

    journal.permanent_delete(entry.id).await.unwrap();

    assert!(journal.get(entry.id).await.is_err());
}

#[tokio::test]
async fn soft_delete_keeps_files_for_restore() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);
    let composed = EntryComposer::new(&journal)
        .compose(Utc::now(), "", vec![png(10, 10)])
        .await
        .unwrap();

    journal.soft_delete(composed.entry.id).await.unwrap();

    for path in composed.entry.media_paths() {
        assert!(journal.media().load(path).await.is_some());
    }
}

#[tokio::test]
async fn variants_are_bounded_and_never_upscaled() {
    let dir = TempDir::new().unwrap();
    let store = FsAttachmentStore::new(dir.path());

    let large = store.save(png(3000, 1500)).await.unwrap();
    let original = image::load_from_memory(&store.load(&large.original_path).await.unwrap()).unwrap();
    let thumb = image::load_from_memory(&store.load(&large.thumb_path).await.unwrap()).unwrap();
    assert_eq!(original.dimensions(), (2048, 1024));
    assert_eq!(thumb.dimensions(), (320, 160));

    let small = store.save(png(200, 100)).await.unwrap();
    let original = image::load_from_memory(&store.load(&small.original_path).await.unwrap()).unwrap();
    let thumb = image::load_from_memory(&store.load(&small.thumb_path).await.unwrap()).unwrap();
    assert_eq!(original.dimensions(), (200, 100));
    assert_eq!(thumb.dimensions(), (200, 100));
}

#[tokio::test]
async fn variant_paths_are_relative_and_keyed_by_id() {
    let dir = TempDir::new().unwrap();
    let store = FsAttachmentStore::new(dir.path());

    let saved = store.save(png(8, 8)).await.unwrap();

    assert_eq!(saved.original_path, format!("media/original/{}.jpg", saved.id));
    assert_eq!(saved.thumb_path, format!("media/thumb/{}.jpg", saved.id));
    assert!(Path::new(&saved.original_path).is_relative());

    let again = store.save(png(8, 8)).await.unwrap();
    assert_ne!(again.id, saved.id);
}

#[tokio::test]
async fn load_is_absent_for_missing_or_escaping_paths() {
    let dir = TempDir::new().unwrap();
    let store = FsAttachmentStore::new(dir.path().join("journal"));
    std::fs::write(dir.path().join("secret.txt"), b"nope").unwrap();

    assert!(store.load("media/original/missing.jpg").await.is_none());
    assert!(store.load("../secret.txt").await.is_none());
    assert!(store.load("/etc/hostname").await.is_none());
    assert!(store.delete("media/thumb/missing.jpg").await.is_ok());
}

#[tokio::test]
async fn photo_only_entry_marks_its_day() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);
    let tz = tokyo();
    let target = day(2023, 12, 24);
    let timestamp = anchor_to_day(target, tz.with_ymd_and_hms(2024, 2, 1, 8, 15, 0).unwrap());

    EntryComposer::new(&journal)
        .compose(timestamp, "", vec![png(16, 16)])
        .await
        .unwrap();

    let days = journal.query_active_days(&tz).await.unwrap();
    assert!(days.contains(&target));
    assert_eq!(days.len(), 1);
}

#[tokio::test]
async fn restore_all_of_three_empties_trash() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);
    for text in ["one", "two", "three"] {
        let entry = journal.create(Utc::now(), text, vec![]).await.unwrap();
        journal.soft_delete(entry.id).await.unwrap();
    }

    let restored = TrashCoordinator::new(&journal).restore_all().await.unwrap();

    assert_eq!(restored, 3);
    assert!(journal.query_trashed().await.unwrap().is_empty());
}

#[tokio::test]
async fn second_photo_failing_still_saves_first() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);

    let composed = EntryComposer::new(&journal)
        .compose(Utc::now(), "picnic", vec![png(64, 48), b"not an image".to_vec()])
        .await
        .unwrap();

    assert_eq!(composed.entry.images.len(), 1);
    assert_eq!(composed.failed_images.len(), 1);
    assert_eq!(composed.failed_images[0].index, 1);
    let stored = journal.get(composed.entry.id).await.unwrap();
    assert_eq!(stored.images, composed.entry.images);
}

#[tokio::test]
async fn empty_entry_is_rejected_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);

    let result = EntryComposer::new(&journal)
        .compose(Utc::now(), "   ", vec![b"garbage".to_vec()])
        .await;

    assert!(matches!(result, Err(EntryError::Validation(_))));
    assert!(journal.query_all().await.unwrap().is_empty());
    assert!(journal.media().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn garbage_collection_removes_only_orphans() {
    let dir = TempDir::new().unwrap();
    let journal = journal(&dir);

    let kept = EntryComposer::new(&journal)
        .compose(Utc::now(), "kept", vec![png(12, 12)])
        .await
        .unwrap();
    let orphan = journal.media().save(png(12, 12)).await.unwrap();

    let removed = journal.collect_garbage().await.unwrap();

    assert_eq!(removed, 2);
    assert!(journal.media().load(&orphan.original_path).await.is_none());
    for path in kept.entry.media_paths() {
        assert!(journal.media().load(path).await.is_some());
    }
}

#[tokio::test]
async fn json_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let entry_id = {
        let journal =
            EntryRepository::new(JsonEntryStore::new(dir.path()), FsAttachmentStore::new(dir.path()));
        let composed = EntryComposer::new(&journal)
            .compose(Utc::now(), "durable", vec![png(20, 20)])
            .await
            .unwrap();
        journal.soft_delete(composed.entry.id).await.unwrap();
        composed.entry.id
    };

    let reopened =
        EntryRepository::new(JsonEntryStore::new(dir.path()), FsAttachmentStore::new(dir.path()));
    let trashed = reopened.query_trashed().await.unwrap();
    assert_eq!(trashed.len(), 1);
    assert_eq!(trashed[0].id, entry_id);
    assert_eq!(trashed[0].text, "durable");
    assert_eq!(trashed[0].images.len(), 1);
}

#[tokio::test]
async fn concurrent_create_and_bulk_trash_do_not_lose_writes() {
    let dir = TempDir::new().unwrap();
    let journal = std::sync::Arc::new(EntryRepository::new(
        JsonEntryStore::new(dir.path()),
        FsAttachmentStore::new(dir.path()),
    ));

    let mut trashed = Vec::new();
    for i in 0..5 {
        let entry = journal.create(Utc::now(), &format!("old {i}"), vec![]).await.unwrap();
        journal.soft_delete(entry.id).await.unwrap();
        trashed.push(entry.id);
    }

    let restorer = {
        let journal = std::sync::Arc::clone(&journal);
        tokio::spawn(async move { TrashCoordinator::new(&journal).restore_many(&trashed).await })
    };
    let creators: Vec<_> = (0..5)
        .map(|i| {
            let journal = std::sync::Arc::clone(&journal);
            tokio::spawn(async move { journal.create(Utc::now(), &format!("new {i}"), vec![]).await })
        })
        .collect();

    assert_eq!(restorer.await.unwrap().unwrap(), 5);
    for creator in creators {
        creator.await.unwrap().unwrap();
    }

    let all = journal.query_all().await.unwrap();
    assert_eq!(all.len(), 10);
    assert!(all.iter().all(|entry| entry.is_active()));
}

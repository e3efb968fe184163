//! Journal command runners: config resolution, wiring and entry commands

use std::env;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate, Utc};
use thiserror::Error;

use crate::application::ports::ConfigStore;
use crate::application::{EntryComposer, EntryError, EntryRepository, TrashCoordinator};
use crate::domain::config::AppConfig;
use crate::domain::entry::{anchor_to_day, Entry, EntryId};
use crate::infrastructure::{default_data_dir, FsAttachmentStore, JsonEntryStore, XdgConfigStore};

use super::args::{Selection, TrashAction};
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// The journal as wired for the command line
pub type Journal = EntryRepository<JsonEntryStore, FsAttachmentStore>;

/// Errors from journal commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Failed(String),
}

impl CommandError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) | Self::Entry(EntryError::Validation(_)) => EXIT_USAGE_ERROR,
            _ => EXIT_ERROR,
        }
    }
}

/// Get API key from the merged config
pub fn require_api_key(config: &AppConfig) -> Result<String, CommandError> {
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            CommandError::Failed(
                "Missing API key. Set GEMINI_API_KEY environment variable or run 'voicelog config set api_key <key>'"
                    .to_string(),
            )
        })
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    let env_config = AppConfig {
        api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
        data_dir: env::var("VOICELOG_DATA_DIR").ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Journal directory from config, or the platform default
pub fn resolve_data_dir(config: &AppConfig) -> PathBuf {
    config.data_dir_path().unwrap_or_else(default_data_dir)
}

/// Wire the JSON entry file and the media directory under `data_dir`
pub fn open_journal(data_dir: &Path) -> Journal {
    EntryRepository::new(
        JsonEntryStore::new(data_dir),
        FsAttachmentStore::new(data_dir),
    )
}

/// `add`: compose an entry from text and photo files
pub async fn run_add(
    journal: &Journal,
    presenter: &Presenter,
    text: Option<String>,
    day: Option<NaiveDate>,
    images: Vec<PathBuf>,
) -> Result<(), CommandError> {
    let mut photos = Vec::with_capacity(images.len());
    for path in &images {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            CommandError::Usage(format!("Cannot read photo {}: {}", path.display(), e))
        })?;
        photos.push(bytes);
    }

    let timestamp = day
        .map(|day| anchor_to_day(day, Local::now()))
        .unwrap_or_else(Utc::now);
    let composed = EntryComposer::new(journal)
        .compose(timestamp, text.as_deref().unwrap_or_default(), photos)
        .await?;

    for failure in &composed.failed_images {
        let name = images
            .get(failure.index)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        presenter.warn(&format!("Photo {} was not saved: {}", name, failure.error));
    }
    report_saved(presenter, &composed.entry, day);
    presenter.output(&composed.entry.id.to_string());
    Ok(())
}

/// Tell the user where a new entry landed
pub fn report_saved(presenter: &Presenter, entry: &Entry, viewed_day: Option<NaiveDate>) {
    let saved_day = entry.timestamp.with_timezone(&Local).date_naive();
    presenter.success(&format!(
        "Saved entry {} on {}",
        entry.id.short(),
        saved_day.format("%Y-%m-%d")
    ));
    if let Some(viewed) = viewed_day {
        if viewed != saved_day {
            presenter.info(&format!(
                "Entry was filed under {}, not {}",
                saved_day.format("%Y-%m-%d"),
                viewed.format("%Y-%m-%d")
            ));
        }
    }
}

/// `list`: active entries of one local day
pub async fn run_list(
    journal: &Journal,
    presenter: &Presenter,
    day: Option<NaiveDate>,
) -> Result<(), CommandError> {
    let day = day.unwrap_or_else(|| Local::now().date_naive());
    let entries = journal.query_active_on(day, &Local).await?;

    presenter.day_heading(day, entries.len());
    for entry in &entries {
        presenter.entry_line(entry);
    }
    Ok(())
}

/// `days`: local days with at least one active entry
pub async fn run_days(
    journal: &Journal,
    presenter: &Presenter,
    month: Option<NaiveDate>,
) -> Result<(), CommandError> {
    let days = journal.query_active_days(&Local).await?;
    for day in days.into_iter().filter(|day| {
        month.map_or(true, |m| day.year() == m.year() && day.month() == m.month())
    }) {
        presenter.output(&day.format("%Y-%m-%d").to_string());
    }
    Ok(())
}

/// `show`: one entry in full, active or trashed
pub async fn run_show(journal: &Journal, presenter: &Presenter, id: &str) -> Result<(), CommandError> {
    let candidates = journal.query_all().await?;
    let id = resolve_id(&candidates, id)?;
    let entry = journal.get(id).await?;
    presenter.entry_detail(&entry);
    Ok(())
}

/// `delete`: move entries to the trash
pub async fn run_delete(
    journal: &Journal,
    presenter: &Presenter,
    ids: &[String],
) -> Result<(), CommandError> {
    let candidates = journal.query_all().await?;
    let ids = resolve_ids(&candidates, ids)?;

    let mut trashed = 0;
    for id in ids {
        if journal.soft_delete(id).await? {
            trashed += 1;
        } else {
            presenter.info(&format!("Entry {} is already in the trash", id.short()));
        }
    }
    presenter.success(&format!("Moved {} to trash", plural(trashed)));
    Ok(())
}

/// `trash ...`
pub async fn run_trash(
    journal: &Journal,
    presenter: &Presenter,
    action: TrashAction,
) -> Result<(), CommandError> {
    let trash = TrashCoordinator::new(journal);
    match action {
        TrashAction::List => {
            let entries = journal.query_trashed().await?;
            if entries.is_empty() {
                presenter.info("Trash is empty");
            }
            for entry in &entries {
                presenter.entry_line(entry);
            }
        }
        TrashAction::Restore(selection) => {
            let restored = if selection.all {
                trash.restore_all().await?
            } else {
                let ids = select_trashed(journal, &selection).await?;
                trash.restore_many(&ids).await?
            };
            presenter.success(&format!("Restored {}", plural(restored)));
        }
        TrashAction::Purge(selection) => {
            let removed = if selection.all {
                trash.delete_all().await?
            } else {
                let ids = select_trashed(journal, &selection).await?;
                trash.delete_many(&ids).await?
            };
            presenter.success(&format!("Permanently deleted {}", plural(removed)));
        }
    }
    Ok(())
}

/// `gc`: drop media files no entry references
pub async fn run_gc(journal: &Journal, presenter: &Presenter) -> Result<(), CommandError> {
    let removed = journal.collect_garbage().await?;
    presenter.success(&format!(
        "Removed {} orphaned file{}",
        removed,
        if removed == 1 { "" } else { "s" }
    ));
    Ok(())
}

async fn select_trashed(journal: &Journal, selection: &Selection) -> Result<Vec<EntryId>, CommandError> {
    let candidates = journal.query_trashed().await?;
    resolve_ids(&candidates, &selection.ids)
}

fn resolve_ids(candidates: &[Entry], inputs: &[String]) -> Result<Vec<EntryId>, CommandError> {
    let mut ids = Vec::with_capacity(inputs.len());
    for input in inputs {
        let id = resolve_id(candidates, input)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Match a full id or a unique prefix of one among `candidates`
fn resolve_id(candidates: &[Entry], input: &str) -> Result<EntryId, CommandError> {
    if let Ok(id) = input.parse::<EntryId>() {
        return Ok(id);
    }

    let prefix = input.trim().replace('-', "").to_ascii_lowercase();
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CommandError::Usage(format!("Not an entry id: '{}'", input)));
    }

    let mut matches = candidates
        .iter()
        .map(|entry| entry.id)
        .filter(|id| id.as_uuid().simple().to_string().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(CommandError::Usage(format!("No entry matches '{}'", input))),
        (Some(_), Some(_)) => Err(CommandError::Usage(format!(
            "'{}' matches more than one entry; use a longer prefix",
            input
        ))),
    }
}

fn plural(count: usize) -> String {
    format!("{} {}", count, if count == 1 { "entry" } else { "entries" })
}

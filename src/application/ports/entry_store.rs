//! Persistence port for journal entries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entry::{Entry, EntryId, EntryStatus};

/// Errors from the persistence capability
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Entry {0} already exists")]
    Duplicate(EntryId),

    #[error("Entry {0} does not exist")]
    Missing(EntryId),

    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
}

/// Result ordering by timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Predicate plus ordering for `EntryStore::query`:
/// "deleted_at is/is not null AND timestamp in [start, end)".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    pub status: Option<EntryStatus>,
    pub range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub order: SortOrder,
}

impl EntryQuery {
    /// Every stored entry, oldest first
    pub fn all() -> Self {
        Self::default()
    }

    /// Active entries, oldest first
    pub fn active() -> Self {
        Self {
            status: Some(EntryStatus::Active),
            ..Self::default()
        }
    }

    /// Trashed entries, newest first
    pub fn trashed() -> Self {
        Self {
            status: Some(EntryStatus::Trashed),
            order: SortOrder::Descending,
            ..Self::default()
        }
    }

    /// Restrict to timestamps in `[start, end)`
    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.range = Some((start, end));
        self
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        let status_ok = self.status.map_or(true, |s| entry.status() == s);
        let range_ok = self
            .range
            .map_or(true, |(start, end)| entry.timestamp >= start && entry.timestamp < end);
        status_ok && range_ok
    }

    /// Filter and order entries given in insertion order.
    ///
    /// The sort is stable, so equal timestamps keep insertion order in
    /// both directions.
    pub fn apply<I>(&self, entries: I) -> Vec<Entry>
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut matched: Vec<Entry> = entries.into_iter().filter(|e| self.matches(e)).collect();
        match self.order {
            SortOrder::Ascending => matched.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortOrder::Descending => matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        }
        matched
    }
}

/// Port for durable entry storage.
///
/// Each call is atomic on its own; the repository serializes
/// read-modify-write sequences above this layer.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Insert a new entry, failing on a duplicate id
    async fn insert(&self, entry: &Entry) -> Result<(), StoreError>;

    /// Replace an existing entry, failing if it is not stored
    async fn update(&self, entry: &Entry) -> Result<(), StoreError>;

    /// Remove an entry, returning it if it existed
    async fn delete(&self, id: EntryId) -> Result<Option<Entry>, StoreError>;

    /// Look up one entry by id
    async fn get(&self, id: EntryId) -> Result<Option<Entry>, StoreError>;

    /// Entries matching `query`, in the order it asks for
    async fn query(&self, query: &EntryQuery) -> Result<Vec<Entry>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry_at(hour: u32, text: &str) -> Entry {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap();
        Entry::new(EntryId::new(), ts, text, vec![]).unwrap()
    }

    #[test]
    fn active_query_excludes_trashed() {
        let keep = entry_at(9, "keep");
        let mut gone = entry_at(10, "gone");
        gone.trash(Utc::now());

        let result = EntryQuery::active().apply(vec![keep.clone(), gone]);
        assert_eq!(result, vec![keep]);
    }

    #[test]
    fn range_is_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let at_start = entry_at(9, "start");
        let at_end = entry_at(10, "end");

        let result = EntryQuery::all()
            .between(start, end)
            .apply(vec![at_start.clone(), at_end]);
        assert_eq!(result, vec![at_start]);
    }

    #[test]
    fn ties_keep_insertion_order_both_ways() {
        let a = entry_at(9, "a");
        let b = entry_at(9, "b");
        let c = entry_at(11, "c");

        let asc = EntryQuery::all().apply(vec![a.clone(), b.clone(), c.clone()]);
        let texts: Vec<_> = asc.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c"]);

        let desc = EntryQuery {
            order: SortOrder::Descending,
            ..EntryQuery::all()
        }
        .apply(vec![a, b, c]);
        let texts: Vec<_> = desc.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["c", "a", "b"]);
    }
}

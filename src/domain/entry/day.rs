//! Calendar-day bucketing
//!
//! Entries are stored with UTC instants; "which day" is a question about
//! the viewer's time zone, so every helper here takes one.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Resolve a wall-clock time in `tz`. Ambiguous times (DST fall-back) take
/// the earlier instant; non-existent times (DST spring-forward) move one
/// hour later.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}

/// Half-open `[start, end)` range covering `date` in `tz`
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = resolve_local(tz, date.and_time(NaiveTime::MIN));
    let end = match date.succ_opt() {
        Some(next) => resolve_local(tz, next.and_time(NaiveTime::MIN)),
        None => DateTime::<Utc>::MAX_UTC,
    };
    (start, end)
}

/// Calendar day of `instant` as seen from `tz`
pub fn day_of<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Anchor a new entry to `day` while keeping the time of day of `now`.
///
/// Lets an entry composed while browsing an earlier day land on that day,
/// in chronological position relative to the rest of it.
pub fn anchor_to_day<Tz: TimeZone>(day: NaiveDate, now: DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    resolve_local(&tz, day.and_time(now.naive_local().time()))
}

//! Journal entries and their photo attachments

mod attachment;
mod day;
mod ids;
mod model;

pub use attachment::Attachment;
pub use day::{anchor_to_day, day_bounds, day_of};
pub use ids::{AttachmentId, EntryId, IdParseError};
pub use model::{normalize_text, Entry, EntryStatus};

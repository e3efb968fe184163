//! Attachment storage adapters

mod fs_store;

pub use fs_store::{FsAttachmentStore, Variant};

//! Entry persistence adapters

mod json_file;
mod memory;

pub use json_file::JsonEntryStore;
pub use memory::MemoryEntryStore;

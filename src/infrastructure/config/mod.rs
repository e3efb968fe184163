//! Configuration storage adapters

mod xdg;

pub use xdg::{default_data_dir, XdgConfigStore};

//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, the journal command
//! runners and the capture host with its shortcut client.

pub mod app;
pub mod args;
pub mod capture;
pub mod config_cmd;
pub mod presenter;
pub mod record;

#[cfg(unix)]
pub mod capture_cmd;
#[cfg(unix)]
pub mod daemon_app;
#[cfg(unix)]
pub mod ipc;
#[cfg(unix)]
pub mod pid_file;
#[cfg(unix)]
pub mod signals;

// Re-export commonly used types
pub use app::{CommandError, Journal, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{CaptureAction, Cli, Commands, ConfigAction, TrashAction};
pub use capture::CaptureSettings;
pub use presenter::Presenter;

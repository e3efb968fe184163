//! PID file guarding against two capture hosts

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::debug;

use super::ipc::runtime_dir;

const PID_FILE_NAME: &str = "voicelog.pid";

/// Default PID file location
pub fn default_pid_path() -> PathBuf {
    runtime_dir().join(PID_FILE_NAME)
}

#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another capture host is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Failed to write PID file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Held while this process is the capture host. Dropping it removes the
/// file; a guard is only ever handed out for a file this process wrote.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Record this process in `path` unless a live host is already listed
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, PidFileError> {
        let path = path.into();
        if let Some(pid) = running_pid(&path) {
            return Err(PidFileError::AlreadyRunning(pid));
        }
        fs::write(&path, process::id().to_string())
            .map_err(|source| PidFileError::WriteFailed { path: path.clone(), source })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!(error = %e, "PID file already gone");
        }
    }
}

/// PID of a live process named in `path`, if any.
/// A file naming a dead process is removed.
pub fn running_pid(path: &Path) -> Option<u32> {
    let pid: u32 = fs::read_to_string(path).ok()?.trim().parse().ok()?;
    let raw = i32::try_from(pid).ok()?;

    // Signal `None` only probes for existence
    match kill(Pid::from_raw(raw), None::<Signal>) {
        Ok(()) | Err(Errno::EPERM) => Some(pid),
        Err(_) => {
            debug!(pid, "Removing stale PID file");
            let _ = fs::remove_file(path);
            None
        }
    }
}

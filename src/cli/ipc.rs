//! Control socket between shortcut commands and the capture host
//!
//! One request line per connection, one reply line back:
//! `start`, `stop`, `cancel` answer `ok` or `error: <message>`;
//! `status` answers the host's state text.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::signals::DaemonSignal;

const SOCKET_NAME: &str = "voicelog.sock";
const ERROR_PREFIX: &str = "error:";

/// Per-user runtime directory: `$XDG_RUNTIME_DIR`, or the temp dir
pub fn runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

/// Default socket location
pub fn default_socket_path() -> PathBuf {
    runtime_dir().join(SOCKET_NAME)
}

/// Capture operation requested by a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Cancel,
}

/// A parsed request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Status,
    Control(ControlCommand),
}

impl FromStr for Request {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        match line.trim() {
            "status" => Ok(Self::Status),
            "start" => Ok(Self::Control(ControlCommand::Start)),
            "stop" => Ok(Self::Control(ControlCommand::Stop)),
            "cancel" => Ok(Self::Control(ControlCommand::Cancel)),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Text answered to `status`
pub type StateFn = Box<dyn Fn() -> String + Send + Sync>;

fn encode_reply(reply: Result<String, String>) -> String {
    match reply {
        Ok(text) => format!("{}\n", text),
        Err(message) => format!("{} {}\n", ERROR_PREFIX, message),
    }
}

/// Split a reply line into success text or the host's error message
pub fn decode_reply(line: &str) -> Result<String, String> {
    let line = line.trim();
    match line.strip_prefix(ERROR_PREFIX) {
        Some(message) => Err(message.trim().to_string()),
        None => Ok(line.to_string()),
    }
}

/// Listening side, owned by the capture host. The socket file is removed
/// when the server is dropped.
pub struct ControlServer {
    path: PathBuf,
    listener: UnixListener,
}

impl ControlServer {
    /// Listen at `path`, replacing a socket left behind by a crashed host.
    /// Callers must hold the PID file first so a live host is never displaced.
    pub fn bind(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed stale socket"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        let listener = UnixListener::bind(&path)?;
        Ok(Self { path, listener })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept connections until the task is dropped. Control commands go
    /// to the host loop through `tx`; the reply waits for its verdict.
    pub async fn serve(&self, tx: mpsc::Sender<DaemonSignal>, state: StateFn) {
        loop {
            let stream = match self.listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!(error = %e, "Socket accept error");
                    continue;
                }
            };
            // Snapshot now; the host may move on before the line is read
            let status = state();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Err(e) = answer(stream, tx, status).await {
                    warn!(error = %e, "Socket connection error");
                }
            });
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn answer(stream: UnixStream, tx: mpsc::Sender<DaemonSignal>, status: String) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await?;
    debug!(request = line.trim(), "Socket request");

    let reply = match line.parse::<Request>() {
        Ok(Request::Status) => Ok(status),
        Ok(Request::Control(command)) => forward(&tx, command).await,
        Err(message) => Err(message),
    };

    writer.write_all(encode_reply(reply).as_bytes()).await?;
    writer.flush().await
}

async fn forward(tx: &mpsc::Sender<DaemonSignal>, command: ControlCommand) -> Result<String, String> {
    let (reply, verdict) = oneshot::channel();
    tx.send(DaemonSignal::Control { command, reply })
        .await
        .map_err(|_| "capture host is shutting down".to_string())?;
    match verdict.await {
        Ok(outcome) => outcome.map(|()| "ok".to_string()),
        Err(_) => Err("no reply from capture host".to_string()),
    }
}

/// Connecting side, used by `voicelog capture ...`
pub struct ControlClient {
    path: PathBuf,
}

impl ControlClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Send one request line. `Ok(None)` means nobody is listening.
    pub async fn send(&self, request: &str) -> io::Result<Option<String>> {
        let stream = match UnixStream::connect(&self.path).await {
            Ok(stream) => stream,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
                ) =>
            {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };
        let (reader, mut writer) = stream.into_split();
        writer.write_all(format!("{}\n", request).as_bytes()).await?;
        writer.flush().await?;

        let mut reply = String::new();
        BufReader::new(reader).read_line(&mut reply).await?;
        Ok(Some(reply))
    }
}

//! Signal and command plumbing for the capture host

use colored::Colorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, oneshot};

use super::ipc::ControlCommand;

/// Reply to a control command: `Ok` or a message for the caller
pub type ControlReply = oneshot::Sender<Result<(), String>>;

/// Daemon signals
#[derive(Debug)]
pub enum DaemonSignal {
    /// A capture operation, with the channel its outcome goes back on
    Control {
        command: ControlCommand,
        reply: ControlReply,
    },
    /// Shutdown daemon (SIGINT/SIGTERM)
    Shutdown,
}

/// Inbox of the capture host loop.
///
/// SIGINT and SIGTERM arrive as `Shutdown`; the control socket pushes
/// `Control` messages through the sender returned by `new`.
pub struct DaemonSignalHandler {
    receiver: mpsc::Receiver<DaemonSignal>,
}

impl DaemonSignalHandler {
    pub async fn new() -> Result<(Self, mpsc::Sender<DaemonSignal>), std::io::Error> {
        let (tx, rx) = mpsc::channel(10);

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let shutdown = tx.clone();
        tokio::spawn(async move {
            let name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            eprintln!("{} Received {} (shutdown)", "↓".cyan(), name);
            let _ = shutdown.send(DaemonSignal::Shutdown).await;
        });

        Ok((Self { receiver: rx }, tx))
    }

    /// Next message; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<DaemonSignal> {
        self.receiver.recv().await
    }
}

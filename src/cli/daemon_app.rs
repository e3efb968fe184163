//! Capture host: owns the process-wide CaptureSession and serves shortcuts

use std::process::ExitCode;
use std::sync::Arc;

use tracing::debug;

use crate::domain::capture::{CapturePhase, CaptureState};

use super::app::{Journal, EXIT_ERROR, EXIT_SUCCESS};
use super::capture::{describe_state, save_transcript, CaptureSettings, Session};
use super::ipc::{default_socket_path, ControlCommand, ControlServer};
use super::pid_file::{default_pid_path, PidFile};
use super::presenter::Presenter;
use super::signals::{DaemonSignal, DaemonSignalHandler};

/// Run the capture host until SIGINT/SIGTERM
pub async fn run_daemon(journal: Journal, settings: CaptureSettings) -> ExitCode {
    let presenter = Presenter::new();

    let _pid_file = match PidFile::acquire(default_pid_path()) {
        Ok(guard) => guard,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let session = Arc::new(settings.session());

    // The socket feeds control commands into the same inbox as OS signals
    let (mut signals, signal_tx) = match DaemonSignalHandler::new().await {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let server = match ControlServer::bind(default_socket_path()) {
        Ok(server) => server,
        Err(e) => {
            presenter.error(&format!("Failed to bind socket: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let socket = server.path().display().to_string();

    let states = session.subscribe();
    let elapsed = session.elapsed();
    let status = move || describe_state(&states.borrow(), *elapsed.borrow());
    let serving = tokio::spawn(async move { server.serve(signal_tx, Box::new(status)).await });

    presenter.capture_status("Started, waiting for commands...");
    presenter.info(&format!(
        "PID: {} | Socket: {} | Language: {} | Limit: {}",
        std::process::id(),
        socket,
        settings.language,
        settings.max_duration
    ));

    let host = Host {
        session: &session,
        journal: &journal,
        presenter: &presenter,
        max_secs: settings.max_duration.as_secs(),
    };
    let clean = host.run(&mut signals).await;

    // Dropping the server task removes the socket file
    serving.abort();
    let _ = serving.await;

    if clean {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

struct Host<'a> {
    session: &'a Session,
    journal: &'a Journal,
    presenter: &'a Presenter,
    max_secs: u64,
}

impl Host<'_> {
    /// Main loop. Returns whether the host shut down on request.
    async fn run(&self, signals: &mut DaemonSignalHandler) -> bool {
        let mut states = self.session.subscribe();
        let mut elapsed = self.session.elapsed();

        loop {
            tokio::select! {
                signal = signals.recv() => match signal {
                    Some(DaemonSignal::Control { command, reply }) => {
                        let outcome = self.handle(command).await;
                        if let Err(ref message) = outcome {
                            self.presenter.warn(message);
                        }
                        let _ = reply.send(outcome);
                    }
                    Some(DaemonSignal::Shutdown) => {
                        self.shutdown().await;
                        return true;
                    }
                    None => return false,
                },
                Ok(()) = elapsed.changed() => {
                    let secs = *elapsed.borrow_and_update();
                    if secs >= self.max_secs && self.session.phase() == CapturePhase::Recording {
                        self.presenter.warn("Max duration reached, auto-stopping");
                        if let Err(message) = self.stop().await {
                            self.presenter.error(&message);
                        }
                    }
                }
                Ok(()) = states.changed() => {
                    let state = states.borrow_and_update().clone();
                    self.settle(state).await;
                }
            }
        }
    }

    async fn handle(&self, command: ControlCommand) -> Result<(), String> {
        debug!(?command, state = %self.session.state(), "Control command");
        match command {
            ControlCommand::Start => {
                // An outcome not yet picked up by the loop would block the start
                self.settle(self.session.state()).await;
                self.session.start().await.map_err(|e| e.to_string())?;
                self.presenter.capture_status("Recording...");
                Ok(())
            }
            ControlCommand::Stop => self.stop().await,
            ControlCommand::Cancel => {
                self.session.cancel().await.map_err(|e| e.to_string())?;
                self.presenter.capture_status("Cancelled");
                Ok(())
            }
        }
    }

    async fn stop(&self) -> Result<(), String> {
        let audio = self.session.stop().await.map_err(|e| e.to_string())?;
        self.presenter
            .capture_status(&format!("Transcribing ({})...", audio.summary()));
        Ok(())
    }

    /// Persist a Completed transcript, report a failure, then return to Idle
    async fn settle(&self, state: CaptureState) {
        match state {
            CaptureState::Completed { ref text } => {
                if let Err(e) = save_transcript(self.journal, self.presenter, text, None).await {
                    self.presenter.error(&format!("Transcript not saved: {}", e));
                    // Keep the words somewhere the user can find them
                    self.presenter.output(text);
                }
            }
            CaptureState::Failed(ref failure) => {
                self.presenter.error(&failure.to_string());
            }
            _ => return,
        }
        if let Err(e) = self.session.reset().await {
            debug!(error = %e, "Outcome already acknowledged");
        }
        self.presenter.capture_status("Idle");
    }

    async fn shutdown(&self) {
        self.presenter.info("Processing shutdown");
        match self.session.phase() {
            CapturePhase::Recording | CapturePhase::Transcribing => {
                if let Err(e) = self.session.cancel().await {
                    debug!(error = %e, "Nothing to cancel");
                }
            }
            _ => {}
        }
        self.presenter.capture_status("Shutting down...");
    }
}

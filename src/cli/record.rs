//! Foreground dictation: record until Enter, Ctrl-C or the time limit

use std::io::BufRead;

use chrono::NaiveDate;
use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::capture::CaptureFailure;

use super::app::{CommandError, Journal};
use super::capture::{save_transcript, CaptureSettings, Session};
use super::presenter::Presenter;

/// Why the recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Enter,
    Interrupted,
    TimeLimit,
}

/// Record one entry in the foreground and file it under `day` (or now)
pub async fn run_record(
    journal: &Journal,
    presenter: &mut Presenter,
    settings: &CaptureSettings,
    day: Option<NaiveDate>,
) -> Result<(), CommandError> {
    let session = settings.session();
    session
        .start()
        .await
        .map_err(|e| CommandError::Failed(e.to_string()))?;

    presenter.start_spinner("Recording...");
    let max_secs = settings.max_duration.as_secs();
    let reason = wait_for_stop(&session, presenter, max_secs).await;
    debug!(?reason, "Recording ends");

    let audio = session.stop().await.map_err(|e| {
        presenter.spinner_fail("Recording failed");
        CommandError::Failed(e.to_string())
    })?;
    let prefix = if reason == StopReason::TimeLimit {
        "Time limit reached. "
    } else {
        ""
    };
    presenter.update_spinner(&format!("{}Transcribing ({})...", prefix, audio.summary()));

    let outcome = tokio::select! {
        outcome = session.wait_for_outcome() => outcome,
        _ = tokio::signal::ctrl_c() => {
            if let Err(e) = session.cancel().await {
                debug!(error = %e, "Cancel after outcome");
            }
            Err(CaptureFailure::Cancelled)
        }
    };

    match outcome {
        Ok(text) => {
            presenter.spinner_success("Transcription complete");
            save_transcript(journal, presenter, &text, day).await?;
            presenter.output(&text);
            Ok(())
        }
        Err(failure) => {
            presenter.spinner_fail(&failure.to_string());
            Err(CommandError::Failed(failure.to_string()))
        }
    }
}

async fn wait_for_stop(
    session: &Session,
    presenter: &Presenter,
    max_secs: u64,
) -> StopReason {
    let mut enter = spawn_enter_listener();
    let mut stdin_open = true;
    let mut elapsed = session.elapsed();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    presenter.update_recording_progress(0, max_secs);
    loop {
        tokio::select! {
            pressed = &mut enter, if stdin_open => match pressed {
                Ok(()) => return StopReason::Enter,
                // No terminal attached; only Ctrl-C or the limit can stop
                Err(_) => stdin_open = false,
            },
            _ = &mut ctrl_c => return StopReason::Interrupted,
            changed = elapsed.changed() => {
                if changed.is_err() {
                    return StopReason::Interrupted;
                }
                let secs = *elapsed.borrow_and_update();
                presenter.update_recording_progress(secs, max_secs);
                if secs >= max_secs {
                    return StopReason::TimeLimit;
                }
            }
        }
    }
}

/// Resolves when a line is read from stdin; dropped on EOF or error.
///
/// Runs on a plain thread because a blocking stdin read cannot be
/// cancelled and would hold up runtime shutdown.
fn spawn_enter_listener() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        if matches!(std::io::stdin().lock().read_line(&mut line), Ok(n) if n > 0) {
            let _ = tx.send(());
        }
    });
    rx
}

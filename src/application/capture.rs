//! Capture session use case
//!
//! Drives one record -> stop -> transcribe cycle at a time. Stopping the
//! microphone returns at once; speech-to-text runs as a background task
//! whose result lands in the session state. Observers follow the state
//! and the elapsed-seconds ticker through `watch` channels.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::capture::{
    CaptureFailure, CaptureMachine, CapturePhase, CaptureState, InvalidStateTransition,
};
use crate::domain::transcription::{AudioData, SystemPrompt};

use super::ports::{Recorder, RecordingError, Transcriber, TranscriptionError};

/// Errors returned directly by capture operations
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Microphone access has not been granted")]
    PermissionDenied,

    #[error("Recording failed: {0}")]
    Recording(#[from] RecordingError),
}

struct Inner {
    machine: CaptureMachine,
    /// Bumped whenever a transcription is started, cancelled or superseded.
    /// A finishing task applies its result only if its number is current.
    generation: u64,
    transcription: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl Inner {
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn abort_transcription(&mut self) {
        self.generation += 1;
        if let Some(task) = self.transcription.take() {
            task.abort();
        }
    }
}

fn publish(tx: &watch::Sender<CaptureState>, machine: &CaptureMachine) {
    tx.send_replace(machine.state().clone());
}

/// The single capture pipeline of a process.
///
/// Construct one and share it (behind an `Arc`) between every caller that
/// can start or stop a capture.
pub struct CaptureSession<R, T>
where
    R: Recorder + 'static,
    T: Transcriber + 'static,
{
    recorder: Arc<R>,
    transcriber: Arc<T>,
    prompt: SystemPrompt,
    inner: Arc<Mutex<Inner>>,
    state_tx: Arc<watch::Sender<CaptureState>>,
    elapsed_tx: Arc<watch::Sender<u64>>,
}

impl<R, T> CaptureSession<R, T>
where
    R: Recorder + 'static,
    T: Transcriber + 'static,
{
    /// Create an idle session
    pub fn new(recorder: R, transcriber: T, prompt: SystemPrompt) -> Self {
        let (state_tx, _) = watch::channel(CaptureState::Idle);
        let (elapsed_tx, _) = watch::channel(0);
        Self {
            recorder: Arc::new(recorder),
            transcriber: Arc::new(transcriber),
            prompt,
            inner: Arc::new(Mutex::new(Inner {
                machine: CaptureMachine::new(),
                generation: 0,
                transcription: None,
                ticker: None,
            })),
            state_tx: Arc::new(state_tx),
            elapsed_tx: Arc::new(elapsed_tx),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> CaptureState {
        self.state_tx.borrow().clone()
    }

    /// Current phase
    pub fn phase(&self) -> CapturePhase {
        self.state_tx.borrow().phase()
    }

    /// Follow state changes
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state_tx.subscribe()
    }

    /// Follow the elapsed-seconds ticker of the current recording
    pub fn elapsed(&self) -> watch::Receiver<u64> {
        self.elapsed_tx.subscribe()
    }

    /// Whole seconds recorded so far in the current cycle
    pub fn elapsed_secs(&self) -> u64 {
        *self.elapsed_tx.borrow()
    }

    /// Begin recording.
    ///
    /// Allowed from Idle, and from Transcribing, in which case the pending
    /// transcription is cancelled and its result will never be applied.
    /// Any other state is rejected without touching the recorder. On
    /// failure the session is left Idle.
    pub async fn start(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock().await;
        inner.machine.ensure_can_start()?;

        if !self.recorder.permission_granted() {
            return Err(CaptureError::PermissionDenied);
        }

        if inner.machine.phase() == CapturePhase::Transcribing {
            inner.abort_transcription();
            inner.machine.supersede()?;
            publish(&self.state_tx, &inner.machine);
            info!("Pending transcription superseded by a new capture");
        }

        self.recorder.start().await?;

        inner.machine.start_recording()?;
        publish(&self.state_tx, &inner.machine);
        inner.ticker = Some(self.spawn_ticker());
        debug!("Recording started");
        Ok(())
    }

    /// Stop recording and hand the audio to the transcriber.
    ///
    /// Returns the captured audio as soon as the microphone is closed; the
    /// transcription outcome arrives later as Completed or Failed.
    pub async fn stop(&self) -> Result<AudioData, CaptureError> {
        let mut inner = self.inner.lock().await;
        inner.machine.begin_stop()?;
        inner.stop_ticker();
        publish(&self.state_tx, &inner.machine);

        let audio = match self.recorder.stop().await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(error = %e, "Recorder failed to stop");
                inner.machine.fail(CaptureFailure::Recording(e.to_string()))?;
                publish(&self.state_tx, &inner.machine);
                return Err(e.into());
            }
        };

        inner.machine.begin_transcribing()?;
        inner.generation += 1;
        let generation = inner.generation;
        publish(&self.state_tx, &inner.machine);

        debug!(
            size = %audio.human_readable_size(),
            generation,
            "Recording stopped, transcribing"
        );
        inner.transcription = Some(self.spawn_transcription(audio.clone(), generation));
        Ok(audio)
    }

    /// Abandon the current cycle.
    ///
    /// While recording, the audio is discarded and the session returns to
    /// Idle. While transcribing, the task is aborted and the session moves
    /// to Failed(cancelled).
    pub async fn cancel(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock().await;

        if inner.machine.phase() == CapturePhase::Recording {
            inner.machine.cancel_recording()?;
            inner.stop_ticker();
            publish(&self.state_tx, &inner.machine);
            if let Err(e) = self.recorder.cancel().await {
                warn!(error = %e, "Recorder failed to cancel");
            }
            debug!("Recording cancelled");
            return Ok(());
        }

        inner.machine.cancel_transcription()?;
        inner.abort_transcription();
        publish(&self.state_tx, &inner.machine);
        debug!("Transcription cancelled");
        Ok(())
    }

    /// Acknowledge a Completed or Failed outcome and return to Idle
    pub async fn reset(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock().await;
        inner.machine.reset()?;
        publish(&self.state_tx, &inner.machine);
        Ok(())
    }

    /// Wait until the current cycle settles.
    ///
    /// Returns the transcript on Completed and the failure on Failed. A
    /// cycle that was superseded or cancelled before finishing reports
    /// `CaptureFailure::Cancelled`.
    pub async fn wait_for_outcome(&self) -> Result<String, CaptureFailure> {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|s| {
                matches!(
                    s.phase(),
                    CapturePhase::Idle | CapturePhase::Completed | CapturePhase::Failed
                )
            })
            .await
            .map(|state| state.clone())
            .map_err(|_| CaptureFailure::Cancelled)?;

        match settled {
            CaptureState::Completed { text } => Ok(text),
            CaptureState::Failed(failure) => Err(failure),
            _ => Err(CaptureFailure::Cancelled),
        }
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let elapsed = Arc::clone(&self.elapsed_tx);
        elapsed.send_replace(0);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(StdDuration::from_secs(1));
            // The first tick completes immediately
            interval.tick().await;
            let mut secs = 0u64;
            loop {
                interval.tick().await;
                secs += 1;
                elapsed.send_replace(secs);
            }
        })
    }

    fn spawn_transcription(&self, audio: AudioData, generation: u64) -> JoinHandle<()> {
        let transcriber = Arc::clone(&self.transcriber);
        let prompt = self.prompt.clone();
        let inner = Arc::clone(&self.inner);
        let state_tx = Arc::clone(&self.state_tx);

        tokio::spawn(async move {
            let result = transcriber.transcribe(&audio, &prompt).await;
            settle(&inner, &state_tx, generation, result).await;
        })
    }
}

/// Apply a finished transcription, unless its cycle has since been
/// cancelled or superseded
async fn settle(
    inner: &Mutex<Inner>,
    state_tx: &watch::Sender<CaptureState>,
    generation: u64,
    result: Result<String, TranscriptionError>,
) {
    let mut inner = inner.lock().await;
    if inner.generation != generation {
        debug!(generation, "Discarding stale transcription result");
        return;
    }
    inner.transcription = None;

    let outcome = match result {
        Ok(text) if text.trim().is_empty() => Err(TranscriptionError::EmptyResponse.to_string()),
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => Err(e.to_string()),
    };

    let applied = match outcome {
        Ok(text) => inner.machine.complete(text),
        Err(message) => {
            warn!(error = %message, "Transcription failed");
            inner.machine.fail(CaptureFailure::Transcription(message))
        }
    };
    match applied {
        Ok(()) => publish(state_tx, &inner.machine),
        Err(e) => debug!(error = %e, "Transcription result not applied"),
    }
}

impl<R, T> Drop for CaptureSession<R, T>
where
    R: Recorder + 'static,
    T: Transcriber + 'static,
{
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_lock() {
            inner.stop_ticker();
            inner.abort_transcription();
        }
    }
}

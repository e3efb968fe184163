//! Microphone recorder using cpal
//!
//! cpal streams are not `Send`, so each recording owns a dedicated thread
//! that opens the stream, reports readiness and keeps it alive until the
//! recorder is stopped or cancelled.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig, SupportedStreamConfigRange};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::flac_encoder::{encode_flac, TARGET_SAMPLE_RATE};
use crate::application::ports::{Recorder, RecordingError};
use crate::domain::transcription::{AudioData, AudioMimeType};

const POLL_INTERVAL: StdDuration = StdDuration::from_millis(50);

/// Lock a std mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Default-input-device recorder producing 16kHz mono FLAC
pub struct CpalRecorder {
    /// Mono samples at the device rate
    samples: Arc<StdMutex<Vec<i16>>>,
    device_rate: Arc<AtomicU32>,
    active: Arc<AtomicBool>,
    worker: StdMutex<Option<JoinHandle<()>>>,
}

impl CpalRecorder {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(StdMutex::new(Vec::new())),
            device_rate: Arc::new(AtomicU32::new(0)),
            active: Arc::new(AtomicBool::new(false)),
            worker: StdMutex::new(None),
        }
    }

    fn input_device() -> Result<cpal::Device, RecordingError> {
        cpal::default_host()
            .default_input_device()
            .ok_or(RecordingError::NoAudioDevice)
    }

    fn covers_target(range: &SupportedStreamConfigRange) -> bool {
        range.min_sample_rate().0 <= TARGET_SAMPLE_RATE
            && range.max_sample_rate().0 >= TARGET_SAMPLE_RATE
    }

    /// Pick an i16/f32 input config, preferring fewer channels and a
    /// range containing 16kHz
    fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), RecordingError> {
        let ranges = device
            .supported_input_configs()
            .map_err(|e| RecordingError::StartFailed(format!("Failed to get configs: {}", e)))?;

        let best = ranges
            .filter(|r| matches!(r.sample_format(), SampleFormat::I16 | SampleFormat::F32))
            .min_by_key(|r| (!Self::covers_target(r), r.channels()))
            .ok_or_else(|| RecordingError::StartFailed("No suitable input config".into()))?;

        let sample_rate = if Self::covers_target(&best) {
            SampleRate(TARGET_SAMPLE_RATE)
        } else {
            best.min_sample_rate()
        };

        let config = StreamConfig {
            channels: best.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((config, best.sample_format()))
    }

    /// Average interleaved frames down to one channel
    fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels <= 1 {
            return samples.to_vec();
        }
        samples
            .chunks(channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    }

    /// Resample mono audio from `source_rate` to 16kHz
    fn resample(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, RecordingError> {
        if source_rate == TARGET_SAMPLE_RATE {
            return Ok(samples.to_vec());
        }

        let input: Vec<f32> = samples.iter().map(|&s| f32::from(s) / 32768.0).collect();
        let expected = (input.len() as f64 * TARGET_SAMPLE_RATE as f64 / source_rate as f64)
            .ceil() as usize;

        let mut resampler =
            FftFixedIn::<f32>::new(source_rate as usize, TARGET_SAMPLE_RATE as usize, 1024, 2, 1)
                .map_err(|e| {
                    RecordingError::RecordingFailed(format!("Resampler init failed: {}", e))
                })?;

        let mut output = Vec::with_capacity(expected);
        for chunk in input.chunks(resampler.input_frames_next()) {
            let mut block = chunk.to_vec();
            block.resize(resampler.input_frames_next(), 0.0);
            let resampled = resampler.process(&vec![block], None).map_err(|e| {
                RecordingError::RecordingFailed(format!("Resampling failed: {}", e))
            })?;
            output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
        }
        output.truncate(expected);
        Ok(output)
    }

    /// Resample and encode a finished recording
    fn encode(samples: &[i16], source_rate: u32) -> Result<AudioData, RecordingError> {
        let normalized = Self::resample(samples, source_rate)?;
        let flac = encode_flac(&normalized, TARGET_SAMPLE_RATE)
            .map_err(|e| RecordingError::RecordingFailed(e.to_string()))?;
        let duration_ms = normalized.len() as u64 * 1000 / u64::from(TARGET_SAMPLE_RATE);
        Ok(AudioData::new(flac, AudioMimeType::Flac).with_duration_ms(duration_ms))
    }

    /// Open and start the input stream; runs on the recording thread
    fn open_stream(
        samples: Arc<StdMutex<Vec<i16>>>,
        active: Arc<AtomicBool>,
        device_rate: &AtomicU32,
    ) -> Result<cpal::Stream, RecordingError> {
        let device = Self::input_device()?;
        let (config, format) = Self::input_config(&device)?;
        let channels = config.channels;
        device_rate.store(config.sample_rate.0, Ordering::SeqCst);

        let push = move |pcm: &[i16]| {
            if active.load(Ordering::SeqCst) {
                lock(&samples).extend(Self::downmix(pcm, channels));
            }
        };
        let on_error = |err: cpal::StreamError| warn!(error = %err, "Audio stream error");

        let stream = match format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| push(data),
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let pcm: Vec<i16> = data.iter().map(|&s| (s * 32767.0) as i16).collect();
                    push(&pcm)
                },
                on_error,
                None,
            ),
            other => {
                return Err(RecordingError::StartFailed(format!(
                    "Unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| RecordingError::StartFailed(e.to_string()))?;

        stream
            .play()
            .map_err(|e| RecordingError::StartFailed(e.to_string()))?;
        Ok(stream)
    }

    /// Signal the recording thread to finish and wait for it
    async fn halt(&self) -> Result<(), RecordingError> {
        self.active.store(false, Ordering::SeqCst);
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|e| RecordingError::RecordingFailed(e.to_string()))?
                .map_err(|_| RecordingError::RecordingFailed("Recording thread panicked".into()))?;
        }
        Ok(())
    }
}

impl Default for CpalRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Recorder for CpalRecorder {
    fn permission_granted(&self) -> bool {
        // Desktop hosts expose no permission prompt; a reachable default
        // input device is the grant.
        cpal::default_host().default_input_device().is_some()
    }

    async fn start(&self) -> Result<(), RecordingError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(RecordingError::StartFailed(
                "Recording already in progress".to_string(),
            ));
        }
        lock(&self.samples).clear();

        let samples = Arc::clone(&self.samples);
        let active = Arc::clone(&self.active);
        let device_rate = Arc::clone(&self.device_rate);
        let (ready_tx, ready_rx) = oneshot::channel();

        let worker = std::thread::spawn(move || {
            let stream = match Self::open_stream(samples, Arc::clone(&active), &device_rate) {
                Ok(stream) => stream,
                Err(e) => {
                    active.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            while active.load(Ordering::SeqCst) {
                std::thread::sleep(POLL_INTERVAL);
            }
            drop(stream);
        });
        *lock(&self.worker) = Some(worker);

        let ready = ready_rx
            .await
            .unwrap_or_else(|_| Err(RecordingError::StartFailed("Recording thread exited".into())));
        if let Err(e) = ready {
            self.active.store(false, Ordering::SeqCst);
            let _ = self.halt().await;
            return Err(e);
        }

        debug!(rate = self.device_rate.load(Ordering::SeqCst), "Microphone open");
        Ok(())
    }

    async fn stop(&self) -> Result<AudioData, RecordingError> {
        if !self.active.load(Ordering::SeqCst) {
            return Err(RecordingError::NotRecording);
        }
        self.halt().await?;

        let rate = self.device_rate.load(Ordering::SeqCst);
        let samples = std::mem::take(&mut *lock(&self.samples));
        if rate == 0 || samples.is_empty() {
            return Err(RecordingError::RecordingFailed(
                "No audio data captured".to_string(),
            ));
        }

        tokio::task::spawn_blocking(move || Self::encode(&samples, rate))
            .await
            .map_err(|e| RecordingError::RecordingFailed(format!("Encode task error: {}", e)))?
    }

    async fn cancel(&self) -> Result<(), RecordingError> {
        self.halt().await?;
        lock(&self.samples).clear();
        Ok(())
    }
}

impl Drop for CpalRecorder {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

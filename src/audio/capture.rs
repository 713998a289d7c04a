//! Live audio capture from an input device.
//!
//! The cpal stream must stay on the thread that built it, so capture is
//! split in two: [`CaptureDevice`] owns the stream and lives on the main
//! thread, while [`CaptureSource`] receives mono sample batches over a
//! channel and can be moved to the visualizer worker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{error, info, warn};

use super::source::{downmix_map, LiveSource, SampleSource};
use crate::error::{Result, VisError};
use crate::params::CaptureConfig;

/// Running input stream; capture stops when this is dropped
pub struct CaptureDevice {
    stream: cpal::Stream,
    name: String,
    dropped: Arc<AtomicUsize>,
}

impl CaptureDevice {
    /// Open the configured (or default) input device and start capturing
    pub fn open(config: &CaptureConfig) -> Result<(Self, CaptureSource)> {
        config.validate()?;
        let host = cpal::default_host();
        let device = match &config.device {
            Some(wanted) => host
                .input_devices()
                .map_err(|e| VisError::source_read(format!("cannot list input devices: {}", e)))?
                .find(|d| d.name().map(|n| &n == wanted).unwrap_or(false))
                .ok_or_else(|| VisError::source_read(format!("no input device named {:?}", wanted)))?,
            None => host
                .default_input_device()
                .ok_or_else(|| VisError::source_read("No audio input device found"))?,
        };
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| VisError::source_read(format!("Failed to get input config: {}", e)))?;
        let stream_config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        let sample_rate = stream_config.sample_rate.0;

        info!(
            "Capture: {} @ {}Hz, {} channels, {:?}",
            name,
            sample_rate,
            stream_config.channels,
            supported.sample_format()
        );

        let (tx, rx) = crossbeam_channel::bounded(config.channel_capacity);
        let (err_tx, err_rx) = crossbeam_channel::bounded(1);
        let dropped = Arc::new(AtomicUsize::new(0));

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream(
                &device,
                &stream_config,
                |s: f32| s,
                tx,
                err_tx,
                Arc::clone(&dropped),
            )?,
            cpal::SampleFormat::I16 => build_stream(
                &device,
                &stream_config,
                |s: i16| s as f32 / 32768.0,
                tx,
                err_tx,
                Arc::clone(&dropped),
            )?,
            cpal::SampleFormat::U16 => build_stream(
                &device,
                &stream_config,
                |s: u16| (s as f32 - 32768.0) / 32768.0,
                tx,
                err_tx,
                Arc::clone(&dropped),
            )?,
            other => {
                return Err(VisError::source_read(format!(
                    "unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| VisError::source_read(format!("Failed to start capture: {}", e)))?;

        let source = CaptureSource {
            samples: rx,
            errors: err_rx,
            sample_rate,
        };
        Ok((
            Self {
                stream,
                name,
                dropped,
            },
            source,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Batches thrown away because the consumer fell behind
    pub fn dropped_batches(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn stop(self) {
        if let Err(e) = self.stream.pause() {
            warn!("Failed to pause capture: {}", e);
        }
        let dropped = self.dropped_batches();
        if dropped > 0 {
            warn!("Capture dropped {} sample batches", dropped);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    convert: fn(T) -> f32,
    samples: Sender<Vec<f32>>,
    errors: Sender<String>,
    dropped: Arc<AtomicUsize>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + 'static,
{
    let channels = config.channels as usize;
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono = downmix_map(data, channels, convert);
                // Never block the audio callback
                if let Err(TrySendError::Full(_)) = samples.try_send(mono) {
                    dropped.fetch_add(1, Ordering::Relaxed);
                }
            },
            move |err| report_stream_error(err, &errors),
            None,
        )
        .map_err(|e| VisError::source_read(format!("Failed to build input stream: {}", e)))
}

/// Only a vanished device ends the capture; overruns and other backend
/// hiccups are logged and capture carries on
fn report_stream_error(err: cpal::StreamError, errors: &Sender<String>) {
    match err {
        cpal::StreamError::DeviceNotAvailable => {
            error!("Capture stream error: {}", err);
            let _ = errors.try_send(err.to_string());
        }
        other => warn!("Capture stream hiccup: {}", other),
    }
}

/// Worker-side end of a capture device
#[derive(Debug)]
pub struct CaptureSource {
    samples: Receiver<Vec<f32>>,
    errors: Receiver<String>,
    sample_rate: u32,
}

impl SampleSource for CaptureSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl LiveSource for CaptureSource {
    fn pull(&mut self, max_wait: Duration) -> Result<Option<Vec<f32>>> {
        if let Ok(reason) = self.errors.try_recv() {
            return Err(VisError::SourceRead(reason));
        }
        match self.samples.recv_timeout(max_wait) {
            Ok(mut batch) => {
                // Take whatever else is already waiting
                for more in self.samples.try_iter() {
                    batch.extend_from_slice(&more);
                }
                Ok(Some(batch))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(VisError::source_read("capture stream closed"))
            }
        }
    }
}

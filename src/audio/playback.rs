//! Play a buffered file on the default output device, in step with the
//! visualization.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error, info, warn};

use super::source::{BufferedAudio, SampleSource};
use crate::error::{Result, VisError};

/// Output stream playing one `BufferedAudio`; silence once it runs out
pub struct Playback {
    stream: cpal::Stream,
    finished: Arc<AtomicBool>,
}

impl Playback {
    /// Start playing immediately
    pub fn start(audio: &BufferedAudio) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| VisError::Playback("No audio output device found".to_string()))?;

        let default_config = device
            .default_output_config()
            .map_err(|e| VisError::Playback(format!("Failed to get audio config: {}", e)))?;

        // Device channel layout, file sample rate
        let config = cpal::StreamConfig {
            channels: default_config.channels(),
            sample_rate: cpal::SampleRate(audio.sample_rate()),
            buffer_size: cpal::BufferSize::Default,
        };
        let channels = (config.channels as usize).max(1);

        info!(
            "Playback: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            channels
        );

        let samples = audio.shared_samples();
        let finished = Arc::new(AtomicBool::new(false));
        let finished_cb = Arc::clone(&finished);
        let mut position = 0usize;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let sample = samples.get(position).copied().unwrap_or(0.0);
                        frame.fill(sample);
                        position += 1;
                    }
                    if position >= samples.len() && !finished_cb.swap(true, Ordering::Relaxed) {
                        debug!("Playback reached end of file");
                    }
                },
                |err| error!("Playback stream error: {}", err),
                None,
            )
            .map_err(|e| VisError::Playback(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| VisError::Playback(format!("Failed to start playback: {}", e)))?;

        Ok(Self { stream, finished })
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    pub fn stop(self) {
        if let Err(e) = self.stream.pause() {
            warn!("Failed to pause playback: {}", e);
        }
    }
}

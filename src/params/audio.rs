//! Audio analysis and capture configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisError};

/// Magnitude normalization applied to every spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Divide by the block's peak magnitude
    Linear,

    /// `ln(|X| + 1) / ln(N / 2)`, clipped to [0, 1]
    #[default]
    Log,
}

/// Window applied to the sample block before the FFT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// No windowing (plain DFT of the block)
    #[default]
    Rectangular,

    /// Hann window, less spectral leakage
    Hann,
}

/// Spectrum analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Audio advanced per visual frame (seconds)
    /// 0.04 = 25 frames per second
    pub chunk_duration_s: f64,

    /// Spectrum normalization policy
    pub normalization: Normalization,

    /// FFT input window
    pub window: WindowFunction,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_duration_s: 1.0 / 25.0,
            normalization: Normalization::Log,
            window: WindowFunction::Rectangular,
        }
    }
}

impl AnalysisConfig {
    /// Build from a target frame rate
    pub fn with_fps(fps: f64) -> Self {
        Self {
            chunk_duration_s: 1.0 / fps,
            ..Self::default()
        }
    }

    /// Visual frame rate implied by the chunk duration
    pub fn fps(&self) -> f64 {
        1.0 / self.chunk_duration_s
    }

    pub fn validate(&self) -> Result<()> {
        if !self.chunk_duration_s.is_finite() || self.chunk_duration_s <= 0.0 {
            return Err(VisError::config(format!(
                "chunk duration must be a positive number of seconds, got {}",
                self.chunk_duration_s
            )));
        }
        Ok(())
    }
}

/// Live capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Input device name (None = host default)
    pub device: Option<String>,

    /// Number of callback buffers held between the device and the scheduler
    /// before new ones are dropped
    pub channel_capacity: usize,

    /// Longest single wait for new samples (milliseconds)
    pub pull_wait_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            channel_capacity: 64,
            pull_wait_ms: 20,
        }
    }
}

impl CaptureConfig {
    pub fn pull_wait(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.pull_wait_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(VisError::config("capture channel capacity must be > 0"));
        }
        if self.pull_wait_ms == 0 {
            return Err(VisError::config("capture pull wait must be > 0 ms"));
        }
        Ok(())
    }
}

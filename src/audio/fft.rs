//! FFT spectrum analysis.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, VisError};
use crate::params::{Normalization, WindowFunction};

/// Smallest block the log normalization can handle (`ln(N/2)` must be > 0)
pub const MIN_BLOCK_SIZE: usize = 4;

/// Largest FFT block accepted (about 24 s of audio at 44.1 kHz)
pub const MAX_BLOCK_SIZE: usize = 1 << 20;

/// Normalized magnitude spectrum, one value in [0, 1] per bin.
///
/// Bin `i` covers frequency `i * sample_rate / block_size`; a block of `N`
/// samples yields `N / 2` bins (the Nyquist bin is dropped).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    magnitudes: Vec<f32>,
}

impl Spectrum {
    /// Wrap raw values, clamping each into [0, 1]
    pub fn from_magnitudes(mut magnitudes: Vec<f32>) -> Self {
        for m in &mut magnitudes {
            *m = if m.is_nan() { 0.0 } else { m.clamp(0.0, 1.0) };
        }
        Self { magnitudes }
    }

    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Index of the loudest bin (first one on ties)
    pub fn peak_bin(&self) -> Option<usize> {
        self.magnitudes
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, &m)| match best {
                Some((_, top)) if top >= m => best,
                _ => Some((i, m)),
            })
            .map(|(i, _)| i)
    }
}

/// Computes normalized magnitude spectra of fixed-size sample blocks
#[derive(Clone)]
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    block_size: usize,
    normalization: Normalization,
    window: Option<Arc<[f32]>>,
}

impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("block_size", &self.block_size)
            .field("normalization", &self.normalization)
            .field("windowed", &self.window.is_some())
            .finish()
    }
}

impl SpectrumAnalyzer {
    /// Plan an analyzer for blocks of `block_size` samples (power of two, >= 4)
    pub fn new(
        block_size: usize,
        normalization: Normalization,
        window: WindowFunction,
    ) -> Result<Self> {
        if !block_size.is_power_of_two() || !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size)
        {
            return Err(VisError::config(format!(
                "FFT block size must be a power of 2 in {}..={}, got {}",
                MIN_BLOCK_SIZE, MAX_BLOCK_SIZE, block_size
            )));
        }

        let fft = FftPlanner::new().plan_fft_forward(block_size);
        let window = match window {
            WindowFunction::Rectangular => None,
            WindowFunction::Hann => Some(
                (0..block_size)
                    .map(|i| hann_window(i, block_size))
                    .collect::<Arc<[f32]>>(),
            ),
        };

        Ok(Self {
            fft,
            block_size,
            normalization,
            window,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of bins in every produced spectrum
    pub fn bins(&self) -> usize {
        self.block_size / 2
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Analyze one block; its length must equal the block size
    pub fn analyze(&self, block: &[f32]) -> Result<Spectrum> {
        if block.len() != self.block_size {
            return Err(VisError::config(format!(
                "sample block has {} samples, analyzer expects {}",
                block.len(),
                self.block_size
            )));
        }

        let mut buffer: Vec<Complex<f32>> = match &self.window {
            Some(window) => block
                .iter()
                .zip(window.iter())
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect(),
            None => block.iter().map(|&s| Complex::new(s, 0.0)).collect(),
        };
        self.fft.process(&mut buffer);

        let magnitudes: Vec<f32> = buffer[..self.bins()].iter().map(|c| c.norm()).collect();
        Ok(Spectrum::from_magnitudes(normalize(
            magnitudes,
            self.normalization,
            self.block_size,
        )))
    }
}

/// Apply a normalization policy to raw magnitudes of an `block_size` FFT
pub fn normalize(mut magnitudes: Vec<f32>, policy: Normalization, block_size: usize) -> Vec<f32> {
    match policy {
        Normalization::Linear => {
            let peak = magnitudes.iter().fold(0.0f32, |a, &m| a.max(m));
            let scale = if peak > 0.0 { peak } else { 1.0 };
            for m in &mut magnitudes {
                *m = (*m / scale).clamp(0.0, 1.0);
            }
        }
        Normalization::Log => {
            let denominator = ((block_size / 2) as f32).ln();
            for m in &mut magnitudes {
                *m = (m.ln_1p() / denominator).clamp(0.0, 1.0);
            }
        }
    }
    magnitudes
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Centre frequency (Hz) of an FFT bin
pub fn bin_frequency(bin: usize, block_size: usize, sample_rate: u32) -> f64 {
    bin as f64 * sample_rate as f64 / block_size as f64
}

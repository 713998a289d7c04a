//! Audio input and spectrum analysis.
//!
//! Samples come from a decoded file or a live capture device, get sliced
//! into overlapping FFT windows, and leave as normalized spectra.

mod capture;
mod chunk;
mod fft;
mod playback;
mod producer;
mod source;
pub mod wavegen;

// Re-export public types
pub use capture::{CaptureDevice, CaptureSource};
pub use chunk::{block_size_for, chunk_size_for, Chunk, ChunkPlan, FileChunks, LiveChunks};
pub use fft::{
    bin_frequency, hann_window, normalize, Spectrum, SpectrumAnalyzer, MAX_BLOCK_SIZE,
    MIN_BLOCK_SIZE,
};
pub use playback::Playback;
pub use producer::SpectrumProducer;
pub use source::{downmix, BufferedAudio, FiniteSource, LiveSource, SampleSource};

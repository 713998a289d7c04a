//! Spectrovis library - real-time audio spectrum visualization
//!
//! Audio is sliced into chunks, analyzed with an FFT, rendered into images
//! on a worker thread, and presented in sync with playback.

pub mod audio;
pub mod cli;
pub mod display;
pub mod error;
pub mod frame;
pub mod graphics;
pub mod params;
pub mod pipeline;

pub use error::{Result, VisError};

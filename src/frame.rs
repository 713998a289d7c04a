//! Timestamped pipeline payloads.

use image::RgbImage;

use crate::audio::Spectrum;

/// A payload tagged with its offset (seconds) from the playback start
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<P> {
    pub timestamp: f64,
    pub payload: P,
}

impl<P> Frame<P> {
    pub fn new(timestamp: f64, payload: P) -> Self {
        Self { timestamp, payload }
    }
}

/// Output of the spectrum producer
pub type SpectrumFrame = Frame<Spectrum>;

/// Output of the renderer, carried through the frame queue
pub type ImageFrame = Frame<RgbImage>;

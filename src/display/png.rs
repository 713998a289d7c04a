//! Headless sink writing every presented frame as a PNG.

use std::fs;

use log::{debug, info};

use super::DisplaySink;
use crate::error::{Result, VisError};
use crate::frame::ImageFrame;
use crate::params::RecordingConfig;

/// Writes `frame_00000.png`, `frame_00001.png`, ... in presentation order
#[derive(Debug)]
pub struct PngRecorder {
    config: RecordingConfig,
    written: usize,
}

impl PngRecorder {
    /// Create the output directory if needed
    pub fn new(config: RecordingConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir)?;
        info!("Recording frames to {:?}", config.output_dir);
        Ok(Self { config, written: 0 })
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl DisplaySink for PngRecorder {
    fn present(&mut self, frame: ImageFrame) -> Result<()> {
        let path = self.config.frame_path(self.written);
        frame
            .payload
            .save(&path)
            .map_err(|e| VisError::Display(format!("failed to save {:?}: {}", path, e)))?;
        debug!("Saved {:?} (t={:.3}s)", path, frame.timestamp);
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames");
        let mut recorder = PngRecorder::new(RecordingConfig::new(&out)).unwrap();

        let mut image = RgbImage::new(4, 3);
        image.put_pixel(1, 2, Rgb([0x5F, 0x00, 0xFF]));
        recorder.present(ImageFrame::new(0.0, image.clone())).unwrap();
        recorder.present(ImageFrame::new(0.04, image)).unwrap();

        assert_eq!(recorder.written(), 2);
        let first = image::open(out.join("frame_00000.png")).unwrap().to_rgb8();
        assert_eq!(first.dimensions(), (4, 3));
        assert_eq!(*first.get_pixel(1, 2), Rgb([0x5F, 0x00, 0xFF]));
        assert!(out.join("frame_00001.png").exists());
    }
}

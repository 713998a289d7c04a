//! Spectrum frame to raster image.

use std::f64::consts::PI;

use image::{Rgb, RgbImage};

use super::color::Palette;
use crate::error::Result;
use crate::frame::{ImageFrame, SpectrumFrame};
use crate::params::{Layout, RenderConfig};

/// Plots spectra onto fixed-size RGB images
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    width: u32,
    height: u32,
    layout: Layout,
    palette: Palette,
}

impl FrameRenderer {
    /// Create a renderer from validated render settings
    pub fn new(config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            width: config.width,
            height: config.height,
            layout: config.layout,
            palette: config.palette()?,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render one frame, keeping its timestamp
    pub fn render_frame(&self, frame: &SpectrumFrame) -> ImageFrame {
        ImageFrame::new(frame.timestamp, self.render(frame.timestamp, frame.payload.magnitudes()))
    }

    /// Plot `spectrum` at `timestamp` on a fresh black image
    pub fn render(&self, timestamp: f64, spectrum: &[f32]) -> RgbImage {
        let mut image = RgbImage::new(self.width, self.height);
        if spectrum.is_empty() {
            return image;
        }
        match self.layout {
            Layout::Linear => self.plot_linear(&mut image, timestamp, spectrum),
            Layout::Polar => self.plot_polar(&mut image, timestamp, spectrum),
        }
        image
    }

    fn plot_linear(&self, image: &mut RgbImage, timestamp: f64, spectrum: &[f32]) {
        let len = spectrum.len() as f64;
        for (i, &magnitude) in spectrum.iter().enumerate() {
            let x = (i as f64 * self.width as f64 / len).floor() as u32;
            let level = (magnitude as f64 * (self.height - 1) as f64).floor() as u32;
            let color = self.palette.color_at(timestamp + i as f64 / len);
            self.put_up(image, x as f64, level as f64, color);
        }
    }

    fn plot_polar(&self, image: &mut RgbImage, timestamp: f64, spectrum: &[f32]) {
        let len = spectrum.len() as f64;
        let (width, height) = (self.width as f64, self.height as f64);
        for (i, &magnitude) in spectrum.iter().enumerate() {
            let radius = magnitude as f64 * height / 2.0;
            let angle = PI * (2.0 * i as f64 / len - 0.5);
            let x = radius * angle.cos() + width / 2.0;
            let y = radius * angle.sin() + height / 2.0;
            let color = self.palette.color_at(timestamp + i as f64 / len);
            self.put_up(image, x, y, color);
            self.put_up(image, width - x, height - y, color);
        }
    }

    /// Set a pixel in y-up coordinates; points outside the raster are dropped
    fn put_up(&self, image: &mut RgbImage, x: f64, y: f64, color: Rgb<u8>) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (col, level) = (x.floor() as u32, y.floor() as u32);
        if col >= self.width || level >= self.height {
            return;
        }
        image.put_pixel(col, self.height - 1 - level, color);
    }
}

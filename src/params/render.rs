//! Rendering and recording configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisError};
use crate::graphics::color::{parse_hex_color, Palette};

/// How spectrum samples are placed on the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Frequency left to right, magnitude bottom to top
    #[default]
    Linear,

    /// Frequency as angle, magnitude as radius, mirrored through the centre
    Polar,
}

/// How plotted points are coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// Single solid colour (`fixed_color`)
    Fixed,

    /// Hue oscillating with time and frequency index
    #[default]
    TimeVarying,
}

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,

    pub layout: Layout,

    pub color_mode: ColorMode,

    /// Colour used in fixed mode (`#RRGGBB`)
    pub fixed_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 800,
            layout: Layout::Linear,
            color_mode: ColorMode::TimeVarying,
            fixed_color: "#5F00FF".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Resolve the colour settings into a palette
    pub fn palette(&self) -> Result<Palette> {
        match self.color_mode {
            ColorMode::Fixed => Ok(Palette::Fixed(parse_hex_color(&self.fixed_color)?)),
            ColorMode::TimeVarying => Ok(Palette::TimeVarying),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VisError::config(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        self.palette().map(|_| ())
    }
}

/// Headless recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Output directory for frames
    pub output_dir: PathBuf,
}

impl RecordingConfig {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the `index`-th frame
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{:05}.png", index))
    }
}

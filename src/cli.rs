//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::error::Result;
use crate::params::{ColorMode, Layout, Normalization, RecordingConfig, VisConfig, WindowFunction};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "spectrovis")]
#[command(about = "Real-time audio spectrum visualizer", long_about = None)]
pub struct Args {
    /// WAV file to visualize (default: live capture from the input device)
    #[arg(short, long, value_name = "WAV")]
    pub input: Option<PathBuf>,

    /// Write frames as PNG files into this directory instead of opening a window
    #[arg(long, value_name = "DIR")]
    pub headless: Option<PathBuf>,

    /// TOML configuration file; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Image width (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Image height (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Visual frames per second
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f64>,

    #[arg(long, value_enum)]
    pub layout: Option<Layout>,

    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// Colour for `--color fixed` (#RRGGBB)
    #[arg(long, value_name = "HEX")]
    pub fixed_color: Option<String>,

    #[arg(long, value_enum)]
    pub normalization: Option<Normalization>,

    /// FFT input window
    #[arg(long, value_enum)]
    pub window: Option<WindowFunction>,

    /// Frames buffered between analysis and display
    #[arg(long, value_name = "FRAMES")]
    pub queue_capacity: Option<usize>,

    /// Input device name for live capture
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Do not play the input file while visualizing it
    #[arg(long)]
    pub mute: bool,

    /// Log per-frame events
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Config file (or defaults) with command-line overrides applied
    pub fn load_config(&self) -> Result<VisConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Config: {:?}", path);
                VisConfig::load(path)?
            }
            None => VisConfig::default(),
        };
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite config values with the flags that were given
    pub fn apply_to(&self, config: &mut VisConfig) {
        if let Some(width) = self.width {
            config.render.width = width;
        }
        if let Some(height) = self.height {
            config.render.height = height;
        }
        if let Some(fps) = self.fps {
            config.analysis.chunk_duration_s = 1.0 / fps;
        }
        if let Some(layout) = self.layout {
            config.render.layout = layout;
        }
        if let Some(color) = self.color {
            config.render.color_mode = color;
        }
        if let Some(code) = &self.fixed_color {
            config.render.fixed_color = code.clone();
        }
        if let Some(normalization) = self.normalization {
            config.analysis.normalization = normalization;
        }
        if let Some(window) = self.window {
            config.analysis.window = window;
        }
        if let Some(capacity) = self.queue_capacity {
            config.pipeline.queue_capacity = capacity;
        }
        if let Some(device) = &self.device {
            config.capture.device = Some(device.clone());
        }
    }

    pub fn recording_config(&self) -> Option<RecordingConfig> {
        self.headless.as_ref().map(RecordingConfig::new)
    }

    /// Default log filter for the binary
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

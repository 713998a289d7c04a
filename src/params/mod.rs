//! Parameter definitions with units and documented semantics.
//!
//! Every tunable of the pipeline lives here:
//! - Units are spelled out in field names (seconds, milliseconds, pixels)
//! - Each group has a `Default` and a `validate()` method
//! - `VisConfig` bundles the groups and can be loaded from a TOML file

mod audio;
mod pipeline;
mod render;

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VisError};

// Re-export all types
pub use audio::{AnalysisConfig, CaptureConfig, Normalization, WindowFunction};
pub use pipeline::PipelineConfig;
pub use render::{ColorMode, Layout, RecordingConfig, RenderConfig};

/// Complete configuration of one visualization run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisConfig {
    pub analysis: AnalysisConfig,
    pub render: RenderConfig,
    pub pipeline: PipelineConfig,
    pub capture: CaptureConfig,
}

impl VisConfig {
    /// Load from a TOML file; missing sections and keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| VisError::config(format!("failed to parse config file: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| VisError::config(format!("failed to serialize config: {}", e)))
    }

    /// Pacer idle interval derived from the pipeline and analysis settings
    pub fn idle_interval(&self) -> std::time::Duration {
        self.pipeline.idle_interval(self.analysis.chunk_duration_s)
    }

    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.render.validate()?;
        self.pipeline.validate()?;
        self.capture.validate()
    }
}

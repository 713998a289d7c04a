//! Spectrum rendering: colour mapping and frame rasterization.

pub mod color;
mod renderer;

pub use color::{value_to_rgb, Palette};
pub use renderer::FrameRenderer;

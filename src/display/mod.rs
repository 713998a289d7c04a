//! Display sinks: where paced frames end up.
//!
//! - `window`: wgpu surface in a winit window
//! - `png`: numbered PNG files for headless runs

mod png;
mod window;

use std::thread;
use std::time::Instant;

use crate::error::Result;
use crate::frame::ImageFrame;
use crate::pipeline::{DisplayPacer, PacerStep};

pub use png::PngRecorder;
pub use window::WindowDisplay;

/// Consumer of rendered frames
pub trait DisplaySink {
    /// Show one frame. Errors end the display loop.
    fn present(&mut self, frame: ImageFrame) -> Result<()>;
}

/// Drive `pacer` without an event loop, sleeping between ticks.
///
/// Returns the number of frames presented once the producer is done.
pub fn run_headless(pacer: &mut DisplayPacer, sink: &mut dyn DisplaySink) -> Result<usize> {
    loop {
        let now = Instant::now();
        match pacer.tick(now, sink)? {
            PacerStep::Scheduled(at) => {
                let wait = at.saturating_duration_since(now);
                if !wait.is_zero() {
                    thread::sleep(wait);
                }
            }
            PacerStep::Finished => return Ok(pacer.presented()),
        }
    }
}

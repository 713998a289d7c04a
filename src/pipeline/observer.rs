//! Pipeline diagnostics hooks.

use log::{debug, error, info};

use super::worker::WorkerState;

/// Receives lifecycle and per-frame events from the pipeline.
///
/// Called from both the worker thread and the display thread.
pub trait PipelineObserver: Send + Sync {
    fn worker_state(&self, _state: &WorkerState) {}

    fn frame_produced(&self, _index: usize, _timestamp: f64) {}

    /// `lateness_s` is how far past its deadline the frame was shown
    fn frame_presented(&self, _timestamp: f64, _lateness_s: f64) {}

    /// The pacer found the queue empty while the worker was still running
    fn frame_skipped(&self) {}
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn worker_state(&self, state: &WorkerState) {
        match state {
            WorkerState::Failed(reason) => error!("Visualizer failed: {}", reason),
            other => info!("Visualizer {:?}", other),
        }
    }

    fn frame_produced(&self, index: usize, timestamp: f64) {
        debug!("Frame {} rendered (t={:.3}s)", index, timestamp);
    }

    fn frame_presented(&self, timestamp: f64, lateness_s: f64) {
        debug!("Frame t={:.3}s shown {:.1}ms late", timestamp, lateness_s * 1000.0);
    }

    fn frame_skipped(&self) {
        debug!("No frame ready, skipping");
    }
}

/// Ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PipelineObserver for NullObserver {}

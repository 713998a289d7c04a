//! Producer/consumer pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisError};

/// Queue and pacing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames buffered between the worker and the display
    pub queue_capacity: usize,

    /// Pacer retry delay when the queue is empty (milliseconds)
    /// None = one chunk duration
    pub idle_interval_ms: Option<u64>,

    /// Live timestamps are pushed this many chunk durations into the future
    /// to cover pipeline and device latency
    pub live_lookahead_chunks: f64,

    /// How often a worker blocked on a full queue re-checks for a stop
    /// request (milliseconds)
    pub push_poll_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            idle_interval_ms: None,
            live_lookahead_chunks: 1.5,
            push_poll_ms: 50,
        }
    }
}

impl PipelineConfig {
    /// Pacer idle interval for a given chunk duration
    pub fn idle_interval(&self, chunk_duration_s: f64) -> Duration {
        match self.idle_interval_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs_f64(chunk_duration_s),
        }
    }

    pub fn push_poll(&self) -> Duration {
        Duration::from_millis(self.push_poll_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(VisError::config("queue capacity must be > 0"));
        }
        if self.idle_interval_ms == Some(0) {
            return Err(VisError::config("idle interval must be > 0 ms"));
        }
        if self.push_poll_ms == 0 {
            return Err(VisError::config("push poll interval must be > 0 ms"));
        }
        if !self.live_lookahead_chunks.is_finite() || self.live_lookahead_chunks < 0.0 {
            return Err(VisError::config(format!(
                "live lookahead must be a non-negative number of chunks, got {}",
                self.live_lookahead_chunks
            )));
        }
        Ok(())
    }
}

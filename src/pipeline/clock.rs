//! Playback clock: the shared time origin of every frame.

use std::time::{Duration, Instant};

/// Anchor that frame timestamps are measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    start: Instant,
}

impl PlaybackClock {
    pub fn start_now() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self { start }
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// Instant at which a frame stamped `timestamp_s` is due.
    /// Negative or non-finite stamps are due immediately.
    pub fn deadline(&self, timestamp_s: f64) -> Instant {
        if timestamp_s.is_finite() && timestamp_s > 0.0 {
            self.start + Duration::from_secs_f64(timestamp_s)
        } else {
            self.start
        }
    }

    /// Seconds since the start; zero before it
    pub fn elapsed_s(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.start).as_secs_f64()
    }
}

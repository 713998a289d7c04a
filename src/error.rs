//! Error type shared by the pipeline and its adapters.

use thiserror::Error;

/// Errors surfaced by the visualization pipeline.
#[derive(Error, Debug)]
pub enum VisError {
    /// Sample source unavailable, unreadable, or exhausted unexpectedly
    #[error("Source read error: {0}")]
    SourceRead(String),

    /// Parameters that cannot produce a meaningful pipeline
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The other end of the frame queue went away while still expected
    #[error("Frame queue closed")]
    QueueClosed,

    /// The worker thread died without reporting an outcome
    #[error("Visualizer worker panicked")]
    WorkerPanicked,

    #[error("Display error: {0}")]
    Display(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn source_read(message: impl Into<String>) -> Self {
        Self::SourceRead(message.into())
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = VisError> = std::result::Result<T, E>;

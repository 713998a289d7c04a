//! Producer/consumer pipeline.
//!
//! - `worker`: background thread rendering spectra into images
//! - `queue`: bounded hand-off between the worker and the display
//! - `pacer`: presents queued frames on time from the host event loop
//! - `clock`: shared time origin for frame timestamps
//! - `observer`: diagnostics hooks

mod clock;
mod observer;
mod pacer;
mod queue;
mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use crate::error::Result;
use crate::frame::SpectrumFrame;
use crate::graphics::FrameRenderer;
use crate::params::VisConfig;

pub use clock::PlaybackClock;
pub use observer::{LogObserver, NullObserver, PipelineObserver};
pub use pacer::{DisplayPacer, PacerStep};
pub use queue::{bounded_queue, Pop, Push, QueueReceiver, QueueSender};
pub use worker::{VisualizerWorker, WorkerState};

/// Cooperative cancellation flag shared across threads
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A running worker plus the means to stop it
#[derive(Debug)]
pub struct Pipeline {
    worker: VisualizerWorker,
    stop: StopFlag,
}

impl Pipeline {
    /// Spawn the worker over `frames` and build the pacer that consumes it.
    ///
    /// `stop` must be the flag the frame source watches (live sources), so
    /// that [`Pipeline::shutdown`] reaches it.
    pub fn start<I>(
        frames: I,
        renderer: FrameRenderer,
        config: &VisConfig,
        clock: PlaybackClock,
        stop: StopFlag,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<(Self, DisplayPacer)>
    where
        I: Iterator<Item = Result<SpectrumFrame>> + Send + 'static,
    {
        config.validate()?;
        let (tx, rx) = bounded_queue(config.pipeline.queue_capacity)?;
        let worker = VisualizerWorker::spawn(
            frames,
            renderer,
            tx,
            stop.clone(),
            config.pipeline.push_poll(),
            Arc::clone(&observer),
        )?;
        let pacer = DisplayPacer::new(rx, clock, config.idle_interval(), observer);

        info!(
            "Pipeline started (queue {}, {:.1} fps)",
            config.pipeline.queue_capacity,
            config.analysis.fps()
        );
        Ok((Self { worker, stop }, pacer))
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Stop the worker and wait for it; returns frames produced or the
    /// error that ended it
    pub fn shutdown(self) -> Result<usize> {
        self.stop.request();
        self.worker.join()
    }

    /// Wait for the worker to run out of frames without requesting a stop
    pub fn join(self) -> Result<usize> {
        self.worker.join()
    }
}

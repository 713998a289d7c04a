//! Visualizer worker thread: spectra in, rendered images out.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info};

use super::observer::PipelineObserver;
use super::queue::{Push, QueueSender};
use super::StopFlag;
use crate::error::{Result, VisError};
use crate::frame::{ImageFrame, SpectrumFrame};
use crate::graphics::FrameRenderer;

/// Worker lifecycle.
///
/// `Idle -> Running -> (Finished | Cancelled | Failed)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    /// Producer exhausted, every frame handed to the queue
    Finished,
    /// Stop requested before the producer ran out
    Cancelled,
    Failed(String),
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerState::Finished | WorkerState::Cancelled | WorkerState::Failed(_)
        )
    }
}

/// How the render loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outcome {
    frames: usize,
    cancelled: bool,
}

/// Handle to the thread running the render loop
#[derive(Debug)]
pub struct VisualizerWorker {
    handle: Option<JoinHandle<Result<usize>>>,
    state: Arc<Mutex<WorkerState>>,
}

impl VisualizerWorker {
    /// Spawn the render loop.
    ///
    /// `queue` is owned by the thread and dropped once the final state is
    /// recorded, which is how the consumer learns that no more frames will
    /// come.
    pub fn spawn<I>(
        frames: I,
        renderer: FrameRenderer,
        queue: QueueSender<ImageFrame>,
        stop: StopFlag,
        push_poll: Duration,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<Self>
    where
        I: Iterator<Item = Result<SpectrumFrame>> + Send + 'static,
    {
        let state = Arc::new(Mutex::new(WorkerState::Idle));
        let thread_state = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name("visualizer".to_string())
            .spawn(move || {
                set_state(&thread_state, WorkerState::Running, observer.as_ref());
                let result = render_loop(
                    frames,
                    &renderer,
                    &queue,
                    &stop,
                    push_poll,
                    observer.as_ref(),
                );

                let final_state = match &result {
                    Ok(Outcome { cancelled: true, .. }) => WorkerState::Cancelled,
                    Ok(_) => WorkerState::Finished,
                    Err(e) => WorkerState::Failed(e.to_string()),
                };
                set_state(&thread_state, final_state, observer.as_ref());
                drop(queue);
                result.map(|outcome| outcome.frames)
            })?;

        Ok(Self {
            handle: Some(handle),
            state,
        })
    }

    pub fn state(&self) -> WorkerState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait for the thread and return the number of frames pushed
    pub fn join(mut self) -> Result<usize> {
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        match handle.join() {
            Ok(result) => result,
            Err(_) => {
                *self.state.lock().unwrap_or_else(PoisonError::into_inner) =
                    WorkerState::Failed("worker thread panicked".to_string());
                Err(VisError::WorkerPanicked)
            }
        }
    }
}

fn set_state(cell: &Mutex<WorkerState>, state: WorkerState, observer: &dyn PipelineObserver) {
    observer.worker_state(&state);
    *cell.lock().unwrap_or_else(PoisonError::into_inner) = state;
}

fn render_loop<I>(
    frames: I,
    renderer: &FrameRenderer,
    queue: &QueueSender<ImageFrame>,
    stop: &StopFlag,
    push_poll: Duration,
    observer: &dyn PipelineObserver,
) -> Result<Outcome>
where
    I: Iterator<Item = Result<SpectrumFrame>>,
{
    let mut pushed = 0;
    for frame in frames {
        if stop.is_requested() {
            debug!("Stop requested after {} frames", pushed);
            return Ok(Outcome {
                frames: pushed,
                cancelled: true,
            });
        }

        let image = renderer.render_frame(&frame?);
        let timestamp = image.timestamp;
        match queue.push_until(image, stop, push_poll)? {
            Push::Sent => {
                observer.frame_produced(pushed, timestamp);
                pushed += 1;
            }
            Push::Stopped => {
                return Ok(Outcome {
                    frames: pushed,
                    cancelled: true,
                })
            }
        }
    }

    // Live sources end their sequence when they see the stop request
    let cancelled = stop.is_requested();
    info!("Visualizer produced {} frames", pushed);
    Ok(Outcome {
        frames: pushed,
        cancelled,
    })
}

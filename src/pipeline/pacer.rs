//! Display pacing: present each frame when its timestamp comes due.
//!
//! The pacer never blocks. The host loop calls [`DisplayPacer::tick`] and
//! gets back the instant it should call again, which fits both a winit
//! `ControlFlow::WaitUntil` loop and a plain sleeping loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;

use super::clock::PlaybackClock;
use super::observer::PipelineObserver;
use super::queue::{Pop, QueueReceiver};
use crate::display::DisplaySink;
use crate::error::Result;
use crate::frame::ImageFrame;

/// What the host loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerStep {
    /// Tick again at this instant
    Scheduled(Instant),
    /// Producer gone and queue drained
    Finished,
}

/// Consumer side of the pipeline
pub struct DisplayPacer {
    queue: QueueReceiver<ImageFrame>,
    clock: PlaybackClock,
    idle_interval: Duration,
    observer: Arc<dyn PipelineObserver>,
    pending: Option<ImageFrame>,
    finished: bool,
    presented: usize,
    skipped: usize,
}

impl DisplayPacer {
    pub fn new(
        queue: QueueReceiver<ImageFrame>,
        clock: PlaybackClock,
        idle_interval: Duration,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            queue,
            clock,
            idle_interval,
            observer,
            pending: None,
            finished: false,
            presented: 0,
            skipped: 0,
        }
    }

    /// Present at most one due frame and pick up the next one.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn DisplaySink) -> Result<PacerStep> {
        if self.finished {
            return Ok(PacerStep::Finished);
        }

        if let Some(frame) = self.pending.take() {
            let deadline = self.clock.deadline(frame.timestamp);
            if now < deadline {
                self.pending = Some(frame);
                return Ok(PacerStep::Scheduled(deadline));
            }
            let lateness = now.duration_since(deadline).as_secs_f64();
            let timestamp = frame.timestamp;
            sink.present(frame)?;
            self.presented += 1;
            self.observer.frame_presented(timestamp, lateness);
        }

        match self.queue.try_pop() {
            Pop::Item(frame) => {
                let deadline = self.clock.deadline(frame.timestamp);
                self.pending = Some(frame);
                Ok(PacerStep::Scheduled(deadline.max(now)))
            }
            Pop::Empty => {
                self.skipped += 1;
                self.observer.frame_skipped();
                Ok(PacerStep::Scheduled(now + self.idle_interval))
            }
            Pop::Closed => {
                info!(
                    "Display finished: {} frames shown, {} idle ticks",
                    self.presented, self.skipped
                );
                self.finished = true;
                Ok(PacerStep::Finished)
            }
        }
    }

    /// Discard queued frames and stop presenting
    pub fn stop(&mut self) {
        let dropped = self.queue.drain() + usize::from(self.pending.take().is_some());
        if dropped > 0 {
            info!("Display stopped, discarding {} frames", dropped);
        }
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn clock(&self) -> PlaybackClock {
        self.clock
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    /// Ticks that found nothing to show while the producer was running
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::observer::NullObserver;
    use crate::pipeline::queue::bounded_queue;
    use image::RgbImage;

    #[derive(Default)]
    struct Recorder {
        shown: Vec<f64>,
    }

    impl DisplaySink for Recorder {
        fn present(&mut self, frame: ImageFrame) -> Result<()> {
            self.shown.push(frame.timestamp);
            Ok(())
        }
    }

    fn frame(timestamp: f64) -> ImageFrame {
        ImageFrame::new(timestamp, RgbImage::new(1, 1))
    }

    fn pacer(
        clock: PlaybackClock,
    ) -> (crate::pipeline::QueueSender<ImageFrame>, DisplayPacer) {
        let (tx, rx) = bounded_queue(8).unwrap();
        let pacer = DisplayPacer::new(rx, clock, Duration::from_millis(40), Arc::new(NullObserver));
        (tx, pacer)
    }

    #[test]
    fn frames_wait_for_their_deadline() {
        let t0 = Instant::now();
        let clock = PlaybackClock::starting_at(t0);
        let (tx, mut pacer) = pacer(clock);
        for ts in [0.0, 0.04, 0.08] {
            tx.push(frame(ts)).unwrap();
        }
        drop(tx);

        let mut sink = Recorder::default();
        // Picks up frame 0, due immediately
        assert_eq!(pacer.tick(t0, &mut sink).unwrap(), PacerStep::Scheduled(t0));
        assert!(sink.shown.is_empty());

        // Shows frame 0, frame 1 due at +40ms
        let due1 = t0 + Duration::from_millis(40);
        assert_eq!(pacer.tick(t0, &mut sink).unwrap(), PacerStep::Scheduled(due1));
        assert_eq!(sink.shown, vec![0.0]);

        // Too early: nothing shown
        let early = t0 + Duration::from_millis(20);
        assert_eq!(pacer.tick(early, &mut sink).unwrap(), PacerStep::Scheduled(due1));
        assert_eq!(sink.shown, vec![0.0]);

        let due2 = t0 + Duration::from_millis(80);
        assert_eq!(pacer.tick(due1, &mut sink).unwrap(), PacerStep::Scheduled(due2));
        assert_eq!(pacer.tick(due2, &mut sink).unwrap(), PacerStep::Finished);
        assert_eq!(sink.shown, vec![0.0, 0.04, 0.08]);
        assert_eq!(pacer.presented(), 3);

        // Stays finished
        assert_eq!(pacer.tick(due2, &mut sink).unwrap(), PacerStep::Finished);
    }

    #[test]
    fn late_frames_are_shown_one_per_tick() {
        let t0 = Instant::now();
        let (tx, mut pacer) = pacer(PlaybackClock::starting_at(t0));
        for ts in [0.0, 0.04, 0.08] {
            tx.push(frame(ts)).unwrap();
        }

        let mut sink = Recorder::default();
        let late = t0 + Duration::from_secs(1);
        pacer.tick(late, &mut sink).unwrap();
        assert_eq!(pacer.tick(late, &mut sink).unwrap(), PacerStep::Scheduled(late));
        assert_eq!(sink.shown.len(), 1);
        pacer.tick(late, &mut sink).unwrap();
        assert_eq!(sink.shown.len(), 2);
    }

    #[test]
    fn empty_queue_with_live_producer_idles() {
        let t0 = Instant::now();
        let (_tx, mut pacer) = pacer(PlaybackClock::starting_at(t0));
        let mut sink = Recorder::default();

        let step = pacer.tick(t0, &mut sink).unwrap();
        assert_eq!(step, PacerStep::Scheduled(t0 + Duration::from_millis(40)));
        assert_eq!(pacer.skipped(), 1);
        assert!(!pacer.is_finished());
    }

    #[test]
    fn stop_discards_frames() {
        let t0 = Instant::now();
        let (tx, mut pacer) = pacer(PlaybackClock::starting_at(t0));
        tx.push(frame(0.0)).unwrap();
        tx.push(frame(0.04)).unwrap();

        let mut sink = Recorder::default();
        pacer.tick(t0, &mut sink).unwrap();
        pacer.stop();
        assert!(pacer.is_finished());
        assert_eq!(pacer.tick(t0, &mut sink).unwrap(), PacerStep::Finished);
        assert!(sink.shown.is_empty());
        assert!(tx.is_empty());
    }
}

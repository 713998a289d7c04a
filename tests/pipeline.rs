//! End-to-end runs of the analysis, render and display pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use spectrovis::audio::{BufferedAudio, LiveSource, SampleSource, SpectrumProducer};
use spectrovis::display::{run_headless, DisplaySink, PngRecorder};
use spectrovis::frame::{ImageFrame, SpectrumFrame};
use spectrovis::graphics::FrameRenderer;
use spectrovis::params::{AnalysisConfig, RecordingConfig, VisConfig};
use spectrovis::pipeline::{
    bounded_queue, LogObserver, NullObserver, PacerStep, Pipeline, PlaybackClock, Pop, StopFlag,
    WorkerState,
};
use spectrovis::{Result, VisError};

fn small_config() -> VisConfig {
    let mut config = VisConfig::default();
    config.render.width = 64;
    config.render.height = 48;
    config.pipeline.queue_capacity = 2;
    config
}

/// Records when each frame was presented
#[derive(Default)]
struct TimedSink {
    shown: Vec<(f64, Instant)>,
}

impl DisplaySink for TimedSink {
    fn present(&mut self, frame: ImageFrame) -> Result<()> {
        self.shown.push((frame.timestamp, Instant::now()));
        Ok(())
    }
}

#[test]
fn tone_produces_frames_on_schedule() {
    let audio = BufferedAudio::sine(440.0, 2.0, 44100).unwrap();
    let frames: Vec<SpectrumFrame> = SpectrumProducer::from_finite(audio, &AnalysisConfig::default())
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(frames.len(), 50);
    for (k, frame) in frames.iter().enumerate() {
        assert!((frame.timestamp - k as f64 * 0.04).abs() < 1e-9);
        assert_eq!(frame.payload.len(), 1024);
    }

    // 440 Hz with a 2048-point FFT at 44.1 kHz sits at bin 20.43
    let expected = 440.0 * 2048.0 / 44100.0;
    for frame in &frames {
        let peak = frame.payload.peak_bin().unwrap() as f64;
        assert!((peak - expected).abs() <= 1.0, "peak {} at t={}", peak, frame.timestamp);
    }
}

#[test]
fn full_queue_blocks_until_pop() {
    const CAPACITY: usize = 3;
    let (tx, rx) = bounded_queue(CAPACITY).unwrap();
    for i in 0..CAPACITY {
        tx.push(i).unwrap();
    }

    let pushed = Arc::new(AtomicBool::new(false));
    let pushed_flag = Arc::clone(&pushed);
    let producer = thread::spawn(move || {
        tx.push(CAPACITY).unwrap();
        pushed_flag.store(true, Ordering::SeqCst);
    });

    thread::sleep(Duration::from_millis(100));
    assert!(!pushed.load(Ordering::SeqCst), "push into a full queue returned");

    assert_eq!(rx.try_pop(), Pop::Item(0));
    producer.join().unwrap();
    assert!(pushed.load(Ordering::SeqCst));

    // FIFO order survives the blocked push
    for expected in 1..=CAPACITY {
        assert_eq!(rx.try_pop(), Pop::Item(expected));
    }
    assert_eq!(rx.try_pop(), Pop::Closed);
}

#[test_log::test]
fn headless_run_writes_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config();
    let audio = BufferedAudio::sine(1000.0, 0.4, 8000).unwrap();
    let frames = SpectrumProducer::from_finite(audio, &config.analysis).unwrap();
    let renderer = FrameRenderer::new(&config.render).unwrap();

    let (pipeline, mut pacer) = Pipeline::start(
        frames,
        renderer,
        &config,
        PlaybackClock::start_now(),
        StopFlag::new(),
        Arc::new(LogObserver),
    )
    .unwrap();

    let mut sink = PngRecorder::new(RecordingConfig::new(dir.path())).unwrap();
    let shown = run_headless(&mut pacer, &mut sink).unwrap();

    assert_eq!(shown, 10);
    assert_eq!(pipeline.worker_state(), WorkerState::Finished);
    assert_eq!(pipeline.shutdown().unwrap(), 10);

    for i in 0..10 {
        let path = dir.path().join(format!("frame_{:05}.png", i));
        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (64, 48));
    }
    assert!(!dir.path().join("frame_00010.png").exists());
}

#[test]
fn frames_are_never_shown_early() {
    let config = small_config();
    let audio = BufferedAudio::sine(440.0, 0.2, 8000).unwrap();
    let frames = SpectrumProducer::from_finite(audio, &config.analysis).unwrap();
    let renderer = FrameRenderer::new(&config.render).unwrap();
    let clock = PlaybackClock::start_now();

    let (pipeline, mut pacer) = Pipeline::start(
        frames,
        renderer,
        &config,
        clock,
        StopFlag::new(),
        Arc::new(NullObserver),
    )
    .unwrap();

    let mut sink = TimedSink::default();
    run_headless(&mut pacer, &mut sink).unwrap();
    pipeline.shutdown().unwrap();

    let stamps: Vec<f64> = sink.shown.iter().map(|(t, _)| *t).collect();
    assert_eq!(stamps, vec![0.0, 0.04, 0.08, 0.12, 0.16]);
    for (timestamp, at) in &sink.shown {
        assert!(*at >= clock.deadline(*timestamp), "frame {} shown early", timestamp);
    }
}

#[test]
fn deadlines_follow_a_late_clock_anchor() {
    let config = small_config();
    let audio = BufferedAudio::sine(440.0, 0.12, 8000).unwrap();
    let frames = SpectrumProducer::from_finite(audio, &config.analysis).unwrap();
    let renderer = FrameRenderer::new(&config.render).unwrap();

    // Stand-in for the time it takes to open the output device
    let setup_started = Instant::now();
    thread::sleep(Duration::from_millis(60));
    let clock = PlaybackClock::start_now();

    let (pipeline, mut pacer) = Pipeline::start(
        frames,
        renderer,
        &config,
        clock,
        StopFlag::new(),
        Arc::new(NullObserver),
    )
    .unwrap();

    let mut sink = TimedSink::default();
    run_headless(&mut pacer, &mut sink).unwrap();
    pipeline.shutdown().unwrap();

    assert_eq!(sink.shown.len(), 3);
    for (timestamp, at) in &sink.shown {
        assert!(*at >= clock.deadline(*timestamp));
        let since_setup = at.duration_since(setup_started).as_secs_f64();
        assert!(since_setup >= 0.06 + timestamp, "frame {} ignored the anchor", timestamp);
    }
}

#[test]
fn producer_failure_surfaces_from_shutdown() {
    let config = small_config();
    let spectrum = spectrovis::audio::Spectrum::from_magnitudes(vec![0.2; 16]);
    let frames = vec![
        Ok(SpectrumFrame::new(0.0, spectrum.clone())),
        Err(VisError::SourceRead("read failed".to_string())),
        Ok(SpectrumFrame::new(0.08, spectrum)),
    ];

    let (pipeline, mut pacer) = Pipeline::start(
        frames.into_iter(),
        FrameRenderer::new(&config.render).unwrap(),
        &config,
        PlaybackClock::start_now(),
        StopFlag::new(),
        Arc::new(NullObserver),
    )
    .unwrap();

    // Consumer drains what was produced, then sees the queue close
    let mut sink = TimedSink::default();
    assert_eq!(run_headless(&mut pacer, &mut sink).unwrap(), 1);
    assert!(matches!(pipeline.worker_state(), WorkerState::Failed(_)));
    assert!(matches!(pipeline.shutdown(), Err(VisError::SourceRead(_))));
}

#[test]
fn invalid_capacity_is_rejected_at_start() {
    let mut config = small_config();
    config.pipeline.queue_capacity = 0;
    let audio = BufferedAudio::sine(440.0, 0.1, 8000).unwrap();
    let frames = SpectrumProducer::from_finite(audio, &config.analysis).unwrap();

    let result = Pipeline::start(
        frames,
        FrameRenderer::new(&config.render).unwrap(),
        &config,
        PlaybackClock::start_now(),
        StopFlag::new(),
        Arc::new(NullObserver),
    );
    assert!(matches!(result, Err(VisError::InvalidConfiguration(_))));
}

/// Endless silence delivered in 10 ms batches
struct SilentDevice {
    rate: u32,
}

impl SampleSource for SilentDevice {
    fn sample_rate(&self) -> u32 {
        self.rate
    }
}

impl LiveSource for SilentDevice {
    fn pull(&mut self, max_wait: Duration) -> Result<Option<Vec<f32>>> {
        thread::sleep(max_wait.min(Duration::from_millis(10)));
        Ok(Some(vec![0.0; self.rate as usize / 100]))
    }
}

#[test_log::test]
fn shutdown_cancels_live_pipeline() {
    let config = small_config();
    let clock = PlaybackClock::start_now();
    let stop = StopFlag::new();
    let frames = SpectrumProducer::from_live(
        SilentDevice { rate: 8000 },
        &config.analysis,
        &config.pipeline,
        Duration::from_millis(10),
        clock,
        stop.clone(),
    )
    .unwrap();

    let (pipeline, mut pacer) = Pipeline::start(
        frames,
        FrameRenderer::new(&config.render).unwrap(),
        &config,
        clock,
        stop,
        Arc::new(LogObserver),
    )
    .unwrap();

    // Show live frames for a while
    let mut sink = TimedSink::default();
    let until = Instant::now() + Duration::from_millis(400);
    while Instant::now() < until {
        match pacer.tick(Instant::now(), &mut sink).unwrap() {
            PacerStep::Scheduled(at) => {
                thread::sleep(at.saturating_duration_since(Instant::now()).min(Duration::from_millis(20)))
            }
            PacerStep::Finished => panic!("live pipeline finished on its own"),
        }
    }
    assert!(!sink.shown.is_empty());
    // Live stamps carry the lookahead
    assert!(sink.shown[0].0 >= 0.06);

    pacer.stop();
    assert!(pipeline.shutdown().is_ok());
}

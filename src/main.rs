//! Spectrovis - see what your audio sounds like
//!
//! Plays a WAV file (or listens to the input device) and draws its
//! frequency spectrum in step with the sound.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use spectrovis::audio::{BufferedAudio, CaptureDevice, Playback, SpectrumProducer};
use spectrovis::cli::Args;
use spectrovis::display::{run_headless, PngRecorder, WindowDisplay};
use spectrovis::graphics::FrameRenderer;
use spectrovis::params::VisConfig;
use spectrovis::pipeline::{
    DisplayPacer, LogObserver, PacerStep, Pipeline, PipelineObserver, PlaybackClock, StopFlag,
};
use spectrovis::VisError;

/// Audio side of a run, kept alive until the display is done
enum AudioSession {
    File(Option<Playback>),
    Capture(CaptureDevice),
}

impl AudioSession {
    fn stop(self) {
        match self {
            AudioSession::File(Some(playback)) => playback.stop(),
            AudioSession::File(None) => {}
            AudioSession::Capture(device) => device.stop(),
        }
    }
}

/// Window front-end driving the pacer from the winit event loop
struct App<'a> {
    pacer: &'a mut DisplayPacer,
    image_size: (u32, u32),
    display: Option<WindowDisplay>,
    error: Option<VisError>,
}

impl<'a> App<'a> {
    fn new(pacer: &'a mut DisplayPacer, config: &VisConfig) -> Self {
        Self {
            pacer,
            image_size: (config.render.width, config.render.height),
            display: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: VisError) {
        error!("{}", e);
        self.error = Some(e);
        event_loop.exit();
    }
}

impl ApplicationHandler for App<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.display.is_some() {
            return; // Already initialized
        }

        let (width, height) = self.image_size;
        let window_attributes = Window::default_attributes()
            .with_title("Spectrovis")
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                return self.fail(event_loop, VisError::Display(format!("Failed to open window: {}", e)))
            }
        };

        match pollster::block_on(WindowDisplay::new(window, self.image_size)) {
            Ok(display) => {
                info!("Press ESC or click to quit");
                self.display = Some(display);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(display) = self.display.as_mut() {
                    display.resize(size.width, size.height);
                    display.window().request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(display) = self.display.as_mut() {
                    if let Err(e) = display.redraw() {
                        self.fail(event_loop, e);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        match self.pacer.tick(Instant::now(), display) {
            Ok(PacerStep::Scheduled(at)) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            Ok(PacerStep::Finished) => {
                info!("All frames shown");
                event_loop.exit();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }
}

fn run_window(pacer: &mut DisplayPacer, config: &VisConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(pacer, config);
    event_loop.run_app(&mut app).context("Event loop failed")?;
    match app.error {
        Some(e) => Err(e).context("Display failed"),
        None => Ok(()),
    }
}

/// Start the worker for the selected input
fn start(
    args: &Args,
    config: &VisConfig,
    stop: &StopFlag,
) -> Result<(Pipeline, DisplayPacer, AudioSession)> {
    let renderer = FrameRenderer::new(&config.render)?;
    let observer: Arc<dyn PipelineObserver> = Arc::new(LogObserver);

    match &args.input {
        Some(path) => {
            let audio = BufferedAudio::read_wav(path)
                .with_context(|| format!("Failed to load {:?}", path))?;
            let frames = SpectrumProducer::from_finite(audio.clone(), &config.analysis)?;

            let playback = if args.mute {
                None
            } else {
                match Playback::start(&audio) {
                    Ok(playback) => Some(playback),
                    Err(e) => {
                        warn!("{}; continuing without sound", e);
                        None
                    }
                }
            };

            // Frame deadlines count from the moment the sound starts
            let clock = PlaybackClock::start_now();
            let (pipeline, pacer) =
                Pipeline::start(frames, renderer, config, clock, stop.clone(), observer)?;
            Ok((pipeline, pacer, AudioSession::File(playback)))
        }
        None => {
            let (device, source) =
                CaptureDevice::open(&config.capture).context("Failed to open capture device")?;
            let clock = PlaybackClock::start_now();
            let frames = SpectrumProducer::from_live(
                source,
                &config.analysis,
                &config.pipeline,
                config.capture.pull_wait(),
                clock,
                stop.clone(),
            )?;
            let (pipeline, pacer) =
                Pipeline::start(frames, renderer, config, clock, stop.clone(), observer)?;
            Ok((pipeline, pacer, AudioSession::Capture(device)))
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    let config = args.load_config().context("Invalid configuration")?;
    info!(
        "Spectrovis: {}x{} @ {:.1} fps, {:?} layout",
        config.render.width,
        config.render.height,
        config.analysis.fps(),
        config.render.layout
    );

    let stop = StopFlag::new();
    let (pipeline, mut pacer, session) = start(&args, &config, &stop)?;

    let shown = match args.recording_config() {
        Some(recording) => PngRecorder::new(recording)
            .and_then(|mut sink| run_headless(&mut pacer, &mut sink))
            .map(|_| ())
            .context("Headless run failed"),
        None => run_window(&mut pacer, &config),
    };

    pacer.stop();
    let produced = pipeline.shutdown();
    session.stop();

    shown?;
    let produced = produced.context("Visualizer failed")?;
    info!("Done: {} frames produced, {} shown", produced, pacer.presented());
    Ok(())
}

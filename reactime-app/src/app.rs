use crate::cli::AppConfig;
use crate::driver::{Driver, Tick};
use crate::render::{StageRenderer, View};
use crate::synthetic::{KeyboardFace, SyntheticClassifier, SyntheticModel};
use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use reactime_core::Stage;
use reactime_gesture::{CameraSession, GestureEvent, ModelSource};
use reactime_session::{InputMode, ReactionSession, SessionEvent};
use reactime_timing::HighPrecisionTimer;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

type AppDriver = Driver<SyntheticClassifier, KeyboardFace, HighPrecisionTimer, ThreadRng>;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<StageRenderer>,
    driver: AppDriver,
    face: KeyboardFace,
    current_size: Option<PhysicalSize<u32>>,
    refresh_rate: Option<f64>,
    should_exit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let timer = HighPrecisionTimer::new();
        let face = KeyboardFace::new();
        let session = ReactionSession::new(config.session.clone(), timer.clone(), rand::rng())
            .context("Invalid session configuration")?;

        let camera = match config.session.input {
            InputMode::Tap => None,
            InputMode::Gesture => {
                let mut camera = CameraSession::new(config.gesture.clone(), face.clone(), timer);
                let sources: Vec<Box<dyn ModelSource<SyntheticClassifier>>> =
                    vec![Box::new(SyntheticModel)];
                let loaded = pollster::block_on(camera.initialize(&sources))
                    .context("Gesture classifier failed to initialize")?;
                info!("Gesture input via {} ({})", loaded, config.gesture.mode);
                Some(camera)
            }
        };

        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            driver: Driver::new(session, camera),
            face,
            current_size: None,
            refresh_rate: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            "Platform: {} / {}",
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        info!("Space/Enter to react, R to restart, C to recalibrate, Esc to quit");

        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        self.refresh_rate = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .and_then(|monitor| monitor.refresh_rate_millihertz())
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("reactime")
            .with_inner_size(LogicalSize::new(640.0, 480.0));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);

        info!(
            "Window {}×{} at scale {:.2}",
            physical_size.width,
            physical_size.height,
            window.scale_factor()
        );
        if let Some(refresh_rate) = self.refresh_rate {
            info!("Refresh rate: {:.1} Hz", refresh_rate);
        }

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);
        self.renderer = Some(
            StageRenderer::new(physical_size.width, physical_size.height)
                .context("Window has zero size")?,
        );

        window.request_redraw();
        self.window = Some(window);

        self.driver.begin();
        Ok(())
    }

    fn update(&mut self) {
        let Tick { session, gesture } = self.driver.tick();
        for event in gesture {
            match event {
                GestureEvent::Calibrated { mode, threshold } => {
                    info!("Calibrated {}: threshold {:.2}", mode, threshold)
                }
                GestureEvent::CalibrationCancelled { mode } => {
                    warn!("Calibration of {} cancelled", mode)
                }
                _ => {}
            }
        }
        for event in session {
            match event {
                SessionEvent::Finished(summary) => match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!("Failed to serialize summary: {}", e),
                },
                other => debug!("{:?}", other),
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let session = &self.driver.session;
        let camera = self.driver.camera.as_ref();
        let view = View {
            stage: session.stage(),
            completed: session.trials().len(),
            total: session.config().total_trials,
            calibrating: self.driver.is_waiting_for_calibration()
                || camera.is_some_and(|c| c.is_calibrating()),
            score: camera.and_then(|c| c.display_score().map(|s| (s, c.threshold()))),
        };
        renderer.draw(&view);
        renderer.copy_into(pixels.frame_mut());
        pixels.render()?;
        Ok(())
    }

    fn handle_key(&mut self, key: PhysicalKey, state: ElementState, repeat: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let pressed = state.is_pressed();
        match code {
            KeyCode::KeyM => self.face.set_mouth_open(pressed),
            KeyCode::KeyB => self.face.set_eyes_closed(pressed),
            _ if !pressed || repeat => {}
            KeyCode::Space | KeyCode::Enter => {
                let outcome = self.driver.tap();
                debug!("Tap: {:?}", outcome);
            }
            KeyCode::KeyR if self.driver.session.stage() == Stage::Done => self.driver.begin(),
            KeyCode::KeyC => {
                if !self.driver.recalibrate() {
                    warn!("Recalibration is only available between sessions");
                }
            }
            KeyCode::KeyV => {
                let playing = self.face.toggle_playing();
                info!("Camera {}", if playing { "started" } else { "stopped" });
            }
            _ => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || self.current_size == Some(new_size) {
            return;
        }
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height);
        }
        debug!("Resized to {}×{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.driver.teardown();
        let stats = self.driver.session.stats();
        info!(
            "Exiting after {} trial(s), min {:?} ms, avg {:?} ms",
            self.driver.session.trials().len(),
            stats.min,
            stats.avg
        );
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("Failed to create window and surface: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    error!("Render failed: {:#}", e);
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    self.cleanup_and_exit(event_loop);
                } else {
                    self.handle_key(event.physical_key, event.state, event.repeat);
                }
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

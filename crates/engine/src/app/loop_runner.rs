use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::config::{resolve_world_config, ConfigError, WorldConfig};
use crate::{resolve_app_paths, StartupError};

use super::metrics::MetricsAccumulator;
use super::rendering::{FrameRenderer, GlyphAtlas, TilesetSurface, CELL_PX};
use super::scene::{Scene, SceneError};
use super::session::Session;
use super::{InputAction, Intent};

pub const DEFAULT_TILESET_FILE: &str = "curses_square_16x16.png";
const MAX_PENDING_INTENTS: usize = 32;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub frame_interval: Duration,
    pub metrics_log_interval: Duration,
    /// Relative paths resolve against the project's `assets/` directory.
    pub tileset_file: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Mahou".to_string(),
            frame_interval: Duration::from_millis(15),
            metrics_log_interval: Duration::from_secs(1),
            tileset_file: PathBuf::from(DEFAULT_TILESET_FILE),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("invalid world configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to load scene: {0}")]
    Scene(#[from] SceneError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize display surface: {0}")]
    CreateSurface(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Resolves the project root and world config, builds the scene through
/// `build_scene`, then runs the window loop until quit.
pub fn run_app<F>(config: LoopConfig, build_scene: F) -> Result<(), AppError>
where
    F: FnOnce(&WorldConfig) -> Box<dyn Scene>,
{
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        "startup"
    );
    let world_config = resolve_world_config(&app_paths.assets_dir)?;
    let layout = world_config.layout().map_err(ConfigError::from)?;
    info!(
        chunk_size = world_config.chunk_size,
        eviction_window_turns = world_config.eviction_window_turns,
        entity_capacity = world_config.entity_capacity,
        bounds = ?world_config.bounds,
        screen_width = layout.screen_width,
        screen_height = layout.screen_height,
        "world_config"
    );

    let mut session = Session::new(&world_config, build_scene(&world_config))?;
    session.start()?;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(layout.screen_width * CELL_PX),
                f64::from(layout.screen_height * CELL_PX),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let atlas = GlyphAtlas::load_or_fallback(&app_paths.assets_dir.join(&config.tileset_file));
    let mut surface = TilesetSurface::new(
        Arc::clone(&window),
        layout.screen_width,
        layout.screen_height,
        atlas,
    )
    .map_err(AppError::CreateSurface)?;
    let mut frame = FrameRenderer::new(layout);

    event_loop.set_control_flow(ControlFlow::Poll);

    let frame_interval =
        normalize_non_zero_duration(config.frame_interval, Duration::from_millis(15));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    info!(
        frame_interval_ms = frame_interval.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    match surface.resize(new_size.width, new_size.height) {
                        Ok(true) => frame.request_present(),
                        Ok(false) => {}
                        Err(error) => {
                            warn!(error = %error, "surface_resize_failed");
                            window_target.exit();
                        }
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    match surface.resize(size.width, size.height) {
                        Ok(true) => frame.request_present(),
                        Ok(false) => {}
                        Err(error) => {
                            warn!(error = %error, "surface_resize_failed");
                            window_target.exit();
                        }
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let report = session.apply_intents(input_collector.drain_intents());
                    metrics_accumulator.record_turns(report.turns_advanced);
                    if report.quit {
                        info!(reason = "quit_intent", turn = session.turn(), "shutdown_requested");
                        window_target.exit();
                        return;
                    }

                    // Single frame pacing sleep point.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep = compute_cap_sleep(elapsed_since_last_present, frame_interval);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let cells_drawn = match session.render(&mut frame, &mut surface) {
                        Ok(stats) => stats.cells_drawn,
                        Err(error) => {
                            warn!(error = %error, "surface_present_failed");
                            window_target.exit();
                            return;
                        }
                    };
                    last_present_instant = Instant::now();

                    let next_title = session.debug_title();
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }
                    metrics_accumulator.record_frame(raw_frame_dt, cells_drawn);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            turns_per_second = snapshot.turns_per_second,
                            frame_time_ms = snapshot.frame_time_ms,
                            cells_drawn = snapshot.cells_drawn,
                            resident_chunks = session.world().chunks().resident_count(),
                            live_entities = session.world().entities().live_count(),
                            turn = session.turn(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                session.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Queues one intent per key press, including auto-repeat, so a held
/// direction keeps walking.
#[derive(Debug, Default)]
struct InputCollector {
    pending: Vec<Intent>,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_key(key_event.physical_key, key_event.state);
    }

    fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }
        let Some(action) = action_for_key(key) else {
            return;
        };
        let intent = action.intent();
        if intent == Intent::Quit || self.pending.len() < MAX_PENDING_INTENTS {
            self.pending.push(intent);
        }
    }

    fn drain_intents(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.pending)
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    match key {
        PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
            Some(InputAction::MoveUp)
        }
        PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
            Some(InputAction::MoveDown)
        }
        PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
            Some(InputAction::MoveLeft)
        }
        PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
            Some(InputAction::MoveRight)
        }
        PhysicalKey::Code(KeyCode::Escape) => Some(InputAction::Quit),
        _ => None,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_cap_sleep(elapsed: Duration, target: Duration) -> Duration {
    target.saturating_sub(elapsed)
}

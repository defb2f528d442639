use tracing::{debug, info};

use crate::config::{ConfigError, WorldConfig};
use crate::world::{MoveOutcome, Position, World};

use super::rendering::{DisplaySurface, FrameRenderer, FrameStats, MessageLog, SurfaceError};
use super::scene::{Scene, SceneError};
use super::Intent;

/// What one batch of intents did to the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub turns_advanced: u64,
    pub chunks_evicted: usize,
    pub quit: bool,
}

/// World, message log, turn counter and scene, advanced one player action at a time.
pub struct Session {
    world: World,
    log: MessageLog,
    scene: Box<dyn Scene>,
    turn: u64,
    camera: Position,
    loaded: bool,
    quit_requested: bool,
}

impl Session {
    pub fn new(config: &WorldConfig, scene: Box<dyn Scene>) -> Result<Self, ConfigError> {
        Ok(Self {
            world: World::new(config)?,
            log: MessageLog::with_capacity(config.log_capacity),
            scene,
            turn: 0,
            camera: Position::ORIGIN,
            loaded: false,
            quit_requested: false,
        })
    }

    pub fn start(&mut self) -> Result<(), SceneError> {
        self.scene.load(&mut self.world, &mut self.log)?;
        let Some(player) = self.world.player_position() else {
            return Err(SceneError::NoPlayer);
        };
        self.camera = player;
        self.loaded = true;
        info!(
            player_x = player.x,
            player_y = player.y,
            entity_count = self.world.entities().live_count(),
            resident_chunks = self.world.chunks().resident_count(),
            "scene_loaded"
        );
        Ok(())
    }

    /// Applies intents in order. Each accepted move advances one turn; a quit
    /// drops everything queued after it.
    pub fn apply_intents<I>(&mut self, intents: I) -> TurnReport
    where
        I: IntoIterator<Item = Intent>,
    {
        let mut report = TurnReport::default();
        for intent in intents {
            if self.quit_requested {
                break;
            }
            match intent {
                Intent::Quit => {
                    self.quit_requested = true;
                }
                Intent::Move { dx, dy } => {
                    if let Some(evicted) = self.move_player(Position::new(dx, dy)) {
                        report.turns_advanced += 1;
                        report.chunks_evicted += evicted;
                    }
                }
            }
        }
        report.quit = self.quit_requested;
        report
    }

    fn move_player(&mut self, delta: Position) -> Option<usize> {
        let player = self.world.player();
        match self.world.move_entity(player, delta) {
            MoveOutcome::Moved { to, .. } => {
                self.camera = to;
                Some(self.advance_turn())
            }
            MoveOutcome::Absent => None,
            blocked => {
                debug!(outcome = ?blocked, turn = self.turn, "player_move_blocked");
                self.scene
                    .on_player_blocked(blocked, &self.world, &mut self.log);
                None
            }
        }
    }

    fn advance_turn(&mut self) -> usize {
        self.turn += 1;
        self.world.tick(self.turn);
        self.scene.on_turn(self.turn, &mut self.world, &mut self.log);
        self.world.evict_stale()
    }

    /// Composes the view around the player (or where the player was last
    /// seen) and pushes dirty cells to `surface`.
    pub fn render<S: DisplaySurface + ?Sized>(
        &mut self,
        frame: &mut FrameRenderer,
        surface: &mut S,
    ) -> Result<FrameStats, SurfaceError> {
        if let Some(player) = self.world.player_position() {
            self.camera = player;
        }
        frame.render_frame(&mut self.world, self.camera, &self.log, surface)
    }

    pub fn shutdown(&mut self) {
        if !self.loaded {
            return;
        }
        self.scene.unload(&mut self.world, &mut self.log);
        self.loaded = false;
        info!(
            turn = self.turn,
            chunks_generated = self.world.chunks().generated_total(),
            chunks_evicted = self.world.chunks().evicted_total(),
            "session_shutdown"
        );
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn camera(&self) -> Position {
        self.camera
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world, self.turn)
    }
}

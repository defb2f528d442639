use thiserror::Error;

use crate::app::MessageLog;
use crate::world::{MoveOutcome, SpawnError, World};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("no free tile within {radius} of ({x}, {y})")]
    NoFreeTile { x: i32, y: i32, radius: i32 },
    #[error("scene loaded without choosing a player entity")]
    NoPlayer,
}

/// Game-side hooks driven by the session's turn loop.
pub trait Scene {
    /// Populates the world. Must leave a live player set on `world`.
    fn load(&mut self, world: &mut World, log: &mut MessageLog) -> Result<(), SceneError>;

    /// Runs once after every turn-advancing player action.
    fn on_turn(&mut self, turn: u64, world: &mut World, log: &mut MessageLog);

    fn on_player_blocked(&mut self, _outcome: MoveOutcome, _world: &World, _log: &mut MessageLog) {}

    fn unload(&mut self, _world: &mut World, _log: &mut MessageLog) {}

    fn debug_title(&self, _world: &World, _turn: u64) -> Option<String> {
        None
    }
}

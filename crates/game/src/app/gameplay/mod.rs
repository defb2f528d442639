use engine::{
    Color, EntityHandle, EntityType, Glyph, MessageLog, MoveOutcome, Position, Scene, SceneError,
    SpawnError, World, WorldConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

const PLAYER_SPAWN_SEARCH_RADIUS: i32 = 32;
const NPC_SCATTER_RADIUS: i32 = 12;
const NPC_PLACEMENT_RADIUS: i32 = 2;
const NPC_SPAWN_ATTEMPTS: u32 = 8;
const NPC_IDLE_ONE_IN: u32 = 2;
const WANDER_STEPS: [Position; 4] = [
    Position::new(0, -1),
    Position::new(0, 1),
    Position::new(-1, 0),
    Position::new(1, 0),
];

pub(crate) static HUMAN: EntityType = EntityType {
    name: "human",
    glyph: Glyph::new(b'H', Color::Yellow, Color::Black),
    max_hp: 20,
    damage: 3,
};

pub(crate) static RAT: EntityType = EntityType {
    name: "rat",
    glyph: Glyph::new(b'r', Color::Brown, Color::Black),
    max_hp: 4,
    damage: 1,
};

pub(crate) static GOBLIN: EntityType = EntityType {
    name: "goblin",
    glyph: Glyph::new(b'g', Color::LightGreen, Color::Black),
    max_hp: 10,
    damage: 2,
};

pub(crate) fn build_scene(config: &WorldConfig) -> Box<dyn Scene> {
    Box::new(RoguelikeScene::new(config.rng_seed, config.npc_count))
}

/// The player plus a handful of wanderers that take one random step per turn.
struct RoguelikeScene {
    rng: StdRng,
    npc_count: u32,
    npcs: Vec<EntityHandle>,
}

impl RoguelikeScene {
    fn new(seed: u64, npc_count: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            npc_count,
            npcs: Vec::new(),
        }
    }

    fn wanderer_type(index: u32) -> &'static EntityType {
        if index % 3 == 2 {
            &GOBLIN
        } else {
            &RAT
        }
    }

    fn spawn_wanderers(&mut self, world: &mut World, around: Position) {
        for index in 0..self.npc_count {
            let kind = Self::wanderer_type(index);
            for _ in 0..NPC_SPAWN_ATTEMPTS {
                let offset = Position::new(
                    self.rng.gen_range(-NPC_SCATTER_RADIUS..=NPC_SCATTER_RADIUS),
                    self.rng.gen_range(-NPC_SCATTER_RADIUS..=NPC_SCATTER_RADIUS),
                );
                let Some(spot) = around
                    .offset(offset)
                    .and_then(|target| world.find_free_spot(target, NPC_PLACEMENT_RADIUS))
                else {
                    continue;
                };
                match world.spawn(kind, spot) {
                    Ok(handle) => {
                        self.npcs.push(handle);
                        break;
                    }
                    Err(SpawnError::CapacityExhausted { capacity }) => {
                        warn!(capacity, spawned = self.npcs.len(), "wanderer_spawn_stopped");
                        return;
                    }
                    Err(error) => {
                        debug!(entity_type = kind.name, error = %error, "wanderer_spawn_retry");
                    }
                }
            }
        }
    }
}

impl Scene for RoguelikeScene {
    fn load(&mut self, world: &mut World, log: &mut MessageLog) -> Result<(), SceneError> {
        let spawn = world
            .find_free_spot(Position::ORIGIN, PLAYER_SPAWN_SEARCH_RADIUS)
            .ok_or(SceneError::NoFreeTile {
                x: Position::ORIGIN.x,
                y: Position::ORIGIN.y,
                radius: PLAYER_SPAWN_SEARCH_RADIUS,
            })?;
        let player = world.spawn(&HUMAN, spawn)?;
        world.set_player(player);

        self.npcs.clear();
        self.spawn_wanderers(world, spawn);

        log.push("Move with WASD or the arrow keys. Esc quits.");
        log.push("Welcome to Mahou.");
        info!(
            player_x = spawn.x,
            player_y = spawn.y,
            wanderers = self.npcs.len(),
            "roguelike_scene_loaded"
        );
        Ok(())
    }

    fn on_turn(&mut self, _turn: u64, world: &mut World, _log: &mut MessageLog) {
        self.npcs.retain(|handle| world.entity(*handle).is_some());
        for &handle in &self.npcs {
            if self.rng.gen_range(0..NPC_IDLE_ONE_IN) == 0 {
                continue;
            }
            let step = WANDER_STEPS[self.rng.gen_range(0..WANDER_STEPS.len())];
            world.move_entity(handle, step);
        }
    }

    fn on_player_blocked(&mut self, outcome: MoveOutcome, world: &World, log: &mut MessageLog) {
        match outcome {
            MoveOutcome::Impassable => log.push("The rock does not budge."),
            MoveOutcome::Occupied(occupant) => {
                let name = world
                    .entity(occupant)
                    .and_then(|entity| entity.kind())
                    .map_or("something", |kind| kind.name);
                log.push(format!("A {name} blocks the way."));
            }
            MoveOutcome::Moved { .. } | MoveOutcome::Absent => {}
        }
    }

    fn unload(&mut self, _world: &mut World, _log: &mut MessageLog) {
        self.npcs.clear();
    }

    fn debug_title(&self, world: &World, turn: u64) -> Option<String> {
        let position = world.player_position()?;
        Some(format!(
            "Mahou | turn {turn} | ({}, {}) | {} alive",
            position.x,
            position.y,
            world.entities().live_count()
        ))
    }
}

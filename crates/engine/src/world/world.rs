use tracing::{debug, warn};

use crate::config::{ConfigError, WorldBounds, WorldConfig};

use super::chunk::{ChunkGeometry, TerrainGenerator, MAX_CHUNK_SIZE};
use super::chunk_store::ChunkStore;
use super::entity::{Entity, EntityHandle, EntityRegistry, EntityType, Position, SpawnError};
use super::tile::{Glyph, MapTile, BORDER_TILE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: Position, to: Position },
    Impassable,
    Occupied(EntityHandle),
    Absent,
}

impl MoveOutcome {
    #[cfg(test)]
    pub fn is_moved(self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }
}

/// Chunk store plus entity registry, with the occupancy policy between them:
/// at most one live entity per tile, and only on passable tiles.
#[derive(Debug)]
pub struct World {
    chunks: ChunkStore,
    entities: EntityRegistry,
    bounds: WorldBounds,
    player: EntityHandle,
}

impl World {
    pub fn new(config: &WorldConfig) -> Result<Self, ConfigError> {
        let geometry = ChunkGeometry::new(config.chunk_size).ok_or_else(|| {
            if config.chunk_size > MAX_CHUNK_SIZE {
                ConfigError::ChunkSizeTooLarge {
                    size: config.chunk_size,
                    max: MAX_CHUNK_SIZE,
                }
            } else {
                ConfigError::ChunkSizeNotPowerOfTwo(config.chunk_size)
            }
        })?;
        let generator = TerrainGenerator::new(config.noise_scale, config.terrain_bands.clone());
        Ok(Self {
            chunks: ChunkStore::new(geometry, generator, config.eviction_window_turns),
            entities: EntityRegistry::with_capacity(config.entity_capacity),
            bounds: config.bounds,
            player: EntityHandle::NONE,
        })
    }

    pub fn chunks(&self) -> &ChunkStore {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut ChunkStore {
        &mut self.chunks
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.get(handle)
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn set_player(&mut self, handle: EntityHandle) {
        self.player = handle;
    }

    pub fn player(&self) -> EntityHandle {
        self.player
    }

    pub fn player_position(&self) -> Option<Position> {
        self.entities.get(self.player).map(|entity| entity.position)
    }

    /// Map tile at `position`, with the border tile substituted outside a
    /// bordered world. Generates and touches the owning chunk otherwise.
    pub fn tile_at(&mut self, position: Position) -> MapTile {
        if !self.bounds.contains(position.x, position.y) {
            return BORDER_TILE;
        }
        *self.chunks.get_tile(position)
    }

    /// What is displayed at `position`: a live occupant's glyph shadows terrain.
    pub fn resolve(&mut self, position: Position) -> Glyph {
        let tile = self.tile_at(position);
        self.live_occupant(&tile)
            .and_then(|handle| self.entities.get(handle))
            .and_then(Entity::glyph)
            .unwrap_or(tile.glyph)
    }

    pub fn is_free(&mut self, position: Position) -> bool {
        let tile = self.tile_at(position);
        tile.passable && self.live_occupant(&tile).is_none()
    }

    pub fn spawn(
        &mut self,
        kind: &'static EntityType,
        position: Position,
    ) -> Result<EntityHandle, SpawnError> {
        let tile = self.tile_at(position);
        if !tile.passable {
            return Err(SpawnError::Impassable {
                x: position.x,
                y: position.y,
            });
        }
        if let Some(occupant) = self.live_occupant(&tile) {
            return Err(SpawnError::Occupied {
                x: position.x,
                y: position.y,
                occupant: occupant.0,
            });
        }

        let handle = self.entities.spawn(kind, position).inspect_err(|error| {
            warn!(entity_type = kind.name, error = %error, "spawn_rejected");
        })?;
        self.chunks.get_mutable_tile(position).occupant = handle;
        debug!(
            entity = handle.0,
            entity_type = kind.name,
            x = position.x,
            y = position.y,
            "entity_spawned"
        );
        Ok(handle)
    }

    /// Moves an entity by `delta` when the destination is passable and free.
    /// Rejected moves change nothing.
    pub fn move_entity(&mut self, handle: EntityHandle, delta: Position) -> MoveOutcome {
        let Some(from) = self.entities.get(handle).map(|entity| entity.position) else {
            return MoveOutcome::Absent;
        };
        let Some(to) = from.offset(delta) else {
            return MoveOutcome::Impassable;
        };
        if to == from {
            return MoveOutcome::Moved { from, to };
        }

        let destination = self.tile_at(to);
        if !destination.passable {
            return MoveOutcome::Impassable;
        }
        if let Some(occupant) = self.live_occupant(&destination) {
            return MoveOutcome::Occupied(occupant);
        }

        self.clear_occupancy(handle, from);
        self.chunks.get_mutable_tile(to).occupant = handle;
        if let Some(entity) = self.entities.get_mut(handle) {
            entity.position = to;
        }
        MoveOutcome::Moved { from, to }
    }

    /// Logically deletes an entity and clears its occupancy marker.
    pub fn kill(&mut self, handle: EntityHandle) -> bool {
        let Some(position) = self.entities.kill(handle) else {
            return false;
        };
        self.clear_occupancy(handle, position);
        debug!(entity = handle.0, "entity_killed");
        true
    }

    /// Nearest free tile to `center`, scanning square rings outward.
    pub fn find_free_spot(&mut self, center: Position, max_radius: i32) -> Option<Position> {
        for radius in 0..=max_radius.max(0) {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let Some(candidate) = center.offset(Position::new(dx, dy)) else {
                        continue;
                    };
                    if self.is_free(candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    pub fn tick(&mut self, turn: u64) {
        self.chunks.tick(turn);
    }

    pub fn evict_stale(&mut self) -> usize {
        self.chunks.evict_stale()
    }

    fn live_occupant(&self, tile: &MapTile) -> Option<EntityHandle> {
        if tile.occupant.is_none() {
            return None;
        }
        self.entities.get(tile.occupant).map(|_| tile.occupant)
    }

    fn clear_occupancy(&mut self, handle: EntityHandle, position: Position) {
        if !self.bounds.contains(position.x, position.y) {
            return;
        }
        let tile = self.chunks.get_mutable_tile(position);
        if tile.occupant == handle {
            tile.occupant = EntityHandle::NONE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::{Color, TerrainKind};
    use crate::world::ChunkCoord;

    static WALKER: EntityType = EntityType {
        name: "Walker",
        glyph: Glyph::new(b'W', Color::Yellow, Color::Black),
        max_hp: 10,
        damage: 1,
    };

    fn world() -> World {
        World::new(&WorldConfig::default()).expect("world")
    }

    #[test]
    fn move_past_coordinate_limit_is_impassable() {
        let mut world = world();
        let edge = Position::new(i32::MAX, 0);
        make_floor(&mut world, edge);
        let handle = world.spawn(&WALKER, edge).expect("spawn at edge");

        assert_eq!(
            world.move_entity(handle, Position::new(1, 0)),
            MoveOutcome::Impassable
        );
        assert_eq!(world.entity(handle).expect("alive").position, edge);
        assert_eq!(world.tile_at(edge).occupant, handle);
    }

    fn make_floor(world: &mut World, position: Position) {
        let tile = world.chunks_mut().get_mutable_tile(position);
        *tile = MapTile {
            occupant: tile.occupant,
            ..TerrainKind::Ground.tile()
        };
    }

    fn make_wall(world: &mut World, position: Position) {
        let tile = world.chunks_mut().get_mutable_tile(position);
        *tile = MapTile {
            occupant: tile.occupant,
            ..TerrainKind::Rock.tile()
        };
    }

    fn occupant_at(world: &mut World, position: Position) -> EntityHandle {
        world.chunks_mut().get_tile(position).occupant
    }

    #[test]
    fn new_rejects_non_power_of_two_chunks() {
        let config = WorldConfig {
            chunk_size: 10,
            ..WorldConfig::default()
        };
        assert!(matches!(
            World::new(&config),
            Err(ConfigError::ChunkSizeNotPowerOfTwo(10))
        ));
    }

    #[test]
    fn spawn_then_move_updates_position_and_occupancy() {
        let mut world = world();
        make_floor(&mut world, Position::ORIGIN);
        make_floor(&mut world, Position::new(1, 0));

        let handle = world.spawn(&WALKER, Position::ORIGIN).expect("spawn");
        assert_eq!(occupant_at(&mut world, Position::ORIGIN), handle);

        let outcome = world.move_entity(handle, Position::new(1, 0));
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: Position::ORIGIN,
                to: Position::new(1, 0)
            }
        );
        assert_eq!(
            world.entity(handle).expect("alive").position,
            Position::new(1, 0)
        );
        assert_eq!(occupant_at(&mut world, Position::ORIGIN), EntityHandle::NONE);
        assert_eq!(occupant_at(&mut world, Position::new(1, 0)), handle);
    }

    #[test]
    fn move_onto_impassable_tile_is_rejected() {
        let mut world = world();
        make_floor(&mut world, Position::ORIGIN);
        make_wall(&mut world, Position::new(0, 1));
        let handle = world.spawn(&WALKER, Position::ORIGIN).expect("spawn");

        assert_eq!(
            world.move_entity(handle, Position::new(0, 1)),
            MoveOutcome::Impassable
        );
        assert_eq!(world.entity(handle).expect("alive").position, Position::ORIGIN);
        assert_eq!(occupant_at(&mut world, Position::ORIGIN), handle);
        assert_eq!(occupant_at(&mut world, Position::new(0, 1)), EntityHandle::NONE);
    }

    #[test]
    fn move_onto_occupied_tile_is_rejected() {
        let mut world = world();
        make_floor(&mut world, Position::ORIGIN);
        make_floor(&mut world, Position::new(-1, 0));
        let mover = world.spawn(&WALKER, Position::ORIGIN).expect("mover");
        let blocker = world.spawn(&WALKER, Position::new(-1, 0)).expect("blocker");

        assert_eq!(
            world.move_entity(mover, Position::new(-1, 0)),
            MoveOutcome::Occupied(blocker)
        );
        assert_eq!(world.entity(mover).expect("alive").position, Position::ORIGIN);
        assert_eq!(occupant_at(&mut world, Position::new(-1, 0)), blocker);
        assert_eq!(world.entities().len(), 2);
    }

    #[test]
    fn spawn_enforces_occupancy_policy() {
        let mut world = world();
        make_floor(&mut world, Position::new(4, 4));
        make_wall(&mut world, Position::new(5, 4));
        let first = world.spawn(&WALKER, Position::new(4, 4)).expect("first");

        assert_eq!(
            world.spawn(&WALKER, Position::new(4, 4)),
            Err(SpawnError::Occupied {
                x: 4,
                y: 4,
                occupant: first.0
            })
        );
        assert_eq!(
            world.spawn(&WALKER, Position::new(5, 4)),
            Err(SpawnError::Impassable { x: 5, y: 4 })
        );
        assert_eq!(world.entities().len(), 1);
    }

    #[test]
    fn full_table_spawn_fails_and_leaves_table_unchanged() {
        let config = WorldConfig {
            entity_capacity: 2,
            ..WorldConfig::default()
        };
        let mut world = World::new(&config).expect("world");
        for x in 0..3 {
            make_floor(&mut world, Position::new(x, 0));
        }
        world.spawn(&WALKER, Position::new(0, 0)).expect("first");
        world.spawn(&WALKER, Position::new(1, 0)).expect("second");

        let err = world
            .spawn(&WALKER, Position::new(2, 0))
            .expect_err("capacity");
        assert_eq!(err, SpawnError::CapacityExhausted { capacity: 2 });
        assert_eq!(world.entities().len(), 2);
        assert_eq!(occupant_at(&mut world, Position::new(2, 0)), EntityHandle::NONE);
    }

    #[test]
    fn resolve_shadows_terrain_with_live_occupant_only() {
        let mut world = world();
        make_floor(&mut world, Position::ORIGIN);
        let terrain = TerrainKind::Ground.tile().glyph;
        assert_eq!(world.resolve(Position::ORIGIN), terrain);

        let handle = world.spawn(&WALKER, Position::ORIGIN).expect("spawn");
        assert_eq!(world.resolve(Position::ORIGIN), WALKER.glyph);

        assert!(world.kill(handle));
        assert_eq!(world.resolve(Position::ORIGIN), terrain);
        assert_eq!(occupant_at(&mut world, Position::ORIGIN), EntityHandle::NONE);
    }

    #[test]
    fn stale_marker_for_dead_entity_does_not_shadow_or_block() {
        let mut world = world();
        make_floor(&mut world, Position::ORIGIN);
        world.chunks_mut().get_mutable_tile(Position::ORIGIN).occupant = EntityHandle(42);
        assert_eq!(world.resolve(Position::ORIGIN), TerrainKind::Ground.tile().glyph);
        assert!(world.is_free(Position::ORIGIN));
    }

    #[test]
    fn handles_resolve_to_same_entity_until_death() {
        let mut world = world();
        make_floor(&mut world, Position::ORIGIN);
        make_floor(&mut world, Position::new(0, 1));
        let a = world.spawn(&WALKER, Position::ORIGIN).expect("a");
        let b = world.spawn(&WALKER, Position::new(0, 1)).expect("b");
        world.kill(a);
        assert!(world.entity(a).is_none());
        assert_eq!(world.entity(b).expect("b").position, Position::new(0, 1));
        assert!(world.move_entity(a, Position::new(1, 0)) == MoveOutcome::Absent);
    }

    #[test]
    fn bordered_world_injects_impassable_border() {
        let config = WorldConfig {
            bounds: WorldBounds::Bordered { radius: 2 },
            ..WorldConfig::default()
        };
        let mut world = World::new(&config).expect("world");
        assert_eq!(world.tile_at(Position::new(3, 0)), BORDER_TILE);
        assert_eq!(world.resolve(Position::new(0, -3)), BORDER_TILE.glyph);
        assert!(world.spawn(&WALKER, Position::new(3, 0)).is_err());
    }

    #[test]
    fn occupied_chunk_survives_eviction_with_marker_intact() {
        let mut world = world();
        make_floor(&mut world, Position::ORIGIN);
        let handle = world.spawn(&WALKER, Position::ORIGIN).expect("spawn");
        let _ = world.tile_at(Position::new(200, 200));
        world.tick(50);
        assert_eq!(world.evict_stale(), 1);
        assert!(world.chunks().is_resident(ChunkCoord { x: 0, y: 0 }));
        assert_eq!(world.resolve(Position::ORIGIN), WALKER.glyph);
        assert_eq!(occupant_at(&mut world, Position::ORIGIN), handle);
    }

    #[test]
    fn find_free_spot_skips_walls_and_occupants() {
        let mut world = world();
        for dy in -1..=1 {
            for dx in -1..=1 {
                make_wall(&mut world, Position::new(dx, dy));
            }
        }
        make_floor(&mut world, Position::new(1, 1));
        let blocker = world.spawn(&WALKER, Position::new(1, 1)).expect("blocker");
        assert!(world.entity(blocker).is_some());
        make_floor(&mut world, Position::new(2, 0));

        let spot = world.find_free_spot(Position::ORIGIN, 4).expect("spot");
        assert!(spot.x.abs() == 2 || spot.y.abs() == 2);
        assert!(world.is_free(spot));
    }
}

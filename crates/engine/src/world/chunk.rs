use crate::config::TerrainBand;

use super::entity::Position;
use super::noise::cubic_noise;
use super::tile::{MapTile, TerrainKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

/// Largest accepted chunk edge, in tiles.
pub const MAX_CHUNK_SIZE: u32 = 256;

/// Power-of-two chunk dimensions, split into shift/mask for coordinate math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGeometry {
    shift: u32,
}

impl ChunkGeometry {
    /// `None` unless `size` is a power of two in `2..=MAX_CHUNK_SIZE`.
    pub fn new(size: u32) -> Option<Self> {
        if size < 2 || size > MAX_CHUNK_SIZE || !size.is_power_of_two() {
            return None;
        }
        Some(Self {
            shift: size.trailing_zeros(),
        })
    }

    pub fn size(self) -> i32 {
        1 << self.shift
    }

    pub fn tile_count(self) -> usize {
        1usize << (self.shift * 2)
    }

    fn mask(self) -> i32 {
        self.size() - 1
    }

    /// Splits a world position into its chunk and the row-major index inside it.
    /// Arithmetic shift keeps negative coordinates in the correct chunk.
    pub fn split(self, position: Position) -> (ChunkCoord, usize) {
        let coord = ChunkCoord {
            x: position.x >> self.shift,
            y: position.y >> self.shift,
        };
        let local_x = (position.x & self.mask()) as usize;
        let local_y = (position.y & self.mask()) as usize;
        (coord, (local_y << self.shift) | local_x)
    }

    pub fn world_origin(self, coord: ChunkCoord) -> Position {
        Position::new(coord.x << self.shift, coord.y << self.shift)
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    tiles: Box<[MapTile]>,
    pub(crate) last_access: u64,
}

impl Chunk {
    pub fn tiles(&self) -> &[MapTile] {
        &self.tiles
    }

    pub fn last_access(&self) -> u64 {
        self.last_access
    }

    /// Chunks with an entity standing in them are never evicted.
    pub fn has_occupant(&self) -> bool {
        self.tiles.iter().any(MapTile::is_occupied)
    }

    pub(crate) fn tile(&self, index: usize) -> &MapTile {
        &self.tiles[index]
    }

    pub(crate) fn tile_mut(&mut self, index: usize) -> &mut MapTile {
        &mut self.tiles[index]
    }
}

/// Maps noise samples onto terrain through an ascending band ladder.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    scale: f64,
    bands: Vec<TerrainBand>,
}

impl TerrainGenerator {
    pub fn new(scale: f64, bands: Vec<TerrainBand>) -> Self {
        Self { scale, bands }
    }

    pub fn kind_at(&self, position: Position) -> TerrainKind {
        let sample = cubic_noise(position.x as f64 * self.scale, position.y as f64 * self.scale);
        self.bands
            .iter()
            .find(|band| sample < band.below)
            .or(self.bands.last())
            .map(|band| band.kind)
            .unwrap_or(TerrainKind::Ground)
    }

    /// Fresh chunk with no occupancy, stamped with `turn`.
    pub fn generate(&self, geometry: ChunkGeometry, coord: ChunkCoord, turn: u64) -> Chunk {
        let origin = geometry.world_origin(coord);
        let size = geometry.size();
        let mut tiles = Vec::with_capacity(geometry.tile_count());
        for local_y in 0..size {
            for local_x in 0..size {
                let world = Position::new(origin.x + local_x, origin.y + local_y);
                tiles.push(self.kind_at(world).tile());
            }
        }
        Chunk {
            tiles: tiles.into_boxed_slice(),
            last_access: turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    fn default_generator() -> TerrainGenerator {
        let config = WorldConfig::default();
        TerrainGenerator::new(config.noise_scale, config.terrain_bands)
    }

    #[test]
    fn geometry_requires_power_of_two() {
        assert!(ChunkGeometry::new(16).is_some());
        assert!(ChunkGeometry::new(2).is_some());
        assert!(ChunkGeometry::new(0).is_none());
        assert!(ChunkGeometry::new(1).is_none());
        assert!(ChunkGeometry::new(24).is_none());
    }

    #[test]
    fn geometry_rejects_oversized_chunks() {
        let largest = ChunkGeometry::new(MAX_CHUNK_SIZE).expect("largest geometry");
        assert_eq!(largest.size(), MAX_CHUNK_SIZE as i32);
        assert!(ChunkGeometry::new(MAX_CHUNK_SIZE * 2).is_none());
        assert!(ChunkGeometry::new(1 << 31).is_none());
    }

    #[test]
    fn split_handles_negative_coordinates() {
        let geometry = ChunkGeometry::new(16).expect("geometry");
        assert_eq!(
            geometry.split(Position::new(0, 0)),
            (ChunkCoord { x: 0, y: 0 }, 0)
        );
        assert_eq!(
            geometry.split(Position::new(17, 2)),
            (ChunkCoord { x: 1, y: 0 }, 2 * 16 + 1)
        );
        assert_eq!(
            geometry.split(Position::new(-1, -16)),
            (ChunkCoord { x: -1, y: -1 }, 15)
        );
        assert_eq!(
            geometry.split(Position::new(-17, 5)),
            (ChunkCoord { x: -2, y: 0 }, 5 * 16 + 15)
        );
    }

    #[test]
    fn world_origin_inverts_split() {
        let geometry = ChunkGeometry::new(8).expect("geometry");
        for (x, y) in [(0, 0), (-1, -1), (9, -20), (-64, 63)] {
            let (coord, index) = geometry.split(Position::new(x, y));
            let origin = geometry.world_origin(coord);
            let local_x = (index % 8) as i32;
            let local_y = (index / 8) as i32;
            assert_eq!(Position::new(origin.x + local_x, origin.y + local_y), Position::new(x, y));
        }
    }

    #[test]
    fn generation_is_deterministic_per_coordinate() {
        let generator = default_generator();
        let geometry = ChunkGeometry::new(16).expect("geometry");
        let coord = ChunkCoord { x: -3, y: 7 };
        let first = generator.generate(geometry, coord, 0);
        let second = generator.generate(geometry, coord, 99);
        assert_eq!(first.tiles(), second.tiles());
        assert_eq!(second.last_access(), 99);
        assert!(!first.has_occupant());
    }

    #[test]
    fn single_band_ladder_yields_uniform_terrain() {
        let generator = TerrainGenerator::new(
            0.1,
            vec![TerrainBand {
                below: 1.0,
                kind: TerrainKind::Grass,
            }],
        );
        let geometry = ChunkGeometry::new(4).expect("geometry");
        let chunk = generator.generate(geometry, ChunkCoord { x: 2, y: 2 }, 0);
        assert!(chunk
            .tiles()
            .iter()
            .all(|tile| *tile == TerrainKind::Grass.tile()));
    }
}

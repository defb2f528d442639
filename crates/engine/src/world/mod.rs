mod chunk;
mod chunk_store;
mod entity;
mod noise;
mod tile;
#[allow(clippy::module_inception)]
mod world;

pub use chunk::{Chunk, ChunkCoord, ChunkGeometry, TerrainGenerator, MAX_CHUNK_SIZE};
pub use chunk_store::ChunkStore;
pub use entity::{Entity, EntityHandle, EntityRegistry, EntityType, Position, SpawnError};
pub use noise::{cubic_noise, frand, value_noise};
pub use tile::{palette_rgb, Color, Glyph, MapTile, Rgb, TerrainKind, BORDER_TILE, PALETTE};
pub use world::{MoveOutcome, World};

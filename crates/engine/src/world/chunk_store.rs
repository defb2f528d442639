use std::collections::HashMap;

use tracing::debug;

use super::chunk::{Chunk, ChunkCoord, ChunkGeometry, TerrainGenerator};
use super::entity::Position;
use super::tile::MapTile;

/// Sparse, lazily generated terrain keyed by chunk coordinate.
///
/// Chunks live in a slot vector indexed through `index`; `last_lookup` caches
/// the most recently resolved coordinate and slot so consecutive reads inside
/// one chunk skip the hash lookup. Eviction and generation both overwrite or
/// clear that cache before it can name a stale slot.
#[derive(Debug)]
pub struct ChunkStore {
    geometry: ChunkGeometry,
    generator: TerrainGenerator,
    eviction_window: u64,
    current_turn: u64,
    slots: Vec<Option<Chunk>>,
    free_slots: Vec<usize>,
    index: HashMap<ChunkCoord, usize>,
    last_lookup: Option<(ChunkCoord, usize)>,
    generated_total: u64,
    evicted_total: u64,
}

impl ChunkStore {
    pub fn new(geometry: ChunkGeometry, generator: TerrainGenerator, eviction_window: u64) -> Self {
        Self {
            geometry,
            generator,
            eviction_window,
            current_turn: 0,
            slots: Vec::new(),
            free_slots: Vec::new(),
            index: HashMap::new(),
            last_lookup: None,
            generated_total: 0,
            evicted_total: 0,
        }
    }

    pub fn geometry(&self) -> ChunkGeometry {
        self.geometry
    }

    /// Read access; generates the owning chunk if needed and touches it.
    pub fn get_tile(&mut self, position: Position) -> &MapTile {
        let (coord, local) = self.geometry.split(position);
        let slot = self.resolve_slot(coord);
        self.chunk_at(slot).tile(local)
    }

    /// Write access with the same resolution and touch semantics as [`Self::get_tile`].
    /// Terrain edits are not written back anywhere and vanish on eviction.
    pub fn get_mutable_tile(&mut self, position: Position) -> &mut MapTile {
        let (coord, local) = self.geometry.split(position);
        let slot = self.resolve_slot(coord);
        self.chunk_at_mut(slot).tile_mut(local)
    }

    /// Looks at a tile without generating or touching anything.
    #[cfg(test)]
    pub fn peek_tile(&self, position: Position) -> Option<&MapTile> {
        let (coord, local) = self.geometry.split(position);
        let slot = *self.index.get(&coord)?;
        self.slots[slot].as_ref().map(|chunk| chunk.tile(local))
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        let slot = *self.index.get(&coord)?;
        self.slots[slot].as_ref()
    }

    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.index.contains_key(&coord)
    }

    pub fn resident_count(&self) -> usize {
        self.index.len()
    }

    pub fn generated_total(&self) -> u64 {
        self.generated_total
    }

    pub fn evicted_total(&self) -> u64 {
        self.evicted_total
    }

    pub fn current_turn(&self) -> u64 {
        self.current_turn
    }

    pub fn tick(&mut self, turn: u64) {
        self.current_turn = self.current_turn.max(turn);
    }

    /// Drops every unpinned chunk whose last access is more than the eviction
    /// window behind the current turn. Returns the number of chunks removed.
    pub fn evict_stale(&mut self) -> usize {
        let current_turn = self.current_turn;
        let window = self.eviction_window;
        let slots = &self.slots;
        let stale: Vec<(ChunkCoord, usize)> = self
            .index
            .iter()
            .filter(|(_, slot)| {
                slots[**slot].as_ref().is_some_and(|chunk| {
                    current_turn.saturating_sub(chunk.last_access) > window
                        && !chunk.has_occupant()
                })
            })
            .map(|(coord, slot)| (*coord, *slot))
            .collect();

        for (coord, slot) in &stale {
            self.index.remove(coord);
            self.slots[*slot] = None;
            self.free_slots.push(*slot);
        }

        if !stale.is_empty() {
            if let Some((cached, _)) = self.last_lookup {
                if !self.index.contains_key(&cached) {
                    self.last_lookup = None;
                }
            }
            self.evicted_total = self.evicted_total.saturating_add(stale.len() as u64);
            debug!(
                evicted = stale.len(),
                resident = self.index.len(),
                turn = current_turn,
                "chunks_evicted"
            );
        }
        stale.len()
    }

    fn resolve_slot(&mut self, coord: ChunkCoord) -> usize {
        let slot = match self.last_lookup {
            Some((cached, slot)) if cached == coord => slot,
            _ => match self.index.get(&coord) {
                Some(slot) => *slot,
                None => self.generate(coord),
            },
        };
        self.last_lookup = Some((coord, slot));
        self.chunk_at_mut(slot).last_access = self.current_turn;
        slot
    }

    fn generate(&mut self, coord: ChunkCoord) -> usize {
        let chunk = self
            .generator
            .generate(self.geometry, coord, self.current_turn);
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = Some(chunk);
                slot
            }
            None => {
                self.slots.push(Some(chunk));
                self.slots.len() - 1
            }
        };
        self.index.insert(coord, slot);
        self.generated_total = self.generated_total.saturating_add(1);
        debug!(
            chunk_x = coord.x,
            chunk_y = coord.y,
            resident = self.index.len(),
            turn = self.current_turn,
            "chunk_generated"
        );
        slot
    }

    // Slots reached through `index` or `last_lookup` are always occupied.
    fn chunk_at(&self, slot: usize) -> &Chunk {
        self.slots[slot]
            .as_ref()
            .unwrap_or_else(|| unreachable!("chunk slot {slot} resolved but empty"))
    }

    fn chunk_at_mut(&mut self, slot: usize) -> &mut Chunk {
        self.slots[slot]
            .as_mut()
            .unwrap_or_else(|| unreachable!("chunk slot {slot} resolved but empty"))
    }
}

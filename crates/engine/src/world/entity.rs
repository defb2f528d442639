use thiserror::Error;

use super::tile::Glyph;

/// Stable 1-based entity reference. `0` is reserved for "no entity".
///
/// Handles are issued in spawn order and never reused: a killed entity keeps
/// its slot for the lifetime of the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u32);

impl EntityHandle {
    pub const NONE: Self = Self(0);

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    fn slot(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    fn from_slot(slot: usize) -> Self {
        Self(slot as u32 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `None` when either axis would leave the `i32` range.
    pub fn offset(self, delta: Position) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(delta.x)?,
            y: self.y.checked_add(delta.y)?,
        })
    }
}

/// Shared read-only prototype every entity of a kind points at.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityType {
    pub name: &'static str,
    pub glyph: Glyph,
    pub max_hp: u32,
    pub damage: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Entity {
    kind: Option<&'static EntityType>,
    pub position: Position,
    pub hp: u32,
    pub max_hp: u32,
    pub damage: u32,
}

impl Entity {
    fn from_type(kind: &'static EntityType, position: Position) -> Self {
        Self {
            kind: Some(kind),
            position,
            hp: kind.max_hp,
            max_hp: kind.max_hp,
            damage: kind.damage,
        }
    }

    /// The entity's prototype, or `None` once it has been killed.
    pub fn kind(&self) -> Option<&'static EntityType> {
        self.kind
    }

    pub fn is_alive(&self) -> bool {
        self.kind.is_some()
    }

    pub fn glyph(&self) -> Option<Glyph> {
        self.kind.map(|kind| kind.glyph)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("entity table is full ({capacity} slots)")]
    CapacityExhausted { capacity: usize },
    #[error("spawn destination ({x}, {y}) is occupied by entity {occupant}")]
    Occupied { x: i32, y: i32, occupant: u32 },
    #[error("spawn destination ({x}, {y}) is impassable")]
    Impassable { x: i32, y: i32 },
}

/// Fixed-capacity, append-only entity table.
#[derive(Debug)]
pub struct EntityRegistry {
    capacity: usize,
    entities: Vec<Entity>,
}

impl EntityRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entities: Vec::with_capacity(capacity.min(1024)),
        }
    }

    /// Appends an entity built from `kind` at the next free slot.
    ///
    /// This does no map bookkeeping; [`super::World::spawn`] wraps it with the
    /// occupancy policy.
    pub fn spawn(
        &mut self,
        kind: &'static EntityType,
        position: Position,
    ) -> Result<EntityHandle, SpawnError> {
        if self.entities.len() >= self.capacity {
            return Err(SpawnError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        self.entities.push(Entity::from_type(kind, position));
        Ok(EntityHandle::from_slot(self.entities.len() - 1))
    }

    /// Resolves a live entity. Returns `None` for the null handle, handles past
    /// the issued range and killed entities.
    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities
            .get(handle.slot()?)
            .filter(|entity| entity.is_alive())
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.entities
            .get_mut(handle.slot()?)
            .filter(|entity| entity.is_alive())
    }

    /// Logically deletes the entity. Returns its last position when it was alive.
    pub fn kill(&mut self, handle: EntityHandle) -> Option<Position> {
        let entity = self.get_mut(handle)?;
        entity.kind = None;
        entity.hp = 0;
        Some(entity.position)
    }

    /// Number of issued handles, dead ones included.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn live_count(&self) -> usize {
        self.entities.iter().filter(|entity| entity.is_alive()).count()
    }

    #[cfg(test)]
    pub fn live_handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.is_alive())
            .map(|(slot, _)| EntityHandle::from_slot(slot))
    }
}

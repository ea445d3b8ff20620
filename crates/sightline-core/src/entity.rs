//! Generational entity identifiers for the data-oriented backend.

use std::fmt;

/// Identifies an entity in a batched entity store.
///
/// Two ids are equal only if both the slot index and the generation match,
/// so an id kept after its entity was despawned never aliases the slot's
/// next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates an id from a slot index and generation.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the generation of the slot when this id was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

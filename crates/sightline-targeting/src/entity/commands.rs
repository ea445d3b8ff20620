//! Deferred structural changes to the entity store.

use glam::Vec3;
use sightline_core::{Aabb, Edge, EntityId};

use super::store::{EntityData, EntityStore};

/// One queued structural change.
#[derive(Debug, Clone)]
pub enum Command {
    /// Create an entity.
    Spawn(Box<EntityData>),
    /// Remove an entity.
    Despawn(EntityId),
    /// Move an entity and update its enumeration order.
    Place {
        /// Target entity.
        entity: EntityId,
        /// World position.
        position: Vec3,
        /// World bounds.
        bounds: Aabb,
        /// Enumeration order.
        order: u32,
    },
    /// Replace an entity's geometry.
    SetGeometry {
        /// Target entity.
        entity: EntityId,
        /// Source GeoInfo revision.
        revision: Option<u64>,
        /// Whether the object has a mesh.
        has_mesh: bool,
        /// World-space edges.
        edges: Vec<Edge>,
        /// Welded world-space vertices.
        vertices: Vec<Vec3>,
    },
}

/// Counts of what one [`CommandQueue::apply`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Entities created.
    pub spawned: usize,
    /// Entities removed.
    pub despawned: usize,
    /// Entities moved or reordered.
    pub placed: usize,
    /// Geometry replacements.
    pub geometry: usize,
    /// Commands that targeted a stale entity.
    pub skipped: usize,
}

impl ApplyStats {
    /// Returns whether anything changed.
    pub fn is_empty(&self) -> bool {
        self.spawned + self.despawned + self.placed + self.geometry == 0
    }
}

/// Buffer for structural changes made while jobs may be reading the store.
///
/// Commands are applied in queue order at the sync point at the start of
/// the entity backend's frame, before any job is scheduled.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Queues an entity spawn.
    pub fn spawn(&mut self, data: EntityData) {
        self.push(Command::Spawn(Box::new(data)));
    }

    /// Queues an entity despawn.
    pub fn despawn(&mut self, entity: EntityId) {
        self.push(Command::Despawn(entity));
    }

    /// Queues a placement update.
    pub fn place(&mut self, entity: EntityId, position: Vec3, bounds: Aabb, order: u32) {
        self.push(Command::Place {
            entity,
            position,
            bounds,
            order,
        });
    }

    /// Queues a geometry replacement.
    pub fn set_geometry(
        &mut self,
        entity: EntityId,
        revision: Option<u64>,
        has_mesh: bool,
        edges: Vec<Edge>,
        vertices: Vec<Vec3>,
    ) {
        self.push(Command::SetGeometry {
            entity,
            revision,
            has_mesh,
            edges,
            vertices,
        });
    }

    /// Returns the number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Discards all queued commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Applies and drains every queued command, then compacts the store.
    pub fn apply(&mut self, store: &mut EntityStore) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for command in self.commands.drain(..) {
            let applied = match command {
                Command::Spawn(data) => {
                    store.spawn(*data);
                    stats.spawned += 1;
                    true
                }
                Command::Despawn(entity) => {
                    let done = store.despawn(entity);
                    stats.despawned += usize::from(done);
                    done
                }
                Command::Place {
                    entity,
                    position,
                    bounds,
                    order,
                } => {
                    let done = store.set_placement(entity, position, bounds, order);
                    stats.placed += usize::from(done);
                    done
                }
                Command::SetGeometry {
                    entity,
                    revision,
                    has_mesh,
                    edges,
                    vertices,
                } => {
                    let done = store.set_geometry(entity, revision, has_mesh, edges, vertices);
                    stats.geometry += usize::from(done);
                    done
                }
            };
            stats.skipped += usize::from(!applied);
        }
        store.compact();
        stats
    }
}

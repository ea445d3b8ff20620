//! Struct-of-arrays storage mirroring tracked objects as entities.
//!
//! Per-entity columns are dense and indexed together. Edges and vertices of
//! all entities live in two flattened buffers, with an owner column so
//! chunked jobs can run over them without touching per-entity data. A sparse
//! slot table maps generational [`EntityId`]s to dense rows.

use std::collections::HashMap;
use std::ops::Range;

use glam::Vec3;
use sightline_core::{Aabb, Edge, EntityId, GeoInfo, ObjectHandle};

/// A contiguous run inside a flattened buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    /// First element.
    pub start: u32,
    /// Element count.
    pub len: u32,
}

impl Span {
    /// Returns the span as a `usize` range.
    pub fn range(self) -> Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

/// Everything needed to create one entity.
#[derive(Debug, Clone)]
pub struct EntityData {
    /// The mirrored scene object.
    pub handle: ObjectHandle,
    /// World position.
    pub position: Vec3,
    /// World bounds.
    pub bounds: Aabb,
    /// Position in the tracker's candidate list.
    pub order: u32,
    /// Whether the object has a mesh.
    pub has_mesh: bool,
    /// GeoInfo revision the geometry was copied from, if copied.
    pub revision: Option<u64>,
    /// World-space edges.
    pub edges: Vec<Edge>,
    /// Welded world-space vertices.
    pub vertices: Vec<Vec3>,
}

impl EntityData {
    /// Copies placement, and geometry when `with_geometry` is set, from a
    /// GeoInfo.
    pub fn from_geo_info(info: &GeoInfo, order: u32, with_geometry: bool) -> Self {
        let (revision, edges, vertices) = if with_geometry {
            (Some(info.revision()), info.edges().to_vec(), info.vertices().to_vec())
        } else {
            (None, Vec::new(), Vec::new())
        };
        Self {
            handle: info.handle(),
            position: info.position(),
            bounds: *info.bounds(),
            order,
            has_mesh: info.mesh().is_some(),
            revision,
            edges,
            vertices,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    dense: Option<u32>,
}

/// Dense entity storage with flattened geometry.
#[derive(Debug, Default)]
pub struct EntityStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_handle: HashMap<ObjectHandle, EntityId>,

    entities: Vec<EntityId>,
    handles: Vec<ObjectHandle>,
    positions: Vec<Vec3>,
    bounds: Vec<Aabb>,
    orders: Vec<u32>,
    has_mesh: Vec<bool>,
    revisions: Vec<Option<u64>>,
    edge_spans: Vec<Span>,
    vertex_spans: Vec<Span>,

    edges: Vec<Edge>,
    edge_owners: Vec<u32>,
    vertices: Vec<Vec3>,
    vertex_owners: Vec<u32>,

    needs_compact: bool,
}

#[allow(clippy::cast_possible_truncation)]
fn to_u32(n: usize) -> u32 {
    n as u32
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if there are no live entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns whether `entity` is alive (index in range, generation current).
    pub fn contains(&self, entity: EntityId) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Returns the entity mirroring `handle`.
    pub fn entity_for(&self, handle: ObjectHandle) -> Option<EntityId> {
        self.by_handle.get(&handle).copied()
    }

    /// Returns the dense row of `entity`.
    pub fn dense_index(&self, entity: EntityId) -> Option<usize> {
        let slot = self.slots.get(entity.index() as usize)?;
        if slot.generation != entity.generation() {
            return None;
        }
        slot.dense.map(|d| d as usize)
    }

    /// Creates an entity. An existing entity for the same handle is
    /// returned unchanged.
    pub fn spawn(&mut self, data: EntityData) -> EntityId {
        if let Some(existing) = self.entity_for(data.handle) {
            return existing;
        }

        let dense = to_u32(self.entities.len());
        let entity = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.dense = Some(dense);
                EntityId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    dense: Some(dense),
                });
                EntityId::new(to_u32(self.slots.len() - 1), 0)
            }
        };

        self.by_handle.insert(data.handle, entity);
        self.entities.push(entity);
        self.handles.push(data.handle);
        self.positions.push(data.position);
        self.bounds.push(data.bounds);
        self.orders.push(data.order);
        self.has_mesh.push(data.has_mesh);
        self.revisions.push(data.revision);
        let (edge_span, vertex_span) = self.append_geometry(dense, data.edges, data.vertices);
        self.edge_spans.push(edge_span);
        self.vertex_spans.push(vertex_span);
        entity
    }

    /// Removes an entity. Returns `false` for stale or unknown ids.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let Some(dense) = self.dense_index(entity) else {
            return false;
        };

        let slot = &mut self.slots[entity.index() as usize];
        slot.dense = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(entity.index());
        self.by_handle.remove(&self.handles[dense]);

        self.entities.swap_remove(dense);
        self.handles.swap_remove(dense);
        self.positions.swap_remove(dense);
        self.bounds.swap_remove(dense);
        self.orders.swap_remove(dense);
        self.has_mesh.swap_remove(dense);
        self.revisions.swap_remove(dense);
        self.edge_spans.swap_remove(dense);
        self.vertex_spans.swap_remove(dense);

        if let Some(&moved) = self.entities.get(dense) {
            self.slots[moved.index() as usize].dense = Some(to_u32(dense));
        }
        self.needs_compact = true;
        true
    }

    /// Updates placement and enumeration order.
    pub fn set_placement(&mut self, entity: EntityId, position: Vec3, bounds: Aabb, order: u32) -> bool {
        let Some(dense) = self.dense_index(entity) else {
            return false;
        };
        self.positions[dense] = position;
        self.bounds[dense] = bounds;
        self.orders[dense] = order;
        true
    }

    /// Replaces an entity's geometry.
    ///
    /// New data is appended to the flattened buffers; the old run stays as
    /// garbage until [`compact`](Self::compact).
    pub fn set_geometry(
        &mut self,
        entity: EntityId,
        revision: Option<u64>,
        has_mesh: bool,
        edges: Vec<Edge>,
        vertices: Vec<Vec3>,
    ) -> bool {
        let Some(dense) = self.dense_index(entity) else {
            return false;
        };
        let (edge_span, vertex_span) = self.append_geometry(to_u32(dense), edges, vertices);
        if self.edge_spans[dense].len > 0 || self.vertex_spans[dense].len > 0 {
            self.needs_compact = true;
        }
        self.edge_spans[dense] = edge_span;
        self.vertex_spans[dense] = vertex_span;
        self.revisions[dense] = revision;
        self.has_mesh[dense] = has_mesh;
        true
    }

    fn append_geometry(&mut self, dense: u32, edges: Vec<Edge>, vertices: Vec<Vec3>) -> (Span, Span) {
        let edge_span = Span {
            start: to_u32(self.edges.len()),
            len: to_u32(edges.len()),
        };
        let vertex_span = Span {
            start: to_u32(self.vertices.len()),
            len: to_u32(vertices.len()),
        };
        self.edge_owners.resize(self.edge_owners.len() + edges.len(), dense);
        self.vertex_owners.resize(self.vertex_owners.len() + vertices.len(), dense);
        self.edges.extend(edges);
        self.vertices.extend(vertices);
        (edge_span, vertex_span)
    }

    /// Rewrites the flattened buffers in dense order, dropping garbage and
    /// fixing owner rows moved by removals. Returns `false` if nothing had
    /// to move.
    pub fn compact(&mut self) -> bool {
        if !self.needs_compact {
            return false;
        }
        let mut edges = Vec::with_capacity(self.edges.len());
        let mut edge_owners = Vec::with_capacity(self.edges.len());
        let mut vertices = Vec::with_capacity(self.vertices.len());
        let mut vertex_owners = Vec::with_capacity(self.vertices.len());

        for dense in 0..self.entities.len() {
            let owner = to_u32(dense);
            let old = self.edge_spans[dense];
            self.edge_spans[dense] = Span {
                start: to_u32(edges.len()),
                len: old.len,
            };
            edges.extend_from_slice(&self.edges[old.range()]);
            edge_owners.resize(edges.len(), owner);

            let old = self.vertex_spans[dense];
            self.vertex_spans[dense] = Span {
                start: to_u32(vertices.len()),
                len: old.len,
            };
            vertices.extend_from_slice(&self.vertices[old.range()]);
            vertex_owners.resize(vertices.len(), owner);
        }

        self.edges = edges;
        self.edge_owners = edge_owners;
        self.vertices = vertices;
        self.vertex_owners = vertex_owners;
        self.needs_compact = false;
        true
    }

    /// Removes every entity. Ids handed out before stay stale.
    pub fn clear(&mut self) {
        let live: Vec<EntityId> = self.entities.clone();
        for entity in live {
            self.despawn(entity);
        }
        self.compact();
    }

    /// Returns dense rows sorted by enumeration order.
    pub fn rows_by_order(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..self.entities.len()).collect();
        rows.sort_by_key(|&row| self.orders[row]);
        rows
    }

    /// Entity ids, by dense row.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Object handles, by dense row.
    pub fn handles(&self) -> &[ObjectHandle] {
        &self.handles
    }

    /// World positions, by dense row.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// World bounds, by dense row.
    pub fn bounds(&self) -> &[Aabb] {
        &self.bounds
    }

    /// Mesh presence, by dense row.
    pub fn has_mesh(&self) -> &[bool] {
        &self.has_mesh
    }

    /// Copied GeoInfo revision of `entity`'s geometry.
    pub fn revision(&self, entity: EntityId) -> Option<u64> {
        self.dense_index(entity).and_then(|d| self.revisions[d])
    }

    /// Placement of `entity` as `(position, bounds, order)`.
    pub fn placement(&self, entity: EntityId) -> Option<(Vec3, Aabb, u32)> {
        self.dense_index(entity)
            .map(|d| (self.positions[d], self.bounds[d], self.orders[d]))
    }

    /// Edge run of a dense row.
    pub fn edge_span(&self, row: usize) -> Span {
        self.edge_spans[row]
    }

    /// Vertex run of a dense row.
    pub fn vertex_span(&self, row: usize) -> Span {
        self.vertex_spans[row]
    }

    /// Flattened edges of all entities.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Owner row of every flattened edge.
    pub fn edge_owners(&self) -> &[u32] {
        &self.edge_owners
    }

    /// Flattened vertices of all entities.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Owner row of every flattened vertex.
    pub fn vertex_owners(&self) -> &[u32] {
        &self.vertex_owners
    }

    /// Whether garbage is waiting for [`compact`](Self::compact).
    pub fn needs_compact(&self) -> bool {
        self.needs_compact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(id: u64, edges: usize) -> EntityData {
        EntityData {
            handle: ObjectHandle(id),
            position: Vec3::splat(id as f32),
            bounds: Aabb::from_point(Vec3::splat(id as f32)),
            order: to_u32(id as usize),
            has_mesh: edges > 0,
            revision: Some(1),
            edges: (0..edges)
                .map(|i| Edge::new(Vec3::ZERO, Vec3::splat(i as f32 + 1.0), 0, 1))
                .collect(),
            vertices: Vec::new(),
        }
    }

    #[test]
    fn test_spawn_and_lookup() {
        let mut store = EntityStore::new();
        let a = store.spawn(data(10, 2));
        let b = store.spawn(data(11, 3));
        assert_eq!(store.len(), 2);
        assert_eq!(store.entity_for(ObjectHandle(11)), Some(b));
        assert_eq!(store.spawn(data(10, 2)), a);
        assert_eq!(store.edges().len(), 5);
        assert_eq!(store.edge_owners(), &[0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_despawn_bumps_generation() {
        let mut store = EntityStore::new();
        let a = store.spawn(data(1, 0));
        assert!(store.despawn(a));
        assert!(!store.despawn(a));
        assert!(!store.contains(a));

        let b = store.spawn(data(2, 0));
        assert_eq!(b.index(), a.index());
        assert_eq!(b.generation(), a.generation() + 1);
        assert!(store.contains(b));
    }

    #[test]
    fn test_swap_remove_keeps_rows_consistent() {
        let mut store = EntityStore::new();
        let a = store.spawn(data(1, 2));
        let b = store.spawn(data(2, 1));
        let c = store.spawn(data(3, 3));

        store.despawn(a);
        assert!(store.needs_compact());
        assert!(store.compact());

        assert_eq!(store.len(), 2);
        let row_c = store.dense_index(c).unwrap();
        let row_b = store.dense_index(b).unwrap();
        assert_eq!(store.handles()[row_c], ObjectHandle(3));
        assert_eq!(store.edge_span(row_c).len, 3);
        assert_eq!(store.edge_span(row_b).len, 1);
        assert_eq!(store.edges().len(), 4);
        for (i, owner) in store.edge_owners().iter().enumerate() {
            assert!(store.edge_span(*owner as usize).range().contains(&i));
        }
    }

    #[test]
    fn test_set_geometry_replaces_run() {
        let mut store = EntityStore::new();
        let a = store.spawn(data(1, 2));
        let edges = vec![Edge::new(Vec3::ZERO, Vec3::X, 0, 1)];
        assert!(store.set_geometry(a, Some(2), true, edges, vec![Vec3::ZERO, Vec3::X]));
        store.compact();
        assert_eq!(store.edges().len(), 1);
        assert_eq!(store.vertices().len(), 2);
        assert_eq!(store.revision(a), Some(2));
    }

    #[test]
    fn test_rows_by_order() {
        let mut store = EntityStore::new();
        store.spawn(data(5, 0));
        let b = store.spawn(data(1, 0));
        store.spawn(data(3, 0));
        store.set_placement(b, Vec3::ZERO, Aabb::from_point(Vec3::ZERO), 9);
        let handles: Vec<ObjectHandle> = store
            .rows_by_order()
            .into_iter()
            .map(|row| store.handles()[row])
            .collect();
        assert_eq!(handles, vec![ObjectHandle(3), ObjectHandle(5), ObjectHandle(1)]);
    }

    #[test]
    fn test_clear_empties_buffers() {
        let mut store = EntityStore::new();
        let a = store.spawn(data(1, 2));
        store.clear();
        assert!(store.is_empty());
        assert!(store.edges().is_empty());
        assert!(!store.contains(a));
        assert_eq!(store.entity_for(ObjectHandle(1)), None);
    }
}

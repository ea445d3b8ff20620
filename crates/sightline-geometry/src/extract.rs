//! Mesh-to-edge extraction.
//!
//! Every triangle contributes its three undirected edges. Endpoints are moved
//! to world space and welded: vertices closer than the dedup tolerance
//! collapse onto the first one seen. Edges are then deduplicated on the
//! welded vertex pair, so hashing and equality use the same basis.

use std::collections::{HashMap, HashSet};

use glam::{Mat4, Vec3};
use sightline_core::{Edge, GeoInfo, Mesh, EDGE_TOLERANCE};

/// Edges and welded vertices extracted from one mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedGeometry {
    /// Deduplicated world-space edges, in first-encounter order.
    pub edges: Vec<Edge>,
    /// Welded world-space vertices, in first-encounter order.
    pub vertices: Vec<Vec3>,
}

/// Turns triangle meshes into deduplicated world-space edge lists.
#[derive(Debug, Clone, Copy)]
pub struct GeometryExtractor {
    tolerance: f32,
}

impl Default for GeometryExtractor {
    fn default() -> Self {
        Self {
            tolerance: EDGE_TOLERANCE,
        }
    }
}

impl GeometryExtractor {
    /// Creates an extractor using [`EDGE_TOLERANCE`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor with a custom weld tolerance.
    pub fn with_tolerance(tolerance: f32) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
        }
    }

    /// Returns the weld tolerance.
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Extracts edges from a mesh placed at `transform`.
    pub fn extract(&self, mesh: &Mesh, transform: Mat4) -> ExtractedGeometry {
        self.extract_raw(mesh.vertices(), mesh.triangles(), transform)
    }

    /// Extracts edges from raw buffers.
    ///
    /// Triangles with out-of-range indices are skipped. A buffer with no
    /// triangles yields empty geometry.
    pub fn extract_raw(
        &self,
        vertices: &[Vec3],
        triangles: &[[u32; 3]],
        transform: Mat4,
    ) -> ExtractedGeometry {
        if triangles.is_empty() {
            return ExtractedGeometry::default();
        }

        let world: Vec<Vec3> = vertices
            .iter()
            .map(|v| transform.transform_point3(*v))
            .collect();

        let mut welder = VertexWelder::new(self.tolerance);
        let mut seen: HashSet<(u32, u32)> = HashSet::with_capacity(triangles.len() * 2);
        let mut edges = Vec::with_capacity(triangles.len() * 3 / 2);
        let mut welded = vec![None; world.len()];

        for tri in triangles {
            if tri.iter().any(|&i| i as usize >= world.len()) {
                continue;
            }
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let wa = *welded[a as usize].get_or_insert_with(|| welder.weld(world[a as usize], a));
                let wb = *welded[b as usize].get_or_insert_with(|| welder.weld(world[b as usize], b));
                if wa == wb {
                    continue;
                }
                let key = if wa < wb { (wa, wb) } else { (wb, wa) };
                if seen.insert(key) {
                    edges.push(Edge::new(
                        welder.position(wa),
                        welder.position(wb),
                        welder.source_index(wa),
                        welder.source_index(wb),
                    ));
                }
            }
        }

        ExtractedGeometry {
            edges,
            vertices: welder.into_positions(),
        }
    }

    /// Extracts geometry for a GeoInfo from its own mesh and transform.
    ///
    /// A GeoInfo without a mesh receives empty geometry.
    pub fn extract_into(&self, info: &mut GeoInfo) {
        let geometry = match info.mesh() {
            Some(mesh) => self.extract(mesh, info.transform()),
            None => ExtractedGeometry::default(),
        };
        log::trace!(
            "extracted {} edges, {} vertices for {}",
            geometry.edges.len(),
            geometry.vertices.len(),
            info.handle()
        );
        info.set_geometry(geometry.edges, geometry.vertices);
    }
}

/// Spatial hash that merges points closer than a tolerance.
///
/// Cells are tolerance-sized, so any match lies in the point's own cell or
/// one of its 26 neighbours.
struct VertexWelder {
    cell_size: f32,
    tolerance_sq: f32,
    cells: HashMap<[i32; 3], Vec<u32>>,
    positions: Vec<Vec3>,
    sources: Vec<u32>,
}

impl VertexWelder {
    fn new(tolerance: f32) -> Self {
        Self {
            cell_size: tolerance.max(1e-6),
            tolerance_sq: tolerance * tolerance,
            cells: HashMap::new(),
            positions: Vec::new(),
            sources: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, p: Vec3) -> [i32; 3] {
        let c = (p / self.cell_size).floor();
        [c.x as i32, c.y as i32, c.z as i32]
    }

    /// Returns the welded id for `p`, adding a new vertex if nothing is close.
    #[allow(clippy::cast_possible_truncation)]
    fn weld(&mut self, p: Vec3, source: u32) -> u32 {
        let [cx, cy, cz] = self.cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = [cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz)];
                    if let Some(ids) = self.cells.get(&key) {
                        if let Some(&id) = ids
                            .iter()
                            .find(|&&id| self.positions[id as usize].distance_squared(p) <= self.tolerance_sq)
                        {
                            return id;
                        }
                    }
                }
            }
        }

        let id = self.positions.len() as u32;
        self.positions.push(p);
        self.sources.push(source);
        self.cells.entry([cx, cy, cz]).or_default().push(id);
        id
    }

    fn position(&self, id: u32) -> Vec3 {
        self.positions[id as usize]
    }

    fn source_index(&self, id: u32) -> u32 {
        self.sources[id as usize]
    }

    fn into_positions(self) -> Vec<Vec3> {
        self.positions
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::primitives::{box_mesh, split_vertex_cube, unit_cube};

    #[test]
    fn test_unit_cube_has_18_edges() {
        let geometry = GeometryExtractor::new().extract(&unit_cube(), Mat4::IDENTITY);
        assert_eq!(geometry.edges.len(), 18);
        assert_eq!(geometry.vertices.len(), 8);
    }

    #[test]
    fn test_split_vertex_cube_welds_to_18_edges() {
        let mesh = split_vertex_cube();
        assert_eq!(mesh.vertices().len(), 24);
        let geometry = GeometryExtractor::new().extract(&mesh, Mat4::IDENTITY);
        assert_eq!(geometry.edges.len(), 18);
        assert_eq!(geometry.vertices.len(), 8);
    }

    #[test]
    fn test_no_duplicate_edges() {
        let geometry = GeometryExtractor::new().extract(&split_vertex_cube(), Mat4::IDENTITY);
        for (i, a) in geometry.edges.iter().enumerate() {
            for b in &geometry.edges[i + 1..] {
                assert!(!a.is_same(b));
            }
        }
    }

    #[test]
    fn test_empty_mesh_yields_no_edges() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], Vec::new());
        let geometry = GeometryExtractor::new().extract(&mesh, Mat4::IDENTITY);
        assert!(geometry.edges.is_empty());
        assert!(geometry.vertices.is_empty());
    }

    #[test]
    fn test_shared_edge_counted_once() {
        // Two triangles forming a quad with opposite windings on the shared edge.
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        let geometry =
            GeometryExtractor::new().extract_raw(&vertices, &[[0, 1, 2], [0, 2, 3]], Mat4::IDENTITY);
        assert_eq!(geometry.edges.len(), 5);
    }

    #[test]
    fn test_endpoints_are_world_space() {
        let transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
        let geometry = GeometryExtractor::new().extract(&unit_cube(), transform);
        for edge in &geometry.edges {
            assert!(edge.start.z >= 9.5 - 1e-5 && edge.start.z <= 10.5 + 1e-5);
            assert!(edge.end.z >= 9.5 - 1e-5 && edge.end.z <= 10.5 + 1e-5);
        }
    }

    #[test]
    fn test_source_indices_refer_to_input_buffer() {
        let mesh = unit_cube();
        let geometry = GeometryExtractor::new().extract(&mesh, Mat4::IDENTITY);
        for edge in &geometry.edges {
            assert_eq!(mesh.vertices()[edge.start_index as usize], edge.start);
            assert_eq!(mesh.vertices()[edge.end_index as usize], edge.end);
        }
    }

    #[test]
    fn test_collapsed_triangle_drops_zero_length_edges() {
        let vertices = vec![Vec3::ZERO, Vec3::new(0.01, 0.0, 0.0), Vec3::Y];
        let geometry = GeometryExtractor::new().extract_raw(&vertices, &[[0, 1, 2]], Mat4::IDENTITY);
        assert_eq!(geometry.edges.len(), 1);
        assert_eq!(geometry.vertices.len(), 2);
    }

    #[test]
    fn test_weld_across_cell_boundary() {
        // 0.099 and 0.101 straddle a 0.1 cell boundary but are 0.002 apart.
        let vertices = vec![
            Vec3::new(0.099, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.101, 0.0, 0.0),
        ];
        let geometry = GeometryExtractor::new()
            .extract_raw(&vertices, &[[0, 1, 2], [3, 1, 2]], Mat4::IDENTITY);
        assert_eq!(geometry.vertices.len(), 3);
        assert_eq!(geometry.edges.len(), 3);
    }

    #[test]
    fn test_extract_into_geo_info() {
        use std::sync::Arc;
        use sightline_core::ObjectHandle;

        let mut info = GeoInfo::new(ObjectHandle(1), Mat4::IDENTITY, Some(Arc::new(unit_cube())), None);
        GeometryExtractor::new().extract_into(&mut info);
        assert!(!info.is_dirty());
        assert_eq!(info.edges().len(), 18);

        let mut bare = GeoInfo::new(ObjectHandle(2), Mat4::IDENTITY, None, None);
        GeometryExtractor::new().extract_into(&mut bare);
        assert!(!bare.is_dirty());
        assert!(bare.edges().is_empty());
    }

    proptest! {
        #[test]
        fn prop_boxes_always_have_18_distinct_edges(
            hx in 0.2f32..20.0, hy in 0.2f32..20.0, hz in 0.2f32..20.0,
            tx in -100.0f32..100.0, ty in -100.0f32..100.0, tz in -100.0f32..100.0,
        ) {
            let mesh = box_mesh(Vec3::new(hx, hy, hz));
            let geometry = GeometryExtractor::new()
                .extract(&mesh, Mat4::from_translation(Vec3::new(tx, ty, tz)));
            prop_assert_eq!(geometry.edges.len(), 18);
            prop_assert_eq!(geometry.vertices.len(), 8);
            for (i, a) in geometry.edges.iter().enumerate() {
                for b in &geometry.edges[i + 1..] {
                    prop_assert!(!a.is_same(b));
                }
            }
        }
    }
}

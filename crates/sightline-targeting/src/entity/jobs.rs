//! Chunked parallel jobs over the entity store's contiguous buffers.
//!
//! Every job runs inside the batch context's pool and returns only after all
//! chunks are done. Outputs go to disjoint chunks of pre-sized buffers.
//! Jobs that read another job's output take it as a finished slice, which
//! fixes their order: bounds, then edges and vertices, then projection.

use glam::Vec3;
use rayon::prelude::*;
use sightline_core::{Aabb, Edge, EntityId, Frustum, ObjectHandle, Ray, Target, TargetElement};

use super::batch::BatchContext;

/// One point to project, tagged with its owning row and element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInput {
    /// World-space candidate point.
    pub position: Vec3,
    /// Dense row of the owning entity.
    pub row: u32,
    /// Which part of the entity the point stands for.
    pub element: TargetElement,
}

/// Writes one visibility flag per entity from its bounds.
pub fn bounds_job(batch: &BatchContext, frustum: &Frustum, bounds: &[Aabb], visible: &mut [bool]) -> usize {
    let chunk = batch.chunk_size();
    batch.install(|| {
        visible
            .par_chunks_mut(chunk)
            .zip(bounds.par_chunks(chunk))
            .map(|(flags, boxes)| {
                let mut count = 0;
                for (flag, aabb) in flags.iter_mut().zip(boxes) {
                    *flag = frustum.contains_bounds(aabb);
                    count += usize::from(*flag);
                }
                count
            })
            .sum()
    })
}

/// Writes one flag per flattened edge; edges of hidden owners stay hidden.
pub fn edge_job(
    batch: &BatchContext,
    frustum: &Frustum,
    edges: &[Edge],
    owners: &[u32],
    owner_visible: &[bool],
    flags: &mut [bool],
) -> usize {
    let chunk = batch.chunk_size();
    batch.install(|| {
        flags
            .par_chunks_mut(chunk)
            .zip(edges.par_chunks(chunk))
            .zip(owners.par_chunks(chunk))
            .map(|((flags, edges), owners)| {
                let mut count = 0;
                for ((flag, edge), owner) in flags.iter_mut().zip(edges).zip(owners) {
                    *flag = owner_visible[*owner as usize] && frustum.contains_edge(edge);
                    count += usize::from(*flag);
                }
                count
            })
            .sum()
    })
}

/// Writes one flag per flattened vertex; vertices of hidden owners stay
/// hidden.
pub fn vertex_job(
    batch: &BatchContext,
    frustum: &Frustum,
    vertices: &[Vec3],
    owners: &[u32],
    owner_visible: &[bool],
    flags: &mut [bool],
) -> usize {
    let chunk = batch.chunk_size();
    batch.install(|| {
        flags
            .par_chunks_mut(chunk)
            .zip(vertices.par_chunks(chunk))
            .zip(owners.par_chunks(chunk))
            .map(|((flags, vertices), owners)| {
                let mut count = 0;
                for ((flag, vertex), owner) in flags.iter_mut().zip(vertices).zip(owners) {
                    *flag = owner_visible[*owner as usize] && frustum.contains(*vertex);
                    count += usize::from(*flag);
                }
                count
            })
            .sum()
    })
}

/// Projects every input onto the ray, keeping input order.
pub fn projection_job(
    batch: &BatchContext,
    ray: &Ray,
    inputs: &[ProjectionInput],
    handles: &[ObjectHandle],
    entities: &[EntityId],
) -> Vec<Target> {
    let chunk = batch.chunk_size();
    batch.install(|| {
        inputs
            .par_chunks(chunk)
            .flat_map_iter(|inputs| {
                inputs.iter().map(move |input| {
                    let row = input.row as usize;
                    Target::project(ray, input.position, handles[row], input.element)
                        .with_entity(entities[row])
                })
            })
            .collect()
    })
}

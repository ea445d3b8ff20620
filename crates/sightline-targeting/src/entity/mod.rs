//! The batched data-oriented backend.
//!
//! Tracked objects are mirrored into an [`EntityStore`]. Structural changes
//! are queued in a [`CommandQueue`] and applied at the sync point that opens
//! each frame; after that the store is read-only while chunked jobs run in
//! the backend's own [`BatchContext`] pool.

pub mod batch;
pub mod commands;
pub mod jobs;
pub mod store;

use std::collections::HashSet;

use sightline_core::{
    rank_targets, BackendKind, BatchSettings, FrameContext, FrameOutput, GeoInfo,
    GeometryGranularity, ObjectHandle, Result, SeenGeometry, TargetElement, TargetingBackend,
};

use crate::resolve::element_index;
use batch::BatchContext;
use commands::{ApplyStats, CommandQueue};
use jobs::{bounds_job, edge_job, projection_job, vertex_job, ProjectionInput};
use store::{EntityData, EntityStore};

pub use batch::{ScratchBuffer, ScratchPool};

/// Runs classification and resolution as chunked jobs over an entity store.
#[derive(Debug)]
pub struct EntityBackend {
    store: EntityStore,
    queue: CommandQueue,
    batch: Option<BatchContext>,
    synced_generation: Option<u64>,
    frames: u64,
}

impl EntityBackend {
    /// Creates the backend and its batch context.
    pub fn new(settings: &BatchSettings) -> Result<Self> {
        Ok(Self {
            store: EntityStore::new(),
            queue: CommandQueue::new(),
            batch: Some(BatchContext::new(settings)?),
            synced_generation: None,
            frames: 0,
        })
    }

    /// Returns the entity store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Returns the batch context, or `None` after teardown.
    pub fn batch(&self) -> Option<&BatchContext> {
        self.batch.as_ref()
    }

    /// Returns the number of frames this backend has run.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Queues the changes needed to mirror `candidates` and applies them.
    ///
    /// Entities of objects that left the candidate list are only looked for
    /// when the tracker's scan generation moved; a new generation also
    /// recopies every entity's geometry.
    pub fn sync(&mut self, candidates: &[GeoInfo], with_geometry: bool, scan_generation: u64) -> ApplyStats {
        let rescanned = self.synced_generation != Some(scan_generation);
        if rescanned {
            let live: HashSet<ObjectHandle> = candidates.iter().map(GeoInfo::handle).collect();
            for (entity, handle) in self.store.entities().iter().zip(self.store.handles()) {
                if !live.contains(handle) {
                    self.queue.despawn(*entity);
                }
            }
            self.synced_generation = Some(scan_generation);
        }

        for (order, info) in candidates.iter().enumerate() {
            let order = element_index(order);
            let Some(entity) = self.store.entity_for(info.handle()) else {
                self.queue.spawn(EntityData::from_geo_info(info, order, with_geometry));
                continue;
            };

            if self.store.placement(entity) != Some((info.position(), *info.bounds(), order)) {
                self.queue.place(entity, info.position(), *info.bounds(), order);
            }
            let stale = with_geometry && self.store.revision(entity) != Some(info.revision());
            if rescanned || stale {
                let data = EntityData::from_geo_info(info, order, with_geometry);
                self.queue
                    .set_geometry(entity, data.revision, data.has_mesh, data.edges, data.vertices);
            }
        }

        let stats = self.queue.apply(&mut self.store);
        if !stats.is_empty() {
            log::debug!(
                "entity sync: +{} -{} moved {} geometry {} ({} entities)",
                stats.spawned,
                stats.despawned,
                stats.placed,
                stats.geometry,
                self.store.len()
            );
        }
        stats
    }
}

impl TargetingBackend for EntityBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Entity
    }

    fn run_frame(&mut self, ctx: &mut FrameContext<'_>) -> FrameOutput {
        if self.batch.is_none() {
            log::warn!("entity backend ran after teardown");
            return FrameOutput::default();
        }
        self.frames += 1;
        let config = ctx.config;
        let with_geometry = config.granularity.needs_geometry();
        self.sync(ctx.candidates, with_geometry, ctx.scan_generation);

        let Some(batch) = self.batch.as_ref() else {
            return FrameOutput::default();
        };
        let store = &self.store;
        let frustum = ctx.frustum;

        let mut visible = batch.flags(store.len());
        let visible_objects = bounds_job(batch, frustum, store.bounds(), &mut visible);

        let mut edge_flags = batch.flags(if with_geometry { store.edges().len() } else { 0 });
        let mut vertex_flags = batch.flags(0);
        let mut visible_edges = 0;
        if with_geometry {
            visible_edges = edge_job(
                batch,
                frustum,
                store.edges(),
                store.edge_owners(),
                &visible,
                &mut edge_flags,
            );
        }
        if config.granularity == GeometryGranularity::Vertices {
            vertex_flags.resize(store.vertices().len(), false);
            vertex_job(
                batch,
                frustum,
                store.vertices(),
                store.vertex_owners(),
                &visible,
                &mut vertex_flags,
            );
        }

        let rows = store.rows_by_order();
        let mut inputs = batch.inputs();
        for &row in rows.iter().filter(|&&row| visible[row]) {
            let owner = element_index(row);
            match config.granularity {
                GeometryGranularity::Objects => inputs.push(ProjectionInput {
                    position: store.positions()[row],
                    row: owner,
                    element: TargetElement::Object,
                }),
                GeometryGranularity::Edges => {
                    let span = store.edge_span(row);
                    for (local, flat) in span.range().enumerate() {
                        if edge_flags[flat] {
                            inputs.push(ProjectionInput {
                                position: store.edges()[flat].midpoint(),
                                row: owner,
                                element: TargetElement::Edge(element_index(local)),
                            });
                        }
                    }
                }
                GeometryGranularity::Vertices => {
                    let span = store.vertex_span(row);
                    for (local, flat) in span.range().enumerate() {
                        if vertex_flags[flat] {
                            inputs.push(ProjectionInput {
                                position: store.vertices()[flat],
                                row: owner,
                                element: TargetElement::Vertex(element_index(local)),
                            });
                        }
                    }
                }
            }
        }

        let mut targets = projection_job(batch, &ctx.ray, &inputs, store.handles(), store.entities());
        rank_targets(&mut targets, config.max_targets);

        let seen_objects = rows
            .iter()
            .filter(|&&row| visible[row])
            .map(|&row| store.handles()[row])
            .collect();
        let seen_geometry = rows
            .iter()
            .filter(|&&row| visible[row] && store.has_mesh()[row])
            .map(|&row| {
                let edges = if with_geometry {
                    let span = store.edge_span(row).range();
                    store.edges()[span.clone()]
                        .iter()
                        .zip(&edge_flags[span])
                        .map(|(edge, flag)| {
                            let mut edge = *edge;
                            edge.visible = *flag;
                            edge
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                SeenGeometry {
                    object: store.handles()[row],
                    entity: Some(store.entities()[row]),
                    bounds: store.bounds()[row],
                    edges,
                }
            })
            .collect();

        log::trace!(
            "entity backend frame {}: {} visible objects, {} visible edges, {} targets",
            ctx.frame,
            visible_objects,
            visible_edges,
            targets.len()
        );

        FrameOutput {
            seen_objects,
            seen_geometry,
            targets,
        }
    }

    fn teardown(&mut self) {
        self.queue.clear();
        self.store.clear();
        self.synced_generation = None;
        if self.batch.take().is_some() {
            log::debug!("entity backend released its batch context after {} frames", self.frames);
        }
    }
}

#![allow(clippy::cast_precision_loss)]
//! Frame loop demonstration.
//!
//! This demo shows:
//! - Building a scene of cubes in a grid
//! - Sweeping the viewer across the grid and logging the closest target
//! - Switching granularity and backends between sweeps
//! - Reading published results from another thread
//!
//! Run with: `RUST_LOG=info cargo run --example frame_loop_demo`

use std::f32::consts::PI;
use std::sync::Arc;

use sightline::*;

fn build_scene() -> InMemoryScene {
    let mut scene = InMemoryScene::new();
    let cube = Arc::new(primitives::unit_cube());
    let crate_mesh = Arc::new(primitives::box_mesh(Vec3::new(0.8, 0.4, 0.6)));
    for row in 0..4 {
        for col in -3..=3 {
            let position = Vec3::new(col as f32 * 2.5, 0.0, 6.0 + row as f32 * 3.0);
            let (mesh, tag) = if (row + col) % 2 == 0 {
                (&cube, Some("enemy"))
            } else {
                (&crate_mesh, None)
            };
            scene.spawn(Mat4::from_translation(position), Some(Arc::clone(mesh)), tag);
        }
    }
    scene
}

fn sweep(coordinator: &mut PipelineCoordinator, scene: &InMemoryScene, label: &str) -> Result<()> {
    const STEPS: usize = 8;
    for step in 0..=STEPS {
        let yaw = (step as f32 / STEPS as f32 - 0.5) * PI * 0.5;
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        coordinator.set_pose(Vec3::new(0.0, 0.5, 0.0), forward, Vec3::Y)?;
        let results = coordinator.update(scene);

        let target = results.closest_target();
        if target.is_empty() {
            log::info!("[{label}] frame {}: nothing in view", results.frame);
        } else {
            log::info!(
                "[{label}] frame {}: {} seen, closest {:?} {:?} at {:.2} from the ray",
                results.frame,
                results.seen_objects().len(),
                target.object,
                target.element,
                target.distance_to_ray
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scene = build_scene();
    let viewer = Viewer::default().with_field_of_view(40.0).with_aspect_ratio(16.0 / 9.0);
    let mut coordinator = PipelineCoordinator::new(viewer)?;
    let results = coordinator.results_handle();

    sweep(&mut coordinator, &scene, "objects / object backend")?;

    coordinator.configure_json(r#"{"geometryGranularity": "edges", "backend": "entity"}"#)?;
    sweep(&mut coordinator, &scene, "edges / entity backend")?;

    coordinator.configure(&TargetingOptions {
        geometry_granularity: Some(GeometryGranularity::Vertices),
        backend: Some(BackendSelection::Both),
        tag_filter: Some("enemy".into()),
        max_targets: Some(3),
        ..Default::default()
    })?;
    sweep(&mut coordinator, &scene, "vertices / both, enemies only")?;

    let reader = std::thread::spawn(move || {
        let latest = results.load();
        (latest.frame, latest.closest_targets().len())
    });
    if let Ok((frame, count)) = reader.join() {
        log::info!("reader thread saw frame {frame} with {count} ranked targets");
    }

    coordinator.configure_json(r#"{"enabled": false}"#)?;
    log::info!("final state: {}", coordinator.state());
    Ok(())
}

//! End-to-end tests driving the coordinator against an in-memory scene.

use std::sync::Arc;

use sightline::*;

fn cube() -> Arc<Mesh> {
    Arc::new(primitives::unit_cube())
}

fn row_of_cubes(z: f32) -> InMemoryScene {
    let mut scene = InMemoryScene::new();
    let cube = cube();
    for x in [-2.0, 0.0, 2.0] {
        scene.spawn(
            Mat4::from_translation(Vec3::new(x, 0.0, z)),
            Some(Arc::clone(&cube)),
            None,
        );
    }
    scene
}

#[test]
fn test_single_face_in_view_yields_five_edges() {
    let mut scene = InMemoryScene::new();
    scene.spawn(Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)), Some(cube()), None);

    // The far plane at 10 cuts the cube in half, so only its front face is inside.
    let viewer = Viewer::default()
        .with_field_of_view(25.0)
        .with_clip_range(0.3, 10.0);
    let config = TargetingConfiguration::default().with_granularity(GeometryGranularity::Edges);
    let mut coordinator = PipelineCoordinator::with_configuration(viewer, config).unwrap();
    let results = coordinator.update(&scene);

    assert_eq!(results.seen_geometry().len(), 1);
    let seen = &results.seen_geometry()[0];
    assert_eq!(seen.edges.len(), 18);
    assert_eq!(seen.visible_edge_count(), 5);
    assert_eq!(results.closest_targets().len(), 5);
}

#[test]
fn test_closest_of_three_in_a_row() {
    let scene = row_of_cubes(0.0);
    let viewer = Viewer::new(Vec3::new(0.0, 0.0, -6.0), Vec3::Z, Vec3::Y);
    let mut coordinator = PipelineCoordinator::new(viewer).unwrap();
    coordinator.update(&scene);

    let closest = coordinator.closest_target();
    assert_eq!(closest.object, Some(ObjectHandle(1)));
    assert!(closest.distance_to_ray < 0.1);
    assert!(closest.position.x.abs() < 1e-6);
    assert_eq!(coordinator.closest_targets().len(), 3);
}

#[test]
fn test_round_trip_movement_restores_target() {
    let scene = row_of_cubes(6.0);
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    coordinator.update(&scene);
    let before = coordinator.closest_target();
    assert!(!before.is_empty());

    coordinator.set_pose(Vec3::ZERO, -Vec3::Z, Vec3::Y).unwrap();
    coordinator.update(&scene);
    assert!(coordinator.closest_targets().is_empty());
    assert!(coordinator.seen_objects().is_empty());
    assert!(coordinator.closest_target().is_empty());

    coordinator.set_pose(Vec3::ZERO, Vec3::Z, Vec3::Y).unwrap();
    coordinator.update(&scene);
    assert_eq!(coordinator.closest_target(), before);
}

#[test]
fn test_disabled_pipeline_publishes_nothing() {
    let scene = row_of_cubes(6.0);
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    coordinator.update(&scene);
    assert!(!coordinator.closest_targets().is_empty());

    coordinator.configure_json(r#"{"enabled": false}"#).unwrap();
    assert_eq!(coordinator.state(), BackendState::Disabled);
    assert!(coordinator.closest_targets().is_empty());

    let results = coordinator.update(&scene);
    assert_eq!(results.state, BackendState::Disabled);
    assert!(results.closest_target().is_empty());
    assert!(results.seen_objects().is_empty());

    coordinator.configure_json(r#"{"enabled": true}"#).unwrap();
    coordinator.update(&scene);
    assert_eq!(coordinator.closest_target().object, Some(ObjectHandle(1)));
}

#[test]
fn test_double_enable_and_disable_are_no_ops() {
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    coordinator.set_backend_enabled(BackendKind::Object, true).unwrap();
    assert_eq!(coordinator.state(), BackendState::ObjectBackendActive);

    coordinator.set_backend_enabled(BackendKind::Entity, false).unwrap();
    assert_eq!(coordinator.state(), BackendState::ObjectBackendActive);

    coordinator.set_backend_enabled(BackendKind::Entity, true).unwrap();
    coordinator.set_backend_enabled(BackendKind::Entity, true).unwrap();
    assert_eq!(coordinator.state(), BackendState::BothActive);

    coordinator.set_backend_enabled(BackendKind::Object, false).unwrap();
    coordinator.set_backend_enabled(BackendKind::Object, false).unwrap();
    assert_eq!(coordinator.state(), BackendState::EntityBackendActive);
    assert_eq!(coordinator.backend_selection(), BackendSelection::Entity);
}

#[test]
fn test_tag_filter_limits_candidates() {
    let mut scene = row_of_cubes(6.0);
    let enemy = scene.spawn(
        Mat4::from_translation(Vec3::new(1.5, 1.0, 8.0)),
        Some(cube()),
        Some("enemy"),
    );
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    coordinator.configure_json(r#"{"tagFilter": "enemy"}"#).unwrap();
    coordinator.update(&scene);

    assert_eq!(coordinator.seen_objects(), vec![enemy]);
    assert_eq!(coordinator.closest_target().object, Some(enemy));

    coordinator.configure_json(r#"{"tagFilter": ""}"#).unwrap();
    coordinator.update(&scene);
    assert_eq!(coordinator.seen_objects().len(), 4);
}

#[test]
fn test_spawned_object_is_picked_up() {
    let mut scene = row_of_cubes(6.0);
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    coordinator.update(&scene);
    let generation = coordinator.tracker().scan_generation();

    let near = scene.spawn(Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0)), None, None);
    coordinator.update(&scene);
    assert_eq!(coordinator.tracker().scan_generation(), generation + 1);
    assert!(coordinator.seen_objects().contains(&near));

    // Both at distance zero from the ray; the earlier candidate wins the tie.
    assert_eq!(coordinator.closest_target().object, Some(ObjectHandle(1)));
}

#[test]
fn test_moving_object_is_followed() {
    let mut scene = row_of_cubes(6.0);
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    coordinator.update(&scene);
    assert_eq!(coordinator.closest_target().object, Some(ObjectHandle(1)));

    scene.set_transform(ObjectHandle(1), Mat4::from_translation(Vec3::new(0.0, 50.0, 6.0)));
    scene.set_transform(ObjectHandle(2), Mat4::from_translation(Vec3::new(0.2, 0.0, 6.0)));
    coordinator.update(&scene);
    assert_eq!(coordinator.closest_target().object, Some(ObjectHandle(2)));
    assert!(!coordinator.seen_objects().contains(&ObjectHandle(1)));
}

#[test]
fn test_same_count_substitution_needs_invalidate() {
    let mut scene = row_of_cubes(6.0);
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    coordinator.update(&scene);

    scene.despawn(ObjectHandle(1));
    let replacement = scene.spawn(Mat4::from_translation(Vec3::new(0.0, 0.0, 4.0)), None, None);
    coordinator.update(&scene);
    assert!(!coordinator.seen_objects().contains(&replacement));

    coordinator.invalidate();
    coordinator.update(&scene);
    assert_eq!(coordinator.closest_target().object, Some(replacement));
}

#[test]
fn test_moving_mesh_refreshes_edges() {
    let mut scene = InMemoryScene::new();
    let handle = scene.spawn(Mat4::from_translation(Vec3::new(0.0, 0.0, 6.0)), Some(cube()), None);
    let config = TargetingConfiguration::default().with_granularity(GeometryGranularity::Edges);
    let mut coordinator = PipelineCoordinator::with_configuration(Viewer::default(), config).unwrap();
    coordinator.update(&scene);

    scene.set_transform(handle, Mat4::from_translation(Vec3::new(1.0, 0.0, 6.0)));
    coordinator.update(&scene);
    let geometry = coordinator.seen_geometry();
    assert!(geometry[0].edges.iter().all(|e| e.start.x >= 0.5 - 1e-5));
    assert!(coordinator
        .closest_targets()
        .iter()
        .all(|t| t.position.x >= 0.5 - 1e-5));
}

#[test]
fn test_results_are_readable_from_another_thread() {
    let scene = row_of_cubes(6.0);
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    let handle = coordinator.results_handle();
    coordinator.update(&scene);

    let frame = std::thread::spawn(move || {
        let results = handle.load();
        (results.frame, results.closest_target().object)
    })
    .join()
    .unwrap();
    assert_eq!(frame, (1, Some(ObjectHandle(1))));
}

#[test]
fn test_max_targets_option() {
    let scene = row_of_cubes(6.0);
    let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
    coordinator.configure_json(r#"{"maxTargets": 1}"#).unwrap();
    coordinator.update(&scene);
    assert_eq!(coordinator.closest_targets().len(), 1);
    assert_eq!(coordinator.seen_objects().len(), 3);
}

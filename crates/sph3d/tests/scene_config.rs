//! Scene file tests: JSON save/load and preset construction.

use std::path::PathBuf;

use sph3d::{ContainerShape, Quat, RenderMode, SceneConfig, SphError, Vec3};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sph3d_{}_{}.json", name, std::process::id()))
}

#[test]
fn test_scene_round_trip() {
    let mut scene = SceneConfig::cylinder();
    scene.orientation = Quat::from_rotation_x(0.4);
    scene.params.viscosity = 2.5;
    scene.params.seed = 99;

    let path = temp_path("round_trip");
    scene.save_json(&path).unwrap();
    let loaded = SceneConfig::load_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.name, scene.name);
    assert_eq!(loaded.container, scene.container);
    assert_eq!(loaded.params.grid_cells, scene.params.grid_cells);
    assert_eq!(loaded.params.viscosity, 2.5);
    assert_eq!(loaded.params.seed, 99);
    assert!(loaded.orientation.abs_diff_eq(scene.orientation, 1e-6));
}

#[test]
fn test_loaded_scene_rebuilds_same_fluid() {
    let scene = SceneConfig::sphere();
    let path = temp_path("rebuild");
    scene.save_json(&path).unwrap();
    let loaded = SceneConfig::load_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let a = scene.build().unwrap();
    let b = loaded.build().unwrap();
    assert_eq!(
        a.solver().particles().positions(),
        b.solver().particles().positions()
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let result = SceneConfig::load_json(&temp_path("does_not_exist"));
    assert!(matches!(result, Err(SphError::Io(_))));
}

#[test]
fn test_malformed_file_is_json_error() {
    let path = temp_path("malformed");
    std::fs::write(&path, "{ \"name\": \"broken\", ").unwrap();
    let result = SceneConfig::load_json(&path);
    std::fs::remove_file(&path).ok();
    assert!(matches!(result, Err(SphError::Json(_))));
}

#[test]
fn test_presets_build() {
    for scene in SceneConfig::presets() {
        let body = scene
            .build()
            .unwrap_or_else(|e| panic!("{} failed to build: {}", scene.name, e));
        assert_eq!(body.solver().particle_count(), scene.params.particle_count);
        assert_eq!(body.render_mode(), RenderMode::Particles);
    }
}

#[test]
fn test_orientation_applied_on_build() {
    let mut scene = SceneConfig::new(
        "tilted box",
        ContainerShape::Box {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        },
        Default::default(),
    );
    scene.params.particle_count = 50;
    scene.orientation = Quat::from_rotation_z(std::f32::consts::PI);

    let body = scene.build().unwrap();
    let g = body.solver().local_gravity();
    assert!((g - Vec3::new(0.0, 9.8, 0.0)).length() < 1e-4, "g = {:?}", g);
}

#[test]
fn test_invalid_params_rejected_on_build() {
    let mut scene = SceneConfig::sphere();
    scene.params.grid_cells = [64, 64, 64];
    assert!(matches!(
        scene.build(),
        Err(SphError::CellSmallerThanRadius { .. })
    ));
}

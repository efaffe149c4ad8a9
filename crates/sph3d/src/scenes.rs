//! Scene descriptions: container shape, solver parameters and body orientation,
//! loadable from JSON.
//!
//! Three presets mirror the demo scenes: a sphere, a capped cylinder and a
//! high-resolution sphere.

use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::body::FluidBody;
use crate::constants::BOUNDS_INFLATION;
use crate::error::SphResult;
use crate::geometry::{BoxContainer, Container, CylinderContainer, SphereContainer};
use crate::grid::SpatialGrid;
use crate::params::SphParams;

/// Container geometry in data form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum ContainerShape {
    Sphere {
        #[serde(with = "crate::serde_utils::vec3")]
        center: Vec3,
        radius: f32,
    },
    /// Y-aligned, capped
    Cylinder {
        #[serde(with = "crate::serde_utils::vec3")]
        center: Vec3,
        radius: f32,
        half_height: f32,
    },
    Box {
        #[serde(with = "crate::serde_utils::vec3")]
        min: Vec3,
        #[serde(with = "crate::serde_utils::vec3")]
        max: Vec3,
    },
}

impl ContainerShape {
    pub fn build(&self) -> Box<dyn Container> {
        match *self {
            Self::Sphere { center, radius } => Box::new(SphereContainer::new(center, radius)),
            Self::Cylinder {
                center,
                radius,
                half_height,
            } => Box::new(CylinderContainer::new(center, radius, half_height)),
            Self::Box { min, max } => Box::new(BoxContainer::new(min, max)),
        }
    }

    /// Grid cell counts fitted to this shape's inflated bounds for radius `h`.
    pub fn fitted_grid(&self, h: f32) -> [usize; 3] {
        let domain = self.build().bounding_box().inflated(BOUNDS_INFLATION);
        SpatialGrid::fitted_dims(&domain, h)
    }
}

/// A complete, serializable fluid setup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub container: ContainerShape,
    #[serde(default)]
    pub params: SphParams,
    /// Initial body rotation
    #[serde(
        default = "crate::serde_utils::quat::identity",
        with = "crate::serde_utils::quat"
    )]
    pub orientation: Quat,
}

impl SceneConfig {
    /// Build a scene whose grid is fitted to the container for `params.smoothing_radius`.
    pub fn new(name: &str, container: ContainerShape, mut params: SphParams) -> Self {
        params.grid_cells = container.fitted_grid(params.smoothing_radius);
        Self {
            name: name.to_string(),
            description: String::new(),
            container,
            params,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Unit sphere with default parameters.
    pub fn sphere() -> Self {
        Self::new(
            "Sphere",
            ContainerShape::Sphere {
                center: Vec3::ZERO,
                radius: 1.0,
            },
            SphParams::default(),
        )
        .with_description("Water sloshing inside a unit sphere")
    }

    pub fn cylinder() -> Self {
        Self::new(
            "Cylinder",
            ContainerShape::Cylinder {
                center: Vec3::ZERO,
                radius: 0.6,
                half_height: 1.0,
            },
            SphParams::default(),
        )
        .with_description("Water column in a capped cylinder")
    }

    /// Unit sphere with a smaller kernel, four times the particles and a finer lattice.
    pub fn sphere_high_res() -> Self {
        let params = SphParams {
            smoothing_radius: 0.1,
            particle_count: 8000,
            lattice_cubes: [48, 48, 48],
            ..Default::default()
        };
        Self::new(
            "Sphere (high resolution)",
            ContainerShape::Sphere {
                center: Vec3::ZERO,
                radius: 1.0,
            },
            params,
        )
        .with_description("Unit sphere at high particle and lattice resolution")
    }

    pub fn presets() -> Vec<Self> {
        vec![Self::sphere(), Self::cylinder(), Self::sphere_high_res()]
    }

    /// Build the fluid body and apply the scene's orientation.
    pub fn build(&self) -> SphResult<FluidBody> {
        let mut body = FluidBody::new(self.container.build(), self.params.clone())?;
        body.solver_mut().set_orientation(self.orientation);
        log::info!("Built scene '{}'", self.name);
        Ok(body)
    }

    /// Save scene to a JSON file.
    pub fn save_json(&self, path: &Path) -> SphResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load scene from a JSON file.
    pub fn load_json(path: &Path) -> SphResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let scene = serde_json::from_str(&json)?;
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_valid_grids() {
        for scene in SceneConfig::presets() {
            let h = scene.params.smoothing_radius;
            let domain = scene.container.build().bounding_box().inflated(BOUNDS_INFLATION);
            let [nx, ny, nz] = scene.params.grid_cells;
            assert!(
                SpatialGrid::new(domain, nx, ny, nz, h).is_ok(),
                "{}: grid {:?} rejected for h = {}",
                scene.name,
                scene.params.grid_cells,
                h
            );
        }
    }

    #[test]
    fn test_cylinder_grid_is_anisotropic() {
        let scene = SceneConfig::cylinder();
        let [nx, ny, nz] = scene.params.grid_cells;
        assert_eq!(nx, nz);
        assert!(ny > nx, "tall cylinder should get more cells along y");
    }

    #[test]
    fn test_shape_json_is_tagged() {
        let shape = ContainerShape::Box {
            min: Vec3::splat(-1.0),
            max: Vec3::ONE,
        };
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["shape"], "Box");
        assert_eq!(json["max"]["z"], serde_json::json!(1.0));
    }

    #[test]
    fn test_minimal_scene_json() {
        let json = r#"{
            "name": "tiny",
            "container": { "shape": "Sphere", "center": {"x": 0, "y": 0, "z": 0}, "radius": 0.5 }
        }"#;
        let scene: SceneConfig = serde_json::from_str(json).unwrap();
        assert_eq!(scene.orientation, Quat::IDENTITY);
        assert_eq!(scene.params.particle_count, SphParams::default().particle_count);
        assert!(scene.description.is_empty());
    }
}

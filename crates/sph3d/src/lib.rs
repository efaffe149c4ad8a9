//! 3D SPH Fluid Simulation
//!
//! Smoothed Particle Hydrodynamics inside a closed container, with a uniform
//! spatial grid for neighbor search and a marching-tetrahedra extractor that
//! turns the particle density into a triangle mesh.
//!
//! # Example
//!
//! ```
//! use sph3d::{FluidBody, RenderMode, SphParams, SphereContainer, Vec3};
//!
//! let params = SphParams {
//!     particle_count: 500,
//!     ..Default::default()
//! };
//! let container = SphereContainer::new(Vec3::ZERO, 1.0);
//! let mut body = FluidBody::new(Box::new(container), params).unwrap();
//!
//! // Run simulation step
//! let report = body.animate(1.0 / 60.0);
//! assert_eq!(report.dt, 0.01);
//!
//! body.set_render_mode(RenderMode::ImplicitSurface);
//! let triangles = body.surface().len();
//! # let _ = triangles;
//! ```

pub mod body;
pub mod constants;
pub mod error;
pub mod field;
pub mod geometry;
pub mod grid;
pub mod kernels;
pub mod marching;
pub mod params;
pub mod particle;
pub mod scenes;
pub mod serde_utils;
pub mod solver;

pub use body::{FluidBody, Frame, RenderMode};
pub use error::{SphError, SphResult};
pub use field::{FieldSample, ImplicitField};
pub use geometry::{
    BoundingBox, BoxContainer, Container, CylinderContainer, Intersection, Ray, SphereContainer,
};
pub use glam::{Quat, Vec3};
pub use grid::SpatialGrid;
pub use kernels::Kernels;
pub use marching::{LatticeVertex, Mesh, SurfaceExtractor, Triangle};
pub use params::SphParams;
pub use particle::{Particle, Particles};
pub use scenes::{ContainerShape, SceneConfig};
pub use solver::{SphSolver, StepReport};

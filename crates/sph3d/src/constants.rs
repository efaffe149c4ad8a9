//! Numeric constants shared by the solver and the surface extractor.
//!
//! ## Surface offset
//!
//! The implicit field handed to the extractor is `density / rest_density - (1 - TENSION_OFFSET)`.
//! A smaller offset pulls the extracted surface further into the particle cloud.

/// Gravity acceleration (m/s^2) - negative Y direction
pub const GRAVITY: f32 = -9.8;

/// Offset controlling how far inside the particle cloud the iso-surface sits.
pub const TENSION_OFFSET: f32 = 0.3;

/// Distance a particle is kept away from a container wall after a collision.
pub const WALL_EPSILON: f32 = 2e-3;

/// Upper bound on wall reflections resolved for one particle in one step.
pub const MAX_COLLISION_ITERATIONS: usize = 16;

/// Scale applied to the container bounding box to get the simulation domain.
pub const BOUNDS_INFLATION: f32 = 1.2;

/// Floor for the kernel-weighted correction denominators.
pub const MIN_CORRECTION: f32 = 1e-12;

/// Rays closer than this are treated as starting on the surface they hit.
pub const RAY_T_MIN: f32 = 1e-6;

// =============================================================================
// DEFAULT FLUID PARAMETERS
// =============================================================================

/// Rest density of water (kg/m³)
pub const WATER_REST_DENSITY: f32 = 1000.0;

/// Default kernel support radius (m)
pub const DEFAULT_SMOOTHING_RADIUS: f32 = 0.15;

/// Default largest time step the solver will integrate in one go (s)
pub const DEFAULT_MAX_TIME_STEP: f32 = 0.01;

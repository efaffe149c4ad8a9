//! Construction parameters for the SPH solver.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_TIME_STEP, DEFAULT_SMOOTHING_RADIUS, GRAVITY, WATER_REST_DENSITY,
};
use crate::error::{SphError, SphResult};

/// Everything needed to build a [`crate::SphSolver`] besides the container.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SphParams {
    /// Kernel support radius (m)
    pub smoothing_radius: f32,
    /// Viscosity force coefficient
    pub viscosity: f32,
    /// Pressure force coefficient
    pub pressure: f32,
    /// Surface tension (cohesion) coefficient
    pub surface_tension: f32,
    /// Neighbor grid cells per axis
    pub grid_cells: [usize; 3],
    /// Extraction lattice cubes per axis
    pub lattice_cubes: [usize; 3],
    pub particle_count: usize,
    /// Target density at rest (kg/m³)
    pub rest_density: f32,
    /// Fluid volume shared among all particles (m³)
    pub total_volume: f32,
    /// Elapsed time per step is clamped to this (s)
    pub max_time_step: f32,
    /// World-space gravity (m/s^2)
    #[serde(with = "crate::serde_utils::vec3")]
    pub gravity: Vec3,
    /// Seed for initial particle placement
    pub seed: u64,
}

impl Default for SphParams {
    fn default() -> Self {
        Self {
            smoothing_radius: DEFAULT_SMOOTHING_RADIUS,
            viscosity: 5.0,
            pressure: 500.0,
            surface_tension: 10.0,
            grid_cells: [14, 14, 14],
            lattice_cubes: [32, 32, 32],
            particle_count: 2000,
            rest_density: WATER_REST_DENSITY,
            total_volume: 1.0,
            max_time_step: DEFAULT_MAX_TIME_STEP,
            gravity: Vec3::new(0.0, GRAVITY, 0.0),
            seed: 0,
        }
    }
}

impl SphParams {
    /// Check every scalar input. Grid geometry is checked when the grid is built.
    pub fn validate(&self) -> SphResult<()> {
        if !(self.smoothing_radius > 0.0 && self.smoothing_radius.is_finite()) {
            return Err(SphError::InvalidSmoothingRadius(self.smoothing_radius));
        }
        if self.particle_count == 0 {
            return Err(SphError::NoParticles);
        }
        let [nx, ny, nz] = self.grid_cells;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(SphError::EmptyGrid { nx, ny, nz });
        }
        let [nx, ny, nz] = self.lattice_cubes;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(SphError::EmptyLattice { nx, ny, nz });
        }

        positive("rest_density", self.rest_density)?;
        positive("total_volume", self.total_volume)?;
        positive("max_time_step", self.max_time_step)?;
        non_negative("viscosity", self.viscosity)?;
        non_negative("pressure", self.pressure)?;
        non_negative("surface_tension", self.surface_tension)?;

        if !self.gravity.is_finite() {
            return Err(SphError::InvalidParameter {
                name: "gravity",
                value: self.gravity.length(),
            });
        }
        Ok(())
    }

    /// Mass carried by each particle so that the pool fills `total_volume` at rest density.
    pub fn particle_mass(&self) -> f32 {
        self.total_volume * self.rest_density / self.particle_count as f32
    }
}

fn positive(name: &'static str, value: f32) -> SphResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SphError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> SphResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SphError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        SphParams::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_radius() {
        for h in [0.0, -0.1, f32::NAN] {
            let params = SphParams {
                smoothing_radius: h,
                ..Default::default()
            };
            assert!(matches!(
                params.validate(),
                Err(SphError::InvalidSmoothingRadius(_))
            ));
        }
    }

    #[test]
    fn test_rejects_zero_particles() {
        let params = SphParams {
            particle_count: 0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(SphError::NoParticles)));
    }

    #[test]
    fn test_rejects_negative_coefficients() {
        let params = SphParams {
            viscosity: -1.0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("viscosity"), "got: {}", err);
    }

    #[test]
    fn test_particle_mass() {
        let params = SphParams {
            particle_count: 100,
            total_volume: 0.5,
            rest_density: 1000.0,
            ..Default::default()
        };
        assert!((params.particle_mass() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_json_uses_xyz_gravity() {
        let json = serde_json::to_value(SphParams::default()).unwrap();
        assert_eq!(json["gravity"]["y"], serde_json::json!(GRAVITY));

        let partial: SphParams = serde_json::from_str(r#"{"particle_count": 12}"#).unwrap();
        assert_eq!(partial.particle_count, 12);
        assert_eq!(partial.rest_density, WATER_REST_DENSITY);
    }
}

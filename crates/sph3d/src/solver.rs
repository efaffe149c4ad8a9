//! SPH solver: density, pressure and force passes, symplectic Euler integration
//! against a container, and grid membership upkeep.
//!
//! # Step phases
//!
//! 1. Density: corrected poly6 density; linear equation of state on the raw sum.
//! 2. Forces: pressure (spiky), viscosity and cohesion, renormalized.
//! 3. Integration: semi-implicit Euler with iterative wall sliding.
//! 4. Reconciliation: move particles whose cell changed to their new bucket.
//!
//! Phases 1-3 run in parallel over particles. Each particle only writes its own
//! record and reads the previous phase's snapshot of everyone else; results are
//! collected first and applied afterwards. Phase 4 is the only writer of the grid
//! and runs sequentially.

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::constants::{
    BOUNDS_INFLATION, MAX_COLLISION_ITERATIONS, MIN_CORRECTION, TENSION_OFFSET, WALL_EPSILON,
};
use crate::error::{SphError, SphResult};
use crate::field::{FieldSample, ImplicitField};
use crate::geometry::{BoundingBox, Container, Ray};
use crate::grid::SpatialGrid;
use crate::kernels::Kernels;
use crate::params::SphParams;
use crate::particle::{Particle, Particles};

/// What happened during one [`SphSolver::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Time actually integrated after clamping
    pub dt: f32,
    /// Particles whose wall collisions did not settle within the iteration cap
    pub unsettled: usize,
    /// Particles that changed grid cell
    pub migrated: usize,
}

/// Result of moving one particle against the container.
#[derive(Clone, Copy, Debug)]
struct Motion {
    position: Vec3,
    velocity: Vec3,
    settled: bool,
}

/// Smoothed Particle Hydrodynamics fluid held inside a container.
pub struct SphSolver {
    container: Box<dyn Container>,
    params: SphParams,
    kernels: Kernels,
    particles: Particles,
    grid: SpatialGrid,
    /// Body rotation; world gravity is mapped into this frame
    orientation: Quat,
    frame: u32,
}

impl SphSolver {
    /// Build a solver and scatter `params.particle_count` particles inside the container.
    pub fn new(container: Box<dyn Container>, params: SphParams) -> SphResult<Self> {
        params.validate()?;
        let domain = Self::domain_for(container.as_ref())?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let positions: Vec<Vec3> = (0..params.particle_count)
            .map(|_| container.random_interior_point(&mut rng))
            .collect();

        Self::build(container, params, domain, positions)
    }

    /// Build a solver with particles at explicit positions.
    ///
    /// `params.particle_count` is overridden by the number of positions.
    pub fn with_positions(
        container: Box<dyn Container>,
        mut params: SphParams,
        positions: Vec<Vec3>,
    ) -> SphResult<Self> {
        if positions.is_empty() {
            return Err(SphError::NoParticles);
        }
        params.particle_count = positions.len();
        params.validate()?;
        let domain = Self::domain_for(container.as_ref())?;

        Self::build(container, params, domain, positions)
    }

    /// Container bounding box inflated by [`BOUNDS_INFLATION`].
    pub fn domain_for(container: &dyn Container) -> SphResult<BoundingBox> {
        container
            .bounding_box()
            .validated()
            .map(|bb| bb.inflated(BOUNDS_INFLATION))
    }

    fn build(
        container: Box<dyn Container>,
        params: SphParams,
        domain: BoundingBox,
        positions: Vec<Vec3>,
    ) -> SphResult<Self> {
        let [nx, ny, nz] = params.grid_cells;
        let grid = SpatialGrid::new(domain, nx, ny, nz, params.smoothing_radius)?;
        let kernels = Kernels::new(params.smoothing_radius);

        let mass = params.particle_mass();
        let mut particles = Particles::with_capacity(positions.len());
        particles.list.extend(
            positions
                .into_iter()
                .map(|p| Particle::new(p, mass, params.rest_density)),
        );

        let mut solver = Self {
            container,
            params,
            kernels,
            particles,
            grid,
            orientation: Quat::IDENTITY,
            frame: 0,
        };
        solver.rebuild_grid();

        log::info!(
            "SPH solver ready: {} particles, grid {}x{}x{}, h = {}",
            solver.particles.len(),
            nx,
            ny,
            nz,
            solver.kernels.h
        );
        Ok(solver)
    }

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (i, particle) in self.particles.list.iter_mut().enumerate() {
            particle.cell_index = self.grid.cell_index(particle.position);
            self.grid.add_particle(particle.cell_index, i);
        }
    }

    // ========== Accessors ==========

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn kernels(&self) -> &Kernels {
        &self.kernels
    }

    pub fn params(&self) -> &SphParams {
        &self.params
    }

    pub fn container(&self) -> &dyn Container {
        self.container.as_ref()
    }

    /// Region covered by the grid (and by any extraction lattice built for this solver).
    pub fn domain(&self) -> &BoundingBox {
        self.grid.bounds()
    }

    /// Number of completed steps.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    /// World gravity expressed in the body's local frame.
    pub fn local_gravity(&self) -> Vec3 {
        self.orientation.inverse() * self.params.gravity
    }

    // ========== Controls ==========

    pub fn reset_velocities(&mut self) {
        for particle in &mut self.particles.list {
            particle.velocity = Vec3::ZERO;
        }
    }

    /// Teleport one particle, keeping its grid bucket consistent.
    pub fn place_particle(&mut self, index: usize, position: Vec3, velocity: Vec3) {
        let particle = &mut self.particles[index];
        particle.position = position;
        particle.velocity = velocity;

        let old_cell = particle.cell_index;
        let new_cell = self.grid.cell_index(position);
        if old_cell != new_cell {
            particle.cell_index = new_cell;
            self.grid.remove_particle(old_cell, index);
            self.grid.add_particle(new_cell, index);
        }
    }

    // ========== Simulation ==========

    /// Advance the fluid by `elapsed` seconds, clamped to `max_time_step`.
    pub fn step(&mut self, elapsed: f32) -> StepReport {
        if !(elapsed > 0.0 && elapsed.is_finite()) {
            return StepReport::default();
        }
        let dt = elapsed.min(self.params.max_time_step);

        self.compute_densities();
        self.compute_forces();
        let unsettled = self.integrate(dt);
        let migrated = self.reconcile_cells();
        self.frame += 1;

        if unsettled > 0 {
            log::warn!(
                "frame {}: {} particles did not settle against the container",
                self.frame,
                unsettled
            );
        }
        log::debug!(
            "frame {}: dt = {:.5}, {} particles changed cell",
            self.frame,
            dt,
            migrated
        );

        StepReport {
            dt,
            unsettled,
            migrated,
        }
    }

    /// Recompute density, volume and pressure of every particle.
    ///
    /// `density` and `volume` use the corrected sum, `pressure` the raw kernel sum.
    pub fn compute_densities(&mut self) {
        let kernels = self.kernels;
        let rest_density = self.params.rest_density;
        let grid = &self.grid;
        let list = &self.particles.list;

        // (corrected, raw) per particle
        let densities: Vec<(f32, f32)> = list
            .par_iter()
            .map(|particle| {
                let mut density = 0.0;
                let mut correction = 0.0;

                for j in grid.neighbors(particle.cell_index) {
                    let neighbor = &list[j];
                    let r2 = (particle.position - neighbor.position).length_squared();
                    if r2 < kernels.h2 {
                        let kernel_mass = kernels.density(r2) * neighbor.mass;
                        density += kernel_mass;
                        correction += kernel_mass / neighbor.density;
                    }
                }

                // The self pair always contributes, so this only bites on corrupted state
                (density / correction.max(MIN_CORRECTION), density)
            })
            .collect();

        self.particles
            .list
            .par_iter_mut()
            .zip(densities)
            .for_each(|(particle, (corrected, raw))| {
                particle.density = corrected;
                particle.volume = particle.mass / corrected;
                // Equation of state sees the raw sum; the corrected value only feeds volumes
                particle.pressure = raw / rest_density - 1.0;
            });
    }

    /// Recompute every particle's acceleration from the current density snapshot.
    pub fn compute_forces(&mut self) {
        let kernels = self.kernels;
        let gravity = self.local_gravity();
        let pressure_coeff = self.params.pressure;
        let viscosity_coeff = self.params.viscosity;
        let tension_coeff = self.params.surface_tension;
        let grid = &self.grid;
        let list = &self.particles.list;

        let accelerations: Vec<Vec3> = list
            .par_iter()
            .map(|particle| {
                let mut pressure_force = Vec3::ZERO;
                let mut viscosity_force = Vec3::ZERO;
                let mut tension_force = Vec3::ZERO;
                let mut correction = 0.0;

                for j in grid.neighbors(particle.cell_index) {
                    let neighbor = &list[j];
                    let difference = particle.position - neighbor.position;
                    let r2 = difference.length_squared();
                    if r2 >= kernels.h2 {
                        continue;
                    }

                    let r = r2.sqrt();
                    let volume = neighbor.volume;
                    let mean_pressure = (neighbor.pressure + particle.pressure) * 0.5;

                    pressure_force -= difference * (kernels.pressure(r) * mean_pressure * volume);
                    viscosity_force +=
                        (neighbor.velocity - particle.velocity) * (kernels.viscosity(r) * volume);

                    // Equal masses, so the m_b / m_a factor of the cohesion term drops out
                    let w = kernels.density(r2);
                    tension_force += difference * w;
                    correction += w * volume;
                }

                let correction = correction.max(MIN_CORRECTION);
                pressure_force *= pressure_coeff / correction;
                viscosity_force *= viscosity_coeff / correction;
                tension_force *= tension_coeff / correction;

                (viscosity_force - pressure_force - tension_force) / particle.density + gravity
            })
            .collect();

        self.particles
            .list
            .par_iter_mut()
            .zip(accelerations)
            .for_each(|(particle, acceleration)| particle.acceleration = acceleration);
    }

    /// Integrate velocities and positions; returns how many particles did not settle.
    ///
    /// Grid membership is left stale until [`Self::reconcile_cells`].
    pub fn integrate(&mut self, dt: f32) -> usize {
        let container = self.container.as_ref();

        self.particles
            .list
            .par_iter_mut()
            .enumerate()
            .map(|(i, particle)| {
                let motion = move_against_walls(container, particle, dt);
                particle.position = motion.position;
                particle.velocity = motion.velocity;
                if !motion.settled {
                    log::trace!("particle {} stopped at {:?} after collision cap", i, motion.position);
                }
                usize::from(!motion.settled)
            })
            .sum()
    }

    /// Move particles whose cell changed into their new bucket; returns how many moved.
    pub fn reconcile_cells(&mut self) -> usize {
        let mut migrated = 0;
        for (i, particle) in self.particles.list.iter_mut().enumerate() {
            let current = particle.cell_index;
            let next = self.grid.cell_index(particle.position);
            if current != next {
                particle.cell_index = next;
                self.grid.remove_particle(current, i);
                self.grid.add_particle(next, i);
                migrated += 1;
            }
        }
        migrated
    }
}

/// Semi-implicit Euler step for one particle, sliding along every wall it crosses.
fn move_against_walls(container: &dyn Container, particle: &Particle, dt: f32) -> Motion {
    let mut velocity = particle.velocity + particle.acceleration * dt;
    let mut anchor = particle.position;
    let mut target = anchor + velocity * dt;

    for _ in 0..MAX_COLLISION_ITERATIONS {
        let travel = target - anchor;
        let distance = travel.length();
        if distance <= f32::EPSILON {
            return Motion {
                position: target,
                velocity,
                settled: true,
            };
        }

        let hit = match container.intersect(&Ray::new(anchor, travel / distance)) {
            Some(hit) if hit.t < distance => hit,
            _ => {
                return Motion {
                    position: target,
                    velocity,
                    settled: true,
                }
            }
        };

        let n = hit.normal;
        let penetration = (target - hit.position).dot(n);
        anchor = hit.position - n * WALL_EPSILON;
        velocity -= n * velocity.dot(n);
        target -= n * (penetration + WALL_EPSILON);
    }

    Motion {
        position: anchor,
        velocity,
        settled: false,
    }
}

impl ImplicitField for SphSolver {
    /// Density-based field: positive inside the fluid, with outward normals.
    fn sample_at(&self, position: Vec3) -> FieldSample {
        let kernels = &self.kernels;
        let mut density = 0.0;
        let mut gradient = Vec3::ZERO;

        for j in self.grid.neighbors(self.grid.cell_index(position)) {
            let particle = &self.particles[j];
            let difference = position - particle.position;
            let r2 = difference.length_squared();
            if r2 < kernels.h2 {
                density += particle.mass * kernels.density(r2);
                gradient -= difference * (particle.mass * kernels.density_gradient(r2));
            }
        }

        let rest_density = self.params.rest_density;
        FieldSample {
            value: density / rest_density - (1.0 - TENSION_OFFSET),
            normal: (2.0 * gradient / rest_density).normalize_or_zero(),
        }
    }
}

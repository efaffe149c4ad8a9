//! SPH particle state.

use glam::Vec3;

/// A single fluid particle.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    /// Position in the body's local frame
    pub position: Vec3,
    pub velocity: Vec3,
    /// Acceleration from the last force pass (gravity included)
    pub acceleration: Vec3,
    pub mass: f32,
    /// Corrected density from the last density pass
    pub density: f32,
    /// Equation-of-state pressure, may be negative
    pub pressure: f32,
    /// mass / density
    pub volume: f32,
    /// Grid cell this particle is bucketed in
    pub cell_index: usize,
}

impl Particle {
    /// Create a resting particle at `position` whose density starts at `rest_density`.
    pub fn new(position: Vec3, mass: f32, rest_density: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            mass,
            density: rest_density,
            pressure: 0.0,
            volume: mass / rest_density,
            cell_index: 0,
        }
    }
}

/// Fixed-size pool of particles, created once per simulation.
#[derive(Clone, Debug, Default)]
pub struct Particles {
    pub list: Vec<Particle>,
}

impl Particles {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list: Vec::with_capacity(capacity),
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.list.iter()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.list
    }

    /// Snapshot of every particle position, in index order.
    pub fn positions(&self) -> Vec<Vec3> {
        self.list.iter().map(|p| p.position).collect()
    }

    /// Total mass, constant over the particles' lifetime.
    pub fn total_mass(&self) -> f32 {
        self.list.iter().map(|p| p.mass).sum()
    }

    pub fn max_speed(&self) -> f32 {
        self.list
            .iter()
            .map(|p| p.velocity.length_squared())
            .fold(0.0f32, f32::max)
            .sqrt()
    }
}

impl std::ops::Index<usize> for Particles {
    type Output = Particle;

    fn index(&self, index: usize) -> &Particle {
        &self.list[index]
    }
}

impl std::ops::IndexMut<usize> for Particles {
    fn index_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.list[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_creation() {
        let p = Particle::new(Vec3::new(1.0, 2.0, 3.0), 0.5, 1000.0);
        assert_eq!(p.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.velocity, Vec3::ZERO);
        assert_eq!(p.density, 1000.0);
        assert!((p.volume - 0.0005).abs() < 1e-9);
    }

    #[test]
    fn test_max_speed() {
        let mut particles = Particles::with_capacity(2);
        particles.list.push(Particle::new(Vec3::ZERO, 1.0, 1.0));
        particles.list.push(Particle::new(Vec3::ONE, 1.0, 1.0));
        particles[1].velocity = Vec3::new(3.0, 4.0, 0.0);
        assert!((particles.max_speed() - 5.0).abs() < 1e-6);
        assert_eq!(particles.total_mass(), 2.0);
    }
}

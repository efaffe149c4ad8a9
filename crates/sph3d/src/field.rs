//! Scalar fields sampled by the surface extractor.

use glam::Vec3;

/// Value and surface normal of an implicit field at one point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldSample {
    /// Positive inside the surface, non-positive outside
    pub value: f32,
    /// Unit outward normal, or zero where the gradient vanishes
    pub normal: Vec3,
}

/// Anything whose zero level-set can be polygonized.
///
/// Sampling must be a pure read: the extractor queries lattice vertices in parallel.
pub trait ImplicitField: Sync {
    fn sample_at(&self, position: Vec3) -> FieldSample;
}

impl<F: Fn(Vec3) -> FieldSample + Sync> ImplicitField for F {
    fn sample_at(&self, position: Vec3) -> FieldSample {
        self(position)
    }
}

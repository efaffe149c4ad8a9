//! SPH smoothing kernels (poly6, spiky, viscosity) with precomputed coefficients.

use std::f32::consts::PI;

/// Kernel coefficients derived once from the smoothing radius `h`.
///
/// All kernels vanish at `r = h`; the caller is expected to skip pairs with `r2 >= h2`.
#[derive(Clone, Copy, Debug)]
pub struct Kernels {
    /// Smoothing radius
    pub h: f32,
    /// h * h
    pub h2: f32,
    /// 315 / (64 π h^9)
    pub poly6: f32,
    /// 45 / (π h^6)
    pub spiky: f32,
    /// 45 / (π h^6)
    pub viscosity: f32,
}

impl Kernels {
    pub fn new(h: f32) -> Self {
        let h2 = h * h;
        let h6 = h2 * h2 * h2;
        let h9 = h6 * h2 * h;

        Self {
            h,
            h2,
            poly6: 315.0 / (64.0 * PI * h9),
            spiky: 3.0 * 15.0 / (PI * h6),
            viscosity: 45.0 / (PI * h6),
        }
    }

    /// Poly6 kernel, taking the squared distance.
    #[inline]
    pub fn density(&self, r2: f32) -> f32 {
        let diff = self.h2 - r2;
        self.poly6 * diff * diff * diff
    }

    /// Derivative of the poly6 kernel with respect to `r2`.
    #[inline]
    pub fn density_gradient(&self, r2: f32) -> f32 {
        let diff = self.h2 - r2;
        -3.0 * self.poly6 * diff * diff
    }

    /// Spiky gradient magnitude divided by `r`; zero at `r = 0` so self pairs exert no force.
    #[inline]
    pub fn pressure(&self, r: f32) -> f32 {
        if r == 0.0 {
            return 0.0;
        }
        let diff = self.h - r;
        self.spiky * diff * diff / r
    }

    /// Viscosity kernel laplacian.
    #[inline]
    pub fn viscosity(&self, r: f32) -> f32 {
        self.viscosity * (self.h - r)
    }
}

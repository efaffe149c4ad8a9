//! Container geometry for wall collisions.
//!
//! The solver only sees the [`Container`] trait; the concrete shapes here are the
//! hollow vessels the fluid is poured into:
//! - SphereContainer: closed ball
//! - CylinderContainer: Y-aligned cylinder with flat caps
//! - BoxContainer: axis-aligned box
//!
//! All normals returned by [`Container::intersect`] point out of the fluid region.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::constants::RAY_T_MIN;
use crate::error::{SphError, SphResult};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Reject boxes that are empty or inverted along any axis.
    pub fn validated(self) -> SphResult<Self> {
        let extent = self.extent();
        if !(self.min.is_finite() && self.max.is_finite())
            || extent.x <= 0.0
            || extent.y <= 0.0
            || extent.z <= 0.0
        {
            return Err(SphError::DegenerateBounds);
        }
        Ok(self)
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive on both faces.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Scale the box about its center.
    pub fn inflated(&self, factor: f32) -> Self {
        let center = self.center();
        Self {
            min: (self.min - center) * factor + center,
            max: (self.max - center) * factor + center,
        }
    }
}

/// Half-line `origin + t * direction`, `t >= 0`. Direction is unit length.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Nearest ray hit against a container wall.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub position: Vec3,
    /// Outward unit normal at `position`
    pub normal: Vec3,
    /// Ray parameter of the hit
    pub t: f32,
}

/// Geometry the fluid is held in.
pub trait Container: Send + Sync {
    fn bounding_box(&self) -> BoundingBox;

    /// A point strictly inside the container. Only used to seed particles.
    fn random_interior_point(&self, rng: &mut StdRng) -> Vec3;

    /// Nearest wall crossing with `t > RAY_T_MIN`, if any.
    fn intersect(&self, ray: &Ray) -> Option<Intersection>;
}

/// Smallest root above `RAY_T_MIN` of `a t^2 + 2 b t + c = 0`.
fn nearest_root(a: f32, half_b: f32, c: f32) -> Option<f32> {
    if a <= 0.0 {
        return None;
    }
    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let near = (-half_b - sqrt_d) / a;
    if near > RAY_T_MIN {
        return Some(near);
    }
    let far = (-half_b + sqrt_d) / a;
    (far > RAY_T_MIN).then_some(far)
}

/// Closed ball.
#[derive(Clone, Debug)]
pub struct SphereContainer {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereContainer {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Container for SphereContainer {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            self.center - Vec3::splat(self.radius),
            self.center + Vec3::splat(self.radius),
        )
    }

    fn random_interior_point(&self, rng: &mut StdRng) -> Vec3 {
        // Rejection sample the unit ball, slightly shrunk so no seed sits on the wall
        loop {
            let p = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if p.length_squared() < 1.0 {
                return self.center + p * (self.radius * 0.98);
            }
        }
    }

    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let t = nearest_root(a, half_b, c)?;
        let position = ray.at(t);
        Some(Intersection {
            position,
            normal: (position - self.center) / self.radius,
            t,
        })
    }
}

/// Cylinder aligned with Y, closed by flat caps at `center.y ± half_height`.
#[derive(Clone, Debug)]
pub struct CylinderContainer {
    pub center: Vec3,
    pub radius: f32,
    pub half_height: f32,
}

impl CylinderContainer {
    pub fn new(center: Vec3, radius: f32, half_height: f32) -> Self {
        Self {
            center,
            radius,
            half_height,
        }
    }

    fn side_hit(&self, ray: &Ray) -> Option<Intersection> {
        let ox = ray.origin.x - self.center.x;
        let oz = ray.origin.z - self.center.z;
        let (dx, dz) = (ray.direction.x, ray.direction.z);
        let a = dx * dx + dz * dz;
        let half_b = ox * dx + oz * dz;
        let c = ox * ox + oz * oz - self.radius * self.radius;

        // Either root may land outside the caps, so test both
        let discriminant = half_b * half_b - a * c;
        if a <= 0.0 || discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        [(-half_b - sqrt_d) / a, (-half_b + sqrt_d) / a]
            .into_iter()
            .filter(|&t| t > RAY_T_MIN)
            .map(|t| (t, ray.at(t)))
            .find(|(_, p)| (p.y - self.center.y).abs() <= self.half_height)
            .map(|(t, position)| {
                let radial = Vec3::new(position.x - self.center.x, 0.0, position.z - self.center.z);
                Intersection {
                    position,
                    normal: radial / self.radius,
                    t,
                }
            })
    }

    fn cap_hit(&self, ray: &Ray, sign: f32) -> Option<Intersection> {
        if ray.direction.y == 0.0 {
            return None;
        }
        let cap_y = self.center.y + sign * self.half_height;
        let t = (cap_y - ray.origin.y) / ray.direction.y;
        if t <= RAY_T_MIN {
            return None;
        }
        let position = ray.at(t);
        let dx = position.x - self.center.x;
        let dz = position.z - self.center.z;
        (dx * dx + dz * dz <= self.radius * self.radius).then(|| Intersection {
            position,
            normal: Vec3::new(0.0, sign, 0.0),
            t,
        })
    }
}

impl Container for CylinderContainer {
    fn bounding_box(&self) -> BoundingBox {
        let half = Vec3::new(self.radius, self.half_height, self.radius);
        BoundingBox::new(self.center - half, self.center + half)
    }

    fn random_interior_point(&self, rng: &mut StdRng) -> Vec3 {
        loop {
            let x = rng.gen_range(-1.0f32..1.0);
            let z = rng.gen_range(-1.0f32..1.0);
            if x * x + z * z < 1.0 {
                let y = rng.gen_range(-1.0f32..1.0);
                return self.center
                    + Vec3::new(
                        x * self.radius * 0.98,
                        y * self.half_height * 0.98,
                        z * self.radius * 0.98,
                    );
            }
        }
    }

    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        [self.side_hit(ray), self.cap_hit(ray, 1.0), self.cap_hit(ray, -1.0)]
            .into_iter()
            .flatten()
            .min_by(|a, b| a.t.total_cmp(&b.t))
    }
}

/// Axis-aligned box container.
#[derive(Clone, Debug)]
pub struct BoxContainer {
    pub bounds: BoundingBox,
}

impl BoxContainer {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            bounds: BoundingBox::new(min, max),
        }
    }
}

impl Container for BoxContainer {
    fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    fn random_interior_point(&self, rng: &mut StdRng) -> Vec3 {
        let center = self.bounds.center();
        let half = self.bounds.extent() * 0.49;
        center
            + Vec3::new(
                rng.gen_range(-half.x..half.x),
                rng.gen_range(-half.y..half.y),
                rng.gen_range(-half.z..half.z),
            )
    }

    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        // Slab test, tracking which face bounds the entry and exit parameters
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut near_normal = Vec3::ZERO;
        let mut far_normal = Vec3::ZERO;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let (lo, hi) = (self.bounds.min[axis], self.bounds.max[axis]);

            if dir == 0.0 {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let mut axis_normal = Vec3::ZERO;
            axis_normal[axis] = 1.0;
            let (t0, t1, n0, n1) = if dir > 0.0 {
                ((lo - origin) / dir, (hi - origin) / dir, -axis_normal, axis_normal)
            } else {
                ((hi - origin) / dir, (lo - origin) / dir, axis_normal, -axis_normal)
            };

            if t0 > t_near {
                t_near = t0;
                near_normal = n0;
            }
            if t1 < t_far {
                t_far = t1;
                far_normal = n1;
            }
            if t_near > t_far {
                return None;
            }
        }

        let (t, normal) = if t_near > RAY_T_MIN {
            (t_near, near_normal)
        } else if t_far > RAY_T_MIN {
            (t_far, far_normal)
        } else {
            return None;
        };

        Some(Intersection {
            position: ray.at(t),
            normal,
            t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_inflated_box_keeps_center() {
        let bb = BoundingBox::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 2.0, 4.0));
        let big = bb.inflated(1.2);
        assert!((big.center() - bb.center()).length() < 1e-6);
        assert!((big.extent() - bb.extent() * 1.2).length() < 1e-5);
        assert!(big.contains(bb.min) && big.contains(bb.max));
        assert!(bb.contains(bb.min), "faces are inside");
        assert!(!bb.contains(big.min));
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        let flat = BoundingBox::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0));
        assert!(matches!(flat.validated(), Err(SphError::DegenerateBounds)));
    }

    #[test]
    fn test_sphere_hit_from_center() {
        let sphere = SphereContainer::new(Vec3::ZERO, 2.0);
        let hit = sphere
            .intersect(&Ray::new(Vec3::ZERO, Vec3::Y))
            .expect("ray from center must hit the shell");
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Y).length() < 1e-5, "normal should point outward");
    }

    #[test]
    fn test_cylinder_cap_and_side() {
        let cyl = CylinderContainer::new(Vec3::ZERO, 1.0, 0.5);

        let down = cyl.intersect(&Ray::new(Vec3::ZERO, -Vec3::Y)).unwrap();
        assert!((down.t - 0.5).abs() < 1e-5);
        assert_eq!(down.normal, -Vec3::Y);

        let sideways = cyl.intersect(&Ray::new(Vec3::ZERO, Vec3::X)).unwrap();
        assert!((sideways.t - 1.0).abs() < 1e-5);
        assert!((sideways.normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_box_exit_face() {
        let b = BoxContainer::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let hit = b
            .intersect(&Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -1.0, 0.0)))
            .unwrap();
        assert!((hit.t - 1.5).abs() < 1e-5);
        assert_eq!(hit.normal, -Vec3::Y);
        assert!((hit.position.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_random_points_inside() {
        let mut rng = StdRng::seed_from_u64(7);
        let sphere = SphereContainer::new(Vec3::new(1.0, 2.0, 3.0), 0.5);
        let cyl = CylinderContainer::new(Vec3::ZERO, 0.3, 1.0);
        for _ in 0..200 {
            let p = sphere.random_interior_point(&mut rng);
            assert!((p - sphere.center).length() < sphere.radius);
            let q = cyl.random_interior_point(&mut rng);
            assert!(q.x * q.x + q.z * q.z < 0.09 && q.y.abs() < 1.0);
        }
    }
}

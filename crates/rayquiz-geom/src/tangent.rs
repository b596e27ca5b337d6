//! Tangency helpers: perpendicular distance from a sphere center to a ray
//! line, and construction of exactly tangent directions.

use crate::math::{Ray, Sphere, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestApproach {
    /// Projection `m = (c - o) . d`.
    pub m: f64,
    /// Perpendicular distance `rho = |(c - o) - m d|`. Tangent iff `rho == r`.
    pub rho: f64,
}

pub fn closest_approach(ray: &Ray, sphere: &Sphere) -> ClosestApproach {
    let u = sphere.center - ray.origin;
    let m = u.dot(ray.direction);
    let rho = (u - ray.direction * m).length();
    ClosestApproach { m, rho }
}

/// Unit direction from `origin` that grazes the sphere `(center, radius)`.
///
/// `sign` picks which side of the center line the ray passes. Returns `None`
/// when the origin is inside or on the sphere, where no external tangent exists.
pub fn tangent_direction(origin: Vec3, center: Vec3, radius: f64, sign: f64) -> Option<Vec3> {
    let u = center - origin;
    let dist = u.length();
    if dist <= radius + 1e-9 {
        return None;
    }

    let uh = u.normalized();
    let sin_t = radius / dist;
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

    let helper = if uh.z.abs() < 0.9 {
        Vec3::new(0.0, 0.0, 1.0)
    } else {
        Vec3::new(0.0, 1.0, 0.0)
    };
    let e2 = helper.cross(uh).normalized();
    let side = if sign < 0.0 { -1.0 } else { 1.0 };

    Some((uh * cos_t + e2 * (side * sin_t)).normalized())
}

/// Rotates `d` by `yaw_deg` about world Y, then `pitch_deg` about world X.
pub fn perturb_direction(d: Vec3, yaw_deg: f64, pitch_deg: f64) -> Vec3 {
    let (sy, cy) = yaw_deg.to_radians().sin_cos();
    let (sx, cx) = pitch_deg.to_radians().sin_cos();

    let ry = Vec3::new(cy * d.x - sy * d.z, d.y, sy * d.x + cy * d.z);
    Vec3::new(ry.x, cx * ry.y - sx * ry.z, sx * ry.y + cx * ry.z).normalized()
}

//! Quadratic root solver for a ray against a sphere.
//!
//! Substituting `p(t) = o + t d` into `|p - c|^2 = r^2` gives
//! `a t^2 + b t + c' = 0` with `a = d.d`, `b = 2 (o - c).d` and
//! `c' = (o - c).(o - c) - r^2`. The discriminant is classified in three bands
//! around zero of half-width [`EPS_D`].

use crate::math::{Ray, Sphere};
use serde::{Deserialize, Serialize};

/// Half-width of the band around zero in which the discriminant counts as tangent.
pub const EPS_D: f64 = 1e-8;

/// Sign class of the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeltaCase {
    Neg,
    Zero,
    Pos,
}

/// Real roots of the intersection quadratic, ascending.
///
/// Serialized as a plain array of 0, 1 or 2 numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<f64>", try_from = "Vec<f64>")]
pub enum RootSet {
    Empty,
    Tangent(f64),
    Two(f64, f64),
}

impl RootSet {
    pub fn len(&self) -> usize {
        match self {
            RootSet::Empty => 0,
            RootSet::Tangent(_) => 1,
            RootSet::Two(_, _) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RootSet::Empty)
    }

    pub fn delta_case(&self) -> DeltaCase {
        match self {
            RootSet::Empty => DeltaCase::Neg,
            RootSet::Tangent(_) => DeltaCase::Zero,
            RootSet::Two(_, _) => DeltaCase::Pos,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        match *self {
            RootSet::Empty => Vec::new(),
            RootSet::Tangent(t) => vec![t],
            RootSet::Two(t0, t1) => vec![t0, t1],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> {
        self.to_vec().into_iter()
    }

    /// Smallest root at or past `eps`.
    pub fn first_forward(&self, eps: f64) -> Option<f64> {
        self.iter().find(|&t| t >= eps)
    }
}

impl From<RootSet> for Vec<f64> {
    fn from(roots: RootSet) -> Self {
        roots.to_vec()
    }
}

impl TryFrom<Vec<f64>> for RootSet {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [] => Ok(RootSet::Empty),
            [t] => Ok(RootSet::Tangent(*t)),
            [t0, t1] if t0 <= t1 => Ok(RootSet::Two(*t0, *t1)),
            [_, _] => Err("roots must be ascending".to_string()),
            _ => Err(format!("expected at most 2 roots, got {}", values.len())),
        }
    }
}

/// `b^2 - 4ac'` for the ray/sphere quadratic.
pub fn discriminant(ray: &Ray, sphere: &Sphere) -> f64 {
    let (a, b, c) = coefficients(ray, sphere);
    b * b - 4.0 * a * c
}

fn coefficients(ray: &Ray, sphere: &Sphere) -> (f64, f64, f64) {
    let oc = ray.origin - sphere.center;
    let a = ray.direction.dot(ray.direction);
    let b = 2.0 * oc.dot(ray.direction);
    let c = oc.dot(oc) - sphere.radius * sphere.radius;
    (a, b, c)
}

/// Roots of the ray/sphere quadratic with no forward or window filtering.
///
/// A zero direction describes no ray at all and has no roots.
pub fn intersect(ray: &Ray, sphere: &Sphere) -> RootSet {
    let (a, b, c) = coefficients(ray, sphere);
    if a == 0.0 {
        return RootSet::Empty;
    }
    let delta = b * b - 4.0 * a * c;

    if delta.abs() <= EPS_D {
        return RootSet::Tangent(-b / (2.0 * a));
    }
    if delta < 0.0 {
        return RootSet::Empty;
    }

    let sqrt_d = delta.sqrt();
    let t0 = (-b - sqrt_d) / (2.0 * a);
    let t1 = (-b + sqrt_d) / (2.0 * a);
    if t0 <= t1 {
        RootSet::Two(t0, t1)
    } else {
        RootSet::Two(t1, t0)
    }
}

/// First root `>= eps`, ignoring any time window.
pub fn first_forward_root(ray: &Ray, sphere: &Sphere, eps: f64) -> Option<f64> {
    intersect(ray, sphere).first_forward(eps)
}

/// Whether the ray reaches the sphere no later than parameter `x`.
pub fn segment_hits_sphere(ray: &Ray, sphere: &Sphere, x: f64, eps: f64) -> bool {
    matches!(first_forward_root(ray, sphere, eps), Some(t) if t <= x + eps)
}

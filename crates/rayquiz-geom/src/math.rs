use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A point or direction in 3D. Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Unit vector in the same direction; the zero vector maps to itself.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::zero()
        } else {
            self / len
        }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        rhs * self
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a.dot(b)
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    a - b
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    a + b
}

pub fn scale(a: Vec3, s: f64) -> Vec3 {
    a * s
}

pub fn length(a: Vec3) -> f64 {
    a.length()
}

pub fn normalize(a: Vec3) -> Vec3 {
    a.normalized()
}

/// `p(t) = origin + t * direction`. Directions should be unit length but the
/// solver does not rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_zero_vector_is_zero() {
        assert_eq!(normalize(Vec3::zero()), Vec3::zero());
    }

    #[test]
    fn normalize_gives_unit_length() {
        let v = normalize(Vec3::new(3.0, 4.0, 12.0));
        assert!((length(v) - 1.0).abs() < 1e-12);
        assert!((v.x - 3.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn free_functions_match_operators() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(-2.0, 0.5, 4.0);
        assert_eq!(add(a, b), Vec3::new(-1.0, 2.5, 7.0));
        assert_eq!(sub(a, b), Vec3::new(3.0, 1.5, -1.0));
        assert_eq!(scale(a, 2.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(dot(a, b), -2.0 + 1.0 + 12.0);
    }

    #[test]
    fn vec3_serializes_as_triple() {
        let json = serde_json::to_string(&Vec3::new(1.0, -2.5, 0.0)).unwrap();
        assert_eq!(json, "[1.0,-2.5,0.0]");
        let back: Vec3 = serde_json::from_str("[0.5, 1, 2]").unwrap();
        assert_eq!(back, Vec3::new(0.5, 1.0, 2.0));
    }

    #[test]
    fn ray_at_walks_direction() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(ray.at(4.0), Vec3::new(0.0, 0.0, -1.0));
    }
}

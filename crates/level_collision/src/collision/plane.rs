//! Half-space boundaries for convex volumes

use crate::foundation::math::{Mat3, Vec3};
use super::CollisionError;

/// Plane defined by a unit normal and signed distance from the origin.
///
/// Points with `normal · p >= distance` lie inside the half-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    distance: f64,
}

impl Plane {
    /// Create a plane, normalizing the normal and scaling the distance to
    /// match.
    pub fn new(normal: Vec3, distance: f64) -> Result<Self, CollisionError> {
        let length = normal.norm();
        if length <= f64::EPSILON || !length.is_finite() {
            return Err(CollisionError::DegeneratePlane);
        }
        Ok(Self {
            normal: normal / length,
            distance: distance / length,
        })
    }

    /// Create a plane with the given normal passing through `point`.
    pub fn from_point(normal: Vec3, point: Vec3) -> Result<Self, CollisionError> {
        let length = normal.norm();
        if length <= f64::EPSILON || !length.is_finite() {
            return Err(CollisionError::DegeneratePlane);
        }
        let normal = normal / length;
        Ok(Self {
            normal,
            distance: normal.dot(&point),
        })
    }

    /// Build from a normal already known to be unit length.
    pub(crate) const fn from_unit(normal: Vec3, distance: f64) -> Self {
        Self { normal, distance }
    }

    /// The unit normal, pointing into the inside half-space.
    pub const fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed distance of the plane from the origin along the normal.
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// The point on the plane closest to the origin.
    pub fn point(&self) -> Vec3 {
        self.normal * self.distance
    }

    /// Signed distance from the plane to `point`, positive inside.
    pub fn signed_distance(&self, point: &Vec3) -> f64 {
        self.normal.dot(point) - self.distance
    }

    /// Check whether `point` is inside, allowing `epsilon` of slack.
    pub fn contains(&self, point: &Vec3, epsilon: f64) -> bool {
        self.signed_distance(point) >= -epsilon
    }

    /// The same plane moved by `offset`.
    pub fn translated(&self, offset: &Vec3) -> Self {
        Self {
            normal: self.normal,
            distance: self.distance + self.normal.dot(offset),
        }
    }

    /// The plane rotated about the origin.
    ///
    /// Rotation preserves distances from the origin, so only the normal
    /// changes.
    pub fn rotated(&self, matrix: &Mat3) -> Self {
        let normal = matrix * self.normal;
        Self {
            normal: normal.try_normalize(f64::EPSILON).unwrap_or(normal),
            distance: self.distance,
        }
    }

    /// Compare normals and distances within `epsilon`.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.normal - other.normal).amax() <= epsilon
            && (self.distance - other.distance).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{utils, Axis, EPSILON};
    use approx::assert_relative_eq;

    #[test]
    fn test_new_normalizes() {
        let plane = Plane::new(Vec3::new(0.0, 0.0, 2.0), 10.0).unwrap();
        assert_eq!(plane.normal(), Vec3::z());
        assert_relative_eq!(plane.distance(), 5.0);
        assert_eq!(plane.point(), Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_zero_normal_rejected() {
        assert_eq!(Plane::new(Vec3::zeros(), 1.0), Err(CollisionError::DegeneratePlane));
        assert!(Plane::from_point(Vec3::zeros(), Vec3::x()).is_err());
    }

    #[test]
    fn test_contains() {
        let plane = Plane::from_point(Vec3::new(1.0, 1.0, 0.0), Vec3::new(5.0, 5.0, 0.0)).unwrap();
        assert!(plane.contains(&Vec3::new(10.0, 10.0, 0.0), EPSILON));
        assert!(plane.contains(&Vec3::new(5.0, 5.0, 3.0), EPSILON));
        assert!(!plane.contains(&Vec3::zeros(), EPSILON));
    }

    #[test]
    fn test_translate_and_rotate() {
        let plane = Plane::new(Vec3::x(), 4.0).unwrap();
        let moved = plane.translated(&Vec3::new(3.0, 100.0, -7.0));
        assert_relative_eq!(moved.distance(), 7.0);
        assert_eq!(moved.normal(), Vec3::x());

        let rotated = plane.rotated(&utils::rotation(Axis::Z, 90.0));
        assert_eq!(rotated.normal(), Vec3::y());
        assert_relative_eq!(rotated.distance(), 4.0);
        assert!(rotated.contains(&Vec3::new(0.0, 4.0, 0.0), EPSILON));
    }
}

//! Convex volumes bounded by explicit planes
//!
//! A [`Volume`] pairs a [`BBox`] with the planes of the real shape. The box
//! is a cheap prefilter for ray traces; the planes may chamfer corners or
//! otherwise cut the box down, but never extend past it.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::ops::{Add, Sub};

use crate::foundation::logging::debug;
use crate::foundation::math::{snap_vec, Axis, Mat3, Vec3, EPSILON};
use super::bbox::BBox;
use super::collide_type::CollideType;
use super::hit::{Hit, HitTarget};
use super::plane::Plane;
use super::{CollisionError, CollisionResult};

/// A convex polyhedron: a bounding box plus its bounding planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    bbox: BBox,
    planes: Vec<Plane>,
}

impl Volume {
    /// Create a volume from its bounding box and planes.
    ///
    /// The planes are expected to lie within the box; this is not checked.
    pub fn new(bbox: BBox, planes: Vec<Plane>) -> Self {
        Self { bbox, planes }
    }

    /// Create a volume whose box spans two corners.
    pub fn from_corners(point1: &Vec3, point2: &Vec3, planes: Vec<Plane>) -> CollisionResult<Self> {
        Ok(Self::new(BBox::from_corners(point1, point2)?, planes))
    }

    /// The bounding box.
    pub const fn bbox(&self) -> &BBox {
        &self.bbox
    }

    /// The bounding planes, in order.
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Categories this volume occupies.
    pub const fn contents(&self) -> CollideType {
        self.bbox.contents()
    }

    /// Owning item name.
    pub fn name(&self) -> &str {
        self.bbox.name()
    }

    /// Free-form tags.
    pub fn tags(&self) -> &BTreeSet<String> {
        self.bbox.tags()
    }

    /// Volumes are already volumes.
    pub fn as_volume(&self) -> Cow<'_, Self> {
        Cow::Borrowed(self)
    }

    /// Check whether a point is inside every plane.
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.planes.iter().all(|plane| plane.contains(point, EPSILON))
    }

    /// Return a volume with the name, contents or tags replaced.
    ///
    /// Borrows `self` back when nothing differs.
    pub fn with_attrs(
        &self,
        name: Option<&str>,
        contents: Option<CollideType>,
        tags: Option<&BTreeSet<String>>,
    ) -> Cow<'_, Self> {
        match self.bbox.with_attrs(name, contents, tags) {
            Cow::Borrowed(_) => Cow::Borrowed(self),
            Cow::Owned(bbox) => Cow::Owned(Self::new(bbox, self.planes.clone())),
        }
    }

    /// Overlap between two volumes.
    ///
    /// General polyhedron intersection is not implemented, so this always
    /// fails with [`CollisionError::Unsupported`].
    pub fn intersect(&self, _other: &Self) -> CollisionResult<Option<BBox>> {
        Err(CollisionError::Unsupported("intersection between plane-bounded volumes"))
    }

    /// Rotate the volume about the origin.
    pub fn rotate(&self, matrix: &Mat3) -> CollisionResult<Self> {
        let bbox = self.bbox.rotate(matrix)?;
        let planes = self.planes.iter().map(|plane| plane.rotated(matrix)).collect();
        Ok(Self::new(bbox, planes))
    }

    /// Shift the volume by `offset`, snapped to the grid first.
    ///
    /// Planes parallel to the shift are kept as they are.
    pub fn translated(&self, offset: &Vec3) -> Self {
        let shift = snap_vec(offset);
        let planes = self
            .planes
            .iter()
            .map(|plane| {
                if plane.normal().dot(&shift) == 0.0 {
                    *plane
                } else {
                    plane.translated(&shift)
                }
            })
            .collect();
        Self::new(self.bbox.translated(&shift), planes)
    }

    /// Stretch the volume so one axis spans `new_min..new_max`.
    ///
    /// Points are mapped linearly from the old bounds to the new ones, and
    /// normals go through the inverse transpose of that scale. Borrows
    /// `self` back when the bounds already match.
    pub fn scale_to(&self, axis: Axis, new_min: f64, new_max: f64) -> CollisionResult<Cow<'_, Self>> {
        let bbox = match self.bbox.scale_to(axis, new_min, new_max)? {
            Cow::Borrowed(_) => return Ok(Cow::Borrowed(self)),
            Cow::Owned(bbox) => bbox,
        };
        let (old_min, old_max) = self.bbox.bounds(axis);
        let (min, max) = bbox.bounds(axis);
        if old_min == old_max {
            return Err(CollisionError::Unsupported("scaling the flat axis of a volume"));
        }
        if min == max {
            return Err(CollisionError::Unsupported("flattening a volume onto a plane"));
        }

        let index = axis.index();
        let factor = f64::from(max - min) / f64::from(old_max - old_min);
        let mut scale = Mat3::identity();
        scale[(index, index)] = factor;
        let normal_matrix = scale
            .try_inverse()
            .ok_or(CollisionError::Unsupported("non-invertible volume scale"))?
            .transpose();

        let mut changed = 0_usize;
        let planes = self
            .planes
            .iter()
            .map(|plane| {
                let mut point = plane.point();
                point[index] = f64::from(min) + (point[index] - f64::from(old_min)) * factor;
                let normal = (normal_matrix * plane.normal()).normalize();
                let rescaled = Plane::from_unit(normal, normal.dot(&point));
                if rescaled.approx_eq(plane, EPSILON) {
                    *plane
                } else {
                    changed += 1;
                    rescaled
                }
            })
            .collect();
        debug!(
            "Scaled volume along {axis:?} to {min}..{max}, {changed} of {} planes changed",
            self.planes.len(),
        );
        Ok(Cow::Owned(Self::new(bbox, planes)))
    }

    /// Trace a ray from `start` along `delta` against this volume.
    ///
    /// The ray enters the volume through the last face it crosses into;
    /// that entry point must lie inside every other plane. Starting inside
    /// (or on the surface) reports a zero-distance hit facing back along
    /// the ray.
    pub fn trace_ray(&self, start: &Vec3, delta: &Vec3) -> Option<Hit<'_>> {
        self.bbox.slab_entry(start, delta)?;
        let target = HitTarget::Volume(self);

        let mut entry: Option<(f64, usize)> = None;
        for (index, plane) in self.planes.iter().enumerate() {
            let offset = plane.signed_distance(start);
            if offset >= 0.0 {
                continue;
            }
            let approach = plane.normal().dot(delta);
            if approach <= 0.0 {
                // Outside this face and moving away from or along it.
                return None;
            }
            let fraction = -offset / approach;
            if fraction > 1.0 {
                return None;
            }
            // Exact ties go to the later plane, matching the box slabs.
            if entry.map_or(true, |(best, _)| fraction >= best) {
                entry = Some((fraction, index));
            }
        }

        let Some((fraction, index)) = entry else {
            return Some(Hit::started_inside(start, delta, target));
        };
        let impact = start + delta * fraction;
        let inside_others = self
            .planes
            .iter()
            .enumerate()
            .all(|(other, plane)| other == index || plane.contains(&impact, EPSILON));
        inside_others.then(|| Hit::new(start, delta, fraction, -self.planes[index].normal(), target))
    }
}

impl Add<Vec3> for &Volume {
    type Output = Volume;

    fn add(self, offset: Vec3) -> Volume {
        self.translated(&offset)
    }
}

impl Add<Vec3> for Volume {
    type Output = Self;

    fn add(self, offset: Vec3) -> Self {
        self.translated(&offset)
    }
}

impl Sub<Vec3> for &Volume {
    type Output = Volume;

    fn sub(self, offset: Vec3) -> Volume {
        self.translated(&-offset)
    }
}

impl Sub<Vec3> for Volume {
    type Output = Self;

    fn sub(self, offset: Vec3) -> Self {
        self.translated(&-offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::utils;
    use approx::assert_relative_eq;

    fn cube() -> BBox {
        BBox::from_scalars(0.0, 0.0, 0.0, 10.0, 10.0, 10.0).unwrap()
    }

    /// A 10 unit cube with the (10, 10, z) edge cut off by the plane x + y = 15.
    fn chamfered() -> Volume {
        let mut planes = cube().as_volume().planes().to_vec();
        planes.push(Plane::from_point(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(7.5, 7.5, 0.0)).unwrap());
        Volume::new(cube(), planes)
    }

    #[test]
    fn test_as_volume_is_identity() {
        let volume = chamfered();
        assert!(matches!(volume.as_volume(), Cow::Borrowed(v) if std::ptr::eq(v, &volume)));
    }

    #[test]
    fn test_contains_point() {
        let volume = chamfered();
        assert!(volume.contains_point(&Vec3::new(2.0, 2.0, 2.0)));
        assert!(volume.contains_point(&Vec3::new(8.0, 7.0, 2.0)));
        assert!(!volume.contains_point(&Vec3::new(9.0, 9.0, 2.0)));
    }

    #[test]
    fn test_intersect_is_unsupported() {
        let volume = chamfered();
        assert!(matches!(volume.intersect(&volume), Err(CollisionError::Unsupported(_))));
    }

    #[test]
    fn test_chamfered_corner_is_not_hit() {
        let volume = chamfered();
        // Aimed at the removed corner from +X; the box would report a hit at x = 10.
        let start = Vec3::new(20.0, 9.0, 5.0);
        let delta = Vec3::new(-20.0, 0.0, 0.0);
        assert!(volume.bbox().trace_ray(&start, &delta).is_some());
        let hit = volume.trace_ray(&start, &delta).unwrap();
        assert_relative_eq!(hit.impact, Vec3::new(6.0, 9.0, 5.0), epsilon = 1e-9);
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(hit.normal, Vec3::new(half, half, 0.0), epsilon = 1e-12);
        assert_relative_eq!(hit.distance, 14.0, epsilon = 1e-9);

        // Clipping only the cut-off corner of the box misses entirely.
        let start = Vec3::new(12.0, 6.0, 5.0);
        let delta = Vec3::new(-6.0, 6.0, 0.0);
        assert!(volume.bbox().trace_ray(&start, &delta).is_some());
        assert!(volume.trace_ray(&start, &delta).is_none());
    }

    #[test]
    fn test_untouched_faces_still_hit() {
        let volume = chamfered();
        let hit = volume.trace_ray(&Vec3::new(-5.0, 2.0, 5.0), &Vec3::new(20.0, 0.0, 0.0)).unwrap();
        assert_eq!(hit.normal, -Vec3::x());
        assert_relative_eq!(hit.distance, 5.0);
        assert!(matches!(hit.target, HitTarget::Volume(v) if std::ptr::eq(v, &volume)));
    }

    #[test]
    fn test_trace_from_inside() {
        let volume = chamfered();
        let start = Vec3::new(2.0, 2.0, 2.0);
        let hit = volume.trace_ray(&start, &Vec3::new(0.0, 5.0, 0.0)).unwrap();
        assert_eq!(hit.distance, 0.0);
        assert_eq!(hit.impact, start);
        assert_eq!(hit.normal, -Vec3::y());

        // Inside the box but in the cut-off corner: leaving, never entering.
        assert!(volume.trace_ray(&Vec3::new(9.5, 9.5, 5.0), &Vec3::new(0.0, 5.0, 0.0)).is_none());
    }

    #[test]
    fn test_translation() {
        let volume = chamfered();
        let moved = &volume + Vec3::new(0.0, 0.0, 32.0);
        assert_eq!(moved.bbox().mins(), Vec3::new(0.0, 0.0, 32.0));
        // The chamfer is parallel to Z and is reused untouched.
        assert_eq!(moved.planes()[6], volume.planes()[6]);
        assert_relative_eq!(moved.planes()[4].distance(), 32.0);

        let moved = &volume - Vec3::new(10.0, 0.0, 0.0);
        assert!(moved.contains_point(&Vec3::new(-2.0, 7.0, 2.0)));
        assert!(!moved.contains_point(&Vec3::new(-1.0, 9.0, 2.0)));
        assert_eq!(&(volume.clone() + Vec3::zeros()), &volume);
    }

    #[test]
    fn test_rotation() {
        let volume = chamfered();
        let rotated = volume.rotate(&utils::rotation(Axis::Z, 90.0)).unwrap();
        assert_eq!(rotated.bbox().mins(), Vec3::new(-10.0, 0.0, 0.0));
        assert_eq!(rotated.bbox().maxes(), Vec3::new(0.0, 10.0, 10.0));
        // The cut corner (10, 10) moves to (-10, 10).
        assert!(!rotated.contains_point(&Vec3::new(-9.0, 9.0, 5.0)));
        assert!(rotated.contains_point(&Vec3::new(-1.0, 9.0, 5.0)));
        assert!(rotated.contains_point(&Vec3::new(-9.0, 1.0, 5.0)));

        let same = volume.rotate(&Mat3::identity()).unwrap();
        assert_eq!(same.bbox(), volume.bbox());
        assert!(same.planes().iter().zip(volume.planes()).all(|(a, b)| a.approx_eq(b, EPSILON)));
    }

    #[test]
    fn test_scale_to() {
        let volume = chamfered();
        assert!(matches!(volume.scale_to(Axis::X, 0.0, 10.0).unwrap(), Cow::Borrowed(_)));

        let stretched = volume.scale_to(Axis::X, 0.0, 20.0).unwrap();
        assert_eq!(stretched.bbox().maxes(), Vec3::new(20.0, 10.0, 10.0));
        // The chamfer x + y = 15 becomes x / 2 + y = 15.
        assert!(stretched.contains_point(&Vec3::new(16.0, 6.9, 5.0)));
        assert!(!stretched.contains_point(&Vec3::new(16.0, 7.1, 5.0)));
        assert!(stretched.contains_point(&Vec3::new(19.9, 5.0, 5.0)));
        // Faces along the other axes are kept as they were.
        assert_eq!(stretched.planes()[2], volume.planes()[2]);
        assert_eq!(stretched.planes()[5], volume.planes()[5]);
        assert_relative_eq!(stretched.planes()[1].distance(), -20.0);

        let shifted = volume.scale_to(Axis::Z, 20.0, 40.0).unwrap();
        assert!(shifted.contains_point(&Vec3::new(1.0, 1.0, 39.0)));
        assert!(!shifted.contains_point(&Vec3::new(1.0, 1.0, 19.0)));
        assert_eq!(shifted.planes()[6], volume.planes()[6]);
    }

    #[test]
    fn test_scale_to_flat_is_unsupported() {
        let volume = chamfered();
        assert!(matches!(volume.scale_to(Axis::Z, 5.0, 5.0), Err(CollisionError::Unsupported(_))));
        let flat = BBox::from_scalars(0.0, 0.0, 5.0, 10.0, 10.0, 5.0).unwrap().as_volume();
        assert!(matches!(flat.scale_to(Axis::Z, 0.0, 10.0), Err(CollisionError::Unsupported(_))));
    }
}

//! Axis-aligned collision boxes on the integer grid
//!
//! A [`BBox`] is either a full box, or a flat "plane" box where exactly one
//! axis has zero thickness. Lines and points are rejected at construction.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::ops::{Add, Sub};
use std::sync::Arc;

use crate::foundation::math::{snap, Axis, Mat3, Vec3, EPSILON};
use super::collide_type::CollideType;
use super::hit::{Hit, HitTarget};
use super::plane::Plane;
use super::volume::Volume;
use super::{CollisionError, CollisionResult};

/// Shared, immutable set of free-form tags.
pub type TagSet = Arc<BTreeSet<String>>;

/// An axis aligned volume for collision.
///
/// This may either be a solid volume, or a plane (with one axis' min == max).
/// All transforms return new boxes; clones are cheap since the name and
/// tags are shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BBox {
    mins: [i32; 3],
    maxes: [i32; 3],
    contents: CollideType,
    /// Item name, or empty for definitions.
    name: Arc<str>,
    tags: TagSet,
}

/// Where a ray crosses into a box's slabs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SlabEntry {
    /// The ray starts inside every slab.
    Inside,
    /// The ray enters through a face at `fraction` of the ray's length.
    Face {
        /// Fraction of the delta travelled before impact.
        fraction: f64,
        /// Outward normal of the face entered.
        normal: Vec3,
    },
}

impl BBox {
    /// Create a box from six scalar bounds.
    ///
    /// Values are rounded to the grid and reversed pairs are swapped. The
    /// box holds `SOLID` contents with no name or tags.
    pub fn from_scalars(
        min_x: f64, min_y: f64, min_z: f64,
        max_x: f64, max_y: f64, max_z: f64,
    ) -> CollisionResult<Self> {
        Self::from_bounds(
            [snap(min_x), snap(min_y), snap(min_z)],
            [snap(max_x), snap(max_y), snap(max_z)],
            CollideType::SOLID,
            Arc::from(""),
            TagSet::default(),
        )
    }

    /// Create a box spanning two opposite corners.
    pub fn from_corners(point1: &Vec3, point2: &Vec3) -> CollisionResult<Self> {
        Self::from_scalars(point1.x, point1.y, point1.z, point2.x, point2.y, point2.z)
    }

    fn from_bounds(
        mut mins: [i32; 3],
        mut maxes: [i32; 3],
        contents: CollideType,
        name: Arc<str>,
        tags: TagSet,
    ) -> CollisionResult<Self> {
        for axis in 0..3 {
            if mins[axis] > maxes[axis] {
                std::mem::swap(&mut mins[axis], &mut maxes[axis]);
            }
        }
        let thick_axes = (0..3).filter(|&axis| mins[axis] != maxes[axis]).count();
        if thick_axes < 2 {
            return Err(CollisionError::DegenerateShape {
                min_x: mins[0],
                min_y: mins[1],
                min_z: mins[2],
                max_x: maxes[0],
                max_y: maxes[1],
                max_z: maxes[2],
            });
        }
        Ok(Self { mins, maxes, contents, name, tags })
    }

    /// Return a new box with the specified corners, keeping contents, name
    /// and tags.
    pub fn with_corners(&self, point1: &Vec3, point2: &Vec3) -> CollisionResult<Self> {
        Self::from_bounds(
            [snap(point1.x), snap(point1.y), snap(point1.z)],
            [snap(point2.x), snap(point2.y), snap(point2.z)],
            self.contents,
            Arc::clone(&self.name),
            Arc::clone(&self.tags),
        )
    }

    /// Set the contents.
    #[must_use]
    pub fn with_contents(mut self, contents: CollideType) -> Self {
        self.contents = contents;
        self
    }

    /// Set the owning item name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Arc::new(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the tags with an already shared set.
    #[must_use]
    pub fn with_tag_set(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    /// Minimum corner.
    pub fn mins(&self) -> Vec3 {
        Vec3::new(self.mins[0].into(), self.mins[1].into(), self.mins[2].into())
    }

    /// Maximum corner.
    pub fn maxes(&self) -> Vec3 {
        Vec3::new(self.maxes[0].into(), self.maxes[1].into(), self.maxes[2].into())
    }

    /// Center of the box.
    pub fn center(&self) -> Vec3 {
        (self.mins() + self.maxes()) / 2.0
    }

    /// Size along each axis.
    pub fn size(&self) -> Vec3 {
        self.maxes() - self.mins()
    }

    /// Integer `(min, max)` bounds along one axis.
    pub const fn bounds(&self, axis: Axis) -> (i32, i32) {
        (self.mins[axis.index()], self.maxes[axis.index()])
    }

    /// Check if this is a plane, not a bounding volume.
    pub fn is_plane(&self) -> bool {
        (0..3).any(|axis| self.mins[axis] == self.maxes[axis])
    }

    /// If a plane, the positive unit normal of the flat axis.
    pub fn plane_normal(&self) -> Option<Vec3> {
        Axis::ALL
            .into_iter()
            .find(|axis| self.mins[axis.index()] == self.maxes[axis.index()])
            .map(Axis::unit)
    }

    /// Categories this box occupies.
    pub const fn contents(&self) -> CollideType {
        self.contents
    }

    /// Owning item name, empty for definitions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form tags.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Return a box with the name, contents or tags replaced.
    ///
    /// Only allocates when a supplied value actually differs; otherwise
    /// `self` is borrowed back unchanged. This is an optimisation for
    /// chained calls, not something callers should rely on.
    pub fn with_attrs(
        &self,
        name: Option<&str>,
        contents: Option<CollideType>,
        tags: Option<&BTreeSet<String>>,
    ) -> Cow<'_, Self> {
        let new_name = name.filter(|name| *name != &*self.name);
        let new_contents = contents.filter(|contents| *contents != self.contents);
        let new_tags = tags.filter(|tags| *tags != &*self.tags);
        if new_name.is_none() && new_contents.is_none() && new_tags.is_none() {
            return Cow::Borrowed(self);
        }
        Cow::Owned(Self {
            mins: self.mins,
            maxes: self.maxes,
            contents: new_contents.unwrap_or(self.contents),
            name: new_name.map_or_else(|| Arc::clone(&self.name), Arc::from),
            tags: new_tags.map_or_else(|| Arc::clone(&self.tags), |tags| Arc::new(tags.clone())),
        })
    }

    /// Check if another box collides with this one.
    ///
    /// If so, return the box representing the overlap. The overlap holds
    /// the shared categories, both item names joined with `&`, and this
    /// box's tags. Touching only along an edge or corner does not count.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let contents = self.contents & other.contents;
        if contents.is_nothing() {
            return None;
        }
        let mut mins = [0; 3];
        let mut maxes = [0; 3];
        for axis in 0..3 {
            // Separating axis test, then narrow to the overlapping interval.
            if self.maxes[axis] < other.mins[axis] || self.mins[axis] > other.maxes[axis] {
                return None;
            }
            mins[axis] = self.mins[axis].max(other.mins[axis]);
            maxes[axis] = self.maxes[axis].min(other.maxes[axis]);
            if mins[axis] > maxes[axis] {
                return None;
            }
        }
        let name: Arc<str> = match (self.name.is_empty(), other.name.is_empty()) {
            (false, false) => Arc::from(format!("{}&{}", self.name, other.name)),
            (true, false) => Arc::clone(&other.name),
            _ => Arc::clone(&self.name),
        };
        Self::from_bounds(mins, maxes, contents, name, Arc::clone(&self.tags)).ok()
    }

    /// Rotate the box about the origin.
    ///
    /// Intended for multiples of 90 degrees; other rotations produce the
    /// box enclosing the rotated shape.
    pub fn rotate(&self, matrix: &Mat3) -> CollisionResult<Self> {
        let (lo, hi) = self.rotated_extents(matrix);
        self.with_corners(&lo, &hi)
    }

    /// Unrounded extents of the box after rotation.
    ///
    /// Each output axis sums the contribution of every input axis, taking
    /// the min or max corner depending on the sign of the matrix entry.
    pub(crate) fn rotated_extents(&self, matrix: &Mat3) -> (Vec3, Vec3) {
        let mins = self.mins();
        let maxes = self.maxes();
        let mut lo = Vec3::zeros();
        let mut hi = Vec3::zeros();
        for out in 0..3 {
            for inp in 0..3 {
                let entry = matrix[(out, inp)];
                if entry > 0.0 {
                    lo[out] += entry * mins[inp];
                    hi[out] += entry * maxes[inp];
                } else {
                    lo[out] += entry * maxes[inp];
                    hi[out] += entry * mins[inp];
                }
            }
        }
        (lo, hi)
    }

    /// Shift the box by `offset`, snapped to the grid first.
    ///
    /// Whole-unit shifts keep the thickness of every axis, so this cannot
    /// fail.
    pub fn translated(&self, offset: &Vec3) -> Self {
        let mut mins = self.mins;
        let mut maxes = self.maxes;
        for axis in 0..3 {
            let step = snap(offset[axis]);
            mins[axis] = mins[axis].saturating_add(step);
            maxes[axis] = maxes[axis].saturating_add(step);
        }
        Self {
            mins,
            maxes,
            contents: self.contents,
            name: Arc::clone(&self.name),
            tags: Arc::clone(&self.tags),
        }
    }

    /// Replace the bounds along one axis.
    ///
    /// Borrows `self` back when the new bounds already match.
    pub fn scale_to(&self, axis: Axis, new_min: f64, new_max: f64) -> CollisionResult<Cow<'_, Self>> {
        let (lo, hi) = ordered(snap(new_min), snap(new_max));
        let index = axis.index();
        if self.mins[index] == lo && self.maxes[index] == hi {
            return Ok(Cow::Borrowed(self));
        }
        let mut mins = self.mins;
        let mut maxes = self.maxes;
        mins[index] = lo;
        maxes[index] = hi;
        Self::from_bounds(mins, maxes, self.contents, Arc::clone(&self.name), Arc::clone(&self.tags))
            .map(Cow::Owned)
    }

    /// Promote to a volume bounded by the six faces of the box.
    ///
    /// Planes are ordered -X, +X, -Y, +Y, -Z, +Z by the face they bound.
    pub fn as_volume(&self) -> Volume {
        let mut planes = Vec::with_capacity(6);
        for axis in Axis::ALL {
            let (lo, hi) = self.bounds(axis);
            let unit = axis.unit();
            planes.push(Plane::from_unit(unit, lo.into()));
            planes.push(Plane::from_unit(-unit, -f64::from(hi)));
        }
        Volume::new(self.clone(), planes)
    }

    /// Trace a ray from `start` along `delta` against this box.
    ///
    /// Uses the slab method: the last slab entered is the actual face hit.
    /// A ray starting inside reports a zero-distance hit facing back along
    /// the ray.
    pub fn trace_ray(&self, start: &Vec3, delta: &Vec3) -> Option<Hit<'_>> {
        let target = HitTarget::BBox(self);
        match self.slab_entry(start, delta)? {
            SlabEntry::Inside => Some(Hit::started_inside(start, delta, target)),
            SlabEntry::Face { fraction, normal } => Some(Hit::new(start, delta, fraction, normal, target)),
        }
    }

    pub(crate) fn slab_entry(&self, start: &Vec3, delta: &Vec3) -> Option<SlabEntry> {
        let mut entry: Option<(f64, usize, f64)> = None;
        for axis in 0..3 {
            let lo = f64::from(self.mins[axis]);
            let hi = f64::from(self.maxes[axis]);
            let (pos, dir) = (start[axis], delta[axis]);
            let (fraction, sign) = if pos < lo {
                if dir <= 0.0 {
                    return None;
                }
                ((lo - pos) / dir, -1.0)
            } else if pos > hi {
                if dir >= 0.0 {
                    return None;
                }
                ((hi - pos) / dir, 1.0)
            } else {
                continue;
            };
            if fraction > 1.0 {
                return None;
            }
            // Exact ties go to the later axis. This is evaluation order, not
            // a geometric rule.
            if entry.map_or(true, |(best, _, _)| fraction >= best) {
                entry = Some((fraction, axis, sign));
            }
        }

        let Some((fraction, axis, sign)) = entry else {
            return Some(SlabEntry::Inside);
        };
        let impact = start + delta * fraction;
        for other in (0..3).filter(|&other| other != axis) {
            if impact[other] < f64::from(self.mins[other]) - EPSILON
                || impact[other] > f64::from(self.maxes[other]) + EPSILON
            {
                return None;
            }
        }
        let mut normal = Vec3::zeros();
        normal[axis] = sign;
        Some(SlabEntry::Face { fraction, normal })
    }
}

const fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a > b { (b, a) } else { (a, b) }
}

impl Add<Vec3> for &BBox {
    type Output = BBox;

    fn add(self, offset: Vec3) -> BBox {
        self.translated(&offset)
    }
}

impl Add<Vec3> for BBox {
    type Output = Self;

    fn add(self, offset: Vec3) -> Self {
        self.translated(&offset)
    }
}

impl Sub<Vec3> for &BBox {
    type Output = BBox;

    fn sub(self, offset: Vec3) -> BBox {
        self.translated(&-offset)
    }
}

impl Sub<Vec3> for BBox {
    type Output = Self;

    fn sub(self, offset: Vec3) -> Self {
        self.translated(&-offset)
    }
}

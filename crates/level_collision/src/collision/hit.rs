//! Ray hits and the nearest-hit dispatcher
//!
//! [`trace_ray`] is a plain linear scan. Callers are expected to narrow the
//! candidates down first, for example with
//! [`Collisions::iter_inside`](super::registry::Collisions::iter_inside).

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::foundation::logging::trace;
use crate::foundation::math::{Mat3, Vec3};
use super::bbox::BBox;
use super::collide_type::CollideType;
use super::volume::Volume;
use super::{CollisionError, CollisionResult};

/// The shape a ray struck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget<'a> {
    /// An axis-aligned box
    BBox(&'a BBox),
    /// A plane-bounded volume
    Volume(&'a Volume),
}

impl<'a> HitTarget<'a> {
    /// Bounding box of the struck shape.
    pub fn bbox(&self) -> &'a BBox {
        match *self {
            Self::BBox(bbox) => bbox,
            Self::Volume(volume) => volume.bbox(),
        }
    }
}

/// Result of a successful ray trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a> {
    /// Where the ray started
    pub start: Vec3,
    /// Unit direction of the ray, zero for a zero-length ray
    pub direction: Vec3,
    /// Distance travelled before the impact
    pub distance: f64,
    /// The point of impact
    pub impact: Vec3,
    /// Outward surface normal at the impact
    pub normal: Vec3,
    /// The shape that was struck
    pub target: HitTarget<'a>,
}

impl<'a> Hit<'a> {
    /// Build a hit `fraction` of the way along `delta`.
    pub(crate) fn new(start: &Vec3, delta: &Vec3, fraction: f64, normal: Vec3, target: HitTarget<'a>) -> Self {
        let (direction, length) = direction_and_length(delta);
        Self {
            start: *start,
            direction,
            distance: fraction * length,
            impact: start + delta * fraction,
            normal,
            target,
        }
    }

    /// Build the zero-distance hit reported for a ray that starts inside.
    pub(crate) fn started_inside(start: &Vec3, delta: &Vec3, target: HitTarget<'a>) -> Self {
        let (direction, _) = direction_and_length(delta);
        Self {
            start: *start,
            direction,
            distance: 0.0,
            impact: *start,
            normal: -direction,
            target,
        }
    }

    /// Check whether the ray began inside the struck shape.
    pub fn started_inside_target(&self) -> bool {
        self.distance == 0.0 && self.impact == self.start
    }
}

fn direction_and_length(delta: &Vec3) -> (Vec3, f64) {
    let length = delta.norm();
    if length > 0.0 {
        (delta / length, length)
    } else {
        (Vec3::zeros(), 0.0)
    }
}

/// A shape that rays can be traced against.
pub trait Traceable {
    /// Axis-aligned bounds of the shape.
    fn bbox(&self) -> &BBox;

    /// Trace a ray from `start` along `delta`, returning the first impact.
    fn trace_ray(&self, start: &Vec3, delta: &Vec3) -> Option<Hit<'_>>;
}

impl Traceable for BBox {
    fn bbox(&self) -> &BBox {
        self
    }

    fn trace_ray(&self, start: &Vec3, delta: &Vec3) -> Option<Hit<'_>> {
        Self::trace_ray(self, start, delta)
    }
}

impl Traceable for Volume {
    fn bbox(&self) -> &BBox {
        Self::bbox(self)
    }

    fn trace_ray(&self, start: &Vec3, delta: &Vec3) -> Option<Hit<'_>> {
        Self::trace_ray(self, start, delta)
    }
}

/// Either kind of collision shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Collider {
    /// An axis-aligned box or flat plane
    BBox(BBox),
    /// A plane-bounded convex volume
    Volume(Volume),
}

impl Collider {
    /// Categories this shape occupies.
    pub fn contents(&self) -> CollideType {
        self.bbox().contents()
    }

    /// Owning item name.
    pub fn name(&self) -> &str {
        self.bbox().name()
    }

    /// Free-form tags.
    pub fn tags(&self) -> &BTreeSet<String> {
        self.bbox().tags()
    }

    /// Promote to a volume. Boxes gain their six face planes.
    pub fn as_volume(&self) -> Cow<'_, Volume> {
        match self {
            Self::BBox(bbox) => Cow::Owned(bbox.as_volume()),
            Self::Volume(volume) => volume.as_volume(),
        }
    }

    /// Overlap between two shapes.
    ///
    /// Only box-box overlap is implemented. Any volume involved gives
    /// [`CollisionError::Unsupported`].
    pub fn intersect(&self, other: &Self) -> CollisionResult<Option<BBox>> {
        match (self, other) {
            (Self::BBox(a), Self::BBox(b)) => Ok(a.intersect(b)),
            _ => Err(CollisionError::Unsupported("intersection involving a plane-bounded volume")),
        }
    }

    /// Rotate the shape about the origin.
    pub fn rotate(&self, matrix: &Mat3) -> CollisionResult<Self> {
        Ok(match self {
            Self::BBox(bbox) => Self::BBox(bbox.rotate(matrix)?),
            Self::Volume(volume) => Self::Volume(volume.rotate(matrix)?),
        })
    }

    /// Shift the shape by a grid-snapped offset.
    #[must_use]
    pub fn translated(&self, offset: &Vec3) -> Self {
        match self {
            Self::BBox(bbox) => Self::BBox(bbox.translated(offset)),
            Self::Volume(volume) => Self::Volume(volume.translated(offset)),
        }
    }

    /// Return a shape with the name, contents or tags replaced.
    pub fn with_attrs(
        &self,
        name: Option<&str>,
        contents: Option<CollideType>,
        tags: Option<&BTreeSet<String>>,
    ) -> Cow<'_, Self> {
        match self {
            Self::BBox(bbox) => match bbox.with_attrs(name, contents, tags) {
                Cow::Borrowed(_) => Cow::Borrowed(self),
                Cow::Owned(bbox) => Cow::Owned(Self::BBox(bbox)),
            },
            Self::Volume(volume) => match volume.with_attrs(name, contents, tags) {
                Cow::Borrowed(_) => Cow::Borrowed(self),
                Cow::Owned(volume) => Cow::Owned(Self::Volume(volume)),
            },
        }
    }
}

impl Traceable for Collider {
    fn bbox(&self) -> &BBox {
        match self {
            Self::BBox(bbox) => bbox,
            Self::Volume(volume) => volume.bbox(),
        }
    }

    fn trace_ray(&self, start: &Vec3, delta: &Vec3) -> Option<Hit<'_>> {
        match self {
            Self::BBox(bbox) => bbox.trace_ray(start, delta),
            Self::Volume(volume) => volume.trace_ray(start, delta),
        }
    }
}

impl From<BBox> for Collider {
    fn from(bbox: BBox) -> Self {
        Self::BBox(bbox)
    }
}

impl From<Volume> for Collider {
    fn from(volume: Volume) -> Self {
        Self::Volume(volume)
    }
}

/// Trace a ray against every candidate, returning the nearest hit.
///
/// On equal distances the earlier candidate wins.
pub fn trace_ray<'a, I, T>(start: &Vec3, delta: &Vec3, candidates: I) -> Option<Hit<'a>>
where
    I: IntoIterator<Item = &'a T>,
    T: Traceable + ?Sized + 'a,
{
    let mut best: Option<Hit<'a>> = None;
    let mut tested = 0_usize;
    for candidate in candidates {
        tested += 1;
        if let Some(hit) = candidate.trace_ray(start, delta) {
            if best.as_ref().map_or(true, |best| hit.distance < best.distance) {
                best = Some(hit);
            }
        }
    }
    trace!("Traced ray from {start:?} against {tested} candidates, hit: {}", best.is_some());
    best
}

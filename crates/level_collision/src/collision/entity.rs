//! Conversion between collisions and map entities
//!
//! Item definitions describe their collisions as brush entities: `coll_*`
//! keyvalues give the categories and each brush becomes one shape. The
//! map parser is not part of this crate, so brushes arrive as
//! [`SolidGeometry`] and leave as [`EntityDescription`].

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::CollisionConfig;
use crate::foundation::math::Vec3;
use super::bbox::{BBox, TagSet};
use super::collide_type::CollideType;
use super::hit::{Collider, Traceable};
use super::plane::Plane;
use super::volume::Volume;
use super::CollisionResult;

/// The one visible face of an otherwise skip-textured brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenPlane {
    /// Face normal
    pub normal: Vec3,
    /// Any point on the face
    pub point: Vec3,
}

impl FlattenPlane {
    /// Move `point` onto this plane along the normal.
    pub fn project(&self, point: &Vec3) -> Vec3 {
        let normal = self.normal.try_normalize(f64::EPSILON).unwrap_or(self.normal);
        point - normal * (point - self.point).dot(&normal)
    }
}

/// Geometry of one brush, as read by the map parser.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidGeometry {
    /// Minimum corner of the brush bounds
    pub mins: Vec3,
    /// Maximum corner of the brush bounds
    pub maxes: Vec3,
    /// Set when only one face is visible, squashing the brush onto it
    pub flatten: Option<FlattenPlane>,
    /// Bounding planes, for brushes that aren't plain boxes
    pub planes: Vec<Plane>,
}

impl SolidGeometry {
    /// A plain box brush.
    pub const fn new(mins: Vec3, maxes: Vec3) -> Self {
        Self {
            mins,
            maxes,
            flatten: None,
            planes: Vec::new(),
        }
    }

    /// Squash the brush onto its only visible face.
    #[must_use]
    pub fn flattened(mut self, normal: Vec3, point: Vec3) -> Self {
        self.flatten = Some(FlattenPlane { normal, point });
        self
    }

    /// Bound the brush with explicit planes.
    #[must_use]
    pub fn with_planes(mut self, planes: Vec<Plane>) -> Self {
        self.planes = planes;
        self
    }

    /// The corners after flattening.
    pub fn corners(&self) -> (Vec3, Vec3) {
        match &self.flatten {
            Some(plane) => (plane.project(&self.mins), plane.project(&self.maxes)),
            None => (self.mins, self.maxes),
        }
    }

    /// Build the shape for this brush.
    pub fn to_collider(&self, contents: CollideType, tags: &TagSet) -> CollisionResult<Collider> {
        let (mins, maxes) = self.corners();
        let bbox = BBox::from_corners(&mins, &maxes)?
            .with_contents(contents)
            .with_tag_set(Arc::clone(tags));
        Ok(if self.planes.is_empty() {
            Collider::BBox(bbox)
        } else {
            Collider::Volume(Volume::new(bbox, self.planes.clone()))
        })
    }
}

/// Split a `tags` keyvalue into a tag set.
pub fn parse_tags(text: &str) -> TagSet {
    Arc::new(text.split_whitespace().map(str::to_string).collect())
}

/// Build the collisions described by a brush entity.
///
/// One shape is produced for each solid. They share the entity's
/// categories and tags, and have no item name yet.
pub fn colliders_from_entity<'a, I>(keyvalues: I, solids: &[SolidGeometry]) -> CollisionResult<Vec<Collider>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let keyvalues: Vec<(&str, &str)> = keyvalues.into_iter().collect();
    let contents = CollideType::from_entity(keyvalues.iter().copied());
    let tags = keyvalues
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("tags"))
        .map_or_else(|| Arc::new(BTreeSet::new()), |(_, value)| parse_tags(value));
    solids
        .iter()
        .map(|solid| solid.to_collider(contents, &tags))
        .collect()
}

/// Brush geometry attached to an exported entity.
#[derive(Debug, Clone, PartialEq)]
pub enum BrushDescription {
    /// A box brush. Flat boxes are given one unit of depth behind
    /// `clip_face`, the only visible face; every other face is skip.
    Prism {
        /// Minimum corner
        mins: Vec3,
        /// Maximum corner
        maxes: Vec3,
        /// Normal of the visible face, or `None` when all faces are visible
        clip_face: Option<Vec3>,
    },
    /// A convex brush cut from its bounds by planes.
    Planes {
        /// Minimum corner
        mins: Vec3,
        /// Maximum corner
        maxes: Vec3,
        /// Bounding planes
        planes: Vec<Plane>,
    },
}

impl BrushDescription {
    /// The geometry a map parser would read back from this brush.
    pub fn to_solid(&self) -> SolidGeometry {
        match self {
            Self::Prism { mins, maxes, clip_face: None } => SolidGeometry::new(*mins, *maxes),
            Self::Prism { mins, maxes, clip_face: Some(normal) } => {
                SolidGeometry::new(*mins, *maxes).flattened(*normal, *maxes)
            }
            Self::Planes { mins, maxes, planes } => SolidGeometry::new(*mins, *maxes).with_planes(planes.clone()),
        }
    }
}

/// An entity to write into the map.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescription {
    /// Entity classname
    pub classname: String,
    /// Keyvalues in output order
    pub keyvalues: Vec<(String, String)>,
    /// Attached brush, if any
    pub brush: Option<BrushDescription>,
}

impl EntityDescription {
    /// An entity with no keyvalues or brush.
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            keyvalues: Vec::new(),
            brush: None,
        }
    }

    /// Set a keyvalue, replacing any existing one regardless of case.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.keyvalues.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(key)) {
            Some((_, old)) => *old = value,
            None => self.keyvalues.push((key.to_string(), value)),
        }
    }

    /// Look up a keyvalue, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keyvalues
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Read the entity back into collisions, as if loaded from a map.
    pub fn to_colliders(&self) -> CollisionResult<Vec<Collider>> {
        let solids: Vec<SolidGeometry> = self.brush.iter().map(BrushDescription::to_solid).collect();
        colliders_from_entity(
            self.keyvalues.iter().map(|(key, value)| (key.as_str(), value.as_str())),
            &solids,
        )
    }
}

fn collision_entity(bbox: &BBox, config: &CollisionConfig, brush: BrushDescription) -> EntityDescription {
    let mut ent = EntityDescription::new(config.bbox_classname.as_str());
    // BTreeSet iterates sorted.
    let tags: Vec<&str> = bbox.tags().iter().map(String::as_str).collect();
    ent.set("tags", tags.join(" "));
    ent.set("item_id", bbox.name());
    for (key, present) in bbox.contents().export_kvalues() {
        ent.set(&key, if present { "1" } else { "0" });
    }
    ent.brush = Some(brush);
    ent
}

impl BBox {
    /// Describe this box as a collision entity.
    pub fn to_entity(&self, config: &CollisionConfig) -> EntityDescription {
        let brush = match self.plane_normal() {
            Some(normal) => BrushDescription::Prism {
                mins: self.mins() - normal,
                maxes: self.maxes(),
                clip_face: Some(normal),
            },
            None => BrushDescription::Prism {
                mins: self.mins(),
                maxes: self.maxes(),
                clip_face: None,
            },
        };
        collision_entity(self, config, brush)
    }
}

impl Volume {
    /// Describe this volume as a collision entity.
    pub fn to_entity(&self, config: &CollisionConfig) -> EntityDescription {
        let brush = BrushDescription::Planes {
            mins: self.bbox().mins(),
            maxes: self.bbox().maxes(),
            planes: self.planes().to_vec(),
        };
        collision_entity(self.bbox(), config, brush)
    }
}

impl Collider {
    /// Describe this shape as a collision entity.
    pub fn to_entity(&self, config: &CollisionConfig) -> EntityDescription {
        match self {
            Self::BBox(bbox) => bbox.to_entity(config),
            Self::Volume(volume) => volume.to_entity(config),
        }
    }

    /// Describe this shape for runtime script traces.
    ///
    /// Bounds are given relative to the centre. Volumes also list their
    /// planes as `plane_01`, `plane_02`... in `"nx ny nz dist"` form.
    pub fn to_vscript_entity(&self, config: &CollisionConfig) -> EntityDescription {
        let bbox = self.bbox();
        let center = bbox.center();
        let mut ent = EntityDescription::new(config.vscript_classname.as_str());
        ent.set("origin", format_vec(&center));
        ent.set("mins", format_vec(&(bbox.mins() - center)));
        ent.set("maxs", format_vec(&(bbox.maxes() - center)));
        ent.set("contents", bbox.contents().bits().to_string());
        if let Self::Volume(volume) = self {
            for (index, plane) in volume.planes().iter().enumerate() {
                ent.set(
                    &format!("plane_{:02}", index + 1),
                    format!("{} {}", format_vec(&plane.normal()), format_float(plane.distance())),
                );
            }
        }
        ent
    }
}

/// Format a number with at most six decimals and no trailing zeros.
pub fn format_float(value: f64) -> String {
    // Adding zero turns -0 into 0.
    let rounded = (value * 1e6).round() / 1e6 + 0.0;
    format!("{rounded}")
}

/// Format a vector as space-separated numbers.
pub fn format_vec(v: &Vec3) -> String {
    format!("{} {} {}", format_float(v.x), format_float(v.y), format_float(v.z))
}

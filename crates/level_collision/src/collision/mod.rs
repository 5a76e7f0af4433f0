//! Collision volumes for authored level content
//!
//! Describes the space occupied by items in a map and answers the
//! geometric questions the compiler asks about it: what kind of surface is
//! here, do two regions overlap, and what does a ray strike first.
//!
//! # Module Organization
//!
//! - [`collide_type`] - Content category bitmask
//! - [`plane`] - Half-space boundaries
//! - [`bbox`] - Axis-aligned boxes and flat planes on the integer grid
//! - [`volume`] - Convex volumes bounded by explicit planes
//! - [`hit`] - Ray hits and the nearest-hit dispatcher
//! - [`entity`] - Conversion to and from map entity descriptions
//! - [`registry`] - Per-map collection of item collisions
//!
//! Every shape is an immutable value: transforms return new shapes and
//! queries never mutate, so shapes can be shared freely across threads.

pub mod collide_type;
pub mod plane;
pub mod bbox;
pub mod volume;
pub mod hit;
pub mod entity;
pub mod registry;

pub use collide_type::{CollideType, EXPORT_KVALUES};
pub use plane::Plane;
pub use bbox::{BBox, TagSet};
pub use volume::Volume;
pub use hit::{trace_ray, Collider, Hit, HitTarget, Traceable};
pub use entity::{BrushDescription, EntityDescription, FlattenPlane, SolidGeometry};
pub use registry::Collisions;

use thiserror::Error;

/// Errors raised by collision geometry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollisionError {
    /// The bounds collapse to a line or a point
    #[error("({min_x} {min_y} {min_z}) - ({max_x} {max_y} {max_z}) is not a full volume or plane!")]
    DegenerateShape {
        /// Minimum X bound
        min_x: i32,
        /// Minimum Y bound
        min_y: i32,
        /// Minimum Z bound
        min_z: i32,
        /// Maximum X bound
        max_x: i32,
        /// Maximum Y bound
        max_y: i32,
        /// Maximum Z bound
        max_z: i32,
    },

    /// A word in a category list names no known category
    #[error("Unknown collide type \"{0}\"!")]
    UnknownCollideType(String),

    /// A plane was given a zero-length normal
    #[error("Plane normal must not be zero")]
    DegeneratePlane,

    /// The operation has no implementation for these shapes
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Registry entries must belong to a named item
    #[error("Collision must have an item name to be stored")]
    Unnamed,
}

/// Result type for collision operations
pub type CollisionResult<T> = Result<T, CollisionError>;

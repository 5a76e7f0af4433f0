//! # Level Collision
//!
//! Collision volumes for items placed in a level. Every item records the
//! space it occupies, tagged with what kind of content it is, so the map
//! compiler can ask whether two items overlap or what a ray strikes first.
//!
//! ## Features
//!
//! - **Content masks**: Solid, glass, grating, fizzlers and more as a bitmask
//! - **Grid boxes**: Axis-aligned boxes and flat planes on the integer grid
//! - **Convex volumes**: Boxes cut down by extra planes, such as chamfers
//! - **Raytracing**: Nearest hit across any mix of shapes
//! - **Entity export**: Debug and runtime-script descriptions of each shape
//!
//! ## Quick Start
//!
//! ```rust
//! use level_collision::prelude::*;
//!
//! fn main() -> Result<(), CollisionError> {
//!     let mut collisions = Collisions::new(CollisionConfig::default());
//!     let wall = BBox::from_scalars(64.0, -32.0, 0.0, 72.0, 32.0, 128.0)?
//!         .with_contents(CollideType::SOLID)
//!         .with_name("wall");
//!     collisions.add(wall)?;
//!
//!     let hit = collisions.trace_ray(
//!         &Vec3::new(0.0, 0.0, 64.0),
//!         &Vec3::new(128.0, 0.0, 0.0),
//!         CollideType::PHYSICS,
//!     );
//!     assert_eq!(hit.map(|hit| hit.impact.x), Some(64.0));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod collision;

/// Common imports for collision users
pub mod prelude {
    pub use crate::{
        collision::{
            trace_ray, BBox, CollideType, Collider, CollisionError, CollisionResult, Collisions,
            EntityDescription, Hit, HitTarget, Plane, Traceable, Volume,
        },
        config::{CollisionConfig, Config, ConfigError},
        foundation::math::{utils, Axis, Mat3, Vec3},
    };
}

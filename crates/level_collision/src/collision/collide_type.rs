//! Content categories for collision volumes
//!
//! Each region of space is tagged with the purposes it serves. Two regions
//! only interact when their masks share at least one category.

use std::str::FromStr;

use bitflags::bitflags;

use crate::foundation::logging::warn;
use super::CollisionError;

bitflags! {
    /// Bitmask of collision categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct CollideType: u32 {
        /// Regular solid walls, props etc.
        const SOLID = 1 << 0;
        /// A location where decoration may not be placed.
        const DECORATION = 1 << 1;
        /// Blocks movement, but does not block energy beams.
        const GRATING = 1 << 2;
        /// Only permits lasers through.
        const GLASS = 1 << 3;
        /// Light bridges.
        const BRIDGE = 1 << 4;
        /// Fizzler fields.
        const FIZZLER = 1 << 5;
        /// Collision is only sometimes present here.
        const TEMPORARY = 1 << 6;
        /// Antlines should not pass here.
        const ANTLINES = 1 << 7;
        /// Outside the playable area; nothing may be placed here.
        const OOB = 1 << 8;

        /// Alias of `GRATING`.
        const GRATE = Self::GRATING.bits();
        /// Alias of `DECORATION`.
        const DECO = Self::DECORATION.bits();
        /// Alias of `ANTLINES`.
        const ANTLINE = Self::ANTLINES.bits();
        /// Anything that physically blocks objects, matching the editor's
        /// physics collision type.
        const PHYSICS = Self::SOLID.bits() | Self::TEMPORARY.bits();

        /// Every category.
        const EVERYTHING = Self::SOLID.bits()
            | Self::DECORATION.bits()
            | Self::GRATING.bits()
            | Self::GLASS.bits()
            | Self::BRIDGE.bits()
            | Self::FIZZLER.bits()
            | Self::TEMPORARY.bits()
            | Self::ANTLINES.bits()
            | Self::OOB.bits();
    }
}

/// Each exported category with its key name, in key order.
const EXPORTS: [(CollideType, &str); 9] = [
    (CollideType::SOLID, "solid"),
    (CollideType::DECORATION, "decoration"),
    (CollideType::GRATING, "grating"),
    (CollideType::GLASS, "glass"),
    (CollideType::BRIDGE, "bridge"),
    (CollideType::FIZZLER, "fizzler"),
    (CollideType::TEMPORARY, "temporary"),
    (CollideType::ANTLINES, "antlines"),
    (CollideType::OOB, "oob"),
];

/// The categories written out when exporting collisions, in key order.
///
/// Aliases are excluded so each bit appears exactly once.
pub const EXPORT_KVALUES: [CollideType; 9] = {
    let mut flags = [CollideType::NOTHING; 9];
    let mut index = 0;
    while index < EXPORTS.len() {
        flags[index] = EXPORTS[index].0;
        index += 1;
    }
    flags
};

impl CollideType {
    /// No categories. Never matches anything.
    pub const NOTHING: Self = Self::empty();

    /// Look up a single category name, ignoring case.
    pub fn from_name_ignore_case(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        if upper == "NOTHING" {
            return Some(Self::NOTHING);
        }
        Self::from_name(&upper)
    }

    /// Parse a whitespace-separated list of category names.
    ///
    /// The first unknown word fails the whole parse.
    pub fn parse(text: &str) -> Result<Self, CollisionError> {
        text.split_whitespace().try_fold(Self::NOTHING, |coll, word| {
            Self::from_name_ignore_case(word)
                .map(|flag| coll | flag)
                .ok_or_else(|| CollisionError::UnknownCollideType(word.to_string()))
        })
    }

    /// Collect categories from `coll_<name>` keyvalues on an entity.
    ///
    /// Keys whose value is boolean-true contribute their category. Unknown
    /// category names are logged and skipped, since entity schemas gain and
    /// lose flags over time.
    pub fn from_entity<'a, I>(keyvalues: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut coll = Self::NOTHING;
        for (key, value) in keyvalues {
            let Some(suffix) = strip_prefix_ignore_case(key, "coll_") else {
                continue;
            };
            if !parse_bool(value) {
                continue;
            }
            match Self::from_name_ignore_case(suffix) {
                Some(flag) => coll |= flag,
                None => warn!("Invalid collide type: \"{key}\"!"),
            }
        }
        coll
    }

    /// Lowercase name used for this category in exported keys.
    ///
    /// Only defined for the single categories in [`EXPORT_KVALUES`].
    pub fn export_name(self) -> Option<&'static str> {
        EXPORTS
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, name)| *name)
    }

    /// `coll_<name>` keys and whether this mask contains each category.
    pub fn export_kvalues(self) -> impl Iterator<Item = (String, bool)> {
        EXPORTS
            .into_iter()
            .map(move |(flag, name)| (format!("coll_{name}"), self.intersects(flag)))
    }

    /// Check whether this mask has no categories.
    pub const fn is_nothing(self) -> bool {
        self.is_empty()
    }
}

impl FromStr for CollideType {
    type Err = CollisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for CollideType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            let names: Vec<&str> = EXPORTS
                .iter()
                .filter(|(flag, _)| self.contains(*flag))
                .map(|(_, name)| *name)
                .collect();
            serializer.serialize_str(&names.join(" "))
        } else {
            serializer.serialize_u32(self.bits())
        }
    }
}

impl<'de> serde::Deserialize<'de> for CollideType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            Self::parse(&text).map_err(serde::de::Error::custom)
        } else {
            u32::deserialize(deserializer).map(Self::from_bits_truncate)
        }
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

/// Interpret an entity keyvalue as a boolean.
///
/// Accepts the usual spellings, and any number other than zero. Anything
/// else is false.
pub fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "t" | "y" => true,
        "0" | "false" | "no" | "f" | "n" | "" => false,
        other => other.parse::<f64>().is_ok_and(|num| num != 0.0),
    }
}

//! Per-map collection of item collisions
//!
//! Shapes are stored twice: grouped by content mask for queries, and by
//! item name for edits. Both are plain lists; maps hold a few thousand
//! shapes at most.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::foundation::logging::debug;
use crate::config::CollisionConfig;
use crate::foundation::math::{Mat3, Vec3};
use super::collide_type::CollideType;
use super::entity::EntityDescription;
use super::hit::{self, Collider, Hit, Traceable};
use super::{CollisionError, CollisionResult};

/// Worldspawn key recording which categories were exported for scripts.
pub const VSCRIPT_MASK_KEY: &str = "bee2_vscript_coll_mask";

/// All the collisions for items in the map.
#[derive(Debug, Clone)]
pub struct Collisions {
    config: CollisionConfig,
    by_contents: BTreeMap<CollideType, Vec<Collider>>,
    /// Keyed by lowercased item name.
    by_name: HashMap<String, Vec<Collider>>,
    vscript_flags: CollideType,
}

fn item_key(name: &str) -> String {
    name.to_lowercase()
}

impl Default for Collisions {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

impl Collisions {
    /// Create an empty collection.
    pub fn new(config: CollisionConfig) -> Self {
        let vscript_flags = config.vscript_flags;
        Self {
            config,
            by_contents: BTreeMap::new(),
            by_name: HashMap::new(),
            vscript_flags,
        }
    }

    /// Settings this collection was created with.
    pub const fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Number of stored shapes.
    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    /// Check whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Add a shape to the map.
    ///
    /// The shape must belong to a named item. Adding the same shape to an
    /// item twice stores it once.
    pub fn add(&mut self, collider: impl Into<Collider>) -> CollisionResult<()> {
        let collider = collider.into();
        if collider.name().is_empty() {
            return Err(CollisionError::Unnamed);
        }
        let items = self.by_name.entry(item_key(collider.name())).or_default();
        if items.contains(&collider) {
            debug!("Collision for \"{}\" already present", collider.name());
            return Ok(());
        }
        debug!("Adding {:?} collision for \"{}\"", collider.contents(), collider.name());
        items.push(collider.clone());
        self.by_contents.entry(collider.contents()).or_default().push(collider);
        Ok(())
    }

    /// Remove a shape, returning whether it was present.
    pub fn remove(&mut self, collider: &Collider) -> bool {
        let key = item_key(collider.name());
        let Some(items) = self.by_name.get_mut(&key) else {
            return false;
        };
        let Some(index) = items.iter().position(|item| item == collider) else {
            return false;
        };
        items.remove(index);
        if items.is_empty() {
            self.by_name.remove(&key);
        }
        if let Some(group) = self.by_contents.get_mut(&collider.contents()) {
            if let Some(index) = group.iter().position(|item| item == collider) {
                group.remove(index);
            }
            if group.is_empty() {
                self.by_contents.remove(&collider.contents());
            }
        }
        debug!("Removed {:?} collision for \"{}\"", collider.contents(), collider.name());
        true
    }

    /// Remove an item's shapes holding every one of `tags`.
    ///
    /// Tags are compared ignoring case on both sides. Returns the number
    /// removed.
    pub fn remove_tagged<I, S>(&mut self, item: &str, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: BTreeSet<String> = tags.into_iter().map(|tag| tag.as_ref().to_lowercase()).collect();
        let mut removed = 0;
        for coll in self.collisions_for_item(item) {
            let held: BTreeSet<String> = coll.tags().iter().map(|tag| tag.to_lowercase()).collect();
            if tags.is_subset(&held) && self.remove(&coll) {
                removed += 1;
            }
        }
        removed
    }

    /// Remove every shape belonging to an item. Returns the number removed.
    pub fn remove_all(&mut self, item: &str) -> usize {
        let mut removed = 0;
        for coll in self.collisions_for_item(item) {
            if self.remove(&coll) {
                removed += 1;
            }
        }
        removed
    }

    /// The shapes for this item, ignoring case.
    pub fn collisions_for_item(&self, name: &str) -> Vec<Collider> {
        self.by_name.get(&item_key(name)).cloned().unwrap_or_default()
    }

    /// Place an item definition's shapes for one instance.
    ///
    /// Each shape is rotated by `orient`, moved to `origin`, then given the
    /// instance's name.
    pub fn add_item_collisions<'a, I>(
        &mut self,
        definitions: I,
        name: &str,
        orient: &Mat3,
        origin: &Vec3,
    ) -> CollisionResult<()>
    where
        I: IntoIterator<Item = &'a Collider>,
    {
        for definition in definitions {
            let placed = definition.rotate(orient)?.translated(origin);
            let named = placed.with_attrs(Some(name), None, None).into_owned();
            self.add(named)?;
        }
        Ok(())
    }

    /// Shapes matching `mask` whose bounds overlap `mins..maxs`.
    ///
    /// Touching counts as overlapping.
    pub fn iter_inside<'s>(
        &'s self,
        mins: &Vec3,
        maxs: &Vec3,
        mask: CollideType,
    ) -> impl Iterator<Item = &'s Collider> + 's {
        let (mins, maxs) = (mins.inf(maxs), mins.sup(maxs));
        self.by_contents
            .iter()
            .filter(move |(contents, _)| contents.intersects(mask))
            .flat_map(|(_, group)| group)
            .filter(move |coll| {
                let bbox = coll.bbox();
                let (lo, hi) = (bbox.mins(), bbox.maxes());
                (0..3).all(|axis| lo[axis] <= maxs[axis] && hi[axis] >= mins[axis])
            })
    }

    /// Trace a ray against every shape matching `mask`.
    pub fn trace_ray(&self, start: &Vec3, delta: &Vec3, mask: CollideType) -> Option<Hit<'_>> {
        let end = start + delta;
        let padding = Vec3::repeat(self.config.trace_padding);
        let mins = start.inf(&end) - padding;
        let maxs = start.sup(&end) + padding;
        hit::trace_ray(start, delta, self.iter_inside(&mins, &maxs, mask))
    }

    /// Categories requested for runtime script traces.
    pub const fn vscript_flags(&self) -> CollideType {
        self.vscript_flags
    }

    /// Request more categories be exported for runtime script traces.
    pub fn request_vscript_flags(&mut self, flags: CollideType) {
        self.vscript_flags |= flags;
    }

    /// The worldspawn keyvalue announcing the exported categories, if any.
    pub fn vscript_mask_keyvalue(&self) -> Option<(&'static str, String)> {
        (!self.vscript_flags.is_nothing()).then(|| (VSCRIPT_MASK_KEY, self.vscript_flags.bits().to_string()))
    }

    /// Entities describing the shapes requested for runtime traces.
    pub fn export_vscript(&self) -> Vec<EntityDescription> {
        if self.vscript_flags.is_nothing() {
            return Vec::new();
        }
        let ents: Vec<EntityDescription> = self
            .by_contents
            .iter()
            .filter(|(contents, _)| contents.intersects(self.vscript_flags))
            // Solid geometry would produce an excessive amount of data.
            .filter(|(contents, _)| !(self.config.vscript_skip_solid && contents.contains(CollideType::SOLID)))
            .flat_map(|(_, group)| group)
            .map(|coll| coll.to_vscript_entity(&self.config))
            .collect();
        debug!("Exported {} collisions for scripts", ents.len());
        ents
    }

    /// Entities describing every shape, for inspecting the compiled map.
    ///
    /// Grouped by item, each tagged with the item's lowercased name.
    pub fn export_debug(&self) -> Vec<(String, Vec<EntityDescription>)> {
        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let ents = self.by_name[name]
                    .iter()
                    .map(|coll| {
                        let mut ent = coll.to_entity(&self.config);
                        ent.set("item_id", name.as_str());
                        ent
                    })
                    .collect();
                (name.clone(), ents)
            })
            .collect()
    }
}

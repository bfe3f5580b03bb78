//! Arena module: live entity storage.
//!
//! Player, enemies, projectiles, hazards and effects all live in one
//! [`Arena`], keyed by id and iterated in spawn order. Alongside the storage
//! it keeps a position index answering "which enemies are inside this aura"
//! and "which enemy is closest", and the playfield [`Bounds`] that
//! projectiles are culled against.
//!
//! # Keeping the Index Current
//!
//! Writing `transform.position` through `get_mut()` leaves the index stale
//! until `update_spatial(id)` runs. The physics step and `World::place` do
//! this for every entity they move; spawn and despawn maintain it too.
//!
//! ```
//! # use gauntlet_core::arena::Arena;
//! # use gauntlet_core::entity::{EntitySpec, EntityTag};
//! # use glam::Vec2;
//! # let mut arena = Arena::new();
//! # let id = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
//! if let Some(entity) = arena.get_mut(id) {
//!     entity.transform.position = Vec2::new(500.0, 500.0);
//! }
//! // Radius queries still see the old position until this call.
//! arena.update_spatial(id);
//! ```
//!
//! # Example
//!
//! ```
//! use gauntlet_core::arena::Arena;
//! use gauntlet_core::entity::{EntitySpec, EntityTag};
//! use glam::Vec2;
//!
//! let mut arena = Arena::new();
//! let id = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::new(100.0, 200.0)));
//!
//! let nearby = arena.spatial().query_radius(Vec2::new(100.0, 200.0), 50.0, EntityTag::Enemy);
//! assert!(nearby.contains(&id));
//! ```

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntitySpec, EntityTag};

// =============================================================================
// Bounds
// =============================================================================

/// Axis-aligned playfield rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Bounds {
    /// Create bounds from dimensions (centered at origin).
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(-width / 2.0, -height / 2.0),
            max: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    /// Create bounds from min/max corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Get the size of the bounds.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Check if a point is inside the bounds.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Check if a point is inside the bounds grown by `margin` on every side.
    #[must_use]
    pub fn contains_with_margin(&self, point: Vec2, margin: f32) -> bool {
        let grown = Self::from_min_max(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin));
        grown.contains(point)
    }

    /// Returns `true` if the rectangle has positive area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let size = self.size();
        size.is_finite() && size.x > 0.0 && size.y > 0.0
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(3000.0, 3000.0)
    }
}

// =============================================================================
// Spatial Index
// =============================================================================

/// Position index for aura, target and pickup queries.
///
/// Stores each entity's position and tag. Radius queries scan all entries;
/// arena populations stay in the hundreds, so a grid is not needed yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    /// Entity positions and tags indexed by ID.
    entries: HashMap<EntityId, (Vec2, EntityTag)>,
}

impl SpatialIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Records (or moves) an entity.
    pub fn insert(&mut self, id: EntityId, pos: Vec2, tag: EntityTag) {
        self.entries.insert(id, (pos, tag));
    }

    /// Forgets an entity.
    pub fn remove(&mut self, id: EntityId) {
        self.entries.remove(&id);
    }

    /// Indexed position of `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Vec2> {
        self.entries.get(&id).map(|(pos, _)| *pos)
    }

    /// Queries for entities with `tag` within `radius` of `center`.
    ///
    /// Returns entity IDs sorted by ID (spawn order).
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32, tag: EntityTag) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        let mut results: Vec<EntityId> = self
            .entries
            .iter()
            .filter(|(_, (pos, t))| *t == tag && center.distance_squared(*pos) <= radius_sq)
            .map(|(id, _)| *id)
            .collect();

        results.sort();
        results
    }

    /// Finds the closest entity with `tag` to `center`.
    ///
    /// Ties are broken by the lower entity ID.
    #[must_use]
    pub fn nearest(&self, center: Vec2, tag: EntityTag) -> Option<(EntityId, Vec2)> {
        self.entries
            .iter()
            .filter(|(_, (pos, t))| *t == tag && pos.is_finite())
            .min_by(|(id_a, (a, _)), (id_b, (b, _))| {
                center
                    .distance_squared(*a)
                    .total_cmp(&center.distance_squared(*b))
                    .then(id_a.cmp(id_b))
            })
            .map(|(id, (pos, _))| (*id, *pos))
    }

    /// Number of indexed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Container of all live entities.
///
/// Entity ids are assigned monotonically and never reused, so iterating the
/// `BTreeMap` yields entities in spawn order.
///
/// # Example
///
/// ```
/// use gauntlet_core::arena::Arena;
/// use gauntlet_core::entity::{EntitySpec, EntityTag};
/// use glam::Vec2;
///
/// let mut arena = Arena::new();
/// let a = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
/// let b = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::new(100.0, 0.0)));
///
/// let ids: Vec<_> = arena.entity_ids_sorted().collect();
/// assert_eq!(ids, vec![a, b]);
///
/// arena.despawn(a);
/// assert!(arena.get(a).is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Next id to hand out; ids are never reused.
    next_id: u64,
    /// Entity storage in spawn order.
    entities: BTreeMap<EntityId, Entity>,
    /// Position index.
    spatial: SpatialIndex,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
            spatial: SpatialIndex::new(),
        }
    }

    /// Spawns a new entity and indexes its position.
    pub fn spawn(&mut self, spec: EntitySpec) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        let entity = Entity::from_spec(id, spec);
        if entity.transform.has_finite_position() {
            self.spatial.insert(id, entity.position(), entity.tag());
        }

        self.entities.insert(id, entity);
        id
    }

    /// Removes an entity from storage and the spatial index.
    ///
    /// The returned handle is marked inactive and out of scene.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.spatial.remove(id);
        self.entities.remove(&id).map(|mut entity| {
            entity.active = false;
            entity.in_scene = false;
            entity.has_body = false;
            entity
        })
    }

    /// Entity `id`, if it exists.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Entity `id`, mutably. Moving it requires `update_spatial`.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns an iterator over entity IDs in spawn order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in spawn order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns an iterator over mutable entities in spawn order.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Returns the number of entities with the given tag.
    #[must_use]
    pub fn count_tagged(&self, tag: EntityTag) -> usize {
        self.entities.values().filter(|e| e.tag() == tag).count()
    }

    /// Total entity count.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` when the arena holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The position index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Re-indexes `id` after its position changed.
    ///
    /// Entities with a non-finite position are dropped from the index so
    /// queries never return them.
    pub fn update_spatial(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get(&id) {
            if entity.transform.has_finite_position() && entity.is_live() {
                self.spatial.insert(id, entity.position(), entity.tag());
            } else {
                self.spatial.remove(id);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod bounds_tests {
        use super::*;

        #[test]
        fn centered_bounds_contain_origin() {
            let bounds = Bounds::new(100.0, 50.0);
            assert!(bounds.contains(Vec2::ZERO));
            assert!(bounds.contains(Vec2::new(50.0, 25.0)));
            assert!(!bounds.contains(Vec2::new(51.0, 0.0)));
        }

        #[test]
        fn margin_grows_bounds() {
            let bounds = Bounds::new(100.0, 100.0);
            assert!(!bounds.contains(Vec2::new(60.0, 0.0)));
            assert!(bounds.contains_with_margin(Vec2::new(60.0, 0.0), 20.0));
        }

        #[test]
        fn degenerate_bounds_are_invalid() {
            assert!(Bounds::new(100.0, 100.0).is_valid());
            assert!(!Bounds::new(0.0, 100.0).is_valid());
        }
    }

    mod spatial_index_tests {
        use super::*;

        #[test]
        fn query_radius_filters_by_tag() {
            let mut index = SpatialIndex::new();
            index.insert(EntityId::new(1), Vec2::ZERO, EntityTag::Enemy);
            index.insert(EntityId::new(2), Vec2::new(10.0, 0.0), EntityTag::Projectile);
            index.insert(EntityId::new(3), Vec2::new(150.0, 0.0), EntityTag::Enemy);

            let results = index.query_radius(Vec2::ZERO, 100.0, EntityTag::Enemy);
            assert_eq!(results, vec![EntityId::new(1)]);
        }

        #[test]
        fn query_radius_returns_sorted_results() {
            let mut index = SpatialIndex::new();
            index.insert(EntityId::new(5), Vec2::new(10.0, 0.0), EntityTag::Enemy);
            index.insert(EntityId::new(2), Vec2::new(20.0, 0.0), EntityTag::Enemy);
            index.insert(EntityId::new(8), Vec2::new(30.0, 0.0), EntityTag::Enemy);

            let results = index.query_radius(Vec2::ZERO, 100.0, EntityTag::Enemy);
            assert_eq!(
                results,
                vec![EntityId::new(2), EntityId::new(5), EntityId::new(8)]
            );
        }

        #[test]
        fn nearest_picks_closest_with_tag() {
            let mut index = SpatialIndex::new();
            index.insert(EntityId::new(1), Vec2::new(50.0, 0.0), EntityTag::Enemy);
            index.insert(EntityId::new(2), Vec2::new(20.0, 0.0), EntityTag::Enemy);
            index.insert(EntityId::new(3), Vec2::new(5.0, 0.0), EntityTag::Player);

            let (id, pos) = index.nearest(Vec2::ZERO, EntityTag::Enemy).unwrap();
            assert_eq!(id, EntityId::new(2));
            assert_eq!(pos, Vec2::new(20.0, 0.0));
        }

        #[test]
        fn nearest_on_empty_index() {
            let index = SpatialIndex::new();
            assert!(index.nearest(Vec2::ZERO, EntityTag::Enemy).is_none());
        }
    }

    mod arena_tests {
        use super::*;

        #[test]
        fn spawn_assigns_monotonic_ids() {
            let mut arena = Arena::new();
            let a = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
            let b = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
            assert!(a < b);
            assert_eq!(arena.entity_count(), 2);
        }

        #[test]
        fn despawn_removes_from_index_and_marks_inactive() {
            let mut arena = Arena::new();
            let id = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));

            let removed = arena.despawn(id).unwrap();
            assert!(!removed.active);
            assert!(!removed.in_scene);
            assert!(arena.get(id).is_none());
            assert!(arena.spatial().get(id).is_none());
        }

        #[test]
        fn despawn_twice_is_noop() {
            let mut arena = Arena::new();
            let id = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
            assert!(arena.despawn(id).is_some());
            assert!(arena.despawn(id).is_none());
        }

        #[test]
        fn ids_are_never_reused() {
            let mut arena = Arena::new();
            let a = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
            arena.despawn(a);
            let b = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
            assert_ne!(a, b);
        }

        #[test]
        fn update_spatial_drops_non_finite_positions() {
            let mut arena = Arena::new();
            let id = arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
            arena.get_mut(id).unwrap().transform.position = Vec2::new(f32::NAN, 0.0);
            arena.update_spatial(id);
            assert!(arena.spatial().get(id).is_none());
        }

        #[test]
        fn count_tagged() {
            let mut arena = Arena::new();
            arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
            arena.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
            arena.spawn(EntitySpec::new(EntityTag::Projectile, Vec2::ZERO));
            assert_eq!(arena.count_tagged(EntityTag::Enemy), 2);
        }
    }
}

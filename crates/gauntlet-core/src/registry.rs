//! Entity registry: descriptors for characters and enemies, behavior
//! instantiation, and weighted enemy selection.
//!
//! A descriptor pairs a [`BaseStats`] block with a [`BehaviorClass`].
//! [`EntityRegistry::create`] binds a fresh behavior instance to an entity;
//! asking for an unregistered id is a hard error because it means the
//! catalog data and the calling code disagree.
//!
//! # Enemy selection
//!
//! Each descriptor carries a spawn weight. As the player levels up, sturdier
//! enemies become more likely:
//!
//! | Condition                        | Multiplier |
//! |----------------------------------|------------|
//! | level ≥ 5 and base health ≥ 4    | × 1.5      |
//! | level ≥ 10 and base health ≥ 6   | × 2        |
//!
//! The multipliers stack. Spawned health scales linearly with level:
//! `ceil(health * (1 + (level - 1) * 0.2))`.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::registry::EntityRegistry;
//!
//! let enemies = EntityRegistry::default_enemies();
//! assert!(enemies.get_descriptor("grunt").is_ok());
//! assert!(enemies.get_descriptor("dragon").is_err());
//! assert_eq!(EntityRegistry::scaled_health(4.0, 6, 0.2), 8.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::behavior::{BehaviorClass, BehaviorHost};
use crate::collision::CollisionHandler;
use crate::entity::{EntityId, Vitals};
use crate::error::{CoreError, Result};
use crate::stats::BaseStats;
use crate::world::WorldContext;

// =============================================================================
// Descriptor
// =============================================================================

/// Static description of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Registry id
    pub id: String,
    /// Display name
    pub name: String,
    /// Base stats
    pub stats: BaseStats,
    /// Behavior variant and tuning
    pub behavior: BehaviorClass,
}

impl EntityDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        stats: BaseStats,
        behavior: BehaviorClass,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stats,
            behavior,
        }
    }

    /// Vitals for an instance spawned with `max_health`.
    #[must_use]
    pub fn vitals(&self, max_health: f32) -> Vitals {
        Vitals {
            health: max_health,
            max_health,
            speed: self.stats.move_speed,
            contact_damage: self.stats.contact_damage,
            xp_value: self.stats.xp_value,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(CoreError::InvalidDescriptor("empty id".into()));
        }
        let stats = &self.stats;
        if !(stats.health >= 1.0) {
            return Err(CoreError::InvalidDescriptor(format!(
                "{}: health must be at least 1",
                self.id
            )));
        }
        if !(stats.move_speed >= 0.0) || !(stats.spawn_weight >= 0.0) {
            return Err(CoreError::InvalidDescriptor(format!(
                "{}: speed and spawn weight must be non-negative",
                self.id
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Descriptors by id.
#[derive(Default, Clone)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, EntityDescriptor>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, replacing any previous one with the same id.
    pub fn register(&mut self, descriptor: EntityDescriptor) {
        debug!(id = %descriptor.id, class = %descriptor.behavior.kind(), "registered entity type");
        self.descriptors.insert(descriptor.id.clone(), descriptor);
    }

    /// Looks up a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntityType`] if `id` is not registered.
    pub fn get_descriptor(&self, id: &str) -> Result<&EntityDescriptor> {
        self.descriptors.get(id).ok_or_else(|| {
            warn!(id, "unknown entity type");
            CoreError::UnknownEntityType(id.to_string())
        })
    }

    /// Registered ids in sorted order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<&str> {
        self.descriptors.keys().map(String::as_str).collect()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Binds a new behavior of type `id` to `entity`.
    ///
    /// The entity receives the descriptor's hitbox and id, and base vitals if
    /// it has none yet. The returned host has not been set up.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntityType`] if `id` is not registered.
    pub fn create(
        &self,
        world: &mut dyn WorldContext,
        id: &str,
        entity: EntityId,
    ) -> Result<BehaviorHost> {
        let descriptor = self.get_descriptor(id)?;
        if let Some(handle) = world.entity_mut(entity) {
            handle.radius = descriptor.stats.hitbox_radius;
            handle.descriptor = Some(descriptor.id.clone());
            if handle.vitals.is_none() {
                handle.vitals = Some(descriptor.vitals(descriptor.stats.health));
            }
        }
        Ok(BehaviorHost::new(
            entity,
            id,
            descriptor.behavior.instantiate(id),
        ))
    }

    /// Collision handlers the type `id` registers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntityType`] if `id` is not registered.
    pub fn collision_handlers(&self, id: &str) -> Result<Vec<CollisionHandler>> {
        let descriptor = self.get_descriptor(id)?;
        Ok(descriptor
            .behavior
            .instantiate(id)
            .collision_handlers())
    }

    /// Handlers of every registered type, in id order.
    #[must_use]
    pub fn all_collision_handlers(&self) -> Vec<CollisionHandler> {
        self.descriptors
            .iter()
            .flat_map(|(id, d)| d.behavior.instantiate(id).collision_handlers())
            .collect()
    }

    /// Parses a JSON array of descriptors and registers them all.
    ///
    /// Nothing is registered if any descriptor is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDescriptor`] for malformed JSON, missing
    /// required fields or invalid values.
    ///
    /// # Example
    ///
    /// ```
    /// use gauntlet_core::registry::EntityRegistry;
    ///
    /// let mut registry = EntityRegistry::new();
    /// let count = registry.load_json(r#"[{
    ///     "id": "imp",
    ///     "name": "Imp",
    ///     "stats": { "health": 2, "moveSpeed": 90, "spawnWeight": 4 },
    ///     "behavior": { "class": "chaser" }
    /// }]"#).unwrap();
    /// assert_eq!(count, 1);
    ///
    /// // moveSpeed is required
    /// let missing = r#"[{"id": "x", "name": "X", "stats": {"health": 2}, "behavior": {"class": "chaser"}}]"#;
    /// assert!(registry.load_json(missing).is_err());
    /// ```
    pub fn load_json(&mut self, json: &str) -> Result<usize> {
        let descriptors: Vec<EntityDescriptor> = serde_json::from_str(json).map_err(|err| {
            warn!(%err, "rejected descriptor data");
            CoreError::InvalidDescriptor(err.to_string())
        })?;
        for descriptor in &descriptors {
            descriptor.validate()?;
        }
        let count = descriptors.len();
        for descriptor in descriptors {
            self.register(descriptor);
        }
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Enemy Selection
    // -------------------------------------------------------------------------

    /// Spawn weight of `descriptor` at player level `level`.
    #[must_use]
    pub fn effective_weight(descriptor: &EntityDescriptor, level: u32) -> f32 {
        let health = descriptor.stats.health;
        let mut weight = descriptor.stats.spawn_weight.max(0.0);
        if level >= 5 && health >= 4.0 {
            weight *= 1.5;
        }
        if level >= 10 && health >= 6.0 {
            weight *= 2.0;
        }
        weight
    }

    /// Draws an enemy type with probability proportional to its effective
    /// weight. Types with zero weight are never drawn.
    ///
    /// Returns `None` if every weight is zero.
    pub fn random_enemy_type<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> Option<&str> {
        let candidates: Vec<(&str, f32)> = self
            .descriptors
            .values()
            .map(|d| (d.id.as_str(), Self::effective_weight(d, level)))
            .filter(|(_, w)| *w > 0.0 && w.is_finite())
            .collect();
        let index = WeightedIndex::new(candidates.iter().map(|(_, w)| *w)).ok()?;
        Some(candidates[index.sample(rng)].0)
    }

    /// Health of an enemy spawned at `level`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scaled_health(base: f32, level: u32, per_level: f32) -> f32 {
        let level = level.max(1);
        (base * (1.0 + (level - 1) as f32 * per_level)).ceil()
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("ids", &self.all_ids())
            .finish()
    }
}

//! Entity handles for the combat core.
//!
//! This module provides the live game-entity types the core operates on:
//! - [`EntityId`]: Unique identifier for entities
//! - [`EntityTag`]: Type classification (player, enemy, projectile, ...)
//! - [`Entity`]: The entity handle read and written by behaviors
//! - [`EntitySpec`]: Builder describing an entity to spawn
//!
//! # Ownership
//!
//! An entity handle only carries engine-facing state (position, flags,
//! vitals). The behavior object that drives it is owned by the session and
//! destroyed in the same operation that despawns the entity.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::entity::{EntitySpec, EntityTag};
//! use gauntlet_core::entity::components::Vitals;
//! use glam::Vec2;
//!
//! let spec = EntitySpec::new(EntityTag::Enemy, Vec2::new(10.0, 20.0))
//!     .with_radius(12.0)
//!     .with_vitals(Vitals::new(4.0, 60.0));
//!
//! assert_eq!(spec.tag, EntityTag::Enemy);
//! assert_eq!(spec.vitals.unwrap().max_health, 4.0);
//! ```

pub mod components;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collision::CollisionLabel;

pub use components::{Conditions, ContactSpec, EntityFlags, TransformState, Vitals};

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. Ids are assigned
/// monotonically by the arena and never reused, so ordering by id is
/// spawn order.
///
/// # Example
///
/// ```
/// use gauntlet_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Entity type tag.
///
/// Used to filter spatial queries and to declare which entities a contact
/// spec collides with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// The controlled character
    Player,
    /// Hostile entity
    Enemy,
    /// In-flight ability object (bolt, blade, star, flask, shard)
    Projectile,
    /// Persistent ground area (puddle)
    Hazard,
    /// Cosmetic follower with no gameplay contacts (aura ring)
    Effect,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
            Self::Projectile => write!(f, "Projectile"),
            Self::Hazard => write!(f, "Hazard"),
            Self::Effect => write!(f, "Effect"),
        }
    }
}

// =============================================================================
// Entity Spec
// =============================================================================

/// Description of an entity to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Type tag
    pub tag: EntityTag,
    /// Initial position
    pub position: Vec2,
    /// Initial velocity
    pub velocity: Vec2,
    /// Hitbox radius
    pub radius: f32,
    /// Vitals for damageable entities
    pub vitals: Option<Vitals>,
    /// Owning entity (for projectiles and hazards)
    pub owner: Option<EntityId>,
    /// Collision reporting
    pub contact: Option<ContactSpec>,
    /// Registry id the entity was created from
    pub descriptor: Option<String>,
}

impl EntitySpec {
    /// Creates a spec with no vitals, owner or contact.
    #[must_use]
    pub fn new(tag: EntityTag, position: Vec2) -> Self {
        Self {
            tag,
            position,
            velocity: Vec2::ZERO,
            radius: 1.0,
            vitals: None,
            owner: None,
            contact: None,
            descriptor: None,
        }
    }

    /// Sets the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the hitbox radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Sets the vitals.
    #[must_use]
    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = Some(vitals);
        self
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Reports contacts with entities tagged `hits` under `label`.
    #[must_use]
    pub fn with_contact(mut self, label: CollisionLabel, hits: EntityTag) -> Self {
        self.contact = Some(ContactSpec { label, hits });
        self
    }

    /// Records the registry id the entity was created from.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = Some(descriptor.into());
        self
    }
}

// =============================================================================
// Entity
// =============================================================================

/// A live entity handle.
///
/// # Invariants
///
/// - The `EntityId` is unique within an arena
/// - `active` is cleared in the same operation that removes the entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    /// Position and velocity
    pub transform: TransformState,
    /// Hitbox radius
    pub radius: f32,
    /// Vitals, if the entity can be damaged
    pub vitals: Option<Vitals>,
    /// Crowd control and permanent flags
    pub conditions: Conditions,
    /// Cleared once the entity is dead or despawned
    pub active: bool,
    /// Whether the entity is still part of the scene
    pub in_scene: bool,
    /// Whether a physics body backs this entity
    pub has_body: bool,
    /// Owning entity
    pub owner: Option<EntityId>,
    /// Collision reporting
    pub contact: Option<ContactSpec>,
    /// Registry id the entity was created from
    pub descriptor: Option<String>,
}

impl Entity {
    /// Creates an active, in-scene entity from a spec.
    #[must_use]
    pub fn from_spec(id: EntityId, spec: EntitySpec) -> Self {
        Self {
            id,
            tag: spec.tag,
            transform: TransformState {
                position: spec.position,
                velocity: spec.velocity,
            },
            radius: spec.radius,
            vitals: spec.vitals,
            conditions: Conditions::default(),
            active: true,
            in_scene: true,
            has_body: true,
            owner: spec.owner,
            contact: spec.contact,
            descriptor: spec.descriptor,
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's type tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns the position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Returns the velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.transform.velocity
    }

    /// Returns `true` if the entity is active and part of the scene.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.active && self.in_scene
    }

    /// Returns `true` if the entity has been consumed by a hit.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.conditions.flags.contains(EntityFlags::CONSUMED)
    }

    /// The behavior owner for contacts: the owner if set, else the entity.
    #[must_use]
    pub fn controller(&self) -> EntityId {
        self.owner.unwrap_or(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entity_id_tests {
        use super::*;

        #[test]
        fn new_creates_id_with_value() {
            let id = EntityId::new(42);
            assert_eq!(id.as_u64(), 42);
        }

        #[test]
        fn ordering_is_spawn_order() {
            let mut ids = vec![EntityId::new(3), EntityId::new(1), EntityId::new(2)];
            ids.sort();
            assert_eq!(ids, vec![EntityId::new(1), EntityId::new(2), EntityId::new(3)]);
        }

        #[test]
        fn debug_and_display() {
            let id = EntityId::new(7);
            assert_eq!(format!("{id:?}"), "EntityId(7)");
            assert_eq!(format!("{id}"), "7");
        }
    }

    mod entity_tag_tests {
        use super::*;

        #[test]
        fn display_format() {
            assert_eq!(EntityTag::Player.to_string(), "Player");
            assert_eq!(EntityTag::Hazard.to_string(), "Hazard");
        }
    }

    mod entity_tests {
        use super::*;

        #[test]
        fn from_spec_is_live() {
            let entity = Entity::from_spec(
                EntityId::new(1),
                EntitySpec::new(EntityTag::Enemy, Vec2::new(5.0, 6.0)).with_radius(10.0),
            );
            assert!(entity.is_live());
            assert!(entity.has_body);
            assert_eq!(entity.position(), Vec2::new(5.0, 6.0));
            assert_eq!(entity.radius, 10.0);
        }

        #[test]
        fn controller_prefers_owner() {
            let owner = EntityId::new(1);
            let bolt = Entity::from_spec(
                EntityId::new(2),
                EntitySpec::new(EntityTag::Projectile, Vec2::ZERO).with_owner(owner),
            );
            assert_eq!(bolt.controller(), owner);

            let enemy = Entity::from_spec(
                EntityId::new(3),
                EntitySpec::new(EntityTag::Enemy, Vec2::ZERO),
            );
            assert_eq!(enemy.controller(), EntityId::new(3));
        }

        #[test]
        fn consumed_flag() {
            let mut entity = Entity::from_spec(
                EntityId::new(1),
                EntitySpec::new(EntityTag::Projectile, Vec2::ZERO),
            );
            assert!(!entity.is_consumed());
            entity.conditions.flags.insert(EntityFlags::CONSUMED);
            assert!(entity.is_consumed());
        }
    }
}

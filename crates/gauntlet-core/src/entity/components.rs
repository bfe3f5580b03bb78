//! State components carried by every live entity handle.
//!
//! These are the fields the combat core reads and writes on an entity:
//! - [`TransformState`]: position and velocity (the physics collaborator owns
//!   the integration, the core only decides velocities)
//! - [`Vitals`]: health and per-type tag values (speed, contact damage, XP)
//! - [`Conditions`]: timed crowd-control windows plus permanent [`EntityFlags`]
//! - [`ContactSpec`]: which collision label this entity reports on overlap

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionLabel;
use crate::entity::EntityTag;

// =============================================================================
// Transform
// =============================================================================

/// Spatial state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformState {
    /// Position in world units.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
}

impl TransformState {
    /// Creates a stationary transform at `position`.
    #[must_use]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }

    /// Returns `true` if both position components are finite numbers.
    #[must_use]
    pub fn has_finite_position(&self) -> bool {
        self.position.is_finite()
    }
}

// =============================================================================
// Vitals
// =============================================================================

/// Health and per-type tag values for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Damage dealt to the player on contact.
    pub contact_damage: f32,
    /// Experience granted when killed.
    pub xp_value: f32,
}

impl Vitals {
    /// Creates vitals at full health.
    #[must_use]
    pub fn new(max_health: f32, speed: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            speed,
            contact_damage: 0.0,
            xp_value: 0.0,
        }
    }

    /// Returns `true` while health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Health as a fraction of max health, clamped to `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

// =============================================================================
// Conditions
// =============================================================================

bitflags! {
    /// Permanent state flags on an entity.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EntityFlags: u8 {
        /// Reflection shield exhausted; the entity takes full damage.
        const VULNERABLE = 0b0000_0001;
        /// Projectile already resolved its hit; further contacts are ignored.
        const CONSUMED = 0b0000_0010;
        /// Countdown to self-destruction has started.
        const PRIMED = 0b0000_0100;
        /// Boss entered its enraged phase.
        const ENRAGED = 0b0000_1000;
    }
}

/// Timed crowd-control windows and permanent flags.
///
/// Windows are stored as absolute simulation timestamps so they freeze
/// together with the clock while the game is paused.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Conditions {
    /// Permanent flags.
    pub flags: EntityFlags,
    /// Stunned until this simulation time.
    pub stunned_until: f64,
    /// Confused until this simulation time.
    pub confused_until: f64,
    /// Movement is driven by a knockback impulse until this time.
    pub knocked_until: f64,
}

impl Conditions {
    /// Extends the stun window to at least `now + duration`.
    pub fn stun(&mut self, now: f64, duration: f64) {
        self.stunned_until = self.stunned_until.max(now + duration);
    }

    /// Extends the confusion window to at least `now + duration`.
    pub fn confuse(&mut self, now: f64, duration: f64) {
        self.confused_until = self.confused_until.max(now + duration);
    }

    /// Extends the knockback window to at least `now + duration`.
    pub fn knock_back(&mut self, now: f64, duration: f64) {
        self.knocked_until = self.knocked_until.max(now + duration);
    }

    /// Returns `true` while stunned.
    #[must_use]
    pub fn is_stunned(&self, now: f64) -> bool {
        now < self.stunned_until
    }

    /// Returns `true` while confused.
    #[must_use]
    pub fn is_confused(&self, now: f64) -> bool {
        now < self.confused_until
    }

    /// Returns `true` while a knockback impulse owns the velocity.
    #[must_use]
    pub fn is_knocked_back(&self, now: f64) -> bool {
        now < self.knocked_until
    }
}

// =============================================================================
// Contact
// =============================================================================

/// Collision reporting for an entity.
///
/// When this entity overlaps an entity tagged `hits`, the physics layer
/// reports a contact `(label, self, other)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSpec {
    /// Label routed through the collision dispatcher.
    pub label: CollisionLabel,
    /// Tag of the entities this one collides with.
    pub hits: EntityTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitals_start_at_full_health() {
        let vitals = Vitals::new(8.0, 40.0);
        assert_eq!(vitals.health, 8.0);
        assert!(vitals.is_alive());
        assert_eq!(vitals.health_fraction(), 1.0);
    }

    #[test]
    fn zero_max_health_has_zero_fraction() {
        let vitals = Vitals {
            max_health: 0.0,
            ..Vitals::default()
        };
        assert_eq!(vitals.health_fraction(), 0.0);
    }

    #[test]
    fn stun_window_never_shrinks() {
        let mut conditions = Conditions::default();
        conditions.stun(0.0, 1000.0);
        conditions.stun(100.0, 200.0);
        assert_eq!(conditions.stunned_until, 1000.0);
        assert!(conditions.is_stunned(999.0));
        assert!(!conditions.is_stunned(1000.0));
    }

    #[test]
    fn flags_are_independent() {
        let mut conditions = Conditions::default();
        conditions.flags.insert(EntityFlags::CONSUMED);
        assert!(conditions.flags.contains(EntityFlags::CONSUMED));
        assert!(!conditions.flags.contains(EntityFlags::VULNERABLE));
    }

    #[test]
    fn finite_position_check() {
        assert!(TransformState::at(Vec2::new(1.0, 2.0)).has_finite_position());
        assert!(!TransformState::at(Vec2::new(f32::NAN, 0.0)).has_finite_position());
    }
}

//! Stat computation: base stats plus modifiers into a derived snapshot.
//!
//! - [`BaseStats`]: the immutable stat block of an entity type
//! - [`ModifierSet`]: accumulated flat bonuses (sum, from 0) and multipliers
//!   (product, from 1), mutated only through [`ModifierSet::add_bonus`] and
//!   [`ModifierSet::multiply`]
//! - [`StatEngine::compute`]: pure function producing [`DerivedStats`]
//!
//! Each derived stat is `max(lower_bound, (base + bonus) * multiplier)`.
//! Max health only takes flat bonuses and is floored. Current health is
//! carried over from the previous snapshot (clamped to the new max) unless a
//! reset is requested.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::stats::{BaseStats, ModifierSet, StatEngine};
//!
//! let base = BaseStats::new(100.0, 150.0);
//! let mut mods = ModifierSet::new();
//!
//! let fresh = StatEngine::compute(&base, &mods, None, true);
//! assert_eq!(fresh.health, 100.0);
//!
//! // Take some damage, then pick up a health upgrade.
//! let mut hurt = fresh.clone();
//! hurt.health = 40.0;
//! mods.add_bonus("health", 50.0).unwrap();
//!
//! let upgraded = StatEngine::compute(&base, &mods, Some(&hurt), false);
//! assert_eq!(upgraded.max_health, 150.0);
//! assert_eq!(upgraded.health, 40.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, Result};

// =============================================================================
// Stat Keys
// =============================================================================

/// Stats that upgrades may modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKey {
    /// Maximum health (flat bonuses only)
    Health,
    /// Flat damage reduction on player hits
    Armor,
    /// Health restored per regeneration tick
    Regen,
    /// Ability damage
    AbilityDamage,
    /// Ability cooldown in milliseconds
    AbilityCooldown,
    /// Ability area radius
    AbilityRadius,
    /// Pickup range
    PickupRange,
    /// Projectiles per cast
    ProjectileCount,
    /// Movement speed
    MoveSpeed,
    /// Aim accuracy
    Accuracy,
}

impl StatKey {
    /// Every modifiable key.
    pub const ALL: [Self; 10] = [
        Self::Health,
        Self::Armor,
        Self::Regen,
        Self::AbilityDamage,
        Self::AbilityCooldown,
        Self::AbilityRadius,
        Self::PickupRange,
        Self::ProjectileCount,
        Self::MoveSpeed,
        Self::Accuracy,
    ];

    /// The name used in upgrade data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Armor => "armor",
            Self::Regen => "regen",
            Self::AbilityDamage => "abilityDamage",
            Self::AbilityCooldown => "abilityCooldown",
            Self::AbilityRadius => "abilityRadius",
            Self::PickupRange => "pickupRange",
            Self::ProjectileCount => "projectileCount",
            Self::MoveSpeed => "moveSpeed",
            Self::Accuracy => "accuracy",
        }
    }

    /// Smallest value the derived stat may take.
    #[must_use]
    pub const fn lower_bound(self) -> f32 {
        match self {
            Self::Health | Self::ProjectileCount => 1.0,
            Self::Armor | Self::Regen => 0.0,
            Self::AbilityDamage | Self::Accuracy => 0.1,
            Self::AbilityCooldown => 50.0,
            Self::AbilityRadius | Self::MoveSpeed => 10.0,
            Self::PickupRange => 20.0,
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| {
                warn!(key = s, "unknown modifier key");
                CoreError::UnknownModifier(s.to_string())
            })
    }
}

// =============================================================================
// Base Stats
// =============================================================================

mod defaults {
    pub(super) const fn cooldown() -> f32 {
        1000.0
    }
    pub(super) const fn radius() -> f32 {
        100.0
    }
    pub(super) const fn pickup() -> f32 {
        50.0
    }
    pub(super) const fn one() -> f32 {
        1.0
    }
    pub(super) const fn hitbox() -> f32 {
        16.0
    }
}

/// Immutable stat block of an entity type.
///
/// `health` and `move_speed` are required in descriptor data; the remaining
/// fields fall back to neutral defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStats {
    /// Maximum health
    pub health: f32,
    /// Flat damage reduction
    #[serde(default)]
    pub armor: f32,
    /// Health per regeneration tick
    #[serde(default)]
    pub regen: f32,
    /// Ability damage
    #[serde(default)]
    pub ability_damage: f32,
    /// Ability cooldown (ms)
    #[serde(default = "defaults::cooldown")]
    pub ability_cooldown: f32,
    /// Ability area radius
    #[serde(default = "defaults::radius")]
    pub ability_radius: f32,
    /// Pickup range
    #[serde(default = "defaults::pickup")]
    pub pickup_range: f32,
    /// Projectiles per cast
    #[serde(default = "defaults::one")]
    pub projectile_count: f32,
    /// Movement speed (units per second)
    pub move_speed: f32,
    /// Damage dealt on contact
    #[serde(default)]
    pub contact_damage: f32,
    /// Experience awarded on death
    #[serde(default)]
    pub xp_value: f32,
    /// Hitbox radius
    #[serde(default = "defaults::hitbox")]
    pub hitbox_radius: f32,
    /// Relative weight in random enemy draws
    #[serde(default)]
    pub spawn_weight: f32,
    /// Aim accuracy
    #[serde(default = "defaults::one")]
    pub accuracy: f32,
}

impl BaseStats {
    /// Creates a stat block with neutral defaults.
    #[must_use]
    pub fn new(health: f32, move_speed: f32) -> Self {
        Self {
            health,
            armor: 0.0,
            regen: 0.0,
            ability_damage: 0.0,
            ability_cooldown: defaults::cooldown(),
            ability_radius: defaults::radius(),
            pickup_range: defaults::pickup(),
            projectile_count: 1.0,
            move_speed,
            contact_damage: 0.0,
            xp_value: 0.0,
            hitbox_radius: defaults::hitbox(),
            spawn_weight: 0.0,
            accuracy: 1.0,
        }
    }

    /// Sets ability damage, cooldown and radius.
    #[must_use]
    pub fn with_ability(mut self, damage: f32, cooldown: f32, radius: f32) -> Self {
        self.ability_damage = damage;
        self.ability_cooldown = cooldown;
        self.ability_radius = radius;
        self
    }

    /// Sets contact damage and experience value.
    #[must_use]
    pub fn with_contact(mut self, contact_damage: f32, xp_value: f32) -> Self {
        self.contact_damage = contact_damage;
        self.xp_value = xp_value;
        self
    }

    /// Sets the spawn weight.
    #[must_use]
    pub fn with_spawn_weight(mut self, weight: f32) -> Self {
        self.spawn_weight = weight;
        self
    }

    /// Sets the hitbox radius.
    #[must_use]
    pub fn with_hitbox(mut self, radius: f32) -> Self {
        self.hitbox_radius = radius;
        self
    }

    /// Base value of a modifiable stat.
    #[must_use]
    pub fn get(&self, key: StatKey) -> f32 {
        match key {
            StatKey::Health => self.health,
            StatKey::Armor => self.armor,
            StatKey::Regen => self.regen,
            StatKey::AbilityDamage => self.ability_damage,
            StatKey::AbilityCooldown => self.ability_cooldown,
            StatKey::AbilityRadius => self.ability_radius,
            StatKey::PickupRange => self.pickup_range,
            StatKey::ProjectileCount => self.projectile_count,
            StatKey::MoveSpeed => self.move_speed,
            StatKey::Accuracy => self.accuracy,
        }
    }
}

// =============================================================================
// Modifier Set
// =============================================================================

/// Accumulated bonuses and multipliers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifierSet {
    bonuses: BTreeMap<StatKey, f32>,
    multipliers: BTreeMap<StatKey, f32>,
}

impl ModifierSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flat bonus to the stat named `key`.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnknownModifier`] if `key` names no stat,
    /// [`CoreError::InvalidModifier`] if `value` is not finite.
    pub fn add_bonus(&mut self, key: &str, value: f32) -> Result<()> {
        self.add_bonus_to(key.parse()?, value)
    }

    /// Multiplies the stat named `key` by `factor`.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnknownModifier`] if `key` names no stat,
    /// [`CoreError::InvalidModifier`] for health or a non-positive factor.
    pub fn multiply(&mut self, key: &str, factor: f32) -> Result<()> {
        self.multiply_by(key.parse()?, factor)
    }

    /// Typed form of [`ModifierSet::add_bonus`].
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidModifier`] if `value` is not finite.
    pub fn add_bonus_to(&mut self, key: StatKey, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(invalid(key, "bonus must be finite"));
        }
        *self.bonuses.entry(key).or_insert(0.0) += value;
        Ok(())
    }

    /// Typed form of [`ModifierSet::multiply`].
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidModifier`] for health or a non-positive factor.
    pub fn multiply_by(&mut self, key: StatKey, factor: f32) -> Result<()> {
        if key == StatKey::Health {
            return Err(invalid(key, "health only accepts flat bonuses"));
        }
        if !factor.is_finite() || factor <= 0.0 {
            return Err(invalid(key, "factor must be positive and finite"));
        }
        *self.multipliers.entry(key).or_insert(1.0) *= factor;
        Ok(())
    }

    /// Accumulated bonus for `key` (0 when untouched).
    #[must_use]
    pub fn bonus(&self, key: StatKey) -> f32 {
        self.bonuses.get(&key).copied().unwrap_or(0.0)
    }

    /// Accumulated multiplier for `key` (1 when untouched).
    #[must_use]
    pub fn multiplier(&self, key: StatKey) -> f32 {
        self.multipliers.get(&key).copied().unwrap_or(1.0)
    }
}

fn invalid(key: StatKey, reason: &str) -> CoreError {
    warn!(%key, reason, "rejected modifier");
    CoreError::InvalidModifier {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Derived Stats
// =============================================================================

/// Derived stat snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    /// Maximum health (whole number)
    pub max_health: f32,
    /// Current health
    pub health: f32,
    /// Flat damage reduction
    pub armor: f32,
    /// Health per regeneration tick
    pub regen: f32,
    /// Ability damage
    pub ability_damage: f32,
    /// Ability cooldown (ms)
    pub ability_cooldown: f32,
    /// Ability area radius
    pub ability_radius: f32,
    /// Pickup range
    pub pickup_range: f32,
    /// Projectiles per cast
    pub projectile_count: u32,
    /// Movement speed
    pub move_speed: f32,
    /// Aim accuracy
    pub accuracy: f32,
}

impl DerivedStats {
    /// Value of a modifiable stat as `f32`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get(&self, key: StatKey) -> f32 {
        match key {
            StatKey::Health => self.max_health,
            StatKey::Armor => self.armor,
            StatKey::Regen => self.regen,
            StatKey::AbilityDamage => self.ability_damage,
            StatKey::AbilityCooldown => self.ability_cooldown,
            StatKey::AbilityRadius => self.ability_radius,
            StatKey::PickupRange => self.pickup_range,
            StatKey::ProjectileCount => self.projectile_count as f32,
            StatKey::MoveSpeed => self.move_speed,
            StatKey::Accuracy => self.accuracy,
        }
    }
}

/// Stat computation entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatEngine;

impl StatEngine {
    /// Computes a derived snapshot.
    ///
    /// Pure: identical inputs yield identical outputs. With `force_reset`
    /// (or no previous snapshot) health starts at max; otherwise the previous
    /// health is kept and clamped to `[0, max_health]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn compute(
        base: &BaseStats,
        mods: &ModifierSet,
        previous: Option<&DerivedStats>,
        force_reset: bool,
    ) -> DerivedStats {
        let derive = |key: StatKey| {
            let value = (base.get(key) + mods.bonus(key)) * mods.multiplier(key);
            key.lower_bound().max(value)
        };

        let max_health = StatKey::Health
            .lower_bound()
            .max((base.health + mods.bonus(StatKey::Health)).floor());

        let health = match previous {
            Some(prev) if !force_reset => {
                if prev.health.is_finite() {
                    prev.health.clamp(0.0, max_health)
                } else {
                    max_health
                }
            }
            _ => max_health,
        };

        DerivedStats {
            max_health,
            health,
            armor: derive(StatKey::Armor),
            regen: derive(StatKey::Regen),
            ability_damage: derive(StatKey::AbilityDamage),
            ability_cooldown: derive(StatKey::AbilityCooldown),
            ability_radius: derive(StatKey::AbilityRadius),
            pickup_range: derive(StatKey::PickupRange),
            projectile_count: derive(StatKey::ProjectileCount).floor().min(64.0) as u32,
            move_speed: derive(StatKey::MoveSpeed),
            accuracy: derive(StatKey::Accuracy),
        }
    }
}

//! Player state: stats, progression, upgrades and status effects.
//!
//! [`PlayerState`] owns the single source of truth for the player's numbers.
//! The player entity in the world only mirrors health and speed for
//! collaborators that read entity handles.
//!
//! Stats are recomputed synchronously whenever an input changes: with
//! `force_reset` on character selection, without it on every upgrade, so
//! current health carries over.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::SessionConfig;
use crate::entity::{Entity, EntityId};
use crate::error::Result;
use crate::progression::ProgressionRecord;
use crate::stats::{BaseStats, DerivedStats, ModifierSet, StatEngine};
use crate::status::{StatusEffectTracker, StatusKind, StatusVisual};
use crate::upgrades::Upgrade;

/// Indicator priority and tint per status kind.
#[must_use]
pub const fn status_visual(kind: StatusKind) -> StatusVisual {
    match kind {
        StatusKind::Stunned => StatusVisual::new(0).with_tint(0x00FF_FF66),
        StatusKind::Poison => StatusVisual::new(1).with_tint(0x0066_FF66),
        StatusKind::Bleed => StatusVisual::new(2).with_tint(0x00FF_4444),
        StatusKind::Confused => StatusVisual::new(3).with_tint(0x00CC_66FF),
        StatusKind::Slowed => StatusVisual::new(4).with_tint(0x0066_99FF),
        StatusKind::Shielded => StatusVisual::new(5),
    }
}

// =============================================================================
// Player State
// =============================================================================

/// Everything the session tracks about the controlled character.
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Selected character id
    pub character_id: String,
    /// Player entity
    pub entity: EntityId,
    /// Character base stats
    pub base: BaseStats,
    /// Accumulated upgrade modifiers
    pub mods: ModifierSet,
    /// Current derived snapshot
    pub derived: DerivedStats,
    /// Level and experience
    pub progression: ProgressionRecord,
    /// Effects shown above the player
    pub status: StatusEffectTracker,
    /// Level-ups not yet spent on an upgrade
    pub pending_upgrades: u32,
    /// Simulation time of death
    pub defeated_at: Option<f64>,
    applied: Vec<Upgrade>,
    last_regen: f64,
    last_affliction_tick: f64,
}

impl PlayerState {
    /// Fresh state for `character_id` at full health.
    #[must_use]
    pub fn new(
        character_id: &str,
        entity: EntityId,
        base: BaseStats,
        config: &SessionConfig,
        now: f64,
    ) -> Self {
        let mods = ModifierSet::new();
        let derived = StatEngine::compute(&base, &mods, None, true);
        Self {
            character_id: character_id.to_string(),
            entity,
            base,
            mods,
            derived,
            progression: ProgressionRecord::new(config.base_experience),
            status: StatusEffectTracker::new(config.status_spacing),
            pending_upgrades: 0,
            defeated_at: None,
            applied: Vec::new(),
            last_regen: now,
            last_affliction_tick: now,
        }
    }

    /// Recomputes derived stats, keeping current health.
    pub fn recompute(&mut self) {
        self.derived = StatEngine::compute(&self.base, &self.mods, Some(&self.derived), false);
    }

    /// Applies an upgrade and recomputes stats.
    ///
    /// Spends one pending level-up if any are available.
    ///
    /// # Errors
    ///
    /// Propagates a rejected effect; stats are unchanged in that case.
    pub fn apply_upgrade(&mut self, upgrade: &Upgrade) -> Result<()> {
        upgrade.apply(&mut self.mods)?;
        self.recompute();
        self.applied.push(upgrade.clone());
        self.pending_upgrades = self.pending_upgrades.saturating_sub(1);
        debug!(upgrade = %upgrade.id, character = %self.character_id, "upgrade applied");
        Ok(())
    }

    /// Upgrades applied so far, in order.
    #[must_use]
    pub fn character_upgrades(&self) -> &[Upgrade] {
        &self.applied
    }

    /// Whether the player has died.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.defeated_at.is_some()
    }

    /// Removes `amount` health. Returns the health actually lost.
    pub fn lose_health(&mut self, amount: f32) -> f32 {
        let before = self.derived.health;
        self.derived.health = (before - amount.max(0.0)).max(0.0);
        before - self.derived.health
    }

    /// Restores up to `amount` health. Returns the health actually gained.
    pub fn restore_health(&mut self, amount: f32) -> f32 {
        let before = self.derived.health;
        self.derived.health = (before + amount.max(0.0)).min(self.derived.max_health);
        self.derived.health - before
    }

    /// Attaches an effect, keeping poison and bleed unique.
    pub fn afflict(&mut self, kind: StatusKind, duration_ms: f64, wall_now: f64) {
        if matches!(kind, StatusKind::Poison | StatusKind::Bleed) {
            self.status.remove_all_of_type(kind);
        }
        self.status.add(kind, duration_ms, status_visual(kind), wall_now);
        self.sync_afflictions();
    }

    /// Mirrors tracker contents into the progression flags.
    pub fn sync_afflictions(&mut self) {
        self.progression.poisoned = self.status.has(StatusKind::Poison);
        self.progression.bleeding = self.status.has(StatusKind::Bleed);
    }

    /// Regeneration due at `now`, if any.
    ///
    /// Returns the amount to heal when an interval has passed, the player is
    /// below max and no affliction blocks it. The interval timer advances
    /// whether or not healing happens.
    pub fn regen_due(&mut self, now: f64, interval: f64) -> Option<f32> {
        if now - self.last_regen < interval {
            return None;
        }
        self.last_regen = now;
        if !self.progression.can_regenerate() {
            trace!("regeneration blocked by affliction");
            return None;
        }
        (self.derived.health < self.derived.max_health && self.derived.regen > 0.0)
            .then_some(self.derived.regen)
    }

    /// Whether an affliction damage tick is due at `now`.
    pub fn affliction_tick_due(&mut self, now: f64, interval: f64) -> bool {
        if now - self.last_affliction_tick < interval {
            return false;
        }
        self.last_affliction_tick = now;
        !self.progression.can_regenerate()
    }

    /// Copies health and speed onto the player entity.
    pub fn mirror_onto(&self, entity: &mut Entity) {
        let vitals = entity.vitals.get_or_insert_with(Default::default);
        vitals.health = self.derived.health;
        vitals.max_health = self.derived.max_health;
        vitals.speed = self.derived.move_speed;
        entity.radius = self.base.hitbox_radius;
    }

    /// HUD snapshot.
    #[must_use]
    pub fn hud(&self, wall_now: f64) -> HudSnapshot {
        HudSnapshot {
            character_id: self.character_id.clone(),
            health: self.derived.health,
            max_health: self.derived.max_health,
            level: self.progression.level,
            experience: self.progression.experience,
            to_next: self.progression.to_next,
            stats: self.derived.clone(),
            statuses: self
                .status
                .effects()
                .iter()
                .map(|effect| StatusIndicator {
                    kind: effect.kind(),
                    slot: effect.slot(),
                    offset: effect.offset(),
                    remaining_ms: effect.remaining(wall_now),
                    tint: effect.visual().tint,
                })
                .collect(),
            pending_upgrades: self.pending_upgrades,
            game_over: self.is_defeated(),
        }
    }
}

// =============================================================================
// HUD
// =============================================================================

/// One on-screen status indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusIndicator {
    /// Effect kind
    pub kind: StatusKind,
    /// Stack slot, 0 closest to the player
    pub slot: usize,
    /// Indicator position
    pub offset: Vec2,
    /// Time left, `None` for persistent effects
    pub remaining_ms: Option<f64>,
    /// Tint as `0xRRGGBB`
    pub tint: u32,
}

/// Read-out for HUD rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    /// Selected character
    pub character_id: String,
    /// Current health
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
    /// Level
    pub level: u32,
    /// Experience toward the next level
    pub experience: f32,
    /// Experience required for the next level
    pub to_next: f32,
    /// Derived stats
    pub stats: DerivedStats,
    /// Status indicators in slot order
    pub statuses: Vec<StatusIndicator>,
    /// Level-ups waiting for an upgrade pick
    pub pending_upgrades: u32,
    /// Whether the run has ended
    pub game_over: bool,
}

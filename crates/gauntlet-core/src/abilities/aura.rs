//! Persistent damaging aura.
//!
//! The vanguard carries a ring sized by `ability_radius`. Every
//! `ability_cooldown` ms the ring pulses, damaging every enemy inside and
//! pushing it outward.

use serde::{Deserialize, Serialize};

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::entity::{EntitySpec, EntityTag};
use crate::output::{EffectKind, VisualEffect};

use super::common::knock_back;

const RING: &str = "ring";
const PULSE: &str = "pulse";

/// Aura tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuraTuning {
    /// Knockback speed applied to enemies hit by a pulse.
    pub knockback_force: f32,
    /// How long the knockback owns the enemy's velocity (ms).
    pub knockback_ms: f64,
}

impl Default for AuraTuning {
    fn default() -> Self {
        Self {
            knockback_force: 260.0,
            knockback_ms: 150.0,
        }
    }
}

/// Aura behavior.
#[derive(Debug, Clone)]
pub struct AuraBehavior {
    tuning: AuraTuning,
    pulses: u64,
}

impl AuraBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(_type_id: &str, tuning: AuraTuning) -> Self {
        Self { tuning, pulses: 0 }
    }

    /// Number of pulses fired so far.
    #[must_use]
    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    fn pulse(&mut self, ctx: &mut AbilityContext<'_>, center: glam::Vec2) {
        let radius = ctx.stats.ability_radius;
        let damage = ctx.stats.ability_damage;
        let targets = ctx.world.query_radius(center, radius, EntityTag::Enemy);
        for target in targets {
            ctx.world.apply_damage(ctx.entity, target, damage);
            knock_back(
                ctx.world,
                target,
                center,
                self.tuning.knockback_force,
                self.tuning.knockback_ms,
            );
        }
        ctx.world
            .spawn_visual_effect(VisualEffect::new(EffectKind::Pulse, center, radius));
        self.pulses += 1;
    }
}

impl Behavior for AuraBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Aura
    }

    fn setup_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        let now = ctx.now();
        ctx.runtime
            .start_repeating(PULSE, now, f64::from(ctx.stats.ability_cooldown));

        let Some(position) = ctx.check_self().with_position().check().map(|l| l.position) else {
            return;
        };
        let ring = ctx.world.spawn(
            EntitySpec::new(EntityTag::Effect, position)
                .with_radius(ctx.stats.ability_radius)
                .with_owner(ctx.entity),
        );
        ctx.runtime.add_to_group(RING, ring);
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        let now = ctx.now();
        let Some(position) = ctx.check_self().with_position().check().map(|l| l.position) else {
            return;
        };

        let radius = ctx.stats.ability_radius;
        for ring in ctx.runtime.group(RING).to_vec() {
            ctx.world.place(ring, position);
            if let Some(entity) = ctx.world.entity_mut(ring) {
                entity.radius = radius;
            }
        }

        // Upgrades may have changed the cooldown since the last tick.
        ctx.runtime
            .set_interval(PULSE, now, f64::from(ctx.stats.ability_cooldown));
        if ctx.runtime.due_timers(now).contains(&PULSE) {
            self.pulse(ctx, position);
        }
    }
}

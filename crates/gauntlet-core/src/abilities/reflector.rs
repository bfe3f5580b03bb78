//! Damage-reflecting chaser.
//!
//! The mirror sends a fixed fraction of every hit back at the attacker until
//! it has reflected `reflect_cap` damage in total. The hit that exhausts the
//! cap breaks the shield: the entity is flagged `VULNERABLE`, a
//! `ShieldBroken` event fires once, and later damage passes through whole.
//!
//! Damage reflected at the player is direct: armor and the invincibility
//! window do not touch it, so the player loses exactly the reflected share.

use serde::{Deserialize, Serialize};

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::collision::{CollisionHandler, Contact};
use crate::entity::{EntityFlags, EntityId};
use crate::output::{EffectKind, Event, VisualEffect};

use super::chaser::ContactCore;

/// Reflector tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectorTuning {
    /// Multiplier on the entity's speed.
    pub speed_factor: f32,
    /// Fraction of each hit sent back.
    pub reflect_fraction: f32,
    /// Total damage the shield can reflect.
    pub reflect_cap: f32,
}

impl Default for ReflectorTuning {
    fn default() -> Self {
        Self {
            speed_factor: 0.9,
            reflect_fraction: 0.5,
            reflect_cap: 6.0,
        }
    }
}

/// Reflector behavior.
#[derive(Debug, Clone)]
pub struct ReflectorBehavior {
    core: ContactCore,
    tuning: ReflectorTuning,
    reflected: f32,
}

impl ReflectorBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(type_id: &str, tuning: ReflectorTuning) -> Self {
        Self {
            core: ContactCore::new(type_id, None),
            tuning,
            reflected: 0.0,
        }
    }

    /// Total damage reflected so far.
    #[must_use]
    pub fn reflected(&self) -> f32 {
        self.reflected
    }

    fn is_vulnerable(ctx: &AbilityContext<'_>) -> bool {
        ctx.world
            .entity(ctx.entity)
            .is_some_and(|e| e.conditions.flags.contains(EntityFlags::VULNERABLE))
    }

    fn break_shield(ctx: &mut AbilityContext<'_>) {
        let Some(entity) = ctx.world.entity_mut(ctx.entity) else {
            return;
        };
        entity.conditions.flags.insert(EntityFlags::VULNERABLE);
        let (position, radius) = (entity.position(), entity.radius);
        ctx.world.emit(Event::ShieldBroken { entity: ctx.entity }.into());
        ctx.world
            .spawn_visual_effect(VisualEffect::new(EffectKind::ShieldBreak, position, radius));
    }
}

impl Behavior for ReflectorBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Reflector
    }

    fn collision_handlers(&self) -> Vec<CollisionHandler> {
        vec![self.core.handler(self.kind())]
    }

    fn setup_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.reflected = 0.0;
        self.core.attach(ctx);
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.core.chase(ctx, self.tuning.speed_factor);
    }

    fn on_collision(&mut self, ctx: &mut AbilityContext<'_>, contact: &Contact) {
        self.core.strike(ctx, contact);
    }

    fn intercept_damage(
        &mut self,
        ctx: &mut AbilityContext<'_>,
        source: EntityId,
        amount: f32,
    ) -> f32 {
        if amount <= 0.0 || Self::is_vulnerable(ctx) {
            return amount;
        }
        let remaining = (self.tuning.reflect_cap - self.reflected).max(0.0);
        let reflected = (amount * self.tuning.reflect_fraction).min(remaining);
        if reflected <= 0.0 {
            return amount;
        }
        self.reflected += reflected;

        if Some(source) == ctx.world.player() {
            ctx.world.apply_direct_damage_to_player(ctx.entity, reflected);
        } else if source != ctx.entity {
            ctx.world.apply_damage(ctx.entity, source, reflected);
        }
        ctx.world.emit(
            Event::Reflected {
                entity: ctx.entity,
                target: source,
                amount: reflected,
            }
            .into(),
        );

        if self.reflected >= self.tuning.reflect_cap {
            Self::break_shield(ctx);
        }
        amount - reflected
    }
}

//! Delayed self-destruct.
//!
//! The bomber primes when the player comes close or, with some chance,
//! when it takes damage. Priming starts a fixed fuse that cannot be
//! restarted. When the fuse runs out the bomber deals falloff damage and
//! knockback to the player and is removed regardless of its health; no
//! experience is awarded for it.
//!
//! Blast damage is direct: armor, the minimum hit of 1 and the invincibility
//! window would flatten the falloff curve.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::collision::{CollisionHandler, Contact};
use crate::entity::{EntityFlags, EntityId};
use crate::liveness::LivenessCheck;
use crate::output::{EffectKind, Event, VisualEffect};

use super::chaser::ContactCore;
use super::common::{apply_velocity_soft, falloff_damage, knock_back};

const DETONATE: &str = "detonate";

/// Bomber tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BomberTuning {
    /// Multiplier on the entity's speed.
    pub speed_factor: f32,
    /// Player distance that primes the fuse.
    pub trigger_distance: f32,
    /// Chance that taking damage primes the fuse.
    pub damage_trigger_chance: f64,
    /// Fuse length (ms).
    pub fuse_ms: f64,
    /// Blast radius.
    pub blast_radius: f32,
    /// Damage at the blast center.
    pub blast_damage: f32,
    /// Knockback speed applied to the player.
    pub knockback_force: f32,
    /// Knockback duration (ms).
    pub knockback_ms: f64,
}

impl Default for BomberTuning {
    fn default() -> Self {
        Self {
            speed_factor: 1.1,
            trigger_distance: 70.0,
            damage_trigger_chance: 0.25,
            fuse_ms: 1500.0,
            blast_radius: 120.0,
            blast_damage: 4.0,
            knockback_force: 350.0,
            knockback_ms: 250.0,
        }
    }
}

/// Bomber behavior.
#[derive(Debug, Clone)]
pub struct BomberBehavior {
    core: ContactCore,
    tuning: BomberTuning,
}

impl BomberBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(type_id: &str, tuning: BomberTuning) -> Self {
        Self {
            core: ContactCore::new(type_id, None),
            tuning,
        }
    }

    fn is_primed(ctx: &AbilityContext<'_>) -> bool {
        ctx.world
            .entity(ctx.entity)
            .is_some_and(|e| e.conditions.flags.contains(EntityFlags::PRIMED))
    }

    /// Starts the fuse. Returns `false` if it was already running.
    fn prime(&self, ctx: &mut AbilityContext<'_>) -> bool {
        let now = ctx.now();
        let Some(entity) = ctx.world.entity_mut(ctx.entity) else {
            return false;
        };
        if entity.conditions.flags.contains(EntityFlags::PRIMED) {
            return false;
        }
        entity.conditions.flags.insert(EntityFlags::PRIMED);
        let position = entity.position();
        ctx.runtime.start_once(DETONATE, now, self.tuning.fuse_ms);
        ctx.world.spawn_visual_effect(VisualEffect::new(
            EffectKind::Warning,
            position,
            self.tuning.blast_radius,
        ));
        true
    }

    fn detonate(&self, ctx: &mut AbilityContext<'_>) {
        let Some(center) = ctx.check_self().with_position().check().map(|l| l.position) else {
            return;
        };
        let radius = self.tuning.blast_radius;

        if let Some(player) = ctx.world.player() {
            if let Some(at) = ctx.world.player_position() {
                let damage = falloff_damage(self.tuning.blast_damage, center.distance(at), radius);
                if let Some(damage) = damage.filter(|d| *d > 0.0) {
                    ctx.world.apply_direct_damage_to_player(ctx.entity, damage);
                    knock_back(
                        ctx.world,
                        player,
                        center,
                        self.tuning.knockback_force,
                        self.tuning.knockback_ms,
                    );
                }
            }
        }

        ctx.world.emit(
            Event::Exploded {
                entity: ctx.entity,
                position: center,
                radius,
            }
            .into(),
        );
        ctx.world
            .spawn_visual_effect(VisualEffect::new(EffectKind::Explosion, center, radius));
        ctx.world.request_despawn(ctx.entity);
    }
}

impl Behavior for BomberBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Bomber
    }

    fn collision_handlers(&self) -> Vec<CollisionHandler> {
        vec![self.core.handler(self.kind())]
    }

    fn setup_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.core.attach(ctx);
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        let now = ctx.now();
        if ctx.runtime.due_timers(now).contains(&DETONATE) {
            self.detonate(ctx);
            return;
        }

        if Self::is_primed(ctx) {
            apply_velocity_soft(ctx.world, ctx.entity, glam::Vec2::ZERO);
            return;
        }

        let close = LivenessCheck::new(&*ctx.world, ctx.entity)
            .with_position()
            .with_player()
            .check()
            .and_then(|live| Some(live.position.distance(live.player_position?)))
            .is_some_and(|d| d <= self.tuning.trigger_distance);
        if close {
            self.prime(ctx);
        } else {
            self.core.chase(ctx, self.tuning.speed_factor);
        }
    }

    fn on_collision(&mut self, ctx: &mut AbilityContext<'_>, contact: &Contact) {
        self.core.strike(ctx, contact);
    }

    fn intercept_damage(
        &mut self,
        ctx: &mut AbilityContext<'_>,
        _source: EntityId,
        amount: f32,
    ) -> f32 {
        if !Self::is_primed(ctx) {
            let chance = self.tuning.damage_trigger_chance.clamp(0.0, 1.0);
            if ctx.world.rng().gen_bool(chance) {
                self.prime(ctx);
            }
        }
        amount
    }
}

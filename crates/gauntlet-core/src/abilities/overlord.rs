//! Boss: shard volleys, meteors and an enrage phase.
//!
//! The overlord chases slowly and runs two timed attacks:
//!
//! - **volley**: a ring of shards flying outward; each shard hurts the
//!   player once
//! - **meteor**: a falling star aimed at the player's position that stuns
//!   on impact
//!
//! Below `enrage_threshold` health it enrages once: it moves faster, its
//! volleys come more often, and an `Enraged` event fires.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::collision::{CollisionHandler, CollisionLabel, Contact};
use crate::entity::{EntityFlags, EntityId, EntitySpec, EntityTag};
use crate::output::{EffectKind, Event, HitStatus, VisualEffect};
use crate::runtime::StateValue;
use crate::status::StatusKind;

use super::chaser::ContactCore;
use super::common::expire_projectile;
use super::starfall::{advance_stars, spawn_star, FallingStar, ImpactRules};

const SHARDS: &str = "shards";
const METEORS: &str = "meteors";
const VOLLEY: &str = "volley";
const METEOR: &str = "meteor";
const ENRAGED_AT: &str = "enraged_at";

/// Overlord tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlordTuning {
    /// Multiplier on the entity's speed.
    pub speed_factor: f32,
    /// Extra speed multiplier once enraged.
    pub enraged_speed_factor: f32,
    /// Health fraction below which the boss enrages.
    pub enrage_threshold: f32,
    /// Interval between volleys (ms).
    pub volley_interval_ms: f64,
    /// Interval between volleys once enraged (ms).
    pub enraged_volley_interval_ms: f64,
    /// Shards per volley.
    pub shard_count: u32,
    /// Shard speed (units/s).
    pub shard_speed: f32,
    /// Damage per shard.
    pub shard_damage: f32,
    /// Shards older than this are removed (ms).
    pub shard_lifetime_ms: f64,
    /// Interval between meteors (ms).
    pub meteor_interval_ms: f64,
    /// Meteor fall speed (units/s).
    pub meteor_speed: f32,
    /// Meteor spawn height above the target.
    pub meteor_height: f32,
    /// Meteor blast radius.
    pub meteor_radius: f32,
    /// Meteor damage.
    pub meteor_damage: f32,
    /// Stun applied by a meteor (ms).
    pub stun_ms: f64,
    /// Meteor impact conditions.
    pub meteor_impact: ImpactRules,
}

impl Default for OverlordTuning {
    fn default() -> Self {
        Self {
            speed_factor: 0.6,
            enraged_speed_factor: 1.5,
            enrage_threshold: 0.5,
            volley_interval_ms: 2000.0,
            enraged_volley_interval_ms: 1000.0,
            shard_count: 8,
            shard_speed: 220.0,
            shard_damage: 1.0,
            shard_lifetime_ms: 4000.0,
            meteor_interval_ms: 5000.0,
            meteor_speed: 360.0,
            meteor_height: 240.0,
            meteor_radius: 90.0,
            meteor_damage: 3.0,
            stun_ms: 800.0,
            meteor_impact: ImpactRules::default(),
        }
    }
}

/// Overlord behavior.
#[derive(Debug, Clone)]
pub struct OverlordBehavior {
    core: ContactCore,
    shard_label: CollisionLabel,
    tuning: OverlordTuning,
    shards: BTreeMap<EntityId, f64>,
    meteors: BTreeMap<EntityId, FallingStar>,
}

impl OverlordBehavior {
    /// Creates the behavior; shards report contacts as `<type_id>:shard`.
    #[must_use]
    pub fn new(type_id: &str, tuning: OverlordTuning) -> Self {
        Self {
            core: ContactCore::new(type_id, None),
            shard_label: CollisionLabel::namespaced(type_id, "shard"),
            tuning,
            shards: BTreeMap::new(),
            meteors: BTreeMap::new(),
        }
    }

    fn is_enraged(ctx: &AbilityContext<'_>) -> bool {
        ctx.world
            .entity(ctx.entity)
            .is_some_and(|e| e.conditions.flags.contains(EntityFlags::ENRAGED))
    }

    #[allow(clippy::cast_precision_loss)]
    fn volley(&mut self, ctx: &mut AbilityContext<'_>, center: Vec2, now: f64) {
        let count = self.tuning.shard_count.max(1);
        let step = std::f32::consts::TAU / count as f32;
        for i in 0..count {
            let direction = Vec2::from_angle(i as f32 * step);
            let shard = ctx.world.spawn(
                EntitySpec::new(EntityTag::Projectile, center)
                    .with_velocity(direction * self.tuning.shard_speed)
                    .with_radius(6.0)
                    .with_owner(ctx.entity)
                    .with_contact(self.shard_label.clone(), EntityTag::Player),
            );
            ctx.runtime.add_to_group(SHARDS, shard);
            self.shards.insert(shard, now);
        }
    }

    fn sweep_shards(&mut self, ctx: &mut AbilityContext<'_>) {
        for shard in ctx.runtime.group(SHARDS).to_vec() {
            let spawned_at = self.shards.get(&shard).copied().unwrap_or(f64::NEG_INFINITY);
            let consumed = ctx.world.entity(shard).is_some_and(|e| e.is_consumed());
            if consumed {
                ctx.world.despawn(shard);
            }
            if consumed
                || expire_projectile(
                    ctx.world,
                    shard,
                    spawned_at,
                    self.tuning.shard_lifetime_ms,
                    6.0,
                )
            {
                ctx.runtime.remove_from_group(SHARDS, shard);
                self.shards.remove(&shard);
            }
        }
    }

    fn drop_meteor(&mut self, ctx: &mut AbilityContext<'_>, now: f64) {
        let Some(target) = ctx.world.player_position() else {
            return;
        };
        let meteor = spawn_star(
            ctx.world,
            ctx.entity,
            target,
            self.tuning.meteor_height,
            self.tuning.meteor_speed,
        );
        ctx.runtime.add_to_group(METEORS, meteor);
        self.meteors.insert(meteor, FallingStar::new(target, now));
        ctx.world.spawn_visual_effect(VisualEffect::new(
            EffectKind::Warning,
            target,
            self.tuning.meteor_radius,
        ));
    }

    fn meteor_impact(&self, ctx: &mut AbilityContext<'_>, at: Vec2) {
        let radius = self.tuning.meteor_radius;
        let hit = ctx
            .world
            .player_position()
            .is_some_and(|p| p.distance(at) <= radius);
        if hit {
            ctx.world.apply_damage_to_player(
                ctx.entity,
                self.tuning.meteor_damage,
                Some(HitStatus::new(StatusKind::Stunned, self.tuning.stun_ms)),
            );
        }
        ctx.world
            .spawn_visual_effect(VisualEffect::new(EffectKind::Impact, at, radius));
    }

    fn maybe_enrage(&self, ctx: &mut AbilityContext<'_>, now: f64) {
        let Some(entity) = ctx.world.entity_mut(ctx.entity) else {
            return;
        };
        let below = entity
            .vitals
            .is_some_and(|v| v.health_fraction() < self.tuning.enrage_threshold);
        if !below || entity.conditions.flags.contains(EntityFlags::ENRAGED) {
            return;
        }
        entity.conditions.flags.insert(EntityFlags::ENRAGED);
        let (position, radius) = (entity.position(), entity.radius);

        ctx.runtime
            .set_interval(VOLLEY, now, self.tuning.enraged_volley_interval_ms);
        ctx.runtime.set_state(ENRAGED_AT, StateValue::Number(now));
        ctx.world.emit(Event::Enraged { entity: ctx.entity }.into());
        ctx.world
            .spawn_visual_effect(VisualEffect::new(EffectKind::Enrage, position, radius));
    }
}

impl Behavior for OverlordBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Overlord
    }

    fn collision_handlers(&self) -> Vec<CollisionHandler> {
        vec![
            self.core.handler(self.kind()),
            CollisionHandler::new(self.shard_label.clone(), self.kind()),
        ]
    }

    fn setup_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.core.attach(ctx);
        let now = ctx.now();
        ctx.runtime
            .start_repeating(VOLLEY, now, self.tuning.volley_interval_ms);
        ctx.runtime
            .start_repeating(METEOR, now, self.tuning.meteor_interval_ms);
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        let now = ctx.now();
        let Some(center) = ctx.check_self().with_position().check().map(|l| l.position) else {
            return;
        };

        self.maybe_enrage(ctx, now);
        let speed = if Self::is_enraged(ctx) {
            self.tuning.speed_factor * self.tuning.enraged_speed_factor
        } else {
            self.tuning.speed_factor
        };
        self.core.chase(ctx, speed);

        self.sweep_shards(ctx);
        let rules = self.tuning.meteor_impact;
        for (_, at, _) in advance_stars(ctx, &mut self.meteors, METEORS, &rules) {
            self.meteor_impact(ctx, at);
        }

        for timer in ctx.runtime.due_timers(now) {
            match timer {
                VOLLEY => self.volley(ctx, center, now),
                METEOR => self.drop_meteor(ctx, now),
                _ => {}
            }
        }
    }

    fn on_collision(&mut self, ctx: &mut AbilityContext<'_>, contact: &Contact) {
        if contact.label != self.shard_label {
            self.core.strike(ctx, contact);
            return;
        }
        if Some(contact.target) != ctx.world.player() {
            return;
        }
        let Some(shard) = ctx.world.entity_mut(contact.source) else {
            return;
        };
        if shard.is_consumed() {
            return;
        }
        shard.conditions.flags.insert(EntityFlags::CONSUMED);
        shard.transform.velocity = Vec2::ZERO;
        ctx.world
            .apply_damage_to_player(ctx.entity, self.tuning.shard_damage, None);
    }

    fn cleanup(&mut self, _ctx: &mut AbilityContext<'_>) {
        self.shards.clear();
        self.meteors.clear();
    }
}

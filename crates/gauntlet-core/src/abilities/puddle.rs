//! Thrown flasks and slowing puddles.
//!
//! The alchemist lobs a flask at the nearest enemy's position. When the
//! flask reaches that point (or has flown too long) it breaks into a puddle
//! hazard with its own lifespan. Every tick the puddle damages the enemies
//! standing in it and slows them.
//!
//! Slows are tracked in a ledger that stores each enemy's pre-slow speed.
//! Leaving the last puddle, puddle expiry and cleanup all restore that
//! stored value; the speed is never recovered by dividing the slow factor
//! back out.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::entity::{EntityId, EntitySpec, EntityTag};
use crate::liveness::LivenessCheck;
use crate::output::{EffectKind, VisualEffect};
use crate::world::WorldContext;

use super::common::heading;

const FLASKS: &str = "flasks";
const PUDDLES: &str = "puddles";

/// Puddle tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuddleTuning {
    /// Flask speed (units/s).
    pub flask_speed: f32,
    /// Maximum throw distance.
    pub throw_range: f32,
    /// A flask within this distance of its target point lands.
    pub arrival_threshold: f32,
    /// A flask still flying after this long lands where it is (ms).
    pub max_flight_ms: f64,
    /// Puddle lifespan (ms).
    pub lifetime_ms: f64,
    /// Interval between damage ticks (ms).
    pub tick_interval_ms: f64,
    /// Fraction of ability damage dealt per tick.
    pub tick_damage_scale: f32,
    /// Speed multiplier while standing in a puddle.
    pub slow_factor: f32,
}

impl Default for PuddleTuning {
    fn default() -> Self {
        Self {
            flask_speed: 300.0,
            throw_range: 350.0,
            arrival_threshold: 12.0,
            max_flight_ms: 3000.0,
            lifetime_ms: 3000.0,
            tick_interval_ms: 500.0,
            tick_damage_scale: 0.5,
            slow_factor: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
struct Flask {
    target: Vec2,
    thrown_at: f64,
}

#[derive(Debug, Clone)]
struct Puddle {
    expires_at: f64,
    next_tick: f64,
    radius: f32,
    occupants: BTreeSet<EntityId>,
}

/// Pre-slow speed of one enemy and how many puddles hold the slow.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SlowEntry {
    original_speed: f32,
    holders: u32,
}

/// Puddle behavior.
#[derive(Debug, Clone)]
pub struct PuddleBehavior {
    tuning: PuddleTuning,
    last_throw: Option<f64>,
    flasks: BTreeMap<EntityId, Flask>,
    puddles: BTreeMap<EntityId, Puddle>,
    slows: BTreeMap<EntityId, SlowEntry>,
}

impl PuddleBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(_type_id: &str, tuning: PuddleTuning) -> Self {
        Self {
            tuning,
            last_throw: None,
            flasks: BTreeMap::new(),
            puddles: BTreeMap::new(),
            slows: BTreeMap::new(),
        }
    }

    /// Number of enemies currently slowed.
    #[must_use]
    pub fn slowed_count(&self) -> usize {
        self.slows.len()
    }

    fn apply_slow(&mut self, world: &mut dyn WorldContext, target: EntityId) {
        if let Some(entry) = self.slows.get_mut(&target) {
            entry.holders += 1;
            return;
        }
        let Some(vitals) = world.entity_mut(target).and_then(|e| e.vitals.as_mut()) else {
            return;
        };
        self.slows.insert(
            target,
            SlowEntry {
                original_speed: vitals.speed,
                holders: 1,
            },
        );
        vitals.speed *= self.tuning.slow_factor;
    }

    fn release_slow(&mut self, world: &mut dyn WorldContext, target: EntityId) {
        let Some(entry) = self.slows.get_mut(&target) else {
            return;
        };
        entry.holders = entry.holders.saturating_sub(1);
        if entry.holders > 0 {
            return;
        }
        let original = entry.original_speed;
        self.slows.remove(&target);
        if let Some(vitals) = world.entity_mut(target).and_then(|e| e.vitals.as_mut()) {
            vitals.speed = original;
        } else {
            trace!(entity = %target, "slowed entity gone before restore");
        }
    }

    fn throw(&mut self, ctx: &mut AbilityContext<'_>, from: Vec2, now: f64) {
        let Some(target) = ctx
            .world
            .nearest(from, EntityTag::Enemy, self.tuning.throw_range)
            .and_then(|id| ctx.world.entity(id))
            .map(|e| e.position())
        else {
            return;
        };
        let direction = heading(from, target, Vec2::X);
        let flask = ctx.world.spawn(
            EntitySpec::new(EntityTag::Projectile, from)
                .with_velocity(direction * self.tuning.flask_speed)
                .with_radius(6.0)
                .with_owner(ctx.entity),
        );
        ctx.runtime.add_to_group(FLASKS, flask);
        self.flasks.insert(
            flask,
            Flask {
                target,
                thrown_at: now,
            },
        );
        self.last_throw = Some(now);
    }

    fn land_flasks(&mut self, ctx: &mut AbilityContext<'_>, now: f64) {
        let ids: Vec<EntityId> = self.flasks.keys().copied().collect();
        for id in ids {
            let Some(flask) = self.flasks.get(&id).cloned() else {
                continue;
            };
            let position = LivenessCheck::new(&*ctx.world, id)
                .with_position()
                .check()
                .map(|l| l.position);
            let landed = match position {
                None => None,
                Some(p) if p.distance(flask.target) < self.tuning.arrival_threshold => Some(p),
                Some(p) if now - flask.thrown_at >= self.tuning.max_flight_ms => Some(p),
                Some(_) => continue,
            };

            ctx.world.despawn(id);
            ctx.runtime.remove_from_group(FLASKS, id);
            self.flasks.remove(&id);
            if let Some(at) = landed {
                self.spawn_puddle(ctx, at, now);
            }
        }
    }

    fn spawn_puddle(&mut self, ctx: &mut AbilityContext<'_>, at: Vec2, now: f64) {
        let radius = ctx.stats.ability_radius;
        let puddle = ctx.world.spawn(
            EntitySpec::new(EntityTag::Hazard, at)
                .with_radius(radius)
                .with_owner(ctx.entity),
        );
        ctx.runtime.add_to_group(PUDDLES, puddle);
        self.puddles.insert(
            puddle,
            Puddle {
                expires_at: now + self.tuning.lifetime_ms,
                next_tick: now,
                radius,
                occupants: BTreeSet::new(),
            },
        );
        ctx.world
            .spawn_visual_effect(VisualEffect::new(EffectKind::Impact, at, radius));
    }

    fn expire_puddle(&mut self, ctx: &mut AbilityContext<'_>, id: EntityId) {
        if let Some(puddle) = self.puddles.remove(&id) {
            for occupant in puddle.occupants {
                self.release_slow(ctx.world, occupant);
            }
        }
        ctx.world.despawn(id);
        ctx.runtime.remove_from_group(PUDDLES, id);
    }

    fn tick_puddles(&mut self, ctx: &mut AbilityContext<'_>, now: f64) {
        let ids: Vec<EntityId> = self.puddles.keys().copied().collect();
        for id in ids {
            let Some(center) = LivenessCheck::new(&*ctx.world, id)
                .with_position()
                .check()
                .map(|l| l.position)
            else {
                self.expire_puddle(ctx, id);
                continue;
            };
            let Some(puddle) = self.puddles.get(&id) else {
                continue;
            };
            if now >= puddle.expires_at {
                self.expire_puddle(ctx, id);
                continue;
            }

            let inside: BTreeSet<EntityId> = ctx
                .world
                .query_radius(center, puddle.radius, EntityTag::Enemy)
                .into_iter()
                .collect();
            let left: Vec<EntityId> = puddle.occupants.difference(&inside).copied().collect();
            let ticking = now >= puddle.next_tick;

            for target in left {
                self.release_slow(ctx.world, target);
                if let Some(puddle) = self.puddles.get_mut(&id) {
                    puddle.occupants.remove(&target);
                }
            }

            if !ticking {
                continue;
            }
            let damage = ctx.stats.ability_damage * self.tuning.tick_damage_scale;
            for &target in &inside {
                ctx.world.apply_damage(ctx.entity, target, damage);
                let newcomer = self
                    .puddles
                    .get_mut(&id)
                    .is_some_and(|p| p.occupants.insert(target));
                if newcomer {
                    self.apply_slow(ctx.world, target);
                }
            }
            if let Some(puddle) = self.puddles.get_mut(&id) {
                puddle.next_tick = now + self.tuning.tick_interval_ms;
            }
        }
    }
}

impl Behavior for PuddleBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Puddle
    }

    fn setup_ability(&mut self, _ctx: &mut AbilityContext<'_>) {
        self.last_throw = None;
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        let now = ctx.now();
        let Some(from) = ctx.check_self().with_position().check().map(|l| l.position) else {
            return;
        };
        self.land_flasks(ctx, now);
        self.tick_puddles(ctx, now);

        let cooldown = f64::from(ctx.stats.ability_cooldown);
        if self.last_throw.map_or(true, |last| now - last >= cooldown) {
            self.throw(ctx, from, now);
        }
    }

    fn cleanup(&mut self, ctx: &mut AbilityContext<'_>) {
        for (target, entry) in std::mem::take(&mut self.slows) {
            if let Some(vitals) = ctx
                .world
                .entity_mut(target)
                .and_then(|e| e.vitals.as_mut())
            {
                vitals.speed = entry.original_speed;
            }
        }
        self.flasks.clear();
        self.puddles.clear();
    }
}

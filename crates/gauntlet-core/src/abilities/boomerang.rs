//! Fixed-heading boomerang blades.
//!
//! Each throw picks a heading once: toward the nearest enemy, or +X when
//! none is in sight. Outbound blades keep that heading until they have
//! traveled `max_range`, then turn around and re-aim at the thrower every
//! update until caught. A blade damages each enemy at most once per flight.
//!
//! ```text
//!   Outbound ──traveled ≥ max_range──▶ Returning ──within catch radius──▶ caught
//! ```

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::collision::{CollisionHandler, CollisionLabel, Contact};
use crate::entity::{EntityId, EntitySpec, EntityTag};
use crate::liveness::LivenessCheck;

use super::common::{apply_velocity_soft, heading};

const BLADES: &str = "blades";

/// Boomerang tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoomerangTuning {
    /// Blade speed (units/s).
    pub blade_speed: f32,
    /// Outbound distance before turning back.
    pub max_range: f32,
    /// Distance at which a returning blade is caught.
    pub catch_radius: f32,
    /// Blade hitbox radius.
    pub blade_radius: f32,
    /// Angle between blades of one throw (radians).
    pub fan_angle: f32,
    /// Blades still flying after this long are removed (ms).
    pub max_flight_ms: f64,
}

impl Default for BoomerangTuning {
    fn default() -> Self {
        Self {
            blade_speed: 360.0,
            max_range: 320.0,
            catch_radius: 24.0,
            blade_radius: 10.0,
            fan_angle: 0.3,
            max_flight_ms: 8000.0,
        }
    }
}

/// Flight state of one blade.
#[derive(Debug, Clone, PartialEq)]
pub struct Blade {
    /// Outbound heading, fixed at spawn.
    pub heading: Vec2,
    /// Path length covered so far.
    pub traveled: f32,
    /// Whether the blade is flying back.
    pub returning: bool,
    last_position: Vec2,
    thrown_at: f64,
    hit: BTreeSet<EntityId>,
}

/// Boomerang behavior.
#[derive(Debug, Clone)]
pub struct BoomerangBehavior {
    label: CollisionLabel,
    tuning: BoomerangTuning,
    last_throw: Option<f64>,
    blades: BTreeMap<EntityId, Blade>,
}

impl BoomerangBehavior {
    /// Creates the behavior; blades report contacts as `<type_id>:blade`.
    #[must_use]
    pub fn new(type_id: &str, tuning: BoomerangTuning) -> Self {
        Self {
            label: CollisionLabel::namespaced(type_id, "blade"),
            tuning,
            last_throw: None,
            blades: BTreeMap::new(),
        }
    }

    /// Flight state of a blade.
    #[must_use]
    pub fn blade(&self, id: EntityId) -> Option<&Blade> {
        self.blades.get(&id)
    }

    fn drop_blade(&mut self, ctx: &mut AbilityContext<'_>, id: EntityId) {
        ctx.world.despawn(id);
        ctx.runtime.remove_from_group(BLADES, id);
        self.blades.remove(&id);
    }

    #[allow(clippy::cast_precision_loss)]
    fn throw(&mut self, ctx: &mut AbilityContext<'_>, from: Vec2, now: f64) {
        let aim = ctx
            .world
            .nearest(from, EntityTag::Enemy, self.tuning.max_range)
            .and_then(|id| ctx.world.entity(id))
            .map_or(Vec2::X, |target| heading(from, target.position(), Vec2::X));

        let count = ctx.stats.projectile_count.max(1);
        let first = -((count - 1) as f32) * self.tuning.fan_angle / 2.0;
        for i in 0..count {
            let direction = Vec2::from_angle(first + i as f32 * self.tuning.fan_angle).rotate(aim);
            let blade = ctx.world.spawn(
                EntitySpec::new(EntityTag::Projectile, from)
                    .with_velocity(direction * self.tuning.blade_speed)
                    .with_radius(self.tuning.blade_radius)
                    .with_owner(ctx.entity)
                    .with_contact(self.label.clone(), EntityTag::Enemy),
            );
            ctx.runtime.add_to_group(BLADES, blade);
            self.blades.insert(
                blade,
                Blade {
                    heading: direction,
                    traveled: 0.0,
                    returning: false,
                    last_position: from,
                    thrown_at: now,
                    hit: BTreeSet::new(),
                },
            );
        }
        self.last_throw = Some(now);
    }

    fn fly(&mut self, ctx: &mut AbilityContext<'_>, owner: Vec2, now: f64) {
        let ids: Vec<EntityId> = self.blades.keys().copied().collect();
        for id in ids {
            let Some(position) = LivenessCheck::new(&*ctx.world, id)
                .with_position()
                .check()
                .map(|l| l.position)
            else {
                self.drop_blade(ctx, id);
                continue;
            };
            let Some(blade) = self.blades.get_mut(&id) else {
                continue;
            };
            if now - blade.thrown_at >= self.tuning.max_flight_ms {
                self.drop_blade(ctx, id);
                continue;
            }

            blade.traveled += position.distance(blade.last_position);
            blade.last_position = position;
            if !blade.returning && blade.traveled >= self.tuning.max_range {
                blade.returning = true;
            }

            let velocity = if blade.returning {
                if position.distance(owner) < self.tuning.catch_radius {
                    self.drop_blade(ctx, id);
                    continue;
                }
                heading(position, owner, -blade.heading) * self.tuning.blade_speed
            } else {
                blade.heading * self.tuning.blade_speed
            };
            apply_velocity_soft(ctx.world, id, velocity);
        }
    }
}

impl Behavior for BoomerangBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Boomerang
    }

    fn collision_handlers(&self) -> Vec<CollisionHandler> {
        vec![CollisionHandler::new(self.label.clone(), self.kind())]
    }

    fn setup_ability(&mut self, _ctx: &mut AbilityContext<'_>) {
        self.last_throw = None;
        self.blades.clear();
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        let now = ctx.now();
        let Some(owner) = ctx.check_self().with_position().check().map(|l| l.position) else {
            return;
        };
        self.fly(ctx, owner, now);

        let cooldown = f64::from(ctx.stats.ability_cooldown);
        if self.last_throw.map_or(true, |last| now - last >= cooldown) {
            self.throw(ctx, owner, now);
        }
    }

    fn on_collision(&mut self, ctx: &mut AbilityContext<'_>, contact: &Contact) {
        let Some(blade) = self.blades.get_mut(&contact.source) else {
            return;
        };
        if blade.hit.insert(contact.target) {
            ctx.world
                .apply_damage(ctx.entity, contact.target, ctx.stats.ability_damage);
        }
    }

    fn cleanup(&mut self, _ctx: &mut AbilityContext<'_>) {
        self.blades.clear();
    }
}

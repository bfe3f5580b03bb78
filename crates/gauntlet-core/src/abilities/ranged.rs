//! Cooldown-gated ranged bolts.
//!
//! The ranger fires when the cooldown has elapsed and an enemy is within
//! range. Aim carries a random spread inversely proportional to accuracy.
//! A bolt damages the first enemy it touches, is marked consumed, and is
//! swept on the next update; duplicate contacts against a consumed bolt are
//! ignored.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::collision::{CollisionHandler, CollisionLabel, Contact};
use crate::entity::{EntityFlags, EntityId, EntitySpec, EntityTag};

use super::common::{aim_with_spread, expire_projectile, heading};

const BOLTS: &str = "bolts";

/// Ranged tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedTuning {
    /// Bolt speed (units/s).
    pub bolt_speed: f32,
    /// Bolt hitbox radius.
    pub bolt_radius: f32,
    /// Bolts older than this are removed (ms).
    pub bolt_lifetime_ms: f64,
    /// Targets farther than this are ignored.
    pub target_range: f32,
    /// Spread at accuracy 1.0 (radians).
    pub base_spread: f32,
    /// Upper bound on spread (radians).
    pub max_spread: f32,
}

impl Default for RangedTuning {
    fn default() -> Self {
        Self {
            bolt_speed: 420.0,
            bolt_radius: 6.0,
            bolt_lifetime_ms: 2500.0,
            target_range: 450.0,
            base_spread: 0.12,
            max_spread: 0.6,
        }
    }
}

impl RangedTuning {
    /// Spread for the given accuracy.
    #[must_use]
    pub fn spread(&self, accuracy: f32) -> f32 {
        (self.base_spread / accuracy.max(f32::EPSILON)).min(self.max_spread)
    }
}

/// Ranged behavior.
#[derive(Debug, Clone)]
pub struct RangedBehavior {
    label: CollisionLabel,
    tuning: RangedTuning,
    last_fire: Option<f64>,
    /// Bolt → spawn time.
    bolts: BTreeMap<EntityId, f64>,
}

impl RangedBehavior {
    /// Creates the behavior; bolts report contacts as `<type_id>:bolt`.
    #[must_use]
    pub fn new(type_id: &str, tuning: RangedTuning) -> Self {
        Self {
            label: CollisionLabel::namespaced(type_id, "bolt"),
            tuning,
            last_fire: None,
            bolts: BTreeMap::new(),
        }
    }

    /// Simulation time of the last shot.
    #[must_use]
    pub fn last_fire(&self) -> Option<f64> {
        self.last_fire
    }

    fn ready(&self, now: f64, cooldown: f64) -> bool {
        self.last_fire.map_or(true, |last| now - last >= cooldown)
    }

    fn sweep(&mut self, ctx: &mut AbilityContext<'_>) {
        for bolt in ctx.runtime.group(BOLTS).to_vec() {
            let spawned_at = self.bolts.get(&bolt).copied().unwrap_or(f64::NEG_INFINITY);
            let consumed = ctx.world.entity(bolt).is_some_and(|e| e.is_consumed());
            if consumed {
                ctx.world.despawn(bolt);
            }
            if consumed
                || expire_projectile(
                    ctx.world,
                    bolt,
                    spawned_at,
                    self.tuning.bolt_lifetime_ms,
                    self.tuning.bolt_radius,
                )
            {
                ctx.runtime.remove_from_group(BOLTS, bolt);
                self.bolts.remove(&bolt);
            }
        }
    }

    fn fire(&mut self, ctx: &mut AbilityContext<'_>, from: Vec2, target: Vec2, now: f64) {
        let spread = self.tuning.spread(ctx.stats.accuracy);
        let direction = aim_with_spread(ctx.world.rng(), heading(from, target, Vec2::X), spread);
        let bolt = ctx.world.spawn(
            EntitySpec::new(EntityTag::Projectile, from)
                .with_velocity(direction * self.tuning.bolt_speed)
                .with_radius(self.tuning.bolt_radius)
                .with_owner(ctx.entity)
                .with_contact(self.label.clone(), EntityTag::Enemy),
        );
        ctx.runtime.add_to_group(BOLTS, bolt);
        self.bolts.insert(bolt, now);
        self.last_fire = Some(now);
    }
}

impl Behavior for RangedBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Ranged
    }

    fn collision_handlers(&self) -> Vec<CollisionHandler> {
        vec![CollisionHandler::new(self.label.clone(), self.kind())]
    }

    fn setup_ability(&mut self, _ctx: &mut AbilityContext<'_>) {
        self.last_fire = None;
        self.bolts.clear();
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.sweep(ctx);

        let now = ctx.now();
        if !self.ready(now, f64::from(ctx.stats.ability_cooldown)) {
            return;
        }
        let Some(from) = ctx.check_self().with_position().check().map(|l| l.position) else {
            return;
        };
        let Some(target) = ctx
            .world
            .nearest(from, EntityTag::Enemy, self.tuning.target_range)
            .and_then(|id| ctx.world.entity(id))
            .map(|e| e.position())
        else {
            return;
        };
        self.fire(ctx, from, target, now);
    }

    fn on_collision(&mut self, ctx: &mut AbilityContext<'_>, contact: &Contact) {
        let Some(bolt) = ctx.world.entity_mut(contact.source) else {
            return;
        };
        if bolt.is_consumed() {
            return;
        }
        bolt.conditions.flags.insert(EntityFlags::CONSUMED);
        bolt.transform.velocity = Vec2::ZERO;
        ctx.world
            .apply_damage(ctx.entity, contact.target, ctx.stats.ability_damage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorHost;
    use crate::entity::Vitals;
    use crate::output::{Modifier, Output};
    use crate::stats::{BaseStats, DerivedStats, ModifierSet, StatEngine};
    use crate::world::{World, WorldContext};

    fn stats() -> DerivedStats {
        let base = BaseStats::new(10.0, 100.0).with_ability(3.0, 400.0, 60.0);
        StatEngine::compute(&base, &ModifierSet::new(), None, true)
    }

    fn setup() -> (World, BehaviorHost, DerivedStats, EntityId) {
        let mut world = World::new(11);
        let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO));
        world.set_player(Some(player));
        let stats = stats();
        let mut host = BehaviorHost::new(
            player,
            "ranger",
            Box::new(RangedBehavior::new("ranger", RangedTuning::default())),
        );
        host.setup(&mut world, &stats);
        (world, host, stats, player)
    }

    fn damage_count(world: &mut World) -> usize {
        world
            .drain_outputs()
            .into_iter()
            .filter(|env| {
                matches!(
                    env.output(),
                    Output::Modifier(Modifier::ApplyDamage { .. })
                )
            })
            .count()
    }

    #[test]
    fn no_target_means_no_shot() {
        let (mut world, mut host, stats, _) = setup();
        host.update(&mut world, &stats);
        assert_eq!(host.runtime().group(BOLTS).len(), 0);
    }

    #[test]
    fn fires_once_per_cooldown() {
        let (mut world, mut host, stats, _) = setup();
        world.spawn(
            EntitySpec::new(EntityTag::Enemy, Vec2::new(200.0, 0.0))
                .with_vitals(Vitals::new(5.0, 0.0)),
        );

        host.update(&mut world, &stats);
        assert_eq!(host.runtime().group(BOLTS).len(), 1);

        world.clock_mut().update(399.0, false);
        host.update(&mut world, &stats);
        assert_eq!(host.runtime().group(BOLTS).len(), 1);

        world.clock_mut().update(400.0, false);
        host.update(&mut world, &stats);
        assert_eq!(host.runtime().group(BOLTS).len(), 2);
    }

    #[test]
    fn bolt_aim_stays_within_spread() {
        let (mut world, mut host, stats, _) = setup();
        world.spawn(
            EntitySpec::new(EntityTag::Enemy, Vec2::new(200.0, 0.0))
                .with_vitals(Vitals::new(5.0, 0.0)),
        );
        host.update(&mut world, &stats);

        let bolt = host.runtime().group(BOLTS)[0];
        let velocity = world.entity(bolt).unwrap().velocity();
        let spread = RangedTuning::default().spread(stats.accuracy);
        assert!(velocity.y.atan2(velocity.x).abs() <= spread + 1e-5);
        assert!((velocity.length() - 420.0).abs() < 1e-3);
    }

    #[test]
    fn consumed_bolt_damages_once() {
        let (mut world, mut host, stats, _) = setup();
        let enemy = world.spawn(
            EntitySpec::new(EntityTag::Enemy, Vec2::new(200.0, 0.0))
                .with_vitals(Vitals::new(5.0, 0.0)),
        );
        host.update(&mut world, &stats);
        let bolt = host.runtime().group(BOLTS)[0];

        let contact = Contact::new(CollisionLabel::from_static("ranger:bolt"), bolt, enemy);
        host.handle_collision(&mut world, &stats, &contact);
        host.handle_collision(&mut world, &stats, &contact);
        assert_eq!(damage_count(&mut world), 1);

        host.update(&mut world, &stats);
        assert!(world.entity(bolt).is_none());
        assert!(host.runtime().group(BOLTS).is_empty());
    }

    #[test]
    fn old_bolts_expire() {
        let (mut world, mut host, stats, _) = setup();
        let enemy = world.spawn(
            EntitySpec::new(EntityTag::Enemy, Vec2::new(200.0, 0.0))
                .with_vitals(Vitals::new(5.0, 0.0)),
        );
        host.update(&mut world, &stats);
        let bolt = host.runtime().group(BOLTS)[0];
        world.despawn(enemy);

        world.clock_mut().update(2500.0, false);
        host.update(&mut world, &stats);
        assert!(world.entity(bolt).is_none());
    }

    #[test]
    fn spread_shrinks_with_accuracy() {
        let tuning = RangedTuning::default();
        assert!(tuning.spread(2.0) < tuning.spread(1.0));
        assert_eq!(tuning.spread(0.01), tuning.max_spread);
    }
}

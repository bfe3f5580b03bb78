//! Falling stars with delayed area impact.
//!
//! A star spawns offset above its target point and flies toward it. It
//! impacts when any of these hold, checked in this order:
//!
//! 1. its age reached the hard cap (no star lives forever)
//! 2. it is within the arrival threshold of the target point
//! 3. it left the arena bounds after having been inside them
//! 4. its speed has stayed near zero for the stuck grace period
//!
//! An impact resolves exactly once: the star is removed from tracking before
//! its effects are applied. A star aimed near the arena edge may spawn
//! outside the bounds; it only counts as lost once it has flown in and out
//! again. The astromancer's stars damage and confuse every
//! enemy in `ability_radius`; the overlord reuses [`FallingStar`] for its
//! stunning meteors.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::arena::Bounds;
use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::entity::{EntityId, EntitySpec, EntityTag};
use crate::liveness::LivenessCheck;
use crate::output::{EffectKind, VisualEffect};
use crate::world::WorldContext;

use super::common::heading;

const STARS: &str = "stars";

// =============================================================================
// Falling Star
// =============================================================================

/// Impact conditions for a falling projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactRules {
    /// Distance to the target point that counts as arrival.
    pub threshold: f32,
    /// Hard age cap (ms).
    pub max_age_ms: f64,
    /// Speeds below this count as stuck.
    pub stuck_speed: f32,
    /// How long a star may stay stuck before it impacts (ms).
    pub stuck_grace_ms: f64,
    /// Slack outside the arena bounds before a star counts as lost.
    pub bounds_margin: f32,
}

impl Default for ImpactRules {
    fn default() -> Self {
        Self {
            threshold: 14.0,
            max_age_ms: 2500.0,
            stuck_speed: 5.0,
            stuck_grace_ms: 300.0,
            bounds_margin: 50.0,
        }
    }
}

/// Why a star impacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactCause {
    /// Age cap reached
    Expired,
    /// Reached the target point
    Arrived,
    /// Left the arena
    OutOfBounds,
    /// Stopped moving
    Stuck,
}

/// Flight state of one star.
#[derive(Debug, Clone, PartialEq)]
pub struct FallingStar {
    /// Target point.
    pub target: Vec2,
    spawned_at: f64,
    stuck_since: Option<f64>,
    entered: bool,
}

impl FallingStar {
    /// Creates a star aimed at `target`.
    #[must_use]
    pub fn new(target: Vec2, spawned_at: f64) -> Self {
        Self {
            target,
            spawned_at,
            stuck_since: None,
            entered: false,
        }
    }

    /// Checks the impact conditions for the current sample.
    ///
    /// # Example
    ///
    /// ```
    /// use gauntlet_core::abilities::starfall::{FallingStar, ImpactCause, ImpactRules};
    /// use gauntlet_core::arena::Bounds;
    /// use glam::Vec2;
    ///
    /// let rules = ImpactRules::default();
    /// let bounds = Bounds::new(1000.0, 1000.0);
    /// let mut star = FallingStar::new(Vec2::ZERO, 0.0);
    ///
    /// let far = Vec2::new(0.0, -200.0);
    /// let falling = Vec2::new(0.0, 400.0);
    /// assert_eq!(star.check(far, falling, 100.0, bounds, &rules), None);
    /// assert_eq!(star.check(Vec2::new(0.0, -5.0), falling, 200.0, bounds, &rules), Some(ImpactCause::Arrived));
    /// assert_eq!(star.check(far, falling, 2500.0, bounds, &rules), Some(ImpactCause::Expired));
    /// ```
    pub fn check(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        now: f64,
        bounds: Bounds,
        rules: &ImpactRules,
    ) -> Option<ImpactCause> {
        if now - self.spawned_at >= rules.max_age_ms {
            return Some(ImpactCause::Expired);
        }
        if position.distance(self.target) < rules.threshold {
            return Some(ImpactCause::Arrived);
        }
        if bounds.contains_with_margin(position, rules.bounds_margin) {
            self.entered = true;
        } else if self.entered {
            return Some(ImpactCause::OutOfBounds);
        }
        if velocity.length() < rules.stuck_speed {
            let since = *self.stuck_since.get_or_insert(now);
            if now - since >= rules.stuck_grace_ms {
                return Some(ImpactCause::Stuck);
            }
        } else {
            self.stuck_since = None;
        }
        None
    }
}

/// Advances every tracked star and returns the ones that impacted, with
/// their impact positions. Stars whose entity vanished are dropped silently.
///
/// Impacted and vanished stars are removed from `stars`, from the runtime
/// group `group` and from the world before this returns.
pub fn advance_stars(
    ctx: &mut AbilityContext<'_>,
    stars: &mut BTreeMap<EntityId, FallingStar>,
    group: &'static str,
    rules: &ImpactRules,
) -> Vec<(EntityId, Vec2, ImpactCause)> {
    let now = ctx.now();
    let bounds = ctx.world.bounds();
    let mut impacts = Vec::new();

    let ids: Vec<EntityId> = stars.keys().copied().collect();
    for id in ids {
        let sample = LivenessCheck::new(&*ctx.world, id)
            .with_position()
            .check()
            .map(|l| (l.position, l.entity.velocity()));
        let cause = match (sample, stars.get_mut(&id)) {
            (Some((position, velocity)), Some(star)) => star
                .check(position, velocity, now, bounds, rules)
                .map(|cause| (position, cause)),
            _ => None,
        };

        if sample.is_some() && cause.is_none() {
            continue;
        }
        stars.remove(&id);
        ctx.runtime.remove_from_group(group, id);
        ctx.world.despawn(id);
        if let Some((position, cause)) = cause {
            impacts.push((id, position, cause));
        }
    }
    impacts
}

/// Spawns a star `height` above `target` falling at `speed`.
pub fn spawn_star(
    world: &mut dyn WorldContext,
    owner: EntityId,
    target: Vec2,
    height: f32,
    speed: f32,
) -> EntityId {
    let origin = target - Vec2::new(0.0, height);
    let direction = heading(origin, target, Vec2::Y);
    world.spawn(
        EntitySpec::new(EntityTag::Projectile, origin)
            .with_velocity(direction * speed)
            .with_radius(8.0)
            .with_owner(owner),
    )
}

// =============================================================================
// Starfall
// =============================================================================

/// Starfall tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfallTuning {
    /// Fall speed (units/s).
    pub star_speed: f32,
    /// Spawn offset above the target point.
    pub spawn_height: f32,
    /// Enemies farther than this are not targeted.
    pub target_range: f32,
    /// Confusion applied on impact (ms).
    pub confuse_ms: f64,
    /// Impact conditions.
    pub impact: ImpactRules,
}

impl Default for StarfallTuning {
    fn default() -> Self {
        Self {
            star_speed: 420.0,
            spawn_height: 260.0,
            target_range: 500.0,
            confuse_ms: 1500.0,
            impact: ImpactRules::default(),
        }
    }
}

/// Starfall behavior.
#[derive(Debug, Clone)]
pub struct StarfallBehavior {
    tuning: StarfallTuning,
    last_cast: Option<f64>,
    stars: BTreeMap<EntityId, FallingStar>,
    impacts: u64,
}

impl StarfallBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(_type_id: &str, tuning: StarfallTuning) -> Self {
        Self {
            tuning,
            last_cast: None,
            stars: BTreeMap::new(),
            impacts: 0,
        }
    }

    /// Number of impacts resolved so far.
    #[must_use]
    pub fn impacts(&self) -> u64 {
        self.impacts
    }

    fn cast(&mut self, ctx: &mut AbilityContext<'_>, from: Vec2, now: f64) {
        let candidates = ctx
            .world
            .query_radius(from, self.tuning.target_range, EntityTag::Enemy);
        if candidates.is_empty() {
            return;
        }
        let count = ctx.stats.projectile_count.max(1) as usize;
        let chosen: Vec<EntityId> = candidates
            .choose_multiple(ctx.world.rng(), count)
            .copied()
            .collect();

        for target in chosen {
            let Some(point) = ctx.world.entity(target).map(|e| e.position()) else {
                continue;
            };
            let star = spawn_star(
                ctx.world,
                ctx.entity,
                point,
                self.tuning.spawn_height,
                self.tuning.star_speed,
            );
            ctx.runtime.add_to_group(STARS, star);
            self.stars.insert(star, FallingStar::new(point, now));
        }
        self.last_cast = Some(now);
    }

    fn impact(&mut self, ctx: &mut AbilityContext<'_>, at: Vec2, now: f64) {
        let radius = ctx.stats.ability_radius;
        for target in ctx.world.query_radius(at, radius, EntityTag::Enemy) {
            ctx.world
                .apply_damage(ctx.entity, target, ctx.stats.ability_damage);
            if let Some(entity) = ctx.world.entity_mut(target) {
                entity.conditions.confuse(now, self.tuning.confuse_ms);
            }
        }
        ctx.world
            .spawn_visual_effect(VisualEffect::new(EffectKind::Impact, at, radius));
        self.impacts += 1;
    }
}

impl Behavior for StarfallBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Starfall
    }

    fn setup_ability(&mut self, _ctx: &mut AbilityContext<'_>) {
        self.last_cast = None;
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        let now = ctx.now();
        let Some(from) = ctx.check_self().with_position().check().map(|l| l.position) else {
            return;
        };

        let rules = self.tuning.impact;
        for (_, at, _) in advance_stars(ctx, &mut self.stars, STARS, &rules) {
            self.impact(ctx, at, now);
        }

        let cooldown = f64::from(ctx.stats.ability_cooldown);
        if self.last_cast.map_or(true, |last| now - last >= cooldown) {
            self.cast(ctx, from, now);
        }
    }

    fn cleanup(&mut self, _ctx: &mut AbilityContext<'_>) {
        self.stars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorHost;
    use crate::entity::Vitals;
    use crate::output::{Modifier, Output};
    use crate::resolver::physics;
    use crate::stats::{BaseStats, DerivedStats, ModifierSet, StatEngine};
    use crate::world::World;

    mod impact_rule_tests {
        use super::*;

        fn bounds() -> Bounds {
            Bounds::new(1000.0, 1000.0)
        }

        #[test]
        fn age_cap_wins_over_everything() {
            let rules = ImpactRules::default();
            let mut star = FallingStar::new(Vec2::ZERO, 0.0);
            // Arrived and out of bounds at once, but the age cap is checked first.
            let cause = star.check(Vec2::new(0.0, 1.0), Vec2::ZERO, 2500.0, bounds(), &rules);
            assert_eq!(cause, Some(ImpactCause::Expired));
        }

        #[test]
        fn leaving_bounds_impacts() {
            let rules = ImpactRules::default();
            let mut star = FallingStar::new(Vec2::ZERO, 0.0);
            let fall = Vec2::Y * 100.0;
            assert_eq!(star.check(Vec2::new(0.0, -300.0), fall, 5.0, bounds(), &rules), None);
            let cause = star.check(Vec2::new(0.0, -700.0), -fall, 10.0, bounds(), &rules);
            assert_eq!(cause, Some(ImpactCause::OutOfBounds));
        }

        #[test]
        fn star_spawned_outside_falls_in() {
            let rules = ImpactRules::default();
            // Target near the top wall puts the spawn point past the margin.
            let mut star = FallingStar::new(Vec2::new(0.0, -450.0), 0.0);
            let fall = Vec2::Y * 420.0;
            assert_eq!(star.check(Vec2::new(0.0, -710.0), fall, 0.0, bounds(), &rules), None);
            assert_eq!(star.check(Vec2::new(0.0, -600.0), fall, 260.0, bounds(), &rules), None);
            assert_eq!(
                star.check(Vec2::new(0.0, -445.0), fall, 630.0, bounds(), &rules),
                Some(ImpactCause::Arrived)
            );
        }

        #[test]
        fn stuck_star_impacts_after_grace() {
            let rules = ImpactRules::default();
            let mut star = FallingStar::new(Vec2::ZERO, 0.0);
            let at = Vec2::new(0.0, -100.0);
            assert_eq!(star.check(at, Vec2::ZERO, 100.0, bounds(), &rules), None);
            assert_eq!(star.check(at, Vec2::ZERO, 399.0, bounds(), &rules), None);
            assert_eq!(
                star.check(at, Vec2::ZERO, 400.0, bounds(), &rules),
                Some(ImpactCause::Stuck)
            );
        }

        #[test]
        fn moving_again_resets_stuck_timer() {
            let rules = ImpactRules::default();
            let mut star = FallingStar::new(Vec2::ZERO, 0.0);
            let at = Vec2::new(0.0, -100.0);
            star.check(at, Vec2::ZERO, 100.0, bounds(), &rules);
            star.check(at, Vec2::Y * 50.0, 200.0, bounds(), &rules);
            assert_eq!(star.check(at, Vec2::ZERO, 450.0, bounds(), &rules), None);
        }
    }

    mod behavior_tests {
        use super::*;

        fn stats() -> DerivedStats {
            let base = BaseStats::new(10.0, 100.0).with_ability(3.0, 10_000.0, 60.0);
            StatEngine::compute(&base, &ModifierSet::new(), None, true)
        }

        #[test]
        fn star_impacts_exactly_once_and_confuses() {
            let mut world = World::new(8);
            let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO));
            world.set_player(Some(player));
            let enemy = world.spawn(
                EntitySpec::new(EntityTag::Enemy, Vec2::new(150.0, 0.0))
                    .with_vitals(Vitals::new(20.0, 0.0)),
            );
            let stats = stats();
            let mut host = BehaviorHost::new(
                player,
                "astromancer",
                Box::new(StarfallBehavior::new("astromancer", StarfallTuning::default())),
            );
            host.setup(&mut world, &stats);
            host.update(&mut world, &stats);

            let star = host.runtime().group(STARS)[0];
            world.place(star, Vec2::new(150.0, -5.0));
            world.drain_outputs();

            for now in [100.0, 200.0, 300.0] {
                world.clock_mut().update(now, false);
                host.update(&mut world, &stats);
            }

            let hits = world
                .drain_outputs()
                .into_iter()
                .filter(|env| {
                    matches!(
                        env.output(),
                        Output::Modifier(Modifier::ApplyDamage { target, .. }) if *target == enemy
                    )
                })
                .count();
            assert_eq!(hits, 1);
            assert!(world.entity(star).is_none());
            assert!(world.entity(enemy).unwrap().conditions.is_confused(300.0));
        }

        #[test]
        fn star_reaches_target_near_top_wall() {
            let mut world = World::with_bounds(8, Bounds::new(3000.0, 3000.0));
            let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::new(0.0, -1200.0)));
            world.set_player(Some(player));
            let enemy = world.spawn(
                EntitySpec::new(EntityTag::Enemy, Vec2::new(0.0, -1400.0))
                    .with_vitals(Vitals::new(20.0, 0.0)),
            );
            let stats = stats();
            let mut host = BehaviorHost::new(
                player,
                "astromancer",
                Box::new(StarfallBehavior::new("astromancer", StarfallTuning::default())),
            );
            host.setup(&mut world, &stats);
            host.update(&mut world, &stats);
            let star = host.runtime().group(STARS)[0];
            // Spawned 260 above a target 100 below the wall.
            assert!(!world.bounds().contains_with_margin(world.entity(star).unwrap().position(), 50.0));
            world.drain_outputs();

            let mut now = 0.0;
            for _ in 0..20 {
                now += 50.0;
                physics::integrate(&mut world, 50.0);
                world.clock_mut().update(now, false);
                host.update(&mut world, &stats);
            }

            let hits = world
                .drain_outputs()
                .into_iter()
                .filter(|env| {
                    matches!(
                        env.output(),
                        Output::Modifier(Modifier::ApplyDamage { target, .. }) if *target == enemy
                    )
                })
                .count();
            assert_eq!(hits, 1);
            assert!(world.entity(star).is_none());
        }

        #[test]
        fn vanished_star_is_dropped_without_impact() {
            let mut world = World::new(8);
            let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO));
            world.spawn(
                EntitySpec::new(EntityTag::Enemy, Vec2::new(150.0, 0.0))
                    .with_vitals(Vitals::new(20.0, 0.0)),
            );
            let stats = stats();
            let mut host = BehaviorHost::new(
                player,
                "astromancer",
                Box::new(StarfallBehavior::new("astromancer", StarfallTuning::default())),
            );
            host.setup(&mut world, &stats);
            host.update(&mut world, &stats);
            let star = host.runtime().group(STARS)[0];

            world.despawn(star);
            world.drain_outputs();
            world.clock_mut().update(100.0, false);
            host.update(&mut world, &stats);
            assert_eq!(world.pending_outputs(), 0);
            assert!(host.runtime().group(STARS).is_empty());
        }
    }
}

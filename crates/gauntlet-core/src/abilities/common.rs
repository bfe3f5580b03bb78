//! Helpers shared by the ability variants.
//!
//! Everything here is fail-soft: a helper that cannot find its entity or a
//! finite position returns without effect, and physics failures are logged
//! at trace level and swallowed.

use glam::Vec2;
use rand::Rng;
use tracing::trace;

use crate::entity::{Entity, EntityId};
use crate::liveness::LivenessCheck;
use crate::output::{EffectKind, VisualEffect};
use crate::world::WorldContext;

/// Falloff-scaled area damage.
///
/// Returns `None` outside `radius`; inside, `damage * (1 - distance / radius)`
/// clamped at zero.
///
/// # Example
///
/// ```
/// use gauntlet_core::abilities::common::falloff_damage;
///
/// assert_eq!(falloff_damage(10.0, 0.0, 100.0), Some(10.0));
/// assert_eq!(falloff_damage(10.0, 50.0, 100.0), Some(5.0));
/// assert_eq!(falloff_damage(10.0, 100.0, 100.0), Some(0.0));
/// assert_eq!(falloff_damage(10.0, 100.5, 100.0), None);
/// ```
#[must_use]
pub fn falloff_damage(damage: f32, distance: f32, radius: f32) -> Option<f32> {
    if !distance.is_finite() || !(radius > 0.0) || distance > radius {
        return None;
    }
    Some((damage * (1.0 - distance / radius)).max(0.0))
}

/// Unit vector from `from` to `to`, or `fallback` when they coincide.
#[must_use]
pub fn heading(from: Vec2, to: Vec2, fallback: Vec2) -> Vec2 {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        fallback
    } else {
        dir
    }
}

/// Rotates `direction` by a uniform random angle in `[-spread, spread]`
/// radians.
pub fn aim_with_spread<R: Rng + ?Sized>(rng: &mut R, direction: Vec2, spread: f32) -> Vec2 {
    if !(spread > 0.0) {
        return direction;
    }
    let angle = rng.gen_range(-spread..=spread);
    Vec2::from_angle(angle).rotate(direction)
}

/// Sets a velocity, swallowing physics failures.
///
/// Returns `true` if the velocity was applied.
pub fn apply_velocity_soft(world: &mut dyn WorldContext, id: EntityId, velocity: Vec2) -> bool {
    match world.apply_velocity(id, velocity) {
        Ok(()) => true,
        Err(err) => {
            trace!(entity = %id, %err, "velocity not applied");
            false
        }
    }
}

/// Pushes `target` away from `origin`.
///
/// The knockback window keeps chasers from overwriting the impulse for
/// `duration_ms`.
pub fn knock_back(
    world: &mut dyn WorldContext,
    target: EntityId,
    origin: Vec2,
    force: f32,
    duration_ms: f64,
) {
    let Some(position) = LivenessCheck::new(&*world, target)
        .with_position()
        .check()
        .map(|live| live.position)
    else {
        return;
    };
    let direction = heading(origin, position, Vec2::X);
    if apply_velocity_soft(world, target, direction * force) {
        let now = world.now();
        if let Some(entity) = world.entity_mut(target) {
            entity.conditions.knock_back(now, duration_ms);
        }
    }
}

/// Velocity a chaser wants this tick.
///
/// Stunned entities stand still, knocked-back entities keep their impulse,
/// and confused entities run away from the target.
#[must_use]
pub fn chase_velocity(entity: &Entity, target: Vec2, speed: f32, now: f64) -> Vec2 {
    let conditions = &entity.conditions;
    if conditions.is_stunned(now) {
        return Vec2::ZERO;
    }
    if conditions.is_knocked_back(now) {
        return entity.velocity();
    }
    let direction = (target - entity.position()).normalize_or_zero();
    if conditions.is_confused(now) {
        -direction * speed
    } else {
        direction * speed
    }
}

/// Steers `id` toward the player at its own speed times `speed_factor`.
pub fn steer_toward_player(world: &mut dyn WorldContext, id: EntityId, speed_factor: f32) {
    let now = world.now();
    let velocity = {
        let Some(live) = LivenessCheck::new(&*world, id)
            .with_position()
            .with_player()
            .check()
        else {
            return;
        };
        let Some(target) = live.player_position else {
            return;
        };
        let speed = live.entity.vitals.map_or(0.0, |v| v.speed) * speed_factor;
        chase_velocity(live.entity, target, speed, now)
    };
    apply_velocity_soft(world, id, velocity);
}

/// Queues healing when `id` is below max health.
///
/// Returns `true` if healing was queued; the heal visual is only requested in
/// that case.
pub fn regenerate(world: &mut dyn WorldContext, id: EntityId, amount: f32) -> bool {
    let Some(live) = LivenessCheck::new(&*world, id).with_position().check() else {
        return false;
    };
    let Some(vitals) = live.entity.vitals else {
        return false;
    };
    if !(amount > 0.0) || vitals.health >= vitals.max_health {
        return false;
    }
    let position = live.position;
    let radius = live.entity.radius;
    world.heal(id, amount);
    world.spawn_visual_effect(VisualEffect::new(EffectKind::Heal, position, radius));
    true
}

/// Despawns a projectile that left the arena or outlived `lifetime_ms`.
///
/// Returns `true` if the projectile is gone (already or now).
pub fn expire_projectile(
    world: &mut dyn WorldContext,
    id: EntityId,
    spawned_at: f64,
    lifetime_ms: f64,
    margin: f32,
) -> bool {
    let now = world.now();
    let bounds = world.bounds();
    let Some(position) = LivenessCheck::new(&*world, id)
        .with_position()
        .check()
        .map(|live| live.position)
    else {
        world.despawn(id);
        return true;
    };
    if now - spawned_at >= lifetime_ms || !bounds.contains_with_margin(position, margin) {
        world.despawn(id);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntitySpec, EntityTag, Vitals};
    use crate::world::World;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    mod falloff_tests {
        use super::*;

        #[test]
        fn full_damage_at_center_and_zero_at_edge() {
            assert_eq!(falloff_damage(6.0, 0.0, 80.0), Some(6.0));
            assert_eq!(falloff_damage(6.0, 80.0, 80.0), Some(0.0));
        }

        #[test]
        fn nothing_outside_radius() {
            assert_eq!(falloff_damage(6.0, 81.0, 80.0), None);
            assert_eq!(falloff_damage(6.0, f32::NAN, 80.0), None);
            assert_eq!(falloff_damage(6.0, 0.0, 0.0), None);
        }

        proptest! {
            #[test]
            fn falloff_is_bounded(damage in 0.0f32..100.0, distance in 0.0f32..500.0, radius in 1.0f32..500.0) {
                if let Some(value) = falloff_damage(damage, distance, radius) {
                    prop_assert!(value >= 0.0);
                    prop_assert!(value <= damage);
                    prop_assert!(distance <= radius);
                } else {
                    prop_assert!(distance > radius);
                }
            }
        }
    }

    mod movement_tests {
        use super::*;

        fn chaser_at(world: &mut World, position: Vec2) -> EntityId {
            world.spawn(
                EntitySpec::new(EntityTag::Enemy, position).with_vitals(Vitals::new(3.0, 50.0)),
            )
        }

        #[test]
        fn chaser_moves_toward_player() {
            let mut world = World::new(1);
            let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO));
            world.set_player(Some(player));
            let enemy = chaser_at(&mut world, Vec2::new(100.0, 0.0));

            steer_toward_player(&mut world, enemy, 1.0);
            assert_eq!(world.entity(enemy).unwrap().velocity(), Vec2::new(-50.0, 0.0));
        }

        #[test]
        fn stunned_chaser_stands_still_and_confused_flees() {
            let mut world = World::new(1);
            let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO));
            world.set_player(Some(player));
            let enemy = chaser_at(&mut world, Vec2::new(100.0, 0.0));

            world.entity_mut(enemy).unwrap().conditions.confuse(0.0, 500.0);
            steer_toward_player(&mut world, enemy, 1.0);
            assert_eq!(world.entity(enemy).unwrap().velocity(), Vec2::new(50.0, 0.0));

            world.entity_mut(enemy).unwrap().conditions.stun(0.0, 500.0);
            steer_toward_player(&mut world, enemy, 1.0);
            assert_eq!(world.entity(enemy).unwrap().velocity(), Vec2::ZERO);
        }

        #[test]
        fn knockback_on_missing_entity_is_silent() {
            let mut world = World::new(1);
            let enemy = chaser_at(&mut world, Vec2::new(10.0, 0.0));
            world.despawn(enemy);
            knock_back(&mut world, enemy, Vec2::ZERO, 200.0, 100.0);
            assert_eq!(world.pending_outputs(), 0);
        }

        #[test]
        fn knockback_opens_window() {
            let mut world = World::new(1);
            let enemy = chaser_at(&mut world, Vec2::new(10.0, 0.0));
            knock_back(&mut world, enemy, Vec2::ZERO, 200.0, 100.0);

            let entity = world.entity(enemy).unwrap();
            assert_eq!(entity.velocity(), Vec2::new(200.0, 0.0));
            assert!(entity.conditions.is_knocked_back(50.0));
        }

        #[test]
        fn spread_stays_within_bound() {
            let mut rng = ChaCha8Rng::seed_from_u64(9);
            for _ in 0..100 {
                let aimed = aim_with_spread(&mut rng, Vec2::X, 0.2);
                assert!(aimed.y.atan2(aimed.x).abs() <= 0.2 + 1e-5);
            }
            assert_eq!(aim_with_spread(&mut rng, Vec2::Y, 0.0), Vec2::Y);
        }
    }

    mod regen_tests {
        use super::*;

        #[test]
        fn no_heal_at_full_health() {
            let mut world = World::new(1);
            let troll = world.spawn(
                EntitySpec::new(EntityTag::Enemy, Vec2::ZERO).with_vitals(Vitals::new(5.0, 30.0)),
            );
            assert!(!regenerate(&mut world, troll, 1.0));
            assert_eq!(world.pending_outputs(), 0);

            world.entity_mut(troll).unwrap().vitals.as_mut().unwrap().health = 3.0;
            assert!(regenerate(&mut world, troll, 1.0));
            assert_eq!(world.pending_outputs(), 2);
        }
    }
}

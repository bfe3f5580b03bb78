//! Gameplay rules checked through the public session API.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::collision::CollisionLabel;
use crate::registry::EntityRegistry;

use super::helpers::{player_health, session_with};

// =============================================================================
// Stats
// =============================================================================

#[test]
fn upgrades_keep_current_health() {
    let mut session = session_with(11, "vanguard");
    let player = session.player().expect("selected").entity;
    let brute = session.spawn_enemy("brute", Vec2::new(-1400.0, 0.0)).expect("spawn");
    session.report_contact(CollisionLabel::new("brute:contact"), brute, player);
    session.step(16.0);
    assert_eq!(player_health(&session), 11.0);

    session.apply_upgrade("vitality").expect("general upgrade");
    let derived = &session.player().expect("selected").derived;
    assert_eq!(derived.max_health, 14.0);
    assert_eq!(derived.health, 11.0);

    session.apply_upgrade("haste").expect("general upgrade");
    assert_eq!(player_health(&session), 11.0);

    let entity = session.world().arena().get(player).expect("player entity");
    let vitals = entity.vitals.expect("player vitals");
    assert_eq!((vitals.health, vitals.max_health), (11.0, 14.0));
}

#[test]
fn signature_upgrades_stay_with_their_character() {
    let mut session = session_with(12, "glaive");
    session.apply_upgrade("twin_blades").expect("glaive upgrade");
    assert_eq!(session.player().expect("selected").derived.projectile_count, 2);

    session.select_character("ranger").expect("selected");
    assert!(session.character_upgrades().is_empty());
    assert!(session.apply_upgrade("twin_blades").is_err());
}

#[test]
fn offered_upgrades_are_distinct_and_available() {
    let mut session = session_with(13, "astromancer");
    let available: BTreeSet<String> = session
        .available_upgrades("astromancer")
        .into_iter()
        .map(|u| u.id.clone())
        .collect();

    for _ in 0..50 {
        let offer = session.offer_upgrades(3).expect("selected");
        assert_eq!(offer.len(), 3);
        let ids: BTreeSet<&str> = offer.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| available.contains(*id)));
    }
}

// =============================================================================
// Collision Dispatch
// =============================================================================

#[test]
fn duplicate_contacts_in_one_tick_hit_once() {
    let mut session = session_with(14, "ranger");
    let player = session.player().expect("selected").entity;
    let viper = session.spawn_enemy("viper", Vec2::new(1400.0, 0.0)).expect("spawn");

    for _ in 0..3 {
        session.report_contact(CollisionLabel::new("viper:contact"), viper, player);
    }
    session.step(16.0);
    assert_eq!(player_health(&session), 7.0);
    assert_eq!(session.player().expect("selected").status.len(), 1);
}

#[test]
fn contacts_for_unknown_labels_are_ignored() {
    let mut session = session_with(15, "ranger");
    let player = session.player().expect("selected").entity;
    let grunt = session.spawn_enemy("grunt", Vec2::new(1400.0, 0.0)).expect("spawn");

    session.report_contact(CollisionLabel::new("wall:scrape"), grunt, player);
    session.report_contact(CollisionLabel::new("glaive:blade"), grunt, player);
    session.step(16.0);
    assert_eq!(player_health(&session), 8.0);
}

#[test]
fn contacts_with_despawned_entities_are_dropped() {
    let mut session = session_with(16, "ranger");
    let player = session.player().expect("selected").entity;
    let viper = session.spawn_enemy("viper", Vec2::new(1400.0, 0.0)).expect("spawn");

    session.report_contact(CollisionLabel::new("viper:contact"), viper, player);
    assert!(session.despawn(viper));
    session.step(16.0);
    assert_eq!(player_health(&session), 8.0);
}

// =============================================================================
// Spawning
// =============================================================================

#[test]
fn level_one_draws_follow_spawn_weights() {
    let registry = EntityRegistry::default_enemies();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let draws = 100_000;

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for _ in 0..draws {
        let id = registry.random_enemy_type(1, &mut rng).expect("positive weights");
        *counts.entry(id.to_owned()).or_default() += 1;
    }

    assert!(!counts.contains_key("overlord"));
    let expected = [
        ("grunt", 10.0),
        ("viper", 5.0),
        ("brute", 3.0),
        ("mirror", 2.0),
        ("troll", 2.0),
        ("bomber", 2.0),
    ];
    for (id, weight) in expected {
        let observed = f64::from(counts.get(id).copied().unwrap_or(0)) / f64::from(draws);
        let wanted = weight / 24.0;
        assert!(
            (observed - wanted).abs() < 0.01,
            "{id}: observed {observed:.4}, wanted {wanted:.4}"
        );
    }
}

#[test]
fn tougher_enemies_weigh_more_at_higher_levels() {
    let registry = EntityRegistry::default_enemies();
    let weight = |id: &str, level| {
        EntityRegistry::effective_weight(registry.get_descriptor(id).expect("known"), level)
    };

    assert_eq!(weight("brute", 1), 3.0);
    assert_eq!(weight("brute", 5), 4.5);
    assert_eq!(weight("brute", 10), 9.0);
    // Four health qualifies for the first bump only.
    assert_eq!(weight("bomber", 10), 3.0);
    assert_eq!(weight("grunt", 10), 10.0);
}

#[test]
fn spawn_health_scales_with_player_level() {
    let mut session = session_with(17, "ranger");
    session.player_mut().expect("selected").progression.level = 6;

    let far = Vec2::new(1400.0, 1400.0);
    let bomber = session.spawn_enemy("bomber", far).expect("spawn");
    let mirror = session.spawn_enemy("mirror", far).expect("spawn");

    let max_health = |id| {
        session
            .world()
            .arena()
            .get(id)
            .and_then(|e| e.vitals)
            .map(|v| (v.health, v.max_health))
    };
    assert_eq!(max_health(bomber), Some((8.0, 8.0)));
    assert_eq!(max_health(mirror), Some((10.0, 10.0)));
}

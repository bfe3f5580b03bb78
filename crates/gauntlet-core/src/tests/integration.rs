//! Integration tests for the full tick loop.
//!
//! These drive a [`CombatSession`] the way a host would and check:
//! - Ability output -> resolver mutation flow (damage, kills, experience)
//! - Player damage, afflictions and game over
//! - Pause handling across the clock and the status tracker
//! - Cleanup when characters switch or entities despawn

use glam::Vec2;

use crate::abilities::AuraTuning;
use crate::behavior::BehaviorClass;
use crate::catalog::default_upgrades;
use crate::collision::CollisionLabel;
use crate::config::SessionConfig;
use crate::entity::EntityTag;
use crate::output::Event;
use crate::registry::{EntityDescriptor, EntityRegistry};
use crate::session::CombatSession;
use crate::stats::BaseStats;
use crate::status::StatusKind;
use crate::world::WorldContext;

use super::helpers::{
    count_kills, exists, player_health, run_frames, run_until, session_with, spawn_ring, FRAME_MS,
};

// =============================================================================
// Combat Flow
// =============================================================================

#[test]
fn aura_kills_award_experience() {
    let mut session = session_with(1, "vanguard");
    let grunts = spawn_ring(&mut session, "grunt", 3, 50.0);

    let (_, cleared) = run_until(&mut session, 0.0, 120, |s| s.enemy_count() == 0);
    assert!(cleared);
    for grunt in grunts {
        assert!(!exists(&session, grunt));
        assert!(session.behavior(grunt).is_none());
    }

    let events = session.drain_events();
    assert_eq!(count_kills(&events), 3);
    let player = session.player().expect("selected");
    assert_eq!(player.progression.experience, 3.0);
    assert_eq!(player.progression.level, 1);
}

#[test]
fn ranger_bolts_kill_at_range() {
    let mut session = session_with(2, "ranger");
    let grunt = session.spawn_enemy("grunt", Vec2::new(150.0, 0.0)).expect("spawn");

    let (_, dead) = run_until(&mut session, 0.0, 300, |s| !exists(s, grunt));
    assert!(dead);
    assert_eq!(player_health(&session), 8.0);
}

#[test]
fn level_up_grants_pending_upgrade() {
    let mut session = session_with(3, "vanguard");
    // Ten grunts at one experience each fill the first level.
    spawn_ring(&mut session, "grunt", 10, 60.0);

    run_until(&mut session, 0.0, 300, |s| s.enemy_count() == 0);
    let events = session.drain_events();
    assert!(events.contains(&Event::LevelUp { level: 2 }));

    let player = session.player().expect("selected");
    assert_eq!(player.progression.level, 2);
    assert_eq!(player.pending_upgrades, 1);
    assert_eq!(player.progression.to_next, 15.0);

    session.apply_upgrade("vitality").expect("general upgrade");
    assert_eq!(session.player().expect("selected").pending_upgrades, 0);
}

// =============================================================================
// Player Damage
// =============================================================================

#[test]
fn contact_damage_respects_armor_and_invincibility() {
    let mut session = session_with(4, "vanguard");
    // Brute contact damage 2 against armor 1.
    session.spawn_enemy("brute", Vec2::new(30.0, 0.0)).expect("spawn");

    session.step(16.0);
    assert_eq!(player_health(&session), 11.0);
    let wall = run_frames(&mut session, 16.0, 20);
    assert_eq!(player_health(&session), 11.0, "still invincible at {wall}");
}

#[test]
fn affliction_ticks_ignore_invincibility() {
    let mut session = session_with(5, "ranger");
    let player = session.player().expect("selected").entity;
    let viper = session.spawn_enemy("viper", Vec2::new(1400.0, 0.0)).expect("spawn");

    session.report_contact(CollisionLabel::new("viper:contact"), viper, player);
    session.step(16.0);
    assert_eq!(player_health(&session), 7.0);
    assert!(session.player().expect("selected").progression.poisoned);

    session.step(1016.0);
    assert_eq!(player_health(&session), 6.0);
    session.step(2016.0);
    assert_eq!(player_health(&session), 5.0);
}

#[test]
fn game_over_freezes_the_run() {
    let mut session = session_with(6, "ranger");
    session.player_mut().expect("selected").derived.health = 1.0;
    let brute = session.spawn_enemy("brute", Vec2::new(20.0, 0.0)).expect("spawn");

    session.step(16.0);
    assert!(session.is_game_over());
    assert_eq!(player_health(&session), 0.0);
    assert!(session.hud().expect("selected").game_over);

    let before = session.world().arena().get(brute).map(|e| e.position());
    run_frames(&mut session, 16.0, 10);
    assert_eq!(session.world().arena().get(brute).map(|e| e.position()), before);
}

#[test]
fn bomber_blast_follows_falloff_through_armor() {
    // Armored character whose aura never fires, so only the blast lands.
    let mut characters = EntityRegistry::new();
    characters.register(EntityDescriptor::new(
        "warden",
        "Warden",
        BaseStats {
            armor: 1.0,
            ..BaseStats::new(12.0, 150.0)
        }
        .with_ability(0.0, 600_000.0, 90.0),
        BehaviorClass::Aura(AuraTuning::default()),
    ));
    let mut session = CombatSession::new(
        SessionConfig::with_seed(13),
        characters,
        EntityRegistry::default_enemies(),
        default_upgrades(),
    );
    session.select_character("warden").expect("registered");
    let player = session.player().expect("selected").entity;

    // Close enough to prime on the first frame.
    let bomber = session.spawn_enemy("bomber", Vec2::new(60.0, 0.0)).expect("spawn");
    session.step(FRAME_MS);
    let center = session.world().entity(bomber).expect("primed").position();

    // Step back to 0.9 of the blast radius before the fuse runs out.
    session.world_mut().place(player, center - Vec2::new(108.0, 0.0));
    let (_, detonated) = run_until(&mut session, FRAME_MS, 200, |s| !exists(s, bomber));
    assert!(detonated);

    let expected = 4.0 * (1.0 - 108.0 / 120.0);
    let lost = 12.0 - player_health(&session);
    assert!((lost - expected).abs() < 1e-3, "lost {lost}, expected {expected}");

    let events = session.drain_events();
    assert_eq!(count_kills(&events), 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Exploded { entity, .. } if *entity == bomber)));
}

// =============================================================================
// Pause
// =============================================================================

#[test]
fn pause_extends_status_duration() {
    let mut session = session_with(7, "ranger");
    let player = session.player().expect("selected").entity;
    let viper = session.spawn_enemy("viper", Vec2::new(1400.0, 0.0)).expect("spawn");
    session.report_contact(CollisionLabel::new("viper:contact"), viper, player);
    session.step(16.0);
    session.step(1016.0);

    session.set_paused(true);
    session.step(9016.0);
    assert!(session.player().expect("selected").status.is_paused());
    session.set_paused(false);

    let status = &session.player().expect("selected").status;
    let poison = status
        .effects()
        .iter()
        .find(|e| e.kind() == StatusKind::Poison)
        .expect("poison survives the pause");
    assert_eq!(poison.remaining(9016.0), Some(3000.0));

    session.step(12_000.0);
    assert!(session.player().expect("selected").progression.poisoned);
    session.step(12_116.0);
    assert!(!session.player().expect("selected").progression.poisoned);
}

#[test]
fn hud_reports_statuses_in_priority_order() {
    let mut session = session_with(8, "ranger");
    let player = session.player().expect("selected").entity;
    let viper = session.spawn_enemy("viper", Vec2::new(1400.0, 0.0)).expect("spawn");
    let brute = session.spawn_enemy("brute", Vec2::new(-1400.0, 0.0)).expect("spawn");

    session.report_contact(CollisionLabel::new("viper:contact"), viper, player);
    session.step(16.0);
    // Second hit after the invincibility window.
    session.report_contact(CollisionLabel::new("brute:contact"), brute, player);
    session.step(600.0);

    let hud = session.hud().expect("selected");
    let kinds: Vec<_> = hud.statuses.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StatusKind::Poison, StatusKind::Bleed]);
    assert_eq!(hud.statuses[0].slot, 0);
    assert_eq!(hud.statuses[1].slot, 1);
}

// =============================================================================
// Cleanup
// =============================================================================

#[test]
fn switching_characters_mid_run_keeps_one_player() {
    let mut session = session_with(9, "glaive");
    spawn_ring(&mut session, "grunt", 4, 300.0);
    let mut wall = run_frames(&mut session, 0.0, 30);

    for character in ["astromancer", "alchemist", "vanguard"] {
        session.select_character(character).expect("character exists");
        wall = run_frames(&mut session, wall, 10);
        assert_eq!(session.world().arena().count_tagged(EntityTag::Player), 1);
        assert_eq!(session.player().expect("selected").character_id, character);
    }
    // Glaive blades and astromancer stars were cleaned up with their owners.
    let projectiles = session.world().arena().count_tagged(EntityTag::Projectile);
    assert_eq!(projectiles, 0);
}

#[test]
fn every_behavior_tracks_a_live_entity() {
    let mut session = CombatSession::with_defaults(crate::config::SessionConfig::with_seed(10));
    session.select_character("alchemist").expect("selected");
    let mut wall = 0.0;
    for wave in 0..5 {
        for i in 0..6 {
            #[allow(clippy::cast_precision_loss)]
            let angle = (wave * 6 + i) as f32;
            session
                .spawn_random_enemy(Vec2::from_angle(angle) * 260.0)
                .expect("spawn");
        }
        wall = run_frames(&mut session, wall, 40);
        for entity in session.world().arena().entities_sorted() {
            if entity.tag() == EntityTag::Enemy {
                assert!(session.behavior(entity.id()).is_some());
            }
        }
        if session.is_game_over() {
            break;
        }
    }
    assert!(session.behavior_count() >= 1);
}

//! Session setup and frame stepping for crate-level tests.

use glam::Vec2;

use crate::config::SessionConfig;
use crate::entity::{EntityId, EntityTag};
use crate::output::Event;
use crate::session::CombatSession;
use crate::world::WorldContext;

/// Nominal frame length used by the helpers (ms).
pub const FRAME_MS: f64 = 16.0;

// =============================================================================
// Session Setup
// =============================================================================

/// Creates a default-catalog session with `character` selected.
///
/// # Arguments
///
/// * `seed` - RNG seed for the world
/// * `character` - Character id to select
///
/// # Returns
///
/// A session positioned at wall time zero with no enemies.
pub fn session_with(seed: u64, character: &str) -> CombatSession {
    let mut session = CombatSession::with_defaults(SessionConfig::with_seed(seed));
    session
        .select_character(character)
        .expect("default catalog has this character");
    session
}

/// Spawns `count` enemies of type `id` in a ring around the origin.
///
/// # Arguments
///
/// * `session` - The session to spawn into
/// * `id` - Enemy type id
/// * `count` - Number of enemies
/// * `distance` - Ring radius
///
/// # Returns
///
/// The spawned entity ids in spawn order.
pub fn spawn_ring(session: &mut CombatSession, id: &str, count: usize, distance: f32) -> Vec<EntityId> {
    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let position = Vec2::from_angle(angle) * distance;
            session.spawn_enemy(id, position).expect("enemy type exists")
        })
        .collect()
}

// =============================================================================
// Stepping
// =============================================================================

/// Steps `frames` frames of [`FRAME_MS`] starting after `wall`.
///
/// # Returns
///
/// The wall time of the last frame.
pub fn run_frames(session: &mut CombatSession, wall: f64, frames: u32) -> f64 {
    let mut wall = wall;
    for _ in 0..frames {
        wall += FRAME_MS;
        session.step(wall);
    }
    wall
}

/// Steps frames until `done` holds or `max_frames` have run.
///
/// # Returns
///
/// `(wall, satisfied)` after the last frame.
pub fn run_until(
    session: &mut CombatSession,
    wall: f64,
    max_frames: u32,
    mut done: impl FnMut(&CombatSession) -> bool,
) -> (f64, bool) {
    let mut wall = wall;
    for _ in 0..max_frames {
        if done(session) {
            return (wall, true);
        }
        wall += FRAME_MS;
        session.step(wall);
    }
    (wall, done(session))
}

// =============================================================================
// Queries
// =============================================================================

/// Current player health.
pub fn player_health(session: &CombatSession) -> f32 {
    session.player().map_or(0.0, |p| p.derived.health)
}

/// Whether `id` is still in the world.
pub fn exists(session: &CombatSession, id: EntityId) -> bool {
    session.world().entity(id).is_some()
}

/// Sorted `(id, tag, position)` of every entity.
pub fn snapshot(session: &CombatSession) -> Vec<(EntityId, EntityTag, Vec2)> {
    session
        .world()
        .arena()
        .entities_sorted()
        .map(|e| (e.id(), e.tag(), e.position()))
        .collect()
}

/// Number of drained kill events.
pub fn count_kills(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::EntityKilled { .. }))
        .count()
}

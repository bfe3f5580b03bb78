//! World collaborator: the narrow interface behaviors use to touch the game.
//!
//! Behaviors only see a `&mut dyn WorldContext`. It exposes simulation time,
//! the player, entity access, spawning, spatial queries, velocity
//! application, cosmetic effects and output emission. The in-process
//! [`World`] implements it on top of an [`Arena`], a [`GameClock`], an output
//! queue and a seeded `ChaCha8Rng`.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::entity::{EntitySpec, EntityTag};
//! use gauntlet_core::world::{World, WorldContext};
//! use glam::Vec2;
//!
//! let mut world = World::new(42);
//! let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO));
//! world.set_player(Some(player));
//!
//! let enemy = world.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::new(30.0, 0.0)));
//! assert_eq!(world.nearest(Vec2::ZERO, EntityTag::Enemy, 100.0), Some(enemy));
//!
//! world.apply_damage(player, enemy, 2.0);
//! assert_eq!(world.pending_outputs(), 1);
//! ```

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::arena::{Arena, Bounds};
use crate::clock::GameClock;
use crate::entity::{Entity, EntityId, EntitySpec, EntityTag};
use crate::error::PhysicsError;
use crate::output::{Command, Event, HitStatus, Modifier, Output, OutputEnvelope, VisualEffect};

// =============================================================================
// WorldContext
// =============================================================================

/// Operations behaviors may perform on the game world.
///
/// Damage, healing and despawn requests are deferred: they are queued as
/// [`Output`]s and applied by the resolvers at the end of the phase.
/// Spawning, despawning projectiles and velocity changes take effect
/// immediately.
pub trait WorldContext {
    /// Current simulation time in milliseconds (pause-excluded).
    fn now(&self) -> f64;

    /// Whether the game is paused.
    fn is_paused(&self) -> bool;

    /// Playfield rectangle.
    fn bounds(&self) -> Bounds;

    /// The player entity, if one is bound.
    fn player(&self) -> Option<EntityId>;

    /// Player position, if the player is live with a finite position.
    fn player_position(&self) -> Option<Vec2>;

    /// Looks up an entity.
    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Looks up an entity mutably.
    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity>;

    /// Spawns an entity immediately.
    fn spawn(&mut self, spec: EntitySpec) -> EntityId;

    /// Removes an entity immediately. Returns `false` if it was already gone.
    fn despawn(&mut self, id: EntityId) -> bool;

    /// Moves an entity and keeps spatial queries in sync.
    fn place(&mut self, id: EntityId, position: Vec2);

    /// Live entities tagged `tag` within `radius` of `center`, in spawn order.
    fn query_radius(&self, center: Vec2, radius: f32, tag: EntityTag) -> Vec<EntityId>;

    /// Closest live entity tagged `tag` within `max_range` of `from`.
    fn nearest(&self, from: Vec2, tag: EntityTag, max_range: f32) -> Option<EntityId>;

    /// Sets an entity's velocity through the physics collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError`] if the entity has no live body or the vector
    /// is not finite.
    fn apply_velocity(&mut self, id: EntityId, velocity: Vec2) -> Result<(), PhysicsError>;

    /// Queues an output for resolution.
    fn emit(&mut self, output: Output);

    /// Random number source.
    fn rng(&mut self) -> &mut ChaCha8Rng;

    /// Requests a cosmetic effect.
    fn spawn_visual_effect(&mut self, effect: VisualEffect) {
        self.emit(Event::VisualEffect(effect).into());
    }

    /// Queues damage against a non-player entity.
    fn apply_damage(&mut self, source: EntityId, target: EntityId, amount: f32) {
        self.emit(Modifier::ApplyDamage {
            source,
            target,
            amount,
        }
        .into());
    }

    /// Queues damage against the player.
    fn apply_damage_to_player(&mut self, source: EntityId, amount: f32, status: Option<HitStatus>) {
        self.emit(Modifier::DamagePlayer {
            source,
            amount,
            status,
        }
        .into());
    }

    /// Queues player damage that skips armor and the invincibility window.
    fn apply_direct_damage_to_player(&mut self, source: EntityId, amount: f32) {
        self.emit(Modifier::DirectPlayerDamage { source, amount }.into());
    }

    /// Queues healing for a non-player entity.
    fn heal(&mut self, target: EntityId, amount: f32) {
        self.emit(Modifier::ApplyHealing { target, amount }.into());
    }

    /// Queues a forced removal that awards no experience.
    fn request_despawn(&mut self, target: EntityId) {
        self.emit(Command::Despawn { target }.into());
    }
}

// =============================================================================
// World
// =============================================================================

/// In-process world used by the session and by tests.
#[derive(Debug, Clone)]
pub struct World {
    arena: Arena,
    clock: GameClock,
    bounds: Bounds,
    player: Option<EntityId>,
    outputs: Vec<OutputEnvelope>,
    /// Entity whose behavior is currently running.
    actor: Option<EntityId>,
    tick: u64,
    sequence: u32,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates an empty world with default bounds.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_bounds(seed, Bounds::default())
    }

    /// Creates an empty world with the given bounds.
    #[must_use]
    pub fn with_bounds(seed: u64, bounds: Bounds) -> Self {
        Self {
            arena: Arena::new(),
            clock: GameClock::default(),
            bounds,
            player: None,
            outputs: Vec::new(),
            actor: None,
            tick: 0,
            sequence: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Binds the player entity.
    pub fn set_player(&mut self, player: Option<EntityId>) {
        self.player = player;
    }

    /// Returns the arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns the arena mutably.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Returns the clock mutably.
    #[must_use]
    pub fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }

    /// Starts a new tick; sequence numbers restart at zero.
    pub fn begin_tick(&mut self) {
        self.tick += 1;
        self.sequence = 0;
    }

    /// Current tick number.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Records which entity's behavior is running.
    pub fn set_actor(&mut self, actor: Option<EntityId>) {
        self.actor = actor;
    }

    /// Number of queued outputs.
    #[must_use]
    pub fn pending_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Takes every queued output.
    pub fn drain_outputs(&mut self) -> Vec<OutputEnvelope> {
        std::mem::take(&mut self.outputs)
    }
}

impl WorldContext for World {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn player(&self) -> Option<EntityId> {
        self.player
    }

    fn player_position(&self) -> Option<Vec2> {
        let player = self.arena.get(self.player?)?;
        (player.is_live() && player.transform.has_finite_position()).then(|| player.position())
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.arena.get_mut(id)
    }

    fn spawn(&mut self, spec: EntitySpec) -> EntityId {
        let tag = spec.tag;
        let id = self.arena.spawn(spec);
        debug!(entity = %id, %tag, "spawned");
        id
    }

    fn despawn(&mut self, id: EntityId) -> bool {
        let removed = self.arena.despawn(id).is_some();
        if removed {
            debug!(entity = %id, "despawned");
        }
        removed
    }

    fn place(&mut self, id: EntityId, position: Vec2) {
        if let Some(entity) = self.arena.get_mut(id) {
            entity.transform.position = position;
            self.arena.update_spatial(id);
        }
    }

    fn query_radius(&self, center: Vec2, radius: f32, tag: EntityTag) -> Vec<EntityId> {
        if !center.is_finite() || !radius.is_finite() || radius < 0.0 {
            return Vec::new();
        }
        self.arena
            .spatial()
            .query_radius(center, radius, tag)
            .into_iter()
            .filter(|id| self.arena.get(*id).is_some_and(Entity::is_live))
            .collect()
    }

    fn nearest(&self, from: Vec2, tag: EntityTag, max_range: f32) -> Option<EntityId> {
        self.query_radius(from, max_range, tag)
            .into_iter()
            .filter_map(|id| {
                let entity = self.arena.get(id)?;
                Some((id, from.distance_squared(entity.position())))
            })
            .min_by(|(id_a, a), (id_b, b)| a.total_cmp(b).then(id_a.cmp(id_b)))
            .map(|(id, _)| id)
    }

    fn apply_velocity(&mut self, id: EntityId, velocity: Vec2) -> Result<(), PhysicsError> {
        if !velocity.is_finite() {
            return Err(PhysicsError::NonFinite(id.as_u64()));
        }
        match self.arena.get_mut(id) {
            Some(entity) if entity.has_body && entity.is_live() => {
                entity.transform.velocity = velocity;
                Ok(())
            }
            _ => Err(PhysicsError::NoBody(id.as_u64())),
        }
    }

    fn emit(&mut self, output: Output) {
        let envelope = OutputEnvelope::new(output, self.actor, self.tick, self.sequence);
        self.sequence += 1;
        self.outputs.push(envelope);
    }

    fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

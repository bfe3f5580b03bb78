//! Combat session: one run of the game, ticked by the host loop.
//!
//! `CombatSession` owns the world, the registries, every live behavior
//! instance, the collision table and the player state. Each call to
//! [`CombatSession::step`] runs one tick:
//!
//! 1. **CLOCK**: feed the wall timestamp; simulation time excludes pauses
//! 2. **PRUNE**: clean up behaviors whose entity disappeared
//! 3. **ABILITY**: update every behavior in entity order
//! 4. **PHYSICS**: integrate velocities over the clamped frame delta
//! 5. **COLLISION**: dispatch detected and reported contacts to their owners
//! 6. **RESOLUTION**: apply queued damage, healing, despawns and events
//! 7. **UPKEEP**: status countdowns, regeneration and affliction ticks
//!
//! While paused only the clock and the status tracker see the tick, so
//! nothing counts down.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::config::SessionConfig;
//! use gauntlet_core::session::CombatSession;
//! use glam::Vec2;
//!
//! let mut session = CombatSession::with_defaults(SessionConfig::with_seed(1));
//! session.select_character("vanguard").unwrap();
//! let grunt = session.spawn_enemy("grunt", Vec2::new(60.0, 0.0)).unwrap();
//!
//! for frame in 1..=120 {
//!     session.step(f64::from(frame) * 16.0);
//! }
//!
//! // The aura pulses every 800 ms and a grunt has 2 health.
//! assert!(session.world().arena().get(grunt).is_none());
//! assert!(!session.is_game_over());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use tracing::{debug, info, trace};

use crate::behavior::BehaviorHost;
use crate::catalog::default_upgrades;
use crate::collision::{CollisionDispatcher, CollisionLabel, Contact};
use crate::config::SessionConfig;
use crate::entity::{Conditions, EntityId, EntitySpec, EntityTag};
use crate::error::{CoreError, Result};
use crate::output::{Event, Output, OutputEnvelope};
use crate::player::{HudSnapshot, PlayerState};
use crate::registry::EntityRegistry;
use crate::resolver::{
    destroy_entity, physics, route, CombatResolver, EventResolver, ResolveContext, Resolver,
};
use crate::stats::{BaseStats, DerivedStats, ModifierSet, StatEngine};
use crate::upgrades::{Upgrade, UpgradeCatalog};
use crate::world::{World, WorldContext};

/// Resolution passes per phase; outputs emitted by the last pass wait for
/// the next tick.
const MAX_RESOLVE_PASSES: usize = 8;

// =============================================================================
// Combat Session
// =============================================================================

/// One run: world, registries, behaviors, collision table and player.
pub struct CombatSession {
    config: SessionConfig,
    world: World,
    characters: EntityRegistry,
    enemies: EntityRegistry,
    upgrades: UpgradeCatalog,
    dispatcher: CollisionDispatcher,
    behaviors: BTreeMap<EntityId, BehaviorHost>,
    player: Option<PlayerState>,
    combat: CombatResolver,
    events: EventResolver,
    /// Contacts reported by the host, delivered in the next collision phase.
    reported: Vec<Contact>,
    paused: bool,
    last_sim: f64,
    fallback_stats: DerivedStats,
}

impl fmt::Debug for CombatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatSession")
            .field("tick", &self.world.tick())
            .field("now", &self.world.now())
            .field("paused", &self.paused)
            .field("behaviors", &self.behaviors.len())
            .field("collision_labels", &self.dispatcher.len())
            .field("character", &self.player.as_ref().map(|p| &p.character_id))
            .finish_non_exhaustive()
    }
}

impl CombatSession {
    /// Creates a session over the given catalogs.
    ///
    /// No character is selected yet; call [`CombatSession::select_character`].
    #[must_use]
    pub fn new(
        config: SessionConfig,
        characters: EntityRegistry,
        enemies: EntityRegistry,
        upgrades: UpgradeCatalog,
    ) -> Self {
        let world = World::with_bounds(config.seed, config.bounds);
        Self {
            config,
            world,
            characters,
            enemies,
            upgrades,
            dispatcher: CollisionDispatcher::new(),
            behaviors: BTreeMap::new(),
            player: None,
            combat: CombatResolver::new(),
            events: EventResolver::new(),
            reported: Vec::new(),
            paused: false,
            last_sim: 0.0,
            fallback_stats: StatEngine::compute(
                &BaseStats::new(1.0, 0.0),
                &ModifierSet::new(),
                None,
                true,
            ),
        }
    }

    /// Creates a session over the built-in catalogs.
    #[must_use]
    pub fn with_defaults(config: SessionConfig) -> Self {
        Self::new(
            config,
            EntityRegistry::default_characters(),
            EntityRegistry::default_enemies(),
            default_upgrades(),
        )
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Session config.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world, mutably.
    #[must_use]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Character registry.
    #[must_use]
    pub fn characters(&self) -> &EntityRegistry {
        &self.characters
    }

    /// Enemy registry.
    #[must_use]
    pub fn enemies(&self) -> &EntityRegistry {
        &self.enemies
    }

    /// Current collision table.
    #[must_use]
    pub fn dispatcher(&self) -> &CollisionDispatcher {
        &self.dispatcher
    }

    /// Player state, if a character is selected.
    #[must_use]
    pub fn player(&self) -> Option<&PlayerState> {
        self.player.as_ref()
    }

    /// Player state, mutably.
    #[must_use]
    pub fn player_mut(&mut self) -> Option<&mut PlayerState> {
        self.player.as_mut()
    }

    /// Behavior bound to `entity`.
    #[must_use]
    pub fn behavior(&self, entity: EntityId) -> Option<&BehaviorHost> {
        self.behaviors.get(&entity)
    }

    /// Number of live behavior instances.
    #[must_use]
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.world.arena().count_tagged(EntityTag::Enemy)
    }

    /// Whether the session is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the player has died.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.player.as_ref().is_some_and(PlayerState::is_defeated)
    }

    fn stats(&self) -> DerivedStats {
        self.player
            .as_ref()
            .map_or_else(|| self.fallback_stats.clone(), |p| p.derived.clone())
    }

    fn level(&self) -> u32 {
        self.player.as_ref().map_or(1, |p| p.progression.level)
    }

    // -------------------------------------------------------------------------
    // Character
    // -------------------------------------------------------------------------

    /// Makes `id` the controlled character.
    ///
    /// The previous character's behavior is cleaned up, the player entity is
    /// reused (or spawned at the arena center), stats and progression start
    /// fresh at full health, and the collision table is rebuilt in one step
    /// from the character's handlers plus every enemy type's handlers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntityType`] if `id` is not a character.
    pub fn select_character(&mut self, id: &str) -> Result<()> {
        let base = self.characters.get_descriptor(id)?.stats.clone();
        let now = self.world.now();

        let old_stats = self.stats();
        let entity = match self.player.take() {
            Some(old) => {
                if let Some(mut host) = self.behaviors.remove(&old.entity) {
                    host.cleanup(&mut self.world, &old_stats);
                }
                Some(old.entity).filter(|e| self.world.entity(*e).is_some_and(|h| h.is_live()))
            }
            None => None,
        };
        let entity = entity.unwrap_or_else(|| {
            let center = (self.config.bounds.min + self.config.bounds.max) / 2.0;
            self.world
                .spawn(EntitySpec::new(EntityTag::Player, center).with_radius(base.hitbox_radius))
        });
        self.world.set_player(Some(entity));

        let mut host = self.characters.create(&mut self.world, id, entity)?;
        let player = PlayerState::new(id, entity, base, &self.config, now);
        if let Some(handle) = self.world.entity_mut(entity) {
            handle.conditions = Conditions::default();
            handle.transform.velocity = Vec2::ZERO;
            player.mirror_onto(handle);
        }

        self.dispatcher.register_all(
            host.collision_handlers()
                .into_iter()
                .chain(self.enemies.all_collision_handlers()),
        );

        self.world.set_actor(Some(entity));
        host.setup(&mut self.world, &player.derived);
        self.world.set_actor(None);
        self.behaviors.insert(entity, host);
        self.player = Some(player);
        info!(character = id, %entity, "character selected");
        Ok(())
    }

    /// Steers the player along `direction` at its move speed.
    ///
    /// Stunned players do not move, knocked-back players keep their impulse
    /// and confused players move the opposite way.
    pub fn move_player(&mut self, direction: Vec2) {
        let Some(player) = self.player.as_ref().filter(|p| !p.is_defeated()) else {
            return;
        };
        let (entity, speed) = (player.entity, player.derived.move_speed);
        let now = self.world.now();
        let Some(conditions) = self.world.entity(entity).map(|e| e.conditions) else {
            return;
        };
        if conditions.is_knocked_back(now) {
            return;
        }
        let velocity = if conditions.is_stunned(now) {
            Vec2::ZERO
        } else if conditions.is_confused(now) {
            -direction.normalize_or_zero() * speed
        } else {
            direction.normalize_or_zero() * speed
        };
        if let Err(err) = self.world.apply_velocity(entity, velocity) {
            trace!(%err, "player velocity rejected");
        }
    }

    // -------------------------------------------------------------------------
    // Enemies
    // -------------------------------------------------------------------------

    /// Spawns an enemy of type `id` at `position`.
    ///
    /// Health is scaled by the player's current level at spawn time.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntityType`] if `id` is not an enemy type.
    pub fn spawn_enemy(&mut self, id: &str, position: Vec2) -> Result<EntityId> {
        let descriptor = self.enemies.get_descriptor(id)?;
        let level = self.level();
        let health = EntityRegistry::scaled_health(
            descriptor.stats.health,
            level,
            self.config.health_scaling_per_level,
        );
        let spec = EntitySpec::new(EntityTag::Enemy, position)
            .with_radius(descriptor.stats.hitbox_radius)
            .with_vitals(descriptor.vitals(health))
            .with_descriptor(id);

        let entity = self.world.spawn(spec);
        let mut host = self.enemies.create(&mut self.world, id, entity)?;
        let stats = self.stats();
        self.world.set_actor(Some(entity));
        host.setup(&mut self.world, &stats);
        self.world.set_actor(None);
        self.behaviors.insert(entity, host);
        debug!(type_id = id, %entity, health, level, "enemy spawned");
        Ok(entity)
    }

    /// Spawns an enemy drawn by level-adjusted weight.
    ///
    /// Returns `Ok(None)` when no enemy type has a positive weight.
    ///
    /// # Errors
    ///
    /// Propagates [`CombatSession::spawn_enemy`] errors.
    pub fn spawn_random_enemy(&mut self, position: Vec2) -> Result<Option<EntityId>> {
        let level = self.level();
        let Some(id) = self
            .enemies
            .random_enemy_type(level, self.world.rng())
            .map(str::to_owned)
        else {
            return Ok(None);
        };
        self.spawn_enemy(&id, position).map(Some)
    }

    /// Cleans up and removes an entity in one operation.
    ///
    /// The player entity cannot be despawned. Returns `false` if nothing was
    /// removed.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if self.player.as_ref().is_some_and(|p| p.entity == entity) {
            return false;
        }
        let stats = self.stats();
        destroy_entity(&mut self.world, &mut self.behaviors, &stats, entity)
    }

    // -------------------------------------------------------------------------
    // Upgrades
    // -------------------------------------------------------------------------

    /// Upgrades the selected character can pick.
    #[must_use]
    pub fn available_upgrades(&self, character_id: &str) -> Vec<&Upgrade> {
        self.upgrades.available_upgrades(character_id)
    }

    /// Upgrades applied so far.
    #[must_use]
    pub fn character_upgrades(&self) -> &[Upgrade] {
        self.player
            .as_ref()
            .map_or(&[], PlayerState::character_upgrades)
    }

    /// Draws `n` distinct upgrades for the selected character.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoActiveCharacter`] before a character is selected.
    pub fn offer_upgrades(&mut self, n: usize) -> Result<Vec<Upgrade>> {
        let character = self
            .player
            .as_ref()
            .ok_or(CoreError::NoActiveCharacter)?
            .character_id
            .clone();
        Ok(self
            .upgrades
            .offer_upgrades(&character, n, self.world.rng()))
    }

    /// Applies an upgrade; the next ability update sees the new stats.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoActiveCharacter`], [`CoreError::UnknownUpgrade`]
    /// or the modifier error of a rejected effect.
    pub fn apply_upgrade(&mut self, upgrade_id: &str) -> Result<()> {
        let player = self.player.as_mut().ok_or(CoreError::NoActiveCharacter)?;
        let upgrade = self.upgrades.find(&player.character_id, upgrade_id)?;
        player.apply_upgrade(upgrade)?;
        if let Some(handle) = self.world.entity_mut(player.entity) {
            player.mirror_onto(handle);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Host Input
    // -------------------------------------------------------------------------

    /// Queues a contact reported by an external physics layer.
    pub fn report_contact(&mut self, label: CollisionLabel, a: EntityId, b: EntityId) {
        self.reported.push(Contact::new(label, a, b));
    }

    /// Sets the global pause flag.
    ///
    /// The transition is stamped at the last wall time the session saw.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        let wall = self.world.clock().wall_now();
        self.world.clock_mut().update(wall, paused);
        let anchor = self.world.player_position().unwrap_or(Vec2::ZERO);
        if let Some(player) = self.player.as_mut() {
            player.status.update(wall, paused, anchor);
        }
        debug!(paused, "pause toggled");
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Runs one tick at wall time `wall_now` (ms).
    pub fn step(&mut self, wall_now: f64) {
        self.world.clock_mut().update(wall_now, self.paused);
        self.world.begin_tick();

        if self.paused {
            let wall = self.world.clock().wall_now();
            let anchor = self.world.player_position().unwrap_or(Vec2::ZERO);
            if let Some(player) = self.player.as_mut() {
                player.status.update(wall, true, anchor);
            }
            return;
        }
        if self.is_game_over() {
            return;
        }

        let now = self.world.now();
        let dt = (now - self.last_sim).clamp(0.0, self.config.max_frame_ms);
        self.last_sim = now;

        self.prune();
        self.update_behaviors();
        physics::integrate(&mut self.world, dt);
        self.dispatch_contacts();
        self.flush();
        self.player_upkeep();
        self.flush();
    }

    /// Drains the event log.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events
            .take_events()
            .into_iter()
            .filter_map(|envelope| match envelope.into_output() {
                Output::Event(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// HUD read-out, if a character is selected.
    #[must_use]
    pub fn hud(&self) -> Option<HudSnapshot> {
        let wall = self.world.clock().wall_now();
        self.player.as_ref().map(|p| p.hud(wall))
    }

    fn prune(&mut self) {
        let gone: Vec<EntityId> = self
            .behaviors
            .keys()
            .copied()
            .filter(|id| !self.world.entity(*id).is_some_and(|e| e.is_live()))
            .collect();
        let stats = self.stats();
        for id in gone {
            trace!(entity = %id, "pruning behavior of vanished entity");
            destroy_entity(&mut self.world, &mut self.behaviors, &stats, id);
        }
    }

    fn update_behaviors(&mut self) {
        let stats = self.stats();
        let ids: Vec<EntityId> = self.behaviors.keys().copied().collect();
        for id in ids {
            let Some(host) = self.behaviors.get_mut(&id) else {
                continue;
            };
            self.world.set_actor(Some(id));
            host.update(&mut self.world, &stats);
        }
        self.world.set_actor(None);
    }

    fn dispatch_contacts(&mut self) {
        let stats = self.stats();
        let mut contacts = std::mem::take(&mut self.reported);
        contacts.extend(physics::detect_contacts(&self.world));

        for contact in contacts {
            let Some(dispatch) =
                self.dispatcher
                    .resolve(&contact.label, contact.source, contact.target, &self.world)
            else {
                continue;
            };
            let Some(host) = self
                .behaviors
                .get_mut(&dispatch.owner)
                .filter(|h| h.kind() == dispatch.kind)
            else {
                trace!(label = %dispatch.contact.label, owner = %dispatch.owner, "no matching behavior");
                continue;
            };
            self.world.set_actor(Some(dispatch.owner));
            host.handle_collision(&mut self.world, &stats, &dispatch.contact);
        }
        self.world.set_actor(None);
    }

    fn player_upkeep(&mut self) {
        let now = self.world.now();
        let wall = self.world.clock().wall_now();
        let anchor = self.world.player_position().unwrap_or(Vec2::ZERO);
        let Some(player) = self.player.as_mut().filter(|p| !p.is_defeated()) else {
            return;
        };

        let expired = player.status.update(wall, false, anchor);
        if !expired.is_empty() {
            player.sync_afflictions();
            trace!(count = expired.len(), "status effects expired");
        }

        if let Some(amount) = player.regen_due(now, self.config.regen_interval_ms) {
            self.world.heal(player.entity, amount);
        }

        if player.affliction_tick_due(now, self.config.affliction_tick_ms) {
            let dealt = player.lose_health(self.config.affliction_damage);
            if player.derived.health <= 0.0 {
                player.defeated_at = Some(now);
                info!(character = %player.character_id, "game over");
            }
            if let Some(handle) = self.world.entity_mut(player.entity) {
                player.mirror_onto(handle);
            }
            if dealt > 0.0 {
                self.world.emit(
                    Event::DamageDealt {
                        source: player.entity,
                        target: player.entity,
                        amount: dealt,
                    }
                    .into(),
                );
            }
        }
    }

    /// Applies queued outputs until the queue is empty or the pass limit is
    /// reached.
    fn flush(&mut self) {
        for _ in 0..MAX_RESOLVE_PASSES {
            let batch: Vec<OutputEnvelope> = self.world.drain_outputs();
            if batch.is_empty() {
                return;
            }
            let mut ctx = ResolveContext {
                world: &mut self.world,
                behaviors: &mut self.behaviors,
                player: self.player.as_mut(),
                config: &self.config,
                fallback_stats: &self.fallback_stats,
            };
            let mut resolvers: [&mut dyn Resolver; 2] = [&mut self.combat, &mut self.events];
            route(&mut resolvers, &batch, &mut ctx);
        }
        trace!(pending = self.world.pending_outputs(), "outputs deferred to next tick");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorKind;
    use crate::runtime::LifecyclePhase;
    use crate::status::StatusKind;

    fn session() -> CombatSession {
        CombatSession::with_defaults(SessionConfig::with_seed(3))
    }

    mod character_tests {
        use super::*;

        #[test]
        fn unknown_character_is_an_error() {
            let mut session = session();
            assert_eq!(
                session.select_character("wizard").unwrap_err(),
                CoreError::UnknownEntityType("wizard".into())
            );
            assert!(session.player().is_none());
        }

        #[test]
        fn selection_builds_collision_table() {
            let mut session = session();
            session.select_character("ranger").unwrap();
            let dispatcher = session.dispatcher();
            assert!(dispatcher.handles(&CollisionLabel::new("ranger:bolt")));
            assert!(dispatcher.handles(&CollisionLabel::new("grunt:contact")));
            assert!(dispatcher.handles(&CollisionLabel::new("overlord:shard")));

            session.select_character("glaive").unwrap();
            let dispatcher = session.dispatcher();
            assert!(!dispatcher.handles(&CollisionLabel::new("ranger:bolt")));
            assert!(dispatcher.handles(&CollisionLabel::new("glaive:blade")));
        }

        #[test]
        fn switching_rebinds_player_and_resets_stats() {
            let mut session = session();
            session.select_character("vanguard").unwrap();
            let entity = session.player().unwrap().entity;
            session.player_mut().unwrap().lose_health(5.0);

            session.select_character("ranger").unwrap();
            let player = session.player().unwrap();
            assert_eq!(player.entity, entity);
            assert_eq!(player.derived.health, player.derived.max_health);
            assert_eq!(session.behavior(entity).unwrap().kind(), BehaviorKind::Ranged);
            assert_eq!(session.world().arena().count_tagged(EntityTag::Player), 1);
        }

        #[test]
        fn switching_cleans_up_old_projectiles() {
            let mut session = session();
            session.select_character("vanguard").unwrap();
            assert_eq!(session.world().arena().count_tagged(EntityTag::Effect), 1);

            session.select_character("ranger").unwrap();
            assert_eq!(session.world().arena().count_tagged(EntityTag::Effect), 0);
        }
    }

    mod enemy_tests {
        use super::*;

        #[test]
        fn spawn_sets_up_behavior() {
            let mut session = session();
            let grunt = session.spawn_enemy("grunt", Vec2::new(200.0, 0.0)).unwrap();
            let host = session.behavior(grunt).unwrap();
            assert_eq!(host.phase(), LifecyclePhase::Active);
            assert_eq!(session.enemy_count(), 1);
        }

        #[test]
        fn unknown_enemy_spawns_nothing() {
            let mut session = session();
            assert!(session.spawn_enemy("dragon", Vec2::ZERO).is_err());
            assert_eq!(session.world().arena().entity_count(), 0);
        }

        #[test]
        fn despawn_is_immediate() {
            let mut session = session();
            session.select_character("ranger").unwrap();
            let grunt = session.spawn_enemy("grunt", Vec2::new(200.0, 0.0)).unwrap();
            assert!(session.despawn(grunt));
            assert!(session.behavior(grunt).is_none());
            assert!(session.world().entity(grunt).is_none());
            assert!(!session.despawn(grunt));

            let player = session.player().unwrap().entity;
            assert!(!session.despawn(player));
        }

        #[test]
        fn random_spawn_never_draws_the_boss() {
            let mut session = session();
            for _ in 0..200 {
                let id = session.spawn_random_enemy(Vec2::new(500.0, 500.0)).unwrap().unwrap();
                let descriptor = session.world().entity(id).unwrap().descriptor.clone();
                assert_ne!(descriptor.as_deref(), Some("overlord"));
                session.despawn(id);
            }
        }
    }

    mod tick_tests {
        use super::*;

        #[test]
        fn chaser_contact_damages_player_once_per_window() {
            let mut session = session();
            session.select_character("ranger").unwrap();
            session.spawn_enemy("brute", Vec2::new(20.0, 0.0)).unwrap();

            session.step(16.0);
            let player = session.player().unwrap();
            assert_eq!(player.derived.health, 6.0);
            assert!(player.progression.bleeding);

            session.step(32.0);
            assert_eq!(session.player().unwrap().derived.health, 6.0);
        }

        #[test]
        fn reported_contact_is_dispatched() {
            let mut session = session();
            session.select_character("ranger").unwrap();
            let player = session.player().unwrap().entity;
            let viper = session.spawn_enemy("viper", Vec2::new(400.0, 0.0)).unwrap();

            session.report_contact(CollisionLabel::new("viper:contact"), viper, player);
            session.step(16.0);
            assert!(session.player().unwrap().status.has(StatusKind::Poison));
        }

        #[test]
        fn pause_freezes_behaviors() {
            let mut session = session();
            session.select_character("ranger").unwrap();
            let grunt = session.spawn_enemy("grunt", Vec2::new(800.0, 0.0)).unwrap();
            session.step(16.0);
            let before = session.world().entity(grunt).unwrap().position();

            session.set_paused(true);
            session.step(1016.0);
            assert_eq!(session.world().entity(grunt).unwrap().position(), before);
            assert_eq!(session.world().now(), 16.0);

            session.set_paused(false);
            session.step(1032.0);
            assert_eq!(session.world().now(), 32.0);
        }

        #[test]
        fn frame_delta_is_clamped() {
            let mut session = session();
            let grunt = session.spawn_enemy("grunt", Vec2::new(300.0, 0.0)).unwrap();
            session
                .world_mut()
                .entity_mut(grunt)
                .unwrap()
                .transform
                .velocity = Vec2::new(-100.0, 0.0);
            session.step(5000.0);
            // Without a player the grunt keeps its velocity for one clamped frame.
            let x = session.world().entity(grunt).unwrap().position().x;
            assert!((x - 290.0).abs() < 1e-3);
        }

        #[test]
        fn upgrade_requires_character() {
            let mut session = session();
            assert_eq!(
                session.apply_upgrade("power").unwrap_err(),
                CoreError::NoActiveCharacter
            );
            session.select_character("ranger").unwrap();
            session.apply_upgrade("power").unwrap();
            assert_eq!(session.player().unwrap().derived.ability_damage, 4.0);
            assert_eq!(session.character_upgrades().len(), 1);
            assert!(matches!(
                session.apply_upgrade("twin_blades"),
                Err(CoreError::UnknownUpgrade(_))
            ));
        }
    }
}

//! Behavior framework: the capability interface every character and enemy
//! variant implements, and the host that enforces its lifecycle.
//!
//! A [`Behavior`] is the per-type ability logic. It never owns engine state
//! directly; each call receives an [`AbilityContext`] holding the world
//! collaborator, the entity's [`AbilityRuntime`] and the player's current
//! [`DerivedStats`].
//!
//! [`BehaviorHost`] pairs a behavior with its runtime and bound entity and
//! enforces the lifecycle:
//! - `setup` runs `setup_ability` exactly once
//! - `update` runs only while active, and only if the entity passes its
//!   liveness check
//! - `cleanup` is idempotent and valid from any phase
//!
//! [`BehaviorClass`] is the closed, data-driven set of variants; it carries
//! per-variant tuning and instantiates behaviors.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::behavior::{BehaviorClass, BehaviorHost, BehaviorKind};
//! use gauntlet_core::abilities::ChaserTuning;
//! use gauntlet_core::entity::{EntitySpec, EntityTag};
//! use gauntlet_core::runtime::LifecyclePhase;
//! use gauntlet_core::stats::{BaseStats, ModifierSet, StatEngine};
//! use gauntlet_core::world::{World, WorldContext};
//! use glam::Vec2;
//!
//! let mut world = World::new(3);
//! let stats = StatEngine::compute(&BaseStats::new(10.0, 100.0), &ModifierSet::new(), None, true);
//! let enemy = world.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
//!
//! let class = BehaviorClass::Chaser(ChaserTuning::default());
//! let mut host = BehaviorHost::new(enemy, "grunt", class.instantiate("grunt"));
//! assert_eq!(host.kind(), BehaviorKind::Chaser);
//!
//! assert!(host.setup(&mut world, &stats));
//! assert!(!host.setup(&mut world, &stats));
//! host.cleanup(&mut world, &stats);
//! host.cleanup(&mut world, &stats);
//! assert_eq!(host.phase(), LifecyclePhase::CleanedUp);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::abilities::{
    aura::AuraBehavior, bomber::BomberBehavior, boomerang::BoomerangBehavior,
    chaser::ChaserBehavior, overlord::OverlordBehavior, puddle::PuddleBehavior,
    ranged::RangedBehavior, reflector::ReflectorBehavior, regenerator::RegeneratorBehavior,
    starfall::StarfallBehavior, AuraTuning, BomberTuning, BoomerangTuning, ChaserTuning,
    OverlordTuning, PuddleTuning, RangedTuning, ReflectorTuning, RegeneratorTuning,
    StarfallTuning,
};
use crate::collision::{CollisionHandler, Contact};
use crate::entity::EntityId;
use crate::liveness::LivenessCheck;
use crate::runtime::{AbilityRuntime, LifecyclePhase};
use crate::stats::DerivedStats;
use crate::world::WorldContext;

// =============================================================================
// Behavior Kind
// =============================================================================

/// Discriminant of the closed variant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// Persistent damaging aura with knockback
    Aura,
    /// Cooldown-gated ranged bolts
    Ranged,
    /// Fixed-heading outbound/return blades
    Boomerang,
    /// Thrown flasks leaving slowing puddles
    Puddle,
    /// Falling stars with area impact
    Starfall,
    /// Contact-damage chaser
    Chaser,
    /// Chaser that reflects damage
    Reflector,
    /// Chaser that regenerates
    Regenerator,
    /// Chaser with a delayed self-destruct
    Bomber,
    /// Multi-ability boss
    Overlord,
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Ability Context
// =============================================================================

/// Everything a behavior may touch during one call.
pub struct AbilityContext<'a> {
    /// Entity the behavior is bound to.
    pub entity: EntityId,
    /// World collaborator.
    pub world: &'a mut dyn WorldContext,
    /// The behavior's runtime.
    pub runtime: &'a mut AbilityRuntime,
    /// The player's current derived stats.
    pub stats: &'a DerivedStats,
}

impl AbilityContext<'_> {
    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.world.now()
    }

    /// Runs a liveness check on the bound entity.
    #[must_use]
    pub fn check_self(&self) -> LivenessCheck<'_> {
        LivenessCheck::new(&*self.world, self.entity)
    }
}

impl fmt::Debug for AbilityContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityContext")
            .field("entity", &self.entity)
            .field("phase", &self.runtime.phase())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Behavior Trait
// =============================================================================

/// Ability logic for one entity type.
///
/// Implementations must tolerate their entity (or any target) vanishing
/// between calls: every positional operation starts with a liveness check
/// and silently returns when it fails.
pub trait Behavior: fmt::Debug {
    /// Variant discriminant.
    fn kind(&self) -> BehaviorKind;

    /// Labels this behavior handles.
    fn collision_handlers(&self) -> Vec<CollisionHandler> {
        Vec::new()
    }

    /// Allocates groups, timers and state. Called once.
    fn setup_ability(&mut self, ctx: &mut AbilityContext<'_>);

    /// Per-tick logic.
    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>);

    /// Handles a dispatched contact whose label this behavior registered.
    fn on_collision(&mut self, _ctx: &mut AbilityContext<'_>, _contact: &Contact) {}

    /// Returns the part of `amount` that should reach the entity's health.
    fn intercept_damage(
        &mut self,
        _ctx: &mut AbilityContext<'_>,
        _source: EntityId,
        amount: f32,
    ) -> f32 {
        amount
    }

    /// Reverts effects the behavior applied to other entities. The host
    /// clears the runtime afterwards.
    fn cleanup(&mut self, _ctx: &mut AbilityContext<'_>) {}
}

// =============================================================================
// Behavior Host
// =============================================================================

/// A behavior bound to a live entity, with its runtime.
#[derive(Debug)]
pub struct BehaviorHost {
    entity: EntityId,
    type_id: String,
    behavior: Box<dyn Behavior>,
    runtime: AbilityRuntime,
}

impl BehaviorHost {
    /// Binds a behavior to an entity.
    #[must_use]
    pub fn new(entity: EntityId, type_id: impl Into<String>, behavior: Box<dyn Behavior>) -> Self {
        Self {
            entity,
            type_id: type_id.into(),
            behavior,
            runtime: AbilityRuntime::new(),
        }
    }

    /// Bound entity.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Registry id of the entity type.
    #[must_use]
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Variant discriminant.
    #[must_use]
    pub fn kind(&self) -> BehaviorKind {
        self.behavior.kind()
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.runtime.phase()
    }

    /// The runtime.
    #[must_use]
    pub fn runtime(&self) -> &AbilityRuntime {
        &self.runtime
    }

    /// Labels handled by the behavior.
    #[must_use]
    pub fn collision_handlers(&self) -> Vec<CollisionHandler> {
        self.behavior.collision_handlers()
    }

    fn context<'a>(
        entity: EntityId,
        world: &'a mut dyn WorldContext,
        runtime: &'a mut AbilityRuntime,
        stats: &'a DerivedStats,
    ) -> AbilityContext<'a> {
        AbilityContext {
            entity,
            world,
            runtime,
            stats,
        }
    }

    /// Runs `setup_ability` if the behavior is still uninitialized.
    ///
    /// Returns `false` (and does nothing) from any other phase.
    pub fn setup(&mut self, world: &mut dyn WorldContext, stats: &DerivedStats) -> bool {
        if !self.runtime.activate() {
            trace!(entity = %self.entity, phase = ?self.runtime.phase(), "setup skipped");
            return false;
        }
        let mut ctx = Self::context(self.entity, world, &mut self.runtime, stats);
        self.behavior.setup_ability(&mut ctx);
        debug!(entity = %self.entity, type_id = %self.type_id, "behavior set up");
        true
    }

    /// Runs one ability update.
    pub fn update(&mut self, world: &mut dyn WorldContext, stats: &DerivedStats) {
        if !self.runtime.is_active() {
            return;
        }
        if LivenessCheck::new(&*world, self.entity)
            .with_position()
            .check()
            .is_none()
        {
            return;
        }
        let mut ctx = Self::context(self.entity, world, &mut self.runtime, stats);
        self.behavior.update_ability(&mut ctx);
    }

    /// Delivers a dispatched contact.
    pub fn handle_collision(
        &mut self,
        world: &mut dyn WorldContext,
        stats: &DerivedStats,
        contact: &Contact,
    ) {
        if !self.runtime.is_active() {
            return;
        }
        let mut ctx = Self::context(self.entity, world, &mut self.runtime, stats);
        self.behavior.on_collision(&mut ctx, contact);
    }

    /// Lets the behavior adjust incoming damage.
    pub fn intercept_damage(
        &mut self,
        world: &mut dyn WorldContext,
        stats: &DerivedStats,
        source: EntityId,
        amount: f32,
    ) -> f32 {
        if !self.runtime.is_active() {
            return amount;
        }
        let mut ctx = Self::context(self.entity, world, &mut self.runtime, stats);
        self.behavior.intercept_damage(&mut ctx, source, amount)
    }

    /// Tears the behavior down. Idempotent.
    pub fn cleanup(&mut self, world: &mut dyn WorldContext, stats: &DerivedStats) {
        if self.runtime.phase() == LifecyclePhase::CleanedUp {
            return;
        }
        {
            let mut ctx = Self::context(self.entity, world, &mut self.runtime, stats);
            self.behavior.cleanup(&mut ctx);
        }
        self.runtime.cleanup(world);
        debug!(entity = %self.entity, type_id = %self.type_id, "behavior cleaned up");
    }
}

// =============================================================================
// Behavior Class
// =============================================================================

/// Data-driven variant selector with per-variant tuning.
///
/// Serialized as an internally tagged object, e.g.
/// `{"class": "ranged", "bolt_speed": 500.0}`; omitted tuning fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum BehaviorClass {
    /// Persistent aura
    Aura(AuraTuning),
    /// Ranged bolts
    Ranged(RangedTuning),
    /// Boomerang blades
    Boomerang(BoomerangTuning),
    /// Flask and puddle
    Puddle(PuddleTuning),
    /// Falling stars
    Starfall(StarfallTuning),
    /// Contact chaser
    Chaser(ChaserTuning),
    /// Damage reflector
    Reflector(ReflectorTuning),
    /// Regenerating chaser
    Regenerator(RegeneratorTuning),
    /// Delayed self-destruct
    Bomber(BomberTuning),
    /// Boss
    Overlord(OverlordTuning),
}

impl BehaviorClass {
    /// Variant discriminant.
    #[must_use]
    pub const fn kind(&self) -> BehaviorKind {
        match self {
            Self::Aura(_) => BehaviorKind::Aura,
            Self::Ranged(_) => BehaviorKind::Ranged,
            Self::Boomerang(_) => BehaviorKind::Boomerang,
            Self::Puddle(_) => BehaviorKind::Puddle,
            Self::Starfall(_) => BehaviorKind::Starfall,
            Self::Chaser(_) => BehaviorKind::Chaser,
            Self::Reflector(_) => BehaviorKind::Reflector,
            Self::Regenerator(_) => BehaviorKind::Regenerator,
            Self::Bomber(_) => BehaviorKind::Bomber,
            Self::Overlord(_) => BehaviorKind::Overlord,
        }
    }

    /// Creates a fresh behavior for the entity type `type_id`.
    ///
    /// `type_id` namespaces the behavior's collision labels.
    #[must_use]
    pub fn instantiate(&self, type_id: &str) -> Box<dyn Behavior> {
        match self {
            Self::Aura(t) => Box::new(AuraBehavior::new(type_id, t.clone())),
            Self::Ranged(t) => Box::new(RangedBehavior::new(type_id, t.clone())),
            Self::Boomerang(t) => Box::new(BoomerangBehavior::new(type_id, t.clone())),
            Self::Puddle(t) => Box::new(PuddleBehavior::new(type_id, t.clone())),
            Self::Starfall(t) => Box::new(StarfallBehavior::new(type_id, t.clone())),
            Self::Chaser(t) => Box::new(ChaserBehavior::new(type_id, t.clone())),
            Self::Reflector(t) => Box::new(ReflectorBehavior::new(type_id, t.clone())),
            Self::Regenerator(t) => Box::new(RegeneratorBehavior::new(type_id, t.clone())),
            Self::Bomber(t) => Box::new(BomberBehavior::new(type_id, t.clone())),
            Self::Overlord(t) => Box::new(OverlordBehavior::new(type_id, t.clone())),
        }
    }
}

//! Resolvers turn queued outputs into state changes.
//!
//! Behaviors never mutate health directly. They queue [`Output`]s through
//! the world; at the end of each phase the session drains the queue and
//! routes every envelope to the resolvers whose [`Resolver::handles`] lists
//! its kind.
//!
//! # Available Resolvers
//!
//! - [`CombatResolver`]: damage, healing, player hits, deaths and despawns
//! - [`EventResolver`]: keeps a drainable event log (no state mutation)
//!
//! The [`physics`] module is the in-process physics stand-in: integration
//! and contact detection.
//!
//! [`Output`]: crate::output::Output

mod combat;
mod event;
pub mod physics;

pub use combat::CombatResolver;
pub use event::EventResolver;

use std::collections::BTreeMap;

use tracing::debug;

use crate::behavior::BehaviorHost;
use crate::config::SessionConfig;
use crate::entity::EntityId;
use crate::output::{OutputEnvelope, OutputKind};
use crate::player::PlayerState;
use crate::stats::DerivedStats;
use crate::world::{World, WorldContext};

/// Mutable state a resolver may touch.
pub struct ResolveContext<'a> {
    /// The world
    pub world: &'a mut World,
    /// Live behavior instances by entity
    pub behaviors: &'a mut BTreeMap<EntityId, BehaviorHost>,
    /// Player state, if a character is selected
    pub player: Option<&'a mut PlayerState>,
    /// Session tunables
    pub config: &'a SessionConfig,
    /// Stats handed to behaviors when no character is selected
    pub fallback_stats: &'a DerivedStats,
}

impl ResolveContext<'_> {
    /// Stats behaviors observe during resolution.
    #[must_use]
    pub fn stats(&self) -> DerivedStats {
        self.player
            .as_deref()
            .map_or_else(|| self.fallback_stats.clone(), |p| p.derived.clone())
    }

    /// Cleans up the entity's behavior and removes the entity.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let stats = self.stats();
        destroy_entity(self.world, self.behaviors, &stats, id)
    }
}

/// Cleanup and removal as one operation.
///
/// The behavior's timers and owned entities go first, then the entity
/// itself, so nothing later in the same tick can observe a half-dead entity.
pub(crate) fn destroy_entity(
    world: &mut World,
    behaviors: &mut BTreeMap<EntityId, BehaviorHost>,
    stats: &DerivedStats,
    id: EntityId,
) -> bool {
    if let Some(mut host) = behaviors.remove(&id) {
        host.cleanup(world, stats);
    }
    let removed = world.despawn(id);
    if removed {
        debug!(entity = %id, "entity destroyed");
    }
    removed
}

/// Applies routed outputs.
///
/// # Invariants
///
/// - Outputs are processed in queue order
/// - Outputs a resolver emits itself are queued for the next pass, never
///   applied re-entrantly
pub trait Resolver {
    /// Output kinds this resolver consumes.
    fn handles(&self) -> &[OutputKind];

    /// Applies the outputs routed to this resolver.
    ///
    /// # Arguments
    ///
    /// * `outputs` - envelopes whose kind is listed in `handles()`
    /// * `ctx` - world, behaviors and player state to mutate
    fn resolve(&mut self, outputs: &[&OutputEnvelope], ctx: &mut ResolveContext<'_>);
}

/// Routes one batch to each resolver in order.
pub fn route(
    resolvers: &mut [&mut dyn Resolver],
    batch: &[OutputEnvelope],
    ctx: &mut ResolveContext<'_>,
) {
    for resolver in resolvers.iter_mut() {
        let relevant: Vec<&OutputEnvelope> = batch
            .iter()
            .filter(|envelope| resolver.handles().contains(&envelope.kind()))
            .collect();
        if !relevant.is_empty() {
            resolver.resolve(&relevant, ctx);
        }
    }
}

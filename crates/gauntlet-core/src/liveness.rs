//! Liveness checks run before positional or cross-entity operations.
//!
//! Entities can disappear between the moment an action is scheduled and the
//! moment it runs (a bolt despawned by a previous contact, an enemy killed
//! mid-explosion). A failing check aborts the current operation by returning
//! `None`. Failures are expected churn, so they are only logged at `trace`.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::entity::{EntitySpec, EntityTag};
//! use gauntlet_core::liveness::LivenessCheck;
//! use gauntlet_core::world::{World, WorldContext};
//! use glam::Vec2;
//!
//! let mut world = World::new(1);
//! let id = world.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::new(3.0, 4.0)));
//!
//! let live = LivenessCheck::new(&world, id).with_position().check().unwrap();
//! assert_eq!(live.position, Vec2::new(3.0, 4.0));
//!
//! world.despawn(id);
//! assert!(LivenessCheck::new(&world, id).check().is_none());
//! ```

use glam::Vec2;
use tracing::trace;

use crate::entity::{Entity, EntityId};
use crate::world::WorldContext;

/// Snapshot returned by a passing check.
#[derive(Debug, Clone)]
pub struct Live<'w> {
    /// The checked entity.
    pub entity: &'w Entity,
    /// Its position (finite when `with_position` was requested).
    pub position: Vec2,
    /// Player position when `with_player` was requested.
    pub player_position: Option<Vec2>,
}

/// Builder for a liveness check.
#[derive(Clone, Copy)]
pub struct LivenessCheck<'w> {
    world: &'w dyn WorldContext,
    id: EntityId,
    position: bool,
    player: bool,
}

impl<'w> LivenessCheck<'w> {
    /// Checks that `id` exists, is active and is still in the scene.
    #[must_use]
    pub fn new(world: &'w dyn WorldContext, id: EntityId) -> Self {
        Self {
            world,
            id,
            position: false,
            player: false,
        }
    }

    /// Also requires a finite position.
    #[must_use]
    pub fn with_position(mut self) -> Self {
        self.position = true;
        self
    }

    /// Also requires a live player with a finite position.
    #[must_use]
    pub fn with_player(mut self) -> Self {
        self.player = true;
        self
    }

    /// Runs the check.
    #[must_use]
    pub fn check(self) -> Option<Live<'w>> {
        let Some(entity) = self.world.entity(self.id) else {
            trace!(entity = %self.id, "liveness: entity missing");
            return None;
        };
        if !entity.is_live() {
            trace!(entity = %self.id, "liveness: entity inactive");
            return None;
        }
        if self.position && !entity.transform.has_finite_position() {
            trace!(entity = %self.id, "liveness: non-finite position");
            return None;
        }

        let player_position = if self.player {
            let Some(position) = self.world.player_position() else {
                trace!(entity = %self.id, "liveness: no live player");
                return None;
            };
            Some(position)
        } else {
            None
        };

        Some(Live {
            entity,
            position: entity.position(),
            player_position,
        })
    }
}

impl std::fmt::Debug for LivenessCheck<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessCheck")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntitySpec, EntityTag};
    use crate::world::{World, WorldContext};

    #[test]
    fn inactive_entity_fails() {
        let mut world = World::new(1);
        let id = world.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
        world.entity_mut(id).unwrap().active = false;
        assert!(LivenessCheck::new(&world, id).check().is_none());
    }

    #[test]
    fn out_of_scene_entity_fails() {
        let mut world = World::new(1);
        let id = world.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
        world.entity_mut(id).unwrap().in_scene = false;
        assert!(LivenessCheck::new(&world, id).check().is_none());
    }

    #[test]
    fn non_finite_position_fails_only_when_required() {
        let mut world = World::new(1);
        let id = world.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
        world.entity_mut(id).unwrap().transform.position = Vec2::new(f32::INFINITY, 0.0);

        assert!(LivenessCheck::new(&world, id).check().is_some());
        assert!(LivenessCheck::new(&world, id).with_position().check().is_none());
    }

    #[test]
    fn player_requirement() {
        let mut world = World::new(1);
        let enemy = world.spawn(EntitySpec::new(EntityTag::Enemy, Vec2::ZERO));
        assert!(LivenessCheck::new(&world, enemy).with_player().check().is_none());

        let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::new(5.0, 0.0)));
        world.set_player(Some(player));
        let live = LivenessCheck::new(&world, enemy).with_player().check().unwrap();
        assert_eq!(live.player_position, Some(Vec2::new(5.0, 0.0)));
    }
}

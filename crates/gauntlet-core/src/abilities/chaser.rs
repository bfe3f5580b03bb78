//! Contact-damage chasers.
//!
//! Every enemy walks toward the player and hurts it on contact. The shared
//! part lives in [`ContactCore`], which the other enemy variants embed;
//! [`ChaserBehavior`] is the plain enemy (grunt, brute, viper) whose only
//! extra is an optional status applied on hit (bleed, poison).

use serde::{Deserialize, Serialize};

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::collision::{CollisionHandler, CollisionLabel, Contact};
use crate::entity::{ContactSpec, EntityTag};
use crate::output::HitStatus;

use super::common::steer_toward_player;

// =============================================================================
// Contact Core
// =============================================================================

/// Chase-and-touch logic shared by every enemy variant.
#[derive(Debug, Clone)]
pub struct ContactCore {
    label: CollisionLabel,
    on_hit: Option<HitStatus>,
}

impl ContactCore {
    /// Creates the core; contacts are reported as `<type_id>:contact`.
    #[must_use]
    pub fn new(type_id: &str, on_hit: Option<HitStatus>) -> Self {
        Self {
            label: CollisionLabel::namespaced(type_id, "contact"),
            on_hit,
        }
    }

    /// The contact label.
    #[must_use]
    pub fn label(&self) -> &CollisionLabel {
        &self.label
    }

    /// Handler entry for `kind`.
    #[must_use]
    pub fn handler(&self, kind: BehaviorKind) -> CollisionHandler {
        CollisionHandler::new(self.label.clone(), kind)
    }

    /// Makes the bound entity report contacts with the player.
    pub fn attach(&self, ctx: &mut AbilityContext<'_>) {
        if let Some(entity) = ctx.world.entity_mut(ctx.entity) {
            entity.contact = Some(ContactSpec {
                label: self.label.clone(),
                hits: EntityTag::Player,
            });
        }
    }

    /// Walks toward the player.
    pub fn chase(&self, ctx: &mut AbilityContext<'_>, speed_factor: f32) {
        steer_toward_player(ctx.world, ctx.entity, speed_factor);
    }

    /// Hurts the player with the entity's contact damage.
    pub fn strike(&self, ctx: &mut AbilityContext<'_>, contact: &Contact) {
        if contact.source != ctx.entity || Some(contact.target) != ctx.world.player() {
            return;
        }
        let Some(damage) = ctx
            .world
            .entity(ctx.entity)
            .and_then(|e| e.vitals)
            .map(|v| v.contact_damage)
        else {
            return;
        };
        if damage > 0.0 {
            ctx.world
                .apply_damage_to_player(ctx.entity, damage, self.on_hit);
        }
    }
}

// =============================================================================
// Chaser
// =============================================================================

/// Chaser tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaserTuning {
    /// Multiplier on the entity's speed.
    pub speed_factor: f32,
    /// Status applied to the player on a landed hit.
    pub on_hit: Option<HitStatus>,
}

impl Default for ChaserTuning {
    fn default() -> Self {
        Self {
            speed_factor: 1.0,
            on_hit: None,
        }
    }
}

/// Plain chaser behavior.
#[derive(Debug, Clone)]
pub struct ChaserBehavior {
    core: ContactCore,
    tuning: ChaserTuning,
}

impl ChaserBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(type_id: &str, tuning: ChaserTuning) -> Self {
        Self {
            core: ContactCore::new(type_id, tuning.on_hit),
            tuning,
        }
    }
}

impl Behavior for ChaserBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Chaser
    }

    fn collision_handlers(&self) -> Vec<CollisionHandler> {
        vec![self.core.handler(self.kind())]
    }

    fn setup_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.core.attach(ctx);
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.core.chase(ctx, self.tuning.speed_factor);
    }

    fn on_collision(&mut self, ctx: &mut AbilityContext<'_>, contact: &Contact) {
        self.core.strike(ctx, contact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorHost;
    use crate::entity::{EntitySpec, Vitals};
    use crate::output::{Modifier, Output};
    use crate::stats::{BaseStats, DerivedStats, ModifierSet, StatEngine};
    use crate::status::StatusKind;
    use crate::world::{World, WorldContext};
    use glam::Vec2;

    fn stats() -> DerivedStats {
        StatEngine::compute(&BaseStats::new(10.0, 100.0), &ModifierSet::new(), None, true)
    }

    fn viper(world: &mut World) -> (BehaviorHost, crate::entity::EntityId) {
        let mut vitals = Vitals::new(3.0, 60.0);
        vitals.contact_damage = 2.0;
        let enemy = world.spawn(
            EntitySpec::new(EntityTag::Enemy, Vec2::new(30.0, 0.0)).with_vitals(vitals),
        );
        let tuning = ChaserTuning {
            on_hit: Some(HitStatus::new(StatusKind::Poison, 3000.0)),
            ..ChaserTuning::default()
        };
        let host = BehaviorHost::new(enemy, "viper", Box::new(ChaserBehavior::new("viper", tuning)));
        (host, enemy)
    }

    #[test]
    fn setup_attaches_contact_label() {
        let mut world = World::new(1);
        let (mut host, enemy) = viper(&mut world);
        host.setup(&mut world, &stats());

        let contact = world.entity(enemy).unwrap().contact.clone().unwrap();
        assert_eq!(contact.label.as_str(), "viper:contact");
        assert_eq!(contact.hits, EntityTag::Player);
        assert_eq!(host.collision_handlers()[0].label, contact.label);
    }

    #[test]
    fn touching_player_queues_damage_with_status() {
        let mut world = World::new(1);
        let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO));
        world.set_player(Some(player));
        let (mut host, enemy) = viper(&mut world);
        let stats = stats();
        host.setup(&mut world, &stats);

        let contact = Contact::new(CollisionLabel::from_static("viper:contact"), enemy, player);
        host.handle_collision(&mut world, &stats, &contact);

        let outputs = world.drain_outputs();
        assert_eq!(outputs.len(), 1);
        assert_eq!(
            outputs[0].output(),
            &Output::Modifier(Modifier::DamagePlayer {
                source: enemy,
                amount: 2.0,
                status: Some(HitStatus::new(StatusKind::Poison, 3000.0)),
            })
        );
    }

    #[test]
    fn chases_the_player() {
        let mut world = World::new(1);
        let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO));
        world.set_player(Some(player));
        let (mut host, enemy) = viper(&mut world);
        let stats = stats();
        host.setup(&mut world, &stats);
        host.update(&mut world, &stats);
        assert_eq!(world.entity(enemy).unwrap().velocity(), Vec2::new(-60.0, 0.0));
    }
}

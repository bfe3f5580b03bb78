//! Combat resolver for damage, healing, player hits and despawns.
//!
//! The `CombatResolver` handles:
//! - `ApplyDamage`: offered to the target's behavior for interception
//!   (reflection), then subtracted; a kill awards experience and destroys
//!   the entity
//! - `ApplyHealing`: capped at max health, `Regenerated` only if health rose
//! - `DamagePlayer`: ignored while invincible, otherwise reduced by armor to
//!   `max(amount - armor, 1)`, opens the invincibility window and applies the
//!   hit's status
//! - `DirectPlayerDamage`: subtracted as is; no armor, no minimum, and the
//!   invincibility window is neither checked nor opened
//! - `Despawn`: cleanup and removal without experience
//!
//! # Example
//!
//! ```
//! use gauntlet_core::output::OutputKind;
//! use gauntlet_core::resolver::{CombatResolver, Resolver};
//!
//! let resolver = CombatResolver::new();
//! assert!(resolver.handles().contains(&OutputKind::Modifier));
//! assert!(resolver.handles().contains(&OutputKind::Command));
//! ```

use tracing::{debug, info, trace};

use crate::entity::{EntityId, EntityTag};
use crate::output::{Command, Event, HitStatus, Modifier, OutputEnvelope, OutputKind};
use crate::status::StatusKind;
use crate::world::WorldContext;

use super::{ResolveContext, Resolver};

/// Resolver for combat modifiers and lifecycle commands.
#[derive(Debug, Clone, Default)]
pub struct CombatResolver;

impl CombatResolver {
    /// Creates a new combat resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn apply_damage(ctx: &mut ResolveContext<'_>, source: EntityId, target: EntityId, amount: f32) {
        if !(amount > 0.0 && amount.is_finite()) {
            return;
        }
        let Some((tag, has_vitals)) = ctx
            .world
            .entity(target)
            .filter(|e| e.is_live())
            .map(|e| (e.tag(), e.vitals.is_some()))
        else {
            trace!(%target, "damage target gone");
            return;
        };
        if tag == EntityTag::Player {
            Self::damage_player(ctx, source, amount, None);
            return;
        }
        if !has_vitals {
            return;
        }

        let stats = ctx.stats();
        let amount = match ctx.behaviors.get_mut(&target) {
            Some(host) => host.intercept_damage(ctx.world, &stats, source, amount),
            None => amount,
        };

        let Some(vitals) = ctx
            .world
            .entity_mut(target)
            .and_then(|e| e.vitals.as_mut())
        else {
            return;
        };
        if !vitals.is_alive() {
            return;
        }
        vitals.health -= amount.max(0.0);
        let killed = !vitals.is_alive();
        if killed {
            vitals.health = 0.0;
        }
        let xp = vitals.xp_value;

        if amount > 0.0 {
            ctx.world.emit(
                Event::DamageDealt {
                    source,
                    target,
                    amount,
                }
                .into(),
            );
        }
        if killed {
            Self::kill(ctx, target, source, xp);
        }
    }

    fn kill(ctx: &mut ResolveContext<'_>, target: EntityId, killer: EntityId, xp: f32) {
        ctx.world.emit(
            Event::EntityKilled {
                entity: target,
                killer: Some(killer),
                xp,
            }
            .into(),
        );
        debug!(entity = %target, xp, "entity killed");

        let growth = ctx.config.experience_growth;
        if let Some(player) = ctx.player.as_deref_mut() {
            let before = player.progression.level;
            let gained = player.progression.add_experience(xp, growth);
            player.pending_upgrades += gained;
            for level in (before + 1)..=(before + gained) {
                ctx.world.emit(Event::LevelUp { level }.into());
            }
        }
        ctx.destroy(target);
    }

    fn apply_healing(ctx: &mut ResolveContext<'_>, target: EntityId, amount: f32) {
        if !(amount > 0.0 && amount.is_finite()) {
            return;
        }
        let is_player = ctx.player.as_deref().is_some_and(|p| p.entity == target);
        let gained = if is_player {
            let Some(player) = ctx.player.as_deref_mut() else {
                return;
            };
            let gained = player.restore_health(amount);
            if let Some(entity) = ctx.world.entity_mut(target) {
                player.mirror_onto(entity);
            }
            gained
        } else {
            let Some(vitals) = ctx
                .world
                .entity_mut(target)
                .filter(|e| e.is_live())
                .and_then(|e| e.vitals.as_mut())
            else {
                return;
            };
            let before = vitals.health;
            vitals.health = (before + amount).min(vitals.max_health);
            vitals.health - before
        };

        if gained > 0.0 {
            ctx.world.emit(
                Event::Regenerated {
                    entity: target,
                    amount: gained,
                }
                .into(),
            );
        }
    }

    fn damage_player(
        ctx: &mut ResolveContext<'_>,
        source: EntityId,
        amount: f32,
        status: Option<HitStatus>,
    ) {
        if !(amount > 0.0 && amount.is_finite()) {
            return;
        }
        let now = ctx.world.now();
        let wall_now = ctx.world.clock().wall_now();
        let invincibility = ctx.config.invincibility_ms;
        let fallback_duration = ctx.config.affliction_duration_ms;
        let Some(player) = ctx.player.as_deref_mut() else {
            return;
        };
        if player.is_defeated() {
            return;
        }
        if player.progression.is_invincible(now) {
            trace!(%source, "hit ignored during invincibility");
            return;
        }

        let dealt = player.lose_health((amount - player.derived.armor).max(1.0));
        player.progression.grant_invincibility(now, invincibility);
        let entity = player.entity;

        if let Some(hit) = status {
            let duration = if hit.duration_ms > 0.0 {
                hit.duration_ms
            } else {
                fallback_duration
            };
            player.afflict(hit.kind, duration, wall_now);
            if let Some(handle) = ctx.world.entity_mut(entity) {
                match hit.kind {
                    StatusKind::Stunned => handle.conditions.stun(now, duration),
                    StatusKind::Confused => handle.conditions.confuse(now, duration),
                    _ => {}
                }
            }
        }

        Self::settle_player_hit(ctx, source, dealt);
    }

    fn direct_damage_player(ctx: &mut ResolveContext<'_>, source: EntityId, amount: f32) {
        if !(amount > 0.0 && amount.is_finite()) {
            return;
        }
        let Some(player) = ctx.player.as_deref_mut() else {
            return;
        };
        if player.is_defeated() {
            return;
        }
        let dealt = player.lose_health(amount);
        Self::settle_player_hit(ctx, source, dealt);
    }

    /// Defeat check, entity mirror and `DamageDealt` after health was lost.
    fn settle_player_hit(ctx: &mut ResolveContext<'_>, source: EntityId, dealt: f32) {
        let now = ctx.world.now();
        let Some(player) = ctx.player.as_deref_mut() else {
            return;
        };
        let entity = player.entity;
        if player.derived.health <= 0.0 {
            player.defeated_at = Some(now);
            info!(character = %player.character_id, level = player.progression.level, "game over");
        }
        if let Some(handle) = ctx.world.entity_mut(entity) {
            player.mirror_onto(handle);
        }

        ctx.world.emit(
            Event::DamageDealt {
                source,
                target: entity,
                amount: dealt,
            }
            .into(),
        );
    }
}

impl Resolver for CombatResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Modifier, OutputKind::Command]
    }

    fn resolve(&mut self, outputs: &[&OutputEnvelope], ctx: &mut ResolveContext<'_>) {
        ctx.world.set_actor(None);
        for envelope in outputs {
            if let Some(modifier) = envelope.output().as_modifier() {
                match *modifier {
                    Modifier::ApplyDamage {
                        source,
                        target,
                        amount,
                    } => Self::apply_damage(ctx, source, target, amount),
                    Modifier::ApplyHealing { target, amount } => {
                        Self::apply_healing(ctx, target, amount);
                    }
                    Modifier::DamagePlayer {
                        source,
                        amount,
                        status,
                    } => Self::damage_player(ctx, source, amount, status),
                    Modifier::DirectPlayerDamage { source, amount } => {
                        Self::direct_damage_player(ctx, source, amount);
                    }
                }
            } else if let Some(Command::Despawn { target }) = envelope.output().as_command() {
                let is_player = ctx.player.as_deref().is_some_and(|p| p.entity == *target);
                if !is_player {
                    ctx.destroy(*target);
                }
            }
        }
    }
}

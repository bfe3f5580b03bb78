//! # Gauntlet Core
//!
//! Ability and combat resolution core for an arena-survival game.
//!
//! The crate owns everything that decides *what happens* in a run: stat
//! derivation, status effects, per-entity ability lifecycles, enemy and
//! character catalogs, collision routing, damage and progression. Rendering,
//! input and audio stay with the host, which feeds wall timestamps and
//! player intent into a [`CombatSession`] and reads back HUD snapshots and
//! events.
//!
//! ## Architecture
//!
//! - **Entities**: player, enemies, projectiles, hazards and effects in an
//!   [`Arena`]
//! - **Behaviors**: one [`BehaviorHost`] per entity wrapping an ability
//!   variant and its [`AbilityRuntime`] (timers, owned entities, state)
//! - **Resolvers**: queued damage, healing and despawns applied after each
//!   phase, never re-entrantly
//!
//! ## Usage
//!
//! ```
//! use gauntlet_core::{CombatSession, SessionConfig};
//! use glam::Vec2;
//!
//! let mut session = CombatSession::with_defaults(SessionConfig::with_seed(7));
//! session.select_character("ranger")?;
//! session.spawn_enemy("grunt", Vec2::new(200.0, 0.0))?;
//!
//! session.move_player(Vec2::X);
//! session.step(16.0);
//!
//! let hud = session.hud().expect("character selected");
//! assert_eq!(hud.level, 1);
//! # Ok::<(), gauntlet_core::CoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod abilities;
pub mod arena;
pub mod behavior;
pub mod catalog;
pub mod clock;
pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod liveness;
pub mod output;
pub mod player;
pub mod progression;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod status;
pub mod upgrades;
pub mod world;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use arena::{Arena, Bounds};
pub use behavior::{Behavior, BehaviorClass, BehaviorHost, BehaviorKind};
pub use clock::GameClock;
pub use collision::{CollisionDispatcher, CollisionHandler, CollisionLabel, Contact, Dispatch};
pub use config::SessionConfig;
pub use entity::{Entity, EntityId, EntitySpec, EntityTag};
pub use error::{CoreError, PhysicsError, Result};
pub use output::{Command, Event, Modifier, Output, OutputEnvelope, OutputKind};
pub use player::{HudSnapshot, PlayerState};
pub use progression::ProgressionRecord;
pub use registry::{EntityDescriptor, EntityRegistry};
pub use runtime::{AbilityRuntime, LifecyclePhase};
pub use session::CombatSession;
pub use stats::{BaseStats, DerivedStats, ModifierSet, StatEngine, StatKey};
pub use status::{StatusEffect, StatusEffectTracker, StatusKind};
pub use upgrades::{Upgrade, UpgradeCatalog, UpgradeEffect};
pub use world::{World, WorldContext};

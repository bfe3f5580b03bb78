//! Outputs proposed by behaviors and resolved at the end of a phase.
//!
//! Behaviors never write health directly. They emit outputs through the
//! [`WorldContext`](crate::world::WorldContext) and the resolvers apply them:
//! - [`Command`]: lifecycle requests (forced despawn)
//! - [`Modifier`]: value changes (damage, healing, player hits)
//! - [`Event`]: notifications for the HUD and telemetry
//!
//! Every output is wrapped in an [`OutputEnvelope`] recording the acting
//! entity, the tick and a per-tick sequence number.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::entity::EntityId;
//! use gauntlet_core::output::{Modifier, Output, OutputEnvelope, OutputKind};
//!
//! let output = Output::Modifier(Modifier::ApplyDamage {
//!     source: EntityId::new(1),
//!     target: EntityId::new(2),
//!     amount: 3.0,
//! });
//!
//! let envelope = OutputEnvelope::new(output, Some(EntityId::new(1)), 12, 0);
//! assert_eq!(envelope.kind(), OutputKind::Modifier);
//! assert_eq!(envelope.tick(), 12);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::EntityId;
use crate::status::StatusKind;

// =============================================================================
// Payload Types
// =============================================================================

/// A status applied to the player when a hit lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitStatus {
    /// Status to apply.
    pub kind: StatusKind,
    /// Duration in milliseconds.
    pub duration_ms: f64,
}

impl HitStatus {
    /// Creates a hit status.
    #[must_use]
    pub const fn new(kind: StatusKind, duration_ms: f64) -> Self {
        Self { kind, duration_ms }
    }
}

/// Cosmetic effect categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Aura pulse ring
    Pulse,
    /// Projectile or star impact
    Impact,
    /// Self-destruct blast
    Explosion,
    /// Healing sparkle
    Heal,
    /// Countdown warning
    Warning,
    /// Reflection shield shattered
    ShieldBreak,
    /// Boss phase change
    Enrage,
}

/// A cosmetic effect requested by a behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualEffect {
    /// Effect category
    pub kind: EffectKind,
    /// World position
    pub position: Vec2,
    /// Display radius
    pub radius: f32,
}

impl VisualEffect {
    /// Creates an effect.
    #[must_use]
    pub const fn new(kind: EffectKind, position: Vec2, radius: f32) -> Self {
        Self {
            kind,
            position,
            radius,
        }
    }
}

// =============================================================================
// Output Categories
// =============================================================================

/// Lifecycle requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Remove an entity without awarding experience.
    Despawn {
        /// Entity to remove
        target: EntityId,
    },
}

impl Command {
    /// Returns the target entity.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        match self {
            Self::Despawn { target } => *target,
        }
    }
}

/// Value changes applied by the combat resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// Damage a non-player entity.
    ApplyDamage {
        /// Entity credited with the damage
        source: EntityId,
        /// Entity to damage
        target: EntityId,
        /// Damage amount (positive)
        amount: f32,
    },
    /// Heal a non-player entity, capped at max health.
    ApplyHealing {
        /// Entity to heal
        target: EntityId,
        /// Healing amount (positive)
        amount: f32,
    },
    /// Damage the player, subject to armor and the invincibility window.
    DamagePlayer {
        /// Entity credited with the damage
        source: EntityId,
        /// Raw damage before armor
        amount: f32,
        /// Status applied if the hit is accepted
        status: Option<HitStatus>,
    },
    /// Damage the player by exactly `amount`.
    ///
    /// Area falloff and reflection use this: armor, the minimum of 1 and the
    /// invincibility window would distort the scaled value.
    DirectPlayerDamage {
        /// Entity credited with the damage
        source: EntityId,
        /// Damage amount, applied as is
        amount: f32,
    },
}

impl Modifier {
    /// Returns the target entity, or `None` for player damage.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        match self {
            Self::ApplyDamage { target, .. } | Self::ApplyHealing { target, .. } => Some(*target),
            Self::DamagePlayer { .. } | Self::DirectPlayerDamage { .. } => None,
        }
    }
}

/// Notifications of things that happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Damage was applied.
    DamageDealt {
        /// Entity credited with the damage
        source: EntityId,
        /// Entity that received it
        target: EntityId,
        /// Amount after armor and reflection
        amount: f32,
    },
    /// An entity died from damage.
    EntityKilled {
        /// Entity that died
        entity: EntityId,
        /// Entity credited with the kill
        killer: Option<EntityId>,
        /// Experience awarded
        xp: f32,
    },
    /// An entity regained health.
    Regenerated {
        /// Healed entity
        entity: EntityId,
        /// Health actually restored
        amount: f32,
    },
    /// Incoming damage was partially sent back to its source.
    Reflected {
        /// Reflecting entity
        entity: EntityId,
        /// Entity hit by the reflection
        target: EntityId,
        /// Reflected amount
        amount: f32,
    },
    /// A reflection shield ran out.
    ShieldBroken {
        /// Entity that became vulnerable
        entity: EntityId,
    },
    /// A delayed self-destruct went off.
    Exploded {
        /// Exploding entity
        entity: EntityId,
        /// Blast center
        position: Vec2,
        /// Blast radius
        radius: f32,
    },
    /// A boss entered its enraged phase.
    Enraged {
        /// Boss entity
        entity: EntityId,
    },
    /// The player reached a new level.
    LevelUp {
        /// Level reached
        level: u32,
    },
    /// A cosmetic effect was requested.
    VisualEffect(VisualEffect),
}

impl Event {
    /// Returns the primary entity involved in this event, if any.
    #[must_use]
    pub const fn primary_entity(&self) -> Option<EntityId> {
        match self {
            Self::DamageDealt { target, .. } => Some(*target),
            Self::EntityKilled { entity, .. }
            | Self::Regenerated { entity, .. }
            | Self::Reflected { entity, .. }
            | Self::ShieldBroken { entity }
            | Self::Exploded { entity, .. }
            | Self::Enraged { entity } => Some(*entity),
            Self::LevelUp { .. } | Self::VisualEffect(_) => None,
        }
    }
}

// =============================================================================
// Top-Level Output Enum
// =============================================================================

/// Output kind for resolver routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// Command outputs
    Command,
    /// Modifier outputs
    Modifier,
    /// Event outputs
    Event,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "Command"),
            Self::Modifier => write!(f, "Modifier"),
            Self::Event => write!(f, "Event"),
        }
    }
}

/// A proposal or notification emitted during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// A command output
    Command(Command),
    /// A modifier output
    Modifier(Modifier),
    /// An event output
    Event(Event),
}

impl Output {
    /// Returns the kind of this output for resolver routing.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        match self {
            Self::Command(_) => OutputKind::Command,
            Self::Modifier(_) => OutputKind::Modifier,
            Self::Event(_) => OutputKind::Event,
        }
    }

    /// Returns the command if this is a command output.
    #[must_use]
    pub const fn as_command(&self) -> Option<&Command> {
        match self {
            Self::Command(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// Returns the modifier if this is a modifier output.
    #[must_use]
    pub const fn as_modifier(&self) -> Option<&Modifier> {
        match self {
            Self::Modifier(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the event if this is an event output.
    #[must_use]
    pub const fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Command> for Output {
    fn from(cmd: Command) -> Self {
        Self::Command(cmd)
    }
}

impl From<Modifier> for Output {
    fn from(m: Modifier) -> Self {
        Self::Modifier(m)
    }
}

impl From<Event> for Output {
    fn from(e: Event) -> Self {
        Self::Event(e)
    }
}

// =============================================================================
// Output Envelope
// =============================================================================

/// An output with its emission metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEnvelope {
    output: Output,
    /// Entity whose behavior was running when the output was emitted.
    actor: Option<EntityId>,
    tick: u64,
    /// Emission order within the tick.
    sequence: u32,
}

impl OutputEnvelope {
    /// Creates an envelope.
    #[must_use]
    pub fn new(output: Output, actor: Option<EntityId>, tick: u64, sequence: u32) -> Self {
        Self {
            output,
            actor,
            tick,
            sequence,
        }
    }

    /// Returns the wrapped output.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Consumes the envelope and returns the wrapped output.
    #[must_use]
    pub fn into_output(self) -> Output {
        self.output
    }

    /// Returns the acting entity.
    #[must_use]
    pub const fn actor(&self) -> Option<EntityId> {
        self.actor
    }

    /// Returns the tick when this output was emitted.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns the sequence number within the tick.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns the kind of the wrapped output.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        self.output.kind()
    }
}

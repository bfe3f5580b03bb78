//! Error types for the combat core.
//!
//! Only configuration mistakes surface as errors: an unknown entity id, a
//! misspelled modifier key, a descriptor that is missing required data. Those
//! are static data or programming bugs and fail loudly at the call site.
//!
//! Transient liveness failures (an entity destroyed mid-operation, a
//! non-finite position, a missing target) are not errors. They are modelled
//! as `Option::None` by [`crate::liveness`] and abort only the current
//! operation.

use thiserror::Error;

/// Errors raised by registry, stat and configuration operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// No descriptor is registered under the requested id.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// A stat modifier key does not name any known stat.
    #[error("unknown modifier key: {0}")]
    UnknownModifier(String),

    /// A known modifier key was used in a way the stat does not support.
    #[error("invalid modifier for {key}: {reason}")]
    InvalidModifier {
        /// The stat key that was targeted
        key: String,
        /// Why the modification was rejected
        reason: String,
    },

    /// A descriptor could not be parsed or failed validation.
    #[error("invalid entity descriptor: {0}")]
    InvalidDescriptor(String),

    /// Session configuration could not be parsed or failed validation.
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    /// No upgrade with the requested id is offered to the active character.
    #[error("unknown upgrade: {0}")]
    UnknownUpgrade(String),

    /// The operation requires a selected character.
    #[error("no character has been selected")]
    NoActiveCharacter,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Failure reported by the physics collaborator when applying a velocity.
///
/// Callers catch and swallow these: the gameplay effect that triggered the
/// knockback (damage, status) still applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhysicsError {
    /// The entity no longer exists.
    #[error("entity {0} has no live physics body")]
    NoBody(u64),

    /// The requested velocity contained NaN or infinite components.
    #[error("non-finite velocity for entity {0}")]
    NonFinite(u64),
}

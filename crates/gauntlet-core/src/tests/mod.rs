//! Crate-level tests that drive a full [`CombatSession`].
//!
//! Unit tests live next to the code they cover; this module exercises the
//! whole tick loop:
//!
//! - **Determinism tests**: same seed and inputs give identical runs
//! - **Integration tests**: spawning, combat, progression and pause end-to-end
//! - **Scenario tests**: behavior the game relies on, checked through the
//!   public session API
//!
//! # Test Structure
//!
//! - `determinism.rs`: replay checks
//! - `integration.rs`: end-to-end tick loop tests
//! - `scenarios.rs`: gameplay rules checked through the session
//! - `helpers.rs`: session setup and frame stepping
//!
//! [`CombatSession`]: crate::session::CombatSession

mod helpers;
mod integration;
mod scenarios;

// Re-export for convenience
pub use helpers::*;

//! Session configuration.
//!
//! Every field has a default, so a JSON document only needs the values it
//! overrides:
//!
//! ```
//! use gauntlet_core::config::SessionConfig;
//!
//! let config = SessionConfig::from_json_str(r#"{"seed": 7, "invincibility_ms": 800}"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.invincibility_ms, 800.0);
//! assert_eq!(config.experience_growth, 1.5);
//!
//! assert!(SessionConfig::from_json_str(r#"{"experience_growth": 1.0}"#).is_err());
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::arena::Bounds;
use crate::error::{CoreError, Result};

/// Tunables for a [`crate::session::CombatSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// World RNG seed
    pub seed: u64,
    /// Playfield rectangle
    pub bounds: Bounds,
    /// Invincibility after an accepted hit (ms)
    pub invincibility_ms: f64,
    /// Interval between player regeneration ticks (ms)
    pub regen_interval_ms: f64,
    /// Interval between poison/bleed damage ticks (ms)
    pub affliction_tick_ms: f64,
    /// Damage per affliction tick
    pub affliction_damage: f32,
    /// Affliction duration when a hit carries none (ms)
    pub affliction_duration_ms: f64,
    /// Experience needed for level 2
    pub base_experience: f32,
    /// Growth of the requirement per level
    pub experience_growth: f32,
    /// Enemy health growth per player level
    pub health_scaling_per_level: f32,
    /// Longest frame integrated in one step (ms)
    pub max_frame_ms: f64,
    /// Vertical spacing between status indicators
    pub status_spacing: f32,
    /// Upgrades offered per level-up
    pub upgrade_choices: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            bounds: Bounds::default(),
            invincibility_ms: 500.0,
            regen_interval_ms: 5000.0,
            affliction_tick_ms: 1000.0,
            affliction_damage: 1.0,
            affliction_duration_ms: 3000.0,
            base_experience: 10.0,
            experience_growth: 1.5,
            health_scaling_per_level: 0.2,
            max_frame_ms: 100.0,
            status_spacing: 18.0,
            upgrade_choices: 3,
        }
    }
}

impl SessionConfig {
    /// Default config with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Default config with the given arena size.
    #[must_use]
    pub fn with_bounds(width: f32, height: f32) -> Self {
        Self {
            bounds: Bounds::new(width, height),
            ..Default::default()
        }
    }

    /// Parses and validates a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for malformed JSON or values
    /// rejected by [`SessionConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| {
            warn!(%err, "rejected session config");
            CoreError::InvalidConfig(err.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks intervals, growth and bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("regen_interval_ms", self.regen_interval_ms),
            ("affliction_tick_ms", self.affliction_tick_ms),
            ("max_frame_ms", self.max_frame_ms),
            ("base_experience", f64::from(self.base_experience)),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(reject(format!("{field} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("invincibility_ms", self.invincibility_ms),
            ("affliction_duration_ms", self.affliction_duration_ms),
            ("affliction_damage", f64::from(self.affliction_damage)),
            ("health_scaling_per_level", f64::from(self.health_scaling_per_level)),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(reject(format!("{field} must be non-negative, got {value}")));
            }
        }

        if !(self.experience_growth > 1.0 && self.experience_growth.is_finite()) {
            return Err(reject(format!(
                "experience_growth must exceed 1, got {}",
                self.experience_growth
            )));
        }
        if !self.bounds.is_valid() {
            return Err(reject("bounds must have positive area".to_string()));
        }
        Ok(())
    }
}

fn reject(reason: String) -> CoreError {
    warn!(%reason, "rejected session config");
    CoreError::InvalidConfig(reason)
}

//! Player progression: level, experience, invincibility window and the
//! affliction flags that gate regeneration.
//!
//! Experience needed for the next level grows geometrically: each level-up
//! multiplies the requirement by the growth factor (1.5 by default). The
//! requirement is kept unrounded.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::progression::ProgressionRecord;
//!
//! let mut record = ProgressionRecord::new(10.0);
//! assert_eq!(record.add_experience(25.0, 1.5), 1);
//! assert_eq!(record.level, 2);
//! assert_eq!(record.experience, 15.0);
//! assert_eq!(record.to_next, 15.0);
//! ```

use serde::{Deserialize, Serialize};

/// Level and experience state of the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    /// Current level, starting at 1
    pub level: u32,
    /// Experience accumulated toward the next level
    pub experience: f32,
    /// Experience required for the next level
    pub to_next: f32,
    /// End of the invincibility window (simulation ms)
    pub invincible_until: f64,
    /// Poison is active
    pub poisoned: bool,
    /// Bleed is active
    pub bleeding: bool,
}

impl ProgressionRecord {
    /// Level 1 record needing `base_experience` for level 2.
    #[must_use]
    pub fn new(base_experience: f32) -> Self {
        Self {
            level: 1,
            experience: 0.0,
            to_next: base_experience,
            invincible_until: 0.0,
            poisoned: false,
            bleeding: false,
        }
    }

    /// Adds experience and returns how many levels were gained.
    ///
    /// Several level-ups can happen at once when `xp` is large.
    pub fn add_experience(&mut self, xp: f32, growth: f32) -> u32 {
        if !(xp > 0.0) {
            return 0;
        }
        self.experience += xp;
        let mut gained = 0;
        while self.to_next > 0.0 && self.experience >= self.to_next {
            self.experience -= self.to_next;
            self.to_next *= growth;
            self.level += 1;
            gained += 1;
        }
        gained
    }

    /// Whether hits are ignored at `now`.
    #[must_use]
    pub fn is_invincible(&self, now: f64) -> bool {
        now < self.invincible_until
    }

    /// Opens (or extends) the invincibility window.
    pub fn grant_invincibility(&mut self, now: f64, duration_ms: f64) {
        self.invincible_until = self.invincible_until.max(now + duration_ms);
    }

    /// Regeneration is blocked while poisoned or bleeding.
    #[must_use]
    pub fn can_regenerate(&self) -> bool {
        !self.poisoned && !self.bleeding
    }

    /// Fraction of the way to the next level.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.to_next > 0.0 {
            (self.experience / self.to_next).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for ProgressionRecord {
    fn default() -> Self {
        Self::new(10.0)
    }
}

//! Timed status effects with pause-aware countdowns.
//!
//! A [`StatusEffectTracker`] holds the effects attached to one target
//! (usually the player). Each effect remembers when it started and how much
//! paused time it has accumulated, so
//!
//! ```text
//! effective_elapsed = (now - started) - paused_time
//! ```
//!
//! and the effect expires once `effective_elapsed >= duration`. Durations of
//! zero or less mean "until removed".
//!
//! The tracker works on wall timestamps and keeps its own pause accounting:
//! `update(now, paused)` notices pause transitions and, on resume, credits the
//! finished pause span to every active effect.
//!
//! # Stacking
//!
//! Effects are kept sorted by ascending priority (ties keep insertion order).
//! The index in that order is the effect's slot; slot 0 draws closest to the
//! target. The tracker permits several effects of the same kind; callers that
//! want a single instance call [`StatusEffectTracker::remove_all_of_type`]
//! before [`StatusEffectTracker::add`].
//!
//! # Example
//!
//! ```
//! use gauntlet_core::status::{StatusEffectTracker, StatusKind, StatusVisual};
//! use glam::Vec2;
//!
//! let mut tracker = StatusEffectTracker::new(18.0);
//! tracker.add(StatusKind::Poison, 1000.0, StatusVisual::new(1), 0.0);
//!
//! // Paused between 500 and 2500.
//! tracker.update(500.0, false, Vec2::ZERO);
//! tracker.update(500.0, true, Vec2::ZERO);
//! tracker.update(2500.0, false, Vec2::ZERO);
//! assert!(tracker.has(StatusKind::Poison));
//!
//! let expired = tracker.update(3000.0, false, Vec2::ZERO);
//! assert_eq!(expired.len(), 1);
//! assert!(!tracker.has(StatusKind::Poison));
//! ```

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

// =============================================================================
// Types
// =============================================================================

/// Kinds of status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Periodic damage; blocks regeneration.
    Poison,
    /// Periodic damage; blocks regeneration.
    Bleed,
    /// Cannot move.
    Stunned,
    /// Movement reversed.
    Confused,
    /// Movement slowed.
    Slowed,
    /// Temporary damage immunity.
    Shielded,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Poison => "poison",
            Self::Bleed => "bleed",
            Self::Stunned => "stunned",
            Self::Confused => "confused",
            Self::Slowed => "slowed",
            Self::Shielded => "shielded",
        };
        write!(f, "{name}")
    }
}

/// Unique id of one effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(u64);

impl EffectId {
    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Display configuration for an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusVisual {
    /// Lower numbers draw closer to the target.
    pub priority: i32,
    /// Indicator tint as `0xRRGGBB`.
    pub tint: u32,
}

impl StatusVisual {
    /// Creates a visual with a white tint.
    #[must_use]
    pub const fn new(priority: i32) -> Self {
        Self {
            priority,
            tint: 0x00FF_FFFF,
        }
    }

    /// Sets the tint.
    #[must_use]
    pub const fn with_tint(mut self, tint: u32) -> Self {
        self.tint = tint;
        self
    }
}

/// One active effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    id: EffectId,
    kind: StatusKind,
    visual: StatusVisual,
    started: f64,
    duration: f64,
    paused_time: f64,
    slot: usize,
    offset: Vec2,
}

impl StatusEffect {
    /// Instance id.
    #[must_use]
    pub const fn id(&self) -> EffectId {
        self.id
    }

    /// Effect kind.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        self.kind
    }

    /// Stacking priority.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.visual.priority
    }

    /// Display configuration.
    #[must_use]
    pub const fn visual(&self) -> StatusVisual {
        self.visual
    }

    /// Nominal duration in milliseconds.
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    /// Paused time credited so far.
    #[must_use]
    pub const fn paused_time(&self) -> f64 {
        self.paused_time
    }

    /// Position in the priority order.
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Indicator position computed by the last running update.
    #[must_use]
    pub const fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Returns `true` for effects that never expire on their own.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.duration <= 0.0
    }

    /// Elapsed time excluding credited pauses.
    #[must_use]
    pub fn effective_elapsed(&self, now: f64) -> f64 {
        (now - self.started) - self.paused_time
    }

    /// Remaining time, or `None` for persistent effects.
    #[must_use]
    pub fn remaining(&self, now: f64) -> Option<f64> {
        (!self.is_persistent()).then(|| (self.duration - self.effective_elapsed(now)).max(0.0))
    }

    fn is_expired(&self, now: f64) -> bool {
        !self.is_persistent() && self.effective_elapsed(now) >= self.duration
    }
}

// =============================================================================
// Tracker
// =============================================================================

/// Effects attached to one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectTracker {
    effects: Vec<StatusEffect>,
    next_id: u64,
    /// Last timestamp seen by `add` or `update`.
    last_now: f64,
    paused: bool,
    pause_started: Option<f64>,
    /// Vertical distance between stacked indicators.
    spacing: f32,
}

impl StatusEffectTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new(spacing: f32) -> Self {
        Self {
            effects: Vec::new(),
            next_id: 0,
            last_now: 0.0,
            paused: false,
            pause_started: None,
            spacing,
        }
    }

    /// Attaches an effect starting at `now`.
    pub fn add(
        &mut self,
        kind: StatusKind,
        duration: f64,
        visual: StatusVisual,
        now: f64,
    ) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        self.last_now = self.last_now.max(now);

        self.effects.push(StatusEffect {
            id,
            kind,
            visual,
            started: now,
            duration,
            paused_time: 0.0,
            slot: 0,
            offset: Vec2::ZERO,
        });
        self.restack();
        trace!(%kind, duration, "status added");
        id
    }

    /// Removes one effect. Returns `false` if it was not present.
    pub fn remove(&mut self, id: EffectId) -> bool {
        let before = self.effects.len();
        self.effects.retain(|effect| effect.id != id);
        let removed = self.effects.len() != before;
        if removed {
            self.restack();
        }
        removed
    }

    /// Removes every effect of `kind`. Returns how many were removed.
    pub fn remove_all_of_type(&mut self, kind: StatusKind) -> usize {
        let before = self.effects.len();
        self.effects.retain(|effect| effect.kind != kind);
        let removed = before - self.effects.len();
        if removed > 0 {
            self.restack();
        }
        removed
    }

    /// Returns `true` if any effect of `kind` is attached.
    #[must_use]
    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|effect| effect.kind == kind)
    }

    /// Attached effects in slot order.
    #[must_use]
    pub fn effects(&self) -> &[StatusEffect] {
        &self.effects
    }

    /// Number of attached effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns `true` if no effects are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Whether the tracker currently considers the game paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advances the tracker.
    ///
    /// Pause transitions are recorded first. While paused nothing expires
    /// and indicator positions are left untouched. Otherwise expired effects
    /// are removed and returned, and the remaining indicators are stacked
    /// above `anchor`.
    pub fn update(&mut self, now: f64, paused: bool, anchor: Vec2) -> Vec<StatusEffect> {
        if now.is_finite() {
            self.last_now = self.last_now.max(now);
        }
        let now = self.last_now;

        match (self.paused, paused) {
            (false, true) => {
                self.pause_started = Some(now);
            }
            (true, false) => {
                if let Some(started) = self.pause_started.take() {
                    for effect in &mut self.effects {
                        // Effects added mid-pause only owe the part after they started.
                        let span = now - started.max(effect.started);
                        if span > 0.0 {
                            effect.paused_time += span;
                        }
                    }
                }
            }
            _ => {}
        }
        self.paused = paused;

        if paused {
            return Vec::new();
        }

        let (expired, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|effect| effect.is_expired(now));
        self.effects = active;

        if !expired.is_empty() {
            self.restack();
        }
        self.position(anchor);
        expired
    }

    /// Re-sorts by priority and reassigns slots.
    fn restack(&mut self) {
        self.effects.sort_by_key(|effect| effect.visual.priority);
        for (slot, effect) in self.effects.iter_mut().enumerate() {
            effect.slot = slot;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn position(&mut self, anchor: Vec2) {
        for effect in &mut self.effects {
            effect.offset = anchor - Vec2::new(0.0, self.spacing * (effect.slot as f32 + 1.0));
        }
    }
}

impl Default for StatusEffectTracker {
    fn default() -> Self {
        Self::new(18.0)
    }
}

//! Pause-aware simulation clock.
//!
//! Every timer, cooldown and lifespan in the core reads [`GameClock::now`],
//! which is wall time with all pause spans subtracted. A subsystem that
//! caches raw wall time and subtracts it later would leak the paused
//! interval into its countdown; reading simulation time instead freezes
//! everything while the game is paused.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::clock::GameClock;
//!
//! let mut clock = GameClock::new(0.0);
//! clock.update(500.0, false);
//! assert_eq!(clock.now(), 500.0);
//!
//! // Paused for two seconds of wall time.
//! clock.update(600.0, true);
//! clock.update(2600.0, true);
//! assert_eq!(clock.now(), 600.0);
//!
//! clock.update(2600.0, false);
//! clock.update(2700.0, false);
//! assert_eq!(clock.now(), 700.0);
//! ```

use serde::{Deserialize, Serialize};

/// Simulation clock that excludes paused wall time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameClock {
    /// Wall timestamp at which the clock was created.
    origin: f64,
    /// Latest wall timestamp seen.
    wall_now: f64,
    /// Whether the clock is currently paused.
    paused: bool,
    /// Wall timestamp at which the current pause began.
    pause_started: Option<f64>,
    /// Total wall time spent in completed pauses.
    paused_total: f64,
}

impl GameClock {
    /// Creates a running clock anchored at `wall_start`.
    #[must_use]
    pub fn new(wall_start: f64) -> Self {
        Self {
            origin: wall_start,
            wall_now: wall_start,
            paused: false,
            pause_started: None,
            paused_total: 0.0,
        }
    }

    /// Feeds the latest wall timestamp and pause flag.
    ///
    /// A false→true transition records the pause start; a true→false
    /// transition folds the finished pause span into the paused total.
    /// Timestamps earlier than the last one seen are ignored.
    pub fn update(&mut self, wall_now: f64, paused: bool) {
        if wall_now.is_finite() && wall_now > self.wall_now {
            self.wall_now = wall_now;
        }

        match (self.paused, paused) {
            (false, true) => {
                self.pause_started = Some(self.wall_now);
            }
            (true, false) => {
                if let Some(started) = self.pause_started.take() {
                    self.paused_total += self.wall_now - started;
                }
            }
            _ => {}
        }
        self.paused = paused;
    }

    /// Current simulation time in milliseconds since the clock origin.
    #[must_use]
    pub fn now(&self) -> f64 {
        let open_pause = self
            .pause_started
            .map_or(0.0, |started| self.wall_now - started);
        self.wall_now - self.origin - self.paused_total - open_pause
    }

    /// Latest wall timestamp seen.
    #[must_use]
    pub fn wall_now(&self) -> f64 {
        self.wall_now
    }

    /// Whether the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Total paused wall time, including an in-progress pause.
    #[must_use]
    pub fn paused_total(&self) -> f64 {
        let open_pause = self
            .pause_started
            .map_or(0.0, |started| self.wall_now - started);
        self.paused_total + open_pause
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_clock_tracks_wall_time() {
        let mut clock = GameClock::new(1000.0);
        clock.update(1250.0, false);
        assert_eq!(clock.now(), 250.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn open_pause_freezes_time() {
        let mut clock = GameClock::new(0.0);
        clock.update(100.0, false);
        clock.update(200.0, true);
        clock.update(5000.0, true);
        assert_eq!(clock.now(), 200.0);
        assert_eq!(clock.paused_total(), 4800.0);
    }

    #[test]
    fn repeated_pauses_accumulate() {
        let mut clock = GameClock::new(0.0);
        clock.update(100.0, true);
        clock.update(300.0, false);
        clock.update(400.0, true);
        clock.update(500.0, false);
        clock.update(600.0, false);
        assert_eq!(clock.now(), 300.0);
    }

    #[test]
    fn backwards_timestamps_are_ignored() {
        let mut clock = GameClock::new(0.0);
        clock.update(500.0, false);
        clock.update(400.0, false);
        assert_eq!(clock.now(), 500.0);
    }

    #[test]
    fn non_finite_timestamps_are_ignored() {
        let mut clock = GameClock::new(0.0);
        clock.update(f64::NAN, false);
        clock.update(f64::INFINITY, false);
        assert_eq!(clock.now(), 0.0);
    }
}

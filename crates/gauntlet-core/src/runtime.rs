//! Per-entity ability runtime: owned object groups, named timers, and a
//! generic state store.
//!
//! Each live behavior owns one [`AbilityRuntime`]. Variants keep their
//! typed state in their own structs; the runtime holds what every variant
//! needs:
//!
//! - **Groups**: named lists of entities the behavior spawned and owns
//!   ("bolts", "puddles"). Cleanup despawns every member.
//! - **Timers**: named one-shot or repeating timers on simulation time.
//!   Behaviors poll [`AbilityRuntime::due_timers`] each update; because the
//!   deadlines are simulation timestamps, timers freeze while paused.
//! - **State**: a small key/value map for optional fields that do not
//!   deserve a struct member.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──activate──▶ Active ──cleanup──▶ CleanedUp
//!        └────────────────────cleanup────────────────▲
//! ```
//!
//! `cleanup` is idempotent and valid from any phase.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::runtime::{AbilityRuntime, LifecyclePhase};
//!
//! let mut runtime = AbilityRuntime::new();
//! runtime.activate();
//! runtime.start_repeating("pulse", 0.0, 500.0);
//!
//! assert!(runtime.due_timers(499.0).is_empty());
//! assert_eq!(runtime.due_timers(500.0), vec!["pulse"]);
//! assert!(runtime.due_timers(600.0).is_empty());
//! assert_eq!(runtime.phase(), LifecyclePhase::Active);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::entity::EntityId;
use crate::world::WorldContext;

// =============================================================================
// Lifecycle
// =============================================================================

/// Behavior lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// Created; `setup_ability` has not run.
    Uninitialized,
    /// Set up and receiving updates.
    Active,
    /// Torn down. Terminal.
    CleanedUp,
}

// =============================================================================
// Timers
// =============================================================================

/// How a timer re-arms after firing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerMode {
    /// Fires once and is removed.
    Once,
    /// Fires every `interval` milliseconds.
    Repeating {
        /// Interval in milliseconds
        interval: f64,
    },
}

/// A named timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    /// Simulation time of the next firing.
    pub due_at: f64,
    /// Re-arm behavior.
    pub mode: TimerMode,
}

// =============================================================================
// State Values
// =============================================================================

/// Value held in the generic state store.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    /// Scalar
    Number(f64),
    /// Boolean
    Flag(bool),
    /// Entity reference
    Entity(EntityId),
}

// =============================================================================
// Runtime
// =============================================================================

/// Mutable per-entity ability state.
#[derive(Debug, Clone)]
pub struct AbilityRuntime {
    phase: LifecyclePhase,
    groups: BTreeMap<&'static str, Vec<EntityId>>,
    timers: BTreeMap<&'static str, Timer>,
    state: BTreeMap<&'static str, StateValue>,
    sets: BTreeMap<&'static str, BTreeSet<EntityId>>,
}

impl AbilityRuntime {
    /// Creates an uninitialized runtime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: LifecyclePhase::Uninitialized,
            groups: BTreeMap::new(),
            timers: BTreeMap::new(),
            state: BTreeMap::new(),
            sets: BTreeMap::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Returns `true` while active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == LifecyclePhase::Active
    }

    /// Moves `Uninitialized` to `Active`. Returns `false` from any other phase.
    pub fn activate(&mut self) -> bool {
        if self.phase == LifecyclePhase::Uninitialized {
            self.phase = LifecyclePhase::Active;
            true
        } else {
            false
        }
    }

    // -------------------------------------------------------------------------
    // Groups
    // -------------------------------------------------------------------------

    /// Adds an entity to a group.
    pub fn add_to_group(&mut self, group: &'static str, id: EntityId) {
        self.groups.entry(group).or_default().push(id);
    }

    /// Members of a group (empty if the group does not exist).
    #[must_use]
    pub fn group(&self, group: &'static str) -> &[EntityId] {
        self.groups.get(group).map_or(&[], Vec::as_slice)
    }

    /// Removes an entity from a group. Returns `false` if it was not a member.
    pub fn remove_from_group(&mut self, group: &'static str, id: EntityId) -> bool {
        let Some(members) = self.groups.get_mut(group) else {
            return false;
        };
        let before = members.len();
        members.retain(|member| *member != id);
        members.len() != before
    }

    /// Drops group members that are no longer live; returns the dropped ids.
    pub fn prune_group(&mut self, group: &'static str, world: &dyn WorldContext) -> Vec<EntityId> {
        let Some(members) = self.groups.get_mut(group) else {
            return Vec::new();
        };
        let mut dropped = Vec::new();
        members.retain(|id| {
            let live = world.entity(*id).is_some_and(|e| e.is_live());
            if !live {
                dropped.push(*id);
            }
            live
        });
        dropped
    }

    /// Total number of owned entities across groups.
    #[must_use]
    pub fn owned_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// Arms a one-shot timer `delay` ms after `now`, replacing any timer of
    /// the same name.
    pub fn start_once(&mut self, name: &'static str, now: f64, delay: f64) {
        self.timers.insert(
            name,
            Timer {
                due_at: now + delay.max(0.0),
                mode: TimerMode::Once,
            },
        );
    }

    /// Arms a repeating timer whose first firing is `interval` ms after `now`.
    pub fn start_repeating(&mut self, name: &'static str, now: f64, interval: f64) {
        let interval = interval.max(1.0);
        self.timers.insert(
            name,
            Timer {
                due_at: now + interval,
                mode: TimerMode::Repeating { interval },
            },
        );
    }

    /// Changes a repeating timer's interval without resetting its deadline
    /// past the new interval.
    pub fn set_interval(&mut self, name: &'static str, now: f64, interval: f64) {
        let interval = interval.max(1.0);
        if let Some(timer) = self.timers.get_mut(name) {
            if let TimerMode::Repeating { interval: current } = timer.mode {
                if (current - interval).abs() > f64::EPSILON {
                    timer.mode = TimerMode::Repeating { interval };
                    timer.due_at = timer.due_at.min(now + interval);
                }
            }
        }
    }

    /// Returns `true` if a timer of that name is armed.
    #[must_use]
    pub fn has_timer(&self, name: &'static str) -> bool {
        self.timers.contains_key(name)
    }

    /// Returns the named timer.
    #[must_use]
    pub fn timer(&self, name: &'static str) -> Option<&Timer> {
        self.timers.get(name)
    }

    /// Disarms a timer. Returns `false` if none was armed.
    pub fn cancel_timer(&mut self, name: &'static str) -> bool {
        self.timers.remove(name).is_some()
    }

    /// Returns the names of timers due at `now`, re-arming repeating ones.
    ///
    /// A repeating timer fires at most once per call; if several intervals
    /// were missed it is re-armed relative to `now`.
    pub fn due_timers(&mut self, now: f64) -> Vec<&'static str> {
        if !self.is_active() {
            return Vec::new();
        }

        let mut fired = Vec::new();
        self.timers.retain(|name, timer| {
            if now < timer.due_at {
                return true;
            }
            fired.push(*name);
            match timer.mode {
                TimerMode::Once => false,
                TimerMode::Repeating { interval } => {
                    let next = timer.due_at + interval;
                    timer.due_at = if next <= now { now + interval } else { next };
                    true
                }
            }
        });
        fired
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// Stores a value.
    pub fn set_state(&mut self, key: &'static str, value: StateValue) {
        self.state.insert(key, value);
    }

    /// Reads a value.
    #[must_use]
    pub fn state(&self, key: &'static str) -> Option<&StateValue> {
        self.state.get(key)
    }

    /// Reads a numeric value.
    #[must_use]
    pub fn number(&self, key: &'static str) -> Option<f64> {
        match self.state.get(key) {
            Some(StateValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Reads a flag (false when unset).
    #[must_use]
    pub fn flag(&self, key: &'static str) -> bool {
        matches!(self.state.get(key), Some(StateValue::Flag(true)))
    }

    /// Mutable access to an entity set, creating it if needed.
    pub fn entity_set(&mut self, key: &'static str) -> &mut BTreeSet<EntityId> {
        self.sets.entry(key).or_default()
    }

    // -------------------------------------------------------------------------
    // Cleanup
    // -------------------------------------------------------------------------

    /// Cancels all timers, despawns every owned entity and clears state.
    ///
    /// Safe to call repeatedly and from any phase.
    pub fn cleanup(&mut self, world: &mut dyn WorldContext) {
        if self.phase == LifecyclePhase::CleanedUp {
            return;
        }
        let mut despawned = 0usize;
        for members in std::mem::take(&mut self.groups).into_values() {
            for id in members {
                if world.despawn(id) {
                    despawned += 1;
                }
            }
        }
        self.timers.clear();
        self.state.clear();
        self.sets.clear();
        self.phase = LifecyclePhase::CleanedUp;
        debug!(despawned, "ability runtime cleaned up");
    }
}

impl Default for AbilityRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntitySpec, EntityTag};
    use crate::world::{World, WorldContext};
    use glam::Vec2;

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn activate_only_from_uninitialized() {
            let mut runtime = AbilityRuntime::new();
            assert!(runtime.activate());
            assert!(!runtime.activate());

            let mut world = World::new(1);
            runtime.cleanup(&mut world);
            assert!(!runtime.activate());
            assert_eq!(runtime.phase(), LifecyclePhase::CleanedUp);
        }

        #[test]
        fn cleanup_is_idempotent_and_despawns_members() {
            let mut world = World::new(1);
            let bolt = world.spawn(EntitySpec::new(EntityTag::Projectile, Vec2::ZERO));
            let mut runtime = AbilityRuntime::new();
            runtime.activate();
            runtime.add_to_group("bolts", bolt);
            runtime.start_repeating("fire", 0.0, 100.0);
            runtime.set_state("last_fire", StateValue::Number(5.0));

            runtime.cleanup(&mut world);
            runtime.cleanup(&mut world);

            assert!(world.entity(bolt).is_none());
            assert_eq!(runtime.owned_count(), 0);
            assert!(!runtime.has_timer("fire"));
            assert_eq!(runtime.number("last_fire"), None);
        }

        #[test]
        fn cleanup_from_uninitialized() {
            let mut world = World::new(1);
            let mut runtime = AbilityRuntime::new();
            runtime.cleanup(&mut world);
            assert_eq!(runtime.phase(), LifecyclePhase::CleanedUp);
        }
    }

    mod timer_tests {
        use super::*;

        #[test]
        fn once_timer_fires_once() {
            let mut runtime = AbilityRuntime::new();
            runtime.activate();
            runtime.start_once("fuse", 100.0, 1500.0);

            assert!(runtime.due_timers(1599.0).is_empty());
            assert_eq!(runtime.due_timers(1600.0), vec!["fuse"]);
            assert!(runtime.due_timers(5000.0).is_empty());
            assert!(!runtime.has_timer("fuse"));
        }

        #[test]
        fn repeating_timer_skips_missed_intervals() {
            let mut runtime = AbilityRuntime::new();
            runtime.activate();
            runtime.start_repeating("regen", 0.0, 100.0);

            assert_eq!(runtime.due_timers(550.0), vec!["regen"]);
            assert_eq!(runtime.timer("regen").unwrap().due_at, 650.0);
        }

        #[test]
        fn inactive_runtime_fires_nothing() {
            let mut runtime = AbilityRuntime::new();
            runtime.start_once("fuse", 0.0, 0.0);
            assert!(runtime.due_timers(10.0).is_empty());
        }

        #[test]
        fn set_interval_pulls_deadline_in() {
            let mut runtime = AbilityRuntime::new();
            runtime.activate();
            runtime.start_repeating("volley", 0.0, 3000.0);
            runtime.set_interval("volley", 100.0, 1000.0);
            assert_eq!(runtime.timer("volley").unwrap().due_at, 1100.0);
        }
    }

    mod group_tests {
        use super::*;

        #[test]
        fn prune_drops_dead_members() {
            let mut world = World::new(1);
            let a = world.spawn(EntitySpec::new(EntityTag::Projectile, Vec2::ZERO));
            let b = world.spawn(EntitySpec::new(EntityTag::Projectile, Vec2::ZERO));
            let mut runtime = AbilityRuntime::new();
            runtime.add_to_group("bolts", a);
            runtime.add_to_group("bolts", b);

            world.despawn(a);
            assert_eq!(runtime.prune_group("bolts", &world), vec![a]);
            assert_eq!(runtime.group("bolts"), &[b]);
        }

        #[test]
        fn missing_group_is_empty() {
            let runtime = AbilityRuntime::new();
            assert!(runtime.group("nothing").is_empty());
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn entity_set_is_created_on_demand() {
            let mut runtime = AbilityRuntime::new();
            runtime.entity_set("stunned").insert(EntityId::new(4));
            runtime.entity_set("stunned").insert(EntityId::new(4));
            assert_eq!(runtime.entity_set("stunned").len(), 1);
        }

        #[test]
        fn flag_defaults_false() {
            let mut runtime = AbilityRuntime::new();
            assert!(!runtime.flag("enraged"));
            runtime.set_state("enraged", StateValue::Flag(true));
            assert!(runtime.flag("enraged"));
        }
    }
}

//! Regenerating chaser.

use serde::{Deserialize, Serialize};

use crate::behavior::{AbilityContext, Behavior, BehaviorKind};
use crate::collision::{CollisionHandler, Contact};

use super::chaser::ContactCore;
use super::common::regenerate;

const REGEN: &str = "regen";

/// Regenerator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegeneratorTuning {
    /// Multiplier on the entity's speed.
    pub speed_factor: f32,
    /// Interval between heals (ms).
    pub regen_interval_ms: f64,
    /// Health restored per heal.
    pub regen_amount: f32,
}

impl Default for RegeneratorTuning {
    fn default() -> Self {
        Self {
            speed_factor: 0.8,
            regen_interval_ms: 1000.0,
            regen_amount: 1.0,
        }
    }
}

/// Regenerator behavior.
#[derive(Debug, Clone)]
pub struct RegeneratorBehavior {
    core: ContactCore,
    tuning: RegeneratorTuning,
}

impl RegeneratorBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(type_id: &str, tuning: RegeneratorTuning) -> Self {
        Self {
            core: ContactCore::new(type_id, None),
            tuning,
        }
    }
}

impl Behavior for RegeneratorBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Regenerator
    }

    fn collision_handlers(&self) -> Vec<CollisionHandler> {
        vec![self.core.handler(self.kind())]
    }

    fn setup_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.core.attach(ctx);
        let now = ctx.now();
        ctx.runtime
            .start_repeating(REGEN, now, self.tuning.regen_interval_ms);
    }

    fn update_ability(&mut self, ctx: &mut AbilityContext<'_>) {
        self.core.chase(ctx, self.tuning.speed_factor);
        let now = ctx.now();
        if ctx.runtime.due_timers(now).contains(&REGEN) {
            regenerate(ctx.world, ctx.entity, self.tuning.regen_amount);
        }
    }

    fn on_collision(&mut self, ctx: &mut AbilityContext<'_>, contact: &Contact) {
        self.core.strike(ctx, contact);
    }
}

//! Event resolver: the session's event log.
//!
//! The `EventResolver` records every event output without touching game
//! state. The log is drained by the caller, typically once per frame, to
//! drive HUD notifications, audio or visual effects.

use tracing::{debug, info};

use crate::output::{Event, OutputEnvelope, OutputKind};

use super::{ResolveContext, Resolver};

/// Resolver that records event outputs.
///
/// # Example
///
/// ```
/// use gauntlet_core::output::OutputKind;
/// use gauntlet_core::resolver::{EventResolver, Resolver};
///
/// let mut resolver = EventResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Event));
/// assert!(resolver.take_events().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct EventResolver {
    log: Vec<OutputEnvelope>,
}

impl EventResolver {
    /// Creates a resolver with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns all recorded events in order.
    pub fn take_events(&mut self) -> Vec<OutputEnvelope> {
        std::mem::take(&mut self.log)
    }

    /// Number of recorded events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.log.len()
    }

    /// Returns `true` if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Discards the log.
    pub fn clear(&mut self) {
        self.log.clear();
    }
}

impl Resolver for EventResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Event]
    }

    fn resolve(&mut self, outputs: &[&OutputEnvelope], _ctx: &mut ResolveContext<'_>) {
        for envelope in outputs {
            match envelope.output().as_event() {
                Some(Event::LevelUp { level }) => info!(level, "level up"),
                Some(Event::ShieldBroken { entity }) => debug!(%entity, "shield broken"),
                Some(Event::Enraged { entity }) => debug!(%entity, "boss enraged"),
                Some(_) => {}
                None => continue,
            }
            self.log.push((*envelope).clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::config::SessionConfig;
    use crate::entity::EntityId;
    use crate::output::{Modifier, Output};
    use crate::stats::{BaseStats, ModifierSet, StatEngine};
    use crate::world::World;

    #[test]
    fn records_only_events_in_order() {
        let mut world = World::new(0);
        let mut behaviors = BTreeMap::new();
        let config = SessionConfig::default();
        let fallback = StatEngine::compute(&BaseStats::new(1.0, 0.0), &ModifierSet::new(), None, true);
        let mut ctx = ResolveContext {
            world: &mut world,
            behaviors: &mut behaviors,
            player: None,
            config: &config,
            fallback_stats: &fallback,
        };

        let outputs = [
            OutputEnvelope::new(Event::LevelUp { level: 2 }.into(), None, 1, 0),
            OutputEnvelope::new(
                Modifier::ApplyHealing {
                    target: EntityId::new(1),
                    amount: 1.0,
                }
                .into(),
                None,
                1,
                1,
            ),
            OutputEnvelope::new(
                Event::ShieldBroken {
                    entity: EntityId::new(4),
                }
                .into(),
                None,
                1,
                2,
            ),
        ];
        let refs: Vec<_> = outputs.iter().collect();

        let mut resolver = EventResolver::new();
        resolver.resolve(&refs, &mut ctx);
        assert_eq!(resolver.event_count(), 2);

        let events: Vec<Output> = resolver
            .take_events()
            .into_iter()
            .map(OutputEnvelope::into_output)
            .collect();
        assert_eq!(events[0], Output::Event(Event::LevelUp { level: 2 }));
        assert!(resolver.is_empty());
    }
}

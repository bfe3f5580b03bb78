//! Collision dispatch: routing raw contacts to the behavior that owns them.
//!
//! The physics layer reduces every overlap to a [`Contact`]: an opaque
//! [`CollisionLabel`] plus the two entities involved. The
//! [`CollisionDispatcher`] maps each label to the [`BehaviorKind`] that
//! registered it and decides which live behavior instance should handle the
//! contact. Labels are namespaced per entity type (`"ranger:bolt"`,
//! `"brute:contact"`), so no central match over projectile types exists.
//!
//! # Table Lifecycle
//!
//! The table is replaced as a whole by [`CollisionDispatcher::register_all`]
//! whenever the active character changes. It is never partially mutated.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::behavior::BehaviorKind;
//! use gauntlet_core::collision::{CollisionDispatcher, CollisionHandler, CollisionLabel};
//!
//! let mut dispatcher = CollisionDispatcher::new();
//! dispatcher.register_all(vec![CollisionHandler::new(
//!     CollisionLabel::new("ranger:bolt"),
//!     BehaviorKind::Ranged,
//! )]);
//!
//! assert!(dispatcher.handles(&CollisionLabel::new("ranger:bolt")));
//! assert!(!dispatcher.handles(&CollisionLabel::new("enemy:terrain")));
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::behavior::BehaviorKind;
use crate::entity::EntityId;
use crate::liveness::LivenessCheck;
use crate::world::WorldContext;

// =============================================================================
// Collision Label
// =============================================================================

/// Opaque string identifying the semantic type of a contact.
///
/// # Example
///
/// ```
/// use gauntlet_core::collision::CollisionLabel;
///
/// let label = CollisionLabel::namespaced("brute", "contact");
/// assert_eq!(label.as_str(), "brute:contact");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollisionLabel(Cow<'static, str>);

impl CollisionLabel {
    /// Creates a label from a static string without allocating.
    #[must_use]
    pub const fn from_static(label: &'static str) -> Self {
        Self(Cow::Borrowed(label))
    }

    /// Creates a label from any string.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(Cow::Owned(label.into()))
    }

    /// Creates a `"<owner>:<interaction>"` label.
    #[must_use]
    pub fn namespaced(owner: &str, interaction: &str) -> Self {
        Self::new(format!("{owner}:{interaction}"))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for CollisionLabel {
    fn from(label: &'static str) -> Self {
        Self::from_static(label)
    }
}

// =============================================================================
// Handlers and Contacts
// =============================================================================

/// A label claimed by a behavior kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionHandler {
    /// Label to route.
    pub label: CollisionLabel,
    /// Behavior kind whose `on_collision` receives the contact.
    pub kind: BehaviorKind,
}

impl CollisionHandler {
    /// Creates a handler entry.
    #[must_use]
    pub fn new(label: CollisionLabel, kind: BehaviorKind) -> Self {
        Self { label, kind }
    }
}

/// A raw contact reported by the physics layer.
///
/// `source` is the entity that carries the contact spec (bolt, blade, enemy
/// body); `target` is the entity it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Interaction label.
    pub label: CollisionLabel,
    /// Reporting entity.
    pub source: EntityId,
    /// Touched entity.
    pub target: EntityId,
}

impl Contact {
    /// Creates a contact.
    #[must_use]
    pub fn new(label: CollisionLabel, source: EntityId, target: EntityId) -> Self {
        Self {
            label,
            source,
            target,
        }
    }
}

/// A contact that passed liveness checks and has a registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// The contact being delivered.
    pub contact: Contact,
    /// Entity whose behavior instance handles the contact.
    pub owner: EntityId,
    /// Kind that registered the label.
    pub kind: BehaviorKind,
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Label → handler table.
#[derive(Debug, Clone, Default)]
pub struct CollisionDispatcher {
    table: BTreeMap<CollisionLabel, BehaviorKind>,
}

impl CollisionDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole table.
    ///
    /// When two handlers claim the same label the later one wins.
    pub fn register_all(&mut self, handlers: impl IntoIterator<Item = CollisionHandler>) {
        let table: BTreeMap<_, _> = handlers
            .into_iter()
            .map(|handler| (handler.label, handler.kind))
            .collect();
        debug!(labels = table.len(), "collision table rebuilt");
        self.table = table;
    }

    /// Returns `true` if a handler is registered for `label`.
    #[must_use]
    pub fn handles(&self, label: &CollisionLabel) -> bool {
        self.table.contains_key(label)
    }

    /// Returns the kind registered for `label`.
    #[must_use]
    pub fn kind_for(&self, label: &CollisionLabel) -> Option<BehaviorKind> {
        self.table.get(label).copied()
    }

    /// Number of registered labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no labels are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Resolves a raw contact into a dispatch.
    ///
    /// Returns `None` when the label has no handler (the contact is not
    /// gameplay-relevant) or when either entity failed its liveness check.
    /// The handling behavior belongs to the source's owner, or to the source
    /// itself when it has none.
    #[must_use]
    pub fn resolve(
        &self,
        label: &CollisionLabel,
        source: EntityId,
        target: EntityId,
        world: &dyn WorldContext,
    ) -> Option<Dispatch> {
        let Some(kind) = self.kind_for(label) else {
            trace!(%label, "no handler for contact");
            return None;
        };

        let source_entity = LivenessCheck::new(world, source).with_position().check()?;
        LivenessCheck::new(world, target).with_position().check()?;

        Some(Dispatch {
            contact: Contact::new(label.clone(), source, target),
            owner: source_entity.entity.controller(),
            kind,
        })
    }
}

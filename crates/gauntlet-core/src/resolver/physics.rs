//! In-process physics stand-in.
//!
//! Integrates `position += velocity * dt` for every live entity with a body
//! and reports circle overlaps as raw contacts. An entity only reports
//! contacts when it carries a contact spec, and only against entities
//! carrying the tag that spec names.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::collision::CollisionLabel;
//! use gauntlet_core::entity::{EntitySpec, EntityTag};
//! use gauntlet_core::resolver::physics;
//! use gauntlet_core::world::{World, WorldContext};
//! use glam::Vec2;
//!
//! let mut world = World::new(1);
//! let player = world.spawn(EntitySpec::new(EntityTag::Player, Vec2::ZERO).with_radius(10.0));
//! let grunt = world.spawn(
//!     EntitySpec::new(EntityTag::Enemy, Vec2::new(40.0, 0.0))
//!         .with_radius(10.0)
//!         .with_velocity(Vec2::new(-100.0, 0.0))
//!         .with_contact(CollisionLabel::new("grunt:contact"), EntityTag::Player),
//! );
//!
//! assert!(physics::detect_contacts(&world).is_empty());
//! physics::integrate(&mut world, 250.0);
//! let contacts = physics::detect_contacts(&world);
//! assert_eq!(contacts.len(), 1);
//! assert_eq!((contacts[0].source, contacts[0].target), (grunt, player));
//! ```

use crate::collision::Contact;
use crate::world::World;

/// Advances positions by `dt_ms` milliseconds.
///
/// Entities whose new position is not finite are dropped from the spatial
/// index.
pub fn integrate(world: &mut World, dt_ms: f64) {
    if !(dt_ms > 0.0) {
        return;
    }
    #[allow(clippy::cast_possible_truncation)]
    let dt = (dt_ms / 1000.0) as f32;

    let arena = world.arena_mut();
    let mut moved = Vec::new();
    for entity in arena.entities_sorted_mut() {
        if !entity.is_live() || !entity.has_body {
            continue;
        }
        let velocity = entity.velocity();
        if velocity == glam::Vec2::ZERO {
            continue;
        }
        entity.transform.position += velocity * dt;
        moved.push(entity.id());
    }
    for id in moved {
        arena.update_spatial(id);
    }
}

/// Overlapping pairs as `(label, source, target)` contacts, in spawn order.
#[must_use]
pub fn detect_contacts(world: &World) -> Vec<Contact> {
    let arena = world.arena();
    let mut contacts = Vec::new();
    for source in arena.entities_sorted() {
        let Some(spec) = source.contact.as_ref() else {
            continue;
        };
        if !source.is_live() || source.is_consumed() || !source.transform.has_finite_position() {
            continue;
        }
        for target in arena.entities_sorted() {
            if target.id() == source.id()
                || target.tag() != spec.hits
                || !target.is_live()
                || source.owner == Some(target.id())
            {
                continue;
            }
            let reach = source.radius + target.radius;
            if source.position().distance_squared(target.position()) <= reach * reach {
                contacts.push(Contact::new(spec.label.clone(), source.id(), target.id()));
            }
        }
    }
    contacts
}

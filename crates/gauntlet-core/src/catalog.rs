//! Built-in catalogs: playable characters, enemy roster and upgrade pools.
//!
//! These are the in-code defaults. The same data can be supplied as JSON
//! through [`EntityRegistry::load_json`].
//!
//! # Example
//!
//! ```
//! use gauntlet_core::catalog::default_upgrades;
//! use gauntlet_core::registry::EntityRegistry;
//!
//! let characters = EntityRegistry::default_characters();
//! assert_eq!(characters.len(), 5);
//!
//! let upgrades = default_upgrades();
//! let glaive: Vec<_> = upgrades
//!     .available_upgrades("glaive")
//!     .into_iter()
//!     .map(|u| u.id.as_str())
//!     .collect();
//! assert!(glaive.contains(&"twin_blades"));
//! assert!(!glaive.contains(&"steady_aim"));
//! ```

use crate::abilities::{
    AuraTuning, BomberTuning, BoomerangTuning, ChaserTuning, OverlordTuning, PuddleTuning,
    RangedTuning, ReflectorTuning, RegeneratorTuning, StarfallTuning,
};
use crate::behavior::BehaviorClass;
use crate::output::HitStatus;
use crate::registry::{EntityDescriptor, EntityRegistry};
use crate::stats::BaseStats;
use crate::status::StatusKind;
use crate::upgrades::{Upgrade, UpgradeCatalog, UpgradeEffect};

impl EntityRegistry {
    /// Registry with the five playable characters.
    ///
    /// # Example
    ///
    /// ```
    /// use gauntlet_core::behavior::BehaviorKind;
    /// use gauntlet_core::registry::EntityRegistry;
    ///
    /// let registry = EntityRegistry::default_characters();
    /// let glaive = registry.get_descriptor("glaive").unwrap();
    /// assert_eq!(glaive.behavior.kind(), BehaviorKind::Boomerang);
    /// ```
    #[must_use]
    pub fn default_characters() -> Self {
        let mut registry = Self::new();

        // Melee: pulsing ring around the player
        registry.register(EntityDescriptor::new(
            "vanguard",
            "Vanguard",
            character(12.0, 150.0, 1.0).with_ability(2.0, 800.0, 90.0),
            BehaviorClass::Aura(AuraTuning::default()),
        ));

        // Single-target bolts
        registry.register(EntityDescriptor::new(
            "ranger",
            "Ranger",
            character(8.0, 170.0, 0.0).with_ability(3.0, 500.0, 60.0),
            BehaviorClass::Ranged(RangedTuning::default()),
        ));

        // Returning blades
        registry.register(EntityDescriptor::new(
            "glaive",
            "Glaive",
            character(10.0, 160.0, 0.0).with_ability(2.0, 1400.0, 60.0),
            BehaviorClass::Boomerang(BoomerangTuning::default()),
        ));

        // Area denial
        registry.register(EntityDescriptor::new(
            "alchemist",
            "Alchemist",
            character(9.0, 155.0, 0.0).with_ability(2.0, 1600.0, 55.0),
            BehaviorClass::Puddle(PuddleTuning::default()),
        ));

        // Delayed area impact
        registry.register(EntityDescriptor::new(
            "astromancer",
            "Astromancer",
            character(8.0, 150.0, 0.0).with_ability(4.0, 2000.0, 70.0),
            BehaviorClass::Starfall(StarfallTuning::default()),
        ));

        registry
    }

    /// Registry with the enemy roster, boss included.
    ///
    /// The boss has zero spawn weight and is only spawned explicitly.
    #[must_use]
    pub fn default_enemies() -> Self {
        let mut registry = Self::new();

        registry.register(EntityDescriptor::new(
            "grunt",
            "Grunt",
            enemy(2.0, 70.0, 1.0, 1.0, 10.0).with_hitbox(14.0),
            BehaviorClass::Chaser(ChaserTuning::default()),
        ));
        registry.register(EntityDescriptor::new(
            "brute",
            "Brute",
            enemy(6.0, 50.0, 2.0, 3.0, 3.0).with_hitbox(22.0),
            BehaviorClass::Chaser(ChaserTuning {
                on_hit: Some(HitStatus::new(StatusKind::Bleed, 3000.0)),
                ..ChaserTuning::default()
            }),
        ));
        registry.register(EntityDescriptor::new(
            "viper",
            "Viper",
            enemy(3.0, 95.0, 1.0, 2.0, 5.0),
            BehaviorClass::Chaser(ChaserTuning {
                on_hit: Some(HitStatus::new(StatusKind::Poison, 4000.0)),
                ..ChaserTuning::default()
            }),
        ));
        registry.register(EntityDescriptor::new(
            "mirror",
            "Mirror",
            enemy(5.0, 60.0, 1.0, 3.0, 2.0),
            BehaviorClass::Reflector(ReflectorTuning::default()),
        ));
        registry.register(EntityDescriptor::new(
            "troll",
            "Troll",
            enemy(8.0, 45.0, 2.0, 4.0, 2.0).with_hitbox(20.0),
            BehaviorClass::Regenerator(RegeneratorTuning::default()),
        ));
        registry.register(EntityDescriptor::new(
            "bomber",
            "Bomber",
            enemy(4.0, 80.0, 1.0, 3.0, 2.0),
            BehaviorClass::Bomber(BomberTuning::default()),
        ));
        registry.register(EntityDescriptor::new(
            "overlord",
            "Overlord",
            enemy(60.0, 40.0, 3.0, 25.0, 0.0).with_hitbox(40.0),
            BehaviorClass::Overlord(OverlordTuning::default()),
        ));

        registry
    }
}

fn character(health: f32, move_speed: f32, armor: f32) -> BaseStats {
    BaseStats {
        armor,
        regen: 1.0,
        ..BaseStats::new(health, move_speed)
    }
}

fn enemy(health: f32, speed: f32, contact: f32, xp: f32, weight: f32) -> BaseStats {
    BaseStats::new(health, speed)
        .with_contact(contact, xp)
        .with_spawn_weight(weight)
}

/// Upgrade pools: a general pool plus one signature upgrade per character.
#[must_use]
pub fn default_upgrades() -> UpgradeCatalog {
    let mut catalog = UpgradeCatalog::new();

    let general = [
        ("vitality", "Vitality", "+2 max health", UpgradeEffect::bonus("health", 2.0)),
        ("plating", "Plating", "+1 armor", UpgradeEffect::bonus("armor", 1.0)),
        ("haste", "Haste", "+10% move speed", UpgradeEffect::multiply("moveSpeed", 1.1)),
        ("focus", "Focus", "-10% ability cooldown", UpgradeEffect::multiply("abilityCooldown", 0.9)),
        ("power", "Power", "+1 ability damage", UpgradeEffect::bonus("abilityDamage", 1.0)),
        ("reach", "Reach", "+15 ability radius", UpgradeEffect::bonus("abilityRadius", 15.0)),
        ("magnet", "Magnet", "+20 pickup range", UpgradeEffect::bonus("pickupRange", 20.0)),
        ("mending", "Mending", "+1 regeneration", UpgradeEffect::bonus("regen", 1.0)),
    ];
    for (id, name, description, effect) in general {
        catalog.add_general(Upgrade::new(id, name, description, vec![effect]));
    }

    let signature = [
        ("vanguard", "wide_aura", "Wide Aura", "+20% aura radius", UpgradeEffect::multiply("abilityRadius", 1.2)),
        ("ranger", "steady_aim", "Steady Aim", "+0.5 accuracy", UpgradeEffect::bonus("accuracy", 0.5)),
        ("glaive", "twin_blades", "Twin Blades", "+1 blade per throw", UpgradeEffect::bonus("projectileCount", 1.0)),
        ("alchemist", "potent_brew", "Potent Brew", "+25% puddle damage", UpgradeEffect::multiply("abilityDamage", 1.25)),
        ("astromancer", "meteor_shower", "Meteor Shower", "+1 star per cast", UpgradeEffect::bonus("projectileCount", 1.0)),
    ];
    for (owner, id, name, description, effect) in signature {
        catalog.add_for_character(owner, Upgrade::new(id, name, description, vec![effect]));
    }

    catalog
}

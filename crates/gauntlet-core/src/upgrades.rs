//! Level-up upgrades.
//!
//! An [`Upgrade`] is a named list of stat effects. Applying one stages every
//! effect on a copy of the player's [`ModifierSet`]; if any effect is
//! rejected (a misspelled key, a multiplier on health) nothing changes.
//! Otherwise the set is committed and the caller recomputes derived stats
//! without a health reset.
//!
//! [`UpgradeCatalog`] holds the general pool offered to every character and
//! the per-character pools.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::stats::ModifierSet;

/// One stat change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Adds a flat bonus.
    Bonus {
        /// Stat key, e.g. `"abilityDamage"`
        stat: String,
        /// Amount added
        value: f32,
    },
    /// Multiplies a stat.
    Multiply {
        /// Stat key
        stat: String,
        /// Factor applied
        factor: f32,
    },
}

impl UpgradeEffect {
    /// Flat bonus.
    #[must_use]
    pub fn bonus(stat: &str, value: f32) -> Self {
        Self::Bonus {
            stat: stat.to_string(),
            value,
        }
    }

    /// Multiplier.
    #[must_use]
    pub fn multiply(stat: &str, factor: f32) -> Self {
        Self::Multiply {
            stat: stat.to_string(),
            factor,
        }
    }

    fn stage(&self, mods: &mut ModifierSet) -> Result<()> {
        match self {
            Self::Bonus { stat, value } => mods.add_bonus(stat, *value),
            Self::Multiply { stat, factor } => mods.multiply(stat, *factor),
        }
    }
}

/// A selectable upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Menu text
    pub description: String,
    /// Effects applied together
    pub effects: Vec<UpgradeEffect>,
}

impl Upgrade {
    /// Creates an upgrade.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        effects: Vec<UpgradeEffect>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            effects,
        }
    }

    /// Applies every effect to `mods`, or none of them.
    ///
    /// # Errors
    ///
    /// Returns the first rejected effect's error; `mods` is left untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use gauntlet_core::stats::{ModifierSet, StatKey};
    /// use gauntlet_core::upgrades::{Upgrade, UpgradeEffect};
    ///
    /// let mut mods = ModifierSet::new();
    /// let broken = Upgrade::new("typo", "Typo", "", vec![
    ///     UpgradeEffect::bonus("armor", 1.0),
    ///     UpgradeEffect::bonus("armour", 1.0),
    /// ]);
    /// assert!(broken.apply(&mut mods).is_err());
    /// assert_eq!(mods.bonus(StatKey::Armor), 0.0);
    /// ```
    pub fn apply(&self, mods: &mut ModifierSet) -> Result<()> {
        let mut staged = mods.clone();
        for effect in &self.effects {
            effect.stage(&mut staged)?;
        }
        *mods = staged;
        Ok(())
    }
}

/// General and per-character upgrade pools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeCatalog {
    general: Vec<Upgrade>,
    by_character: BTreeMap<String, Vec<Upgrade>>,
}

impl UpgradeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an upgrade offered to every character.
    pub fn add_general(&mut self, upgrade: Upgrade) {
        self.general.push(upgrade);
    }

    /// Adds an upgrade offered only to `character_id`.
    pub fn add_for_character(&mut self, character_id: &str, upgrade: Upgrade) {
        self.by_character
            .entry(character_id.to_string())
            .or_default()
            .push(upgrade);
    }

    /// General pool followed by the character's own pool.
    #[must_use]
    pub fn available_upgrades(&self, character_id: &str) -> Vec<&Upgrade> {
        self.general
            .iter()
            .chain(self.by_character.get(character_id).into_iter().flatten())
            .collect()
    }

    /// Finds an upgrade available to `character_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownUpgrade`] if no available upgrade has that id.
    pub fn find(&self, character_id: &str, upgrade_id: &str) -> Result<&Upgrade> {
        self.available_upgrades(character_id)
            .into_iter()
            .find(|u| u.id == upgrade_id)
            .ok_or_else(|| CoreError::UnknownUpgrade(upgrade_id.to_string()))
    }

    /// Draws up to `n` distinct upgrades for a level-up menu.
    pub fn offer_upgrades<R: Rng + ?Sized>(
        &self,
        character_id: &str,
        n: usize,
        rng: &mut R,
    ) -> Vec<Upgrade> {
        self.available_upgrades(character_id)
            .choose_multiple(rng, n)
            .map(|u| (*u).clone())
            .collect()
    }
}

//! Item documents.
//!
//! Items own status definitions (in their flag bag) and an applied
//! snapshot recording what their statuses last contributed to the owning
//! actor. Armor items additionally carry three raw numeric stats that are
//! injected directly while equipped, bypassing the modifier system.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::FlagBag;

/// Unique identifier for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Generate a new random item ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Where an item currently sits on its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// Worn or wielded.
    Equipped,
    /// Carried but not in use.
    #[default]
    Backpack,
}

/// What kind of item this is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// A weapon, with its damage formula.
    Weapon {
        /// Damage formula text, e.g. `"2d6+3"`.
        damage: String,
    },
    /// Armor, with its raw stat block.
    Armor {
        /// Armor slot capacity granted while equipped.
        score: i64,
        /// Lower damage threshold granted while equipped.
        noticeable: i64,
        /// Upper damage threshold granted while equipped.
        heavy: i64,
    },
    /// Anything else.
    Gear,
}

/// An item document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Item kind and kind-specific stats.
    pub category: ItemCategory,
    /// Current container state.
    pub container: Container,
    /// Persisted engine state (status list, applied snapshot).
    pub flags: FlagBag,
}

impl Item {
    /// Create an item in the backpack.
    pub fn new(category: ItemCategory, name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            category,
            container: Container::Backpack,
            flags: FlagBag::new(),
        }
    }

    /// Returns true if the item is currently equipped.
    pub fn is_equipped(&self) -> bool {
        self.container == Container::Equipped
    }
}

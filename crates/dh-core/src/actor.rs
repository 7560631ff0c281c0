//! Actor documents.
//!
//! An actor carries its numeric fields (traits, resources, thresholds),
//! its owned items, and two persisted status lists in the flag bag:
//! locally authored statuses and statuses applied by other actors.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::fields::{FieldStore, FlagBag, path};
use crate::item::{Item, ItemId};

/// Unique identifier for an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Generate a new random actor ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// One of the six character traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitKey {
    /// Agility: sprint, leap, maneuver.
    Agility,
    /// Strength: lift, smash, grapple.
    Strength,
    /// Finesse: control, hide, tinker.
    Finesse,
    /// Instinct: perceive, sense, navigate.
    Instinct,
    /// Presence: charm, perform, deceive.
    Presence,
    /// Knowledge: recall, analyze, comprehend.
    Knowledge,
}

impl TraitKey {
    /// All trait keys in sheet order.
    pub const ALL: [TraitKey; 6] = [
        TraitKey::Agility,
        TraitKey::Strength,
        TraitKey::Finesse,
        TraitKey::Instinct,
        TraitKey::Presence,
        TraitKey::Knowledge,
    ];

    /// The snake_case key for this trait.
    pub fn key(self) -> &'static str {
        match self {
            Self::Agility => "agility",
            Self::Strength => "strength",
            Self::Finesse => "finesse",
            Self::Instinct => "instinct",
            Self::Presence => "presence",
            Self::Knowledge => "knowledge",
        }
    }

    /// The field path holding this trait's value.
    pub fn path(self) -> String {
        format!("traits.{}", self.key())
    }

    /// Whether this trait can drive spellcasting. The "magic" formula
    /// token resolves to the highest value among these.
    pub fn is_magic(self) -> bool {
        matches!(self, Self::Instinct | Self::Presence | Self::Knowledge)
    }

    /// Parse a trait from its key, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.key() == lower)
    }
}

impl fmt::Display for TraitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Who controls an actor. Damage resolution is automatic for NPCs and
/// interactive (armor negotiation) for player characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// A player character.
    Player,
    /// A gamemaster-controlled adversary or ally.
    Npc,
}

/// An actor document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Unique identifier.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Player character or NPC.
    pub kind: ActorKind,
    /// Numeric fields at dotted paths (traits, resources, thresholds).
    pub fields: FieldStore,
    /// Owned items.
    pub items: Vec<Item>,
    /// Persisted engine state (status lists, applied snapshot).
    pub flags: FlagBag,
}

impl Actor {
    /// Create an actor with empty fields.
    pub fn new(kind: ActorKind, name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            kind,
            fields: FieldStore::new(),
            items: Vec::new(),
            flags: FlagBag::new(),
        }
    }

    /// Read a trait value (0 when unset).
    pub fn trait_value(&self, key: TraitKey) -> i64 {
        self.fields.get(&key.path())
    }

    /// Set a trait value.
    pub fn set_trait(&mut self, key: TraitKey, value: i64) {
        self.fields.set(key.path(), value);
    }

    /// The highest value among magic-capable traits.
    pub fn magic_trait(&self) -> i64 {
        TraitKey::ALL
            .into_iter()
            .filter(|t| t.is_magic())
            .map(|t| self.trait_value(t))
            .max()
            .unwrap_or(0)
    }

    /// Find an owned item by ID.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Find an owned item by ID, mutably.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Gain Hope, clamped to the maximum. Returns the delta actually
    /// applied (0 when already full).
    pub fn gain_hope(&mut self, amount: i64) -> i64 {
        let current = self.fields.get(path::HOPE_VALUE);
        let max = self.fields.get(path::HOPE_MAX);
        let applied = (current + amount).clamp(0, max) - current;
        self.fields.add(path::HOPE_VALUE, applied);
        applied
    }

    /// Spend Hope. Refused entirely when insufficient: Hope never goes
    /// negative and is never silently clamped on deduction.
    pub fn spend_hope(&mut self, amount: i64) -> CoreResult<()> {
        let current = self.fields.get(path::HOPE_VALUE);
        if current < amount {
            return Err(CoreError::InsufficientResource {
                resource: "hope".to_string(),
                needed: amount,
                available: current,
            });
        }
        self.fields.add(path::HOPE_VALUE, -amount);
        Ok(())
    }

    /// Adjust Stress, clamped to `0..=max`. Returns the delta applied.
    pub fn adjust_stress(&mut self, delta: i64) -> i64 {
        let current = self.fields.get(path::STRESS_VALUE);
        let max = self.fields.get(path::STRESS_MAX);
        let applied = (current + delta).clamp(0, max) - current;
        self.fields.add(path::STRESS_VALUE, applied);
        applied
    }

    /// Unspent armor slots (capacity minus slots already used).
    pub fn armor_capacity(&self) -> i64 {
        (self.fields.get(path::ARMOR_MAX) - self.fields.get(path::ARMOR_VALUE)).max(0)
    }
}

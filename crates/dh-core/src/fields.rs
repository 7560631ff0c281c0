//! Dotted-path numeric fields and the per-document flag bag.
//!
//! Every mutable number on a document lives at a dotted path such as
//! `resources.hp.value`. Reads default to 0 for absent paths and all
//! mutation is read-then-add; the engine never overwrites a live field
//! blind, so concurrent contributors (items, statuses) stay additive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Standard field paths used by the engine.
pub mod path {
    /// Wounds taken (counts up toward the maximum).
    pub const HP_VALUE: &str = "resources.hp.value";
    /// Wound capacity.
    pub const HP_MAX: &str = "resources.hp.max";
    /// Stress marked (counts up toward the maximum).
    pub const STRESS_VALUE: &str = "resources.stress.value";
    /// Stress capacity.
    pub const STRESS_MAX: &str = "resources.stress.max";
    /// Armor slots spent (counts up toward the maximum).
    pub const ARMOR_VALUE: &str = "resources.armor.value";
    /// Armor slot capacity.
    pub const ARMOR_MAX: &str = "resources.armor.max";
    /// Current Hope.
    pub const HOPE_VALUE: &str = "resources.hope.value";
    /// Hope capacity.
    pub const HOPE_MAX: &str = "resources.hope.max";
    /// Lower damage threshold ("noticeable").
    pub const THRESHOLD_NOTICEABLE: &str = "damage_thresholds.noticeable";
    /// Upper damage threshold ("heavy").
    pub const THRESHOLD_HEAVY: &str = "damage_thresholds.heavy";
    /// Roll target for incoming attacks.
    pub const EVASION: &str = "evasion";
}

/// A flat store of numeric fields keyed by dotted path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldStore {
    values: BTreeMap<String, i64>,
}

impl FieldStore {
    /// Create an empty field store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value at a path, defaulting to 0 when absent.
    pub fn get(&self, path: &str) -> i64 {
        self.values.get(path).copied().unwrap_or(0)
    }

    /// Overwrite the value at a path. Used for initial setup only; the
    /// engine itself mutates through [`FieldStore::add`].
    pub fn set(&mut self, path: impl Into<String>, value: i64) {
        self.values.insert(path.into(), value);
    }

    /// Read-then-add mutation. Returns the new value.
    pub fn add(&mut self, path: &str, delta: i64) -> i64 {
        let entry = self.values.entry(path.to_string()).or_insert(0);
        *entry += delta;
        *entry
    }

    /// Iterate over all `(path, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A scoped key-value bag of persisted engine state on a document.
///
/// This models the host's "flags" storage: opaque JSON payloads the
/// engine reads back between passes (status lists, applied snapshots).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagBag {
    entries: BTreeMap<String, serde_json::Value>,
}

impl FlagBag {
    /// Create an empty flag bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a flag by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    /// Write a flag, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.insert(key.into(), value);
    }

    /// Remove a flag, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.entries.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_defaults_to_zero() {
        let fields = FieldStore::new();
        assert_eq!(fields.get("resources.hp.value"), 0);
    }

    #[test]
    fn add_is_read_then_add() {
        let mut fields = FieldStore::new();
        fields.set(path::HP_MAX, 6);
        assert_eq!(fields.add(path::HP_MAX, 3), 9);
        assert_eq!(fields.add(path::HP_MAX, -3), 6);
        assert_eq!(fields.get(path::HP_MAX), 6);
    }

    #[test]
    fn add_creates_missing_path() {
        let mut fields = FieldStore::new();
        assert_eq!(fields.add("custom.counter", 2), 2);
    }

    #[test]
    fn flag_bag_roundtrip() {
        let mut bag = FlagBag::new();
        bag.set("statuses", serde_json::json!([{"name": "Shielded"}]));
        assert!(bag.get("statuses").is_some());
        assert!(bag.remove("statuses").is_some());
        assert!(bag.get("statuses").is_none());
    }
}

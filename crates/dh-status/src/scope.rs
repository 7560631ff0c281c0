//! Attribute-token resolution over actors.
//!
//! Formula tokens are display labels, raw field paths, or the special
//! `magic` token. The [`LabelIndex`] owns the label-to-path mapping and
//! is invalidated explicitly when the rendering layer changes locale;
//! there is no ambient locale state in the engine.

use std::collections::BTreeMap;

use dh_core::{Actor, TraitKey, fields::path};
use dh_formula::Scope;

/// The sentinel path a label may map to for the magic token.
pub const MAGIC_PATH: &str = "magic";

/// Label-to-path mapping for token resolution.
///
/// Keys are compared case-insensitively. The standard index carries the
/// English labels; a host re-populates it for other locales and calls
/// [`LabelIndex::invalidate`] when the locale changes.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: BTreeMap<String, String>,
}

impl LabelIndex {
    /// An empty index. Tokens still resolve as raw paths and trait keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// The index with standard English labels.
    pub fn standard() -> Self {
        let mut index = Self::new();
        for key in TraitKey::ALL {
            index.insert(key.key(), key.path());
        }
        index.insert("hope", path::HOPE_VALUE);
        index.insert("hope max", path::HOPE_MAX);
        index.insert("stress", path::STRESS_VALUE);
        index.insert("stress max", path::STRESS_MAX);
        index.insert("armor", path::ARMOR_MAX);
        index.insert("evasion", path::EVASION);
        index.insert("magic", MAGIC_PATH);
        index
    }

    /// Map a display label to a field path (or [`MAGIC_PATH`]).
    pub fn insert(&mut self, label: impl AsRef<str>, target: impl Into<String>) {
        self.labels
            .insert(label.as_ref().trim().to_lowercase(), target.into());
    }

    /// Resolve a label to its path.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.labels
            .get(&label.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Drop every mapping. Called on locale change; the caller re-inserts
    /// labels for the new locale.
    pub fn invalidate(&mut self) {
        self.labels.clear();
    }
}

/// A formula scope reading tokens off one actor.
///
/// Resolution order: the magic token, then the label index, then a raw
/// dotted path, then a bare trait key. Anything else is unknown and the
/// evaluator reads it as 0.
#[derive(Debug, Clone, Copy)]
pub struct ActorScope<'a> {
    actor: &'a Actor,
    index: &'a LabelIndex,
}

impl<'a> ActorScope<'a> {
    /// Create a scope over an actor.
    pub fn new(actor: &'a Actor, index: &'a LabelIndex) -> Self {
        Self { actor, index }
    }
}

impl Scope for ActorScope<'_> {
    fn resolve(&self, token: &str) -> Option<f64> {
        let token = token.trim();
        if token.eq_ignore_ascii_case(MAGIC_PATH) {
            return Some(self.actor.magic_trait() as f64);
        }
        if let Some(target) = self.index.resolve(token) {
            if target == MAGIC_PATH {
                return Some(self.actor.magic_trait() as f64);
            }
            return Some(self.actor.fields.get(target) as f64);
        }
        if token.contains('.') {
            return Some(self.actor.fields.get(token) as f64);
        }
        TraitKey::parse(token).map(|key| self.actor.trait_value(key) as f64)
    }
}

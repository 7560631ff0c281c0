//! The modifier handler trait and the type-keyed registry.

use std::collections::BTreeMap;
use std::fmt;

use dh_core::DiceRoller;
use dh_formula::Scope;

use crate::error::{StatusError, StatusResult};
use crate::modifier::{DesiredMap, ModifierInstance, ModifierKind, builtin};

/// Capability interface for one modifier kind.
///
/// `normalize` must be total: whatever the raw data looks like, it
/// returns a usable instance of this kind. The accumulation hooks are
/// no-ops by default; persistent kinds override [`accumulate`] and
/// instant kinds override [`compute_instant`].
///
/// [`accumulate`]: ModifierHandler::accumulate
/// [`compute_instant`]: ModifierHandler::compute_instant
pub trait ModifierHandler {
    /// Display label for UI population.
    fn label(&self) -> &'static str;

    /// Persistent or instant.
    fn kind(&self) -> ModifierKind;

    /// Coerce raw persisted data into an instance of this kind. Never
    /// fails; malformed fields become safe defaults.
    fn normalize(&self, raw: &serde_json::Value) -> ModifierInstance;

    /// Presentation of the modifier's value.
    fn format_value(&self, modifier: &ModifierInstance) -> String;

    /// Add this modifier's evaluated contribution into the desired map.
    /// Persistent kinds only; the formula is evaluated without dice.
    fn accumulate(&self, _out: &mut DesiredMap, _modifier: &ModifierInstance, _scope: &dyn Scope) {
    }

    /// Compute the one-shot `(path, delta)` of an instant modifier,
    /// rolling dice if the formula calls for them. Instant kinds only.
    fn compute_instant(
        &self,
        _modifier: &ModifierInstance,
        _scope: &dyn Scope,
        _roller: &mut dyn DiceRoller,
    ) -> Option<(String, i64)> {
        None
    }
}

/// Type-keyed table of modifier handlers.
///
/// Registration from initialization code only; re-registering a key
/// silently replaces the previous handler (hot-reload relies on this).
pub struct ModifierRegistry {
    handlers: BTreeMap<String, Box<dyn ModifierHandler>>,
}

impl ModifierRegistry {
    /// A registry with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// A registry with the five built-in kinds registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        builtin::register_all(&mut registry);
        registry
    }

    /// Register a handler under a type key. The only failure is an empty
    /// key; overwriting an existing key is deliberate and silent.
    pub fn register(
        &mut self,
        type_key: impl Into<String>,
        handler: Box<dyn ModifierHandler>,
    ) -> StatusResult<()> {
        let type_key = type_key.into();
        if type_key.is_empty() {
            return Err(StatusError::EmptyTypeKey);
        }
        self.handlers.insert(type_key, handler);
        Ok(())
    }

    /// Look up the handler for a type key.
    pub fn lookup(&self, type_key: &str) -> Option<&dyn ModifierHandler> {
        self.handlers.get(type_key).map(Box::as_ref)
    }

    /// The handler for an already-normalized instance.
    pub fn handler_for(&self, modifier: &ModifierInstance) -> Option<&dyn ModifierHandler> {
        self.lookup(modifier.type_key())
    }

    /// `(type key, label)` pairs for UI population, in key order.
    pub fn list_all(&self) -> Vec<(String, String)> {
        self.handlers
            .iter()
            .map(|(key, handler)| (key.clone(), handler.label().to_string()))
            .collect()
    }

    /// Normalize raw persisted modifier data. The `type` field routes to
    /// a handler; unknown or missing types become
    /// [`ModifierInstance::Unknown`].
    pub fn normalize(&self, raw: &serde_json::Value) -> ModifierInstance {
        let type_key = raw.get("type").and_then(|v| v.as_str()).unwrap_or("");
        match self.lookup(type_key) {
            Some(handler) => handler.normalize(raw),
            None => ModifierInstance::Unknown,
        }
    }
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierRegistry")
            .field("types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

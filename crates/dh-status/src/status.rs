//! Status definitions and their normalization.
//!
//! Statuses are persisted as JSON in a document's flag bag and read back
//! through [`StatusDefinition::normalize`], which is idempotent and
//! total: unknown activation triggers fall back to a per-context
//! default, the legacy `{attrPath, attrDelta}` shorthand becomes a
//! one-element attribute modifier list, and a legacy `activator` field
//! is read as `when`.

use std::fmt;

use dh_core::{Actor, ActorId, FlagBag, Item};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::modifier::{ModifierInstance, ModifierKind, ModifierRegistry};

/// Flag bag keys for persisted status data.
pub mod flag {
    /// Status definitions on an item.
    pub const ITEM_STATUSES: &str = "statuses";
    /// Owner-authored status definitions on an actor.
    pub const ACTOR_STATUSES: &str = "statuses";
    /// Statuses applied to an actor by other actors.
    pub const APPLIED_STATUSES: &str = "applied_statuses";
}

/// Unique identifier for a status definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusId(pub Uuid);

impl StatusId {
    /// Generate a new random status ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StatusId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// When a status's modifiers are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationWhen {
    /// Only while the owning item is equipped.
    Equip,
    /// Always while owned or present.
    Backpack,
    /// Never auto-active; applied to targets by explicit action only.
    Button,
}

impl ActivationWhen {
    /// Parse an activation key, falling back to `None` on anything
    /// unrecognized.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "equip" => Some(Self::Equip),
            "backpack" => Some(Self::Backpack),
            "button" => Some(Self::Button),
            _ => None,
        }
    }
}

/// Whether a raw status is being read from an item or an actor. Decides
/// the default activation trigger for unknown `when` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusContext {
    /// Item-owned status; defaults to [`ActivationWhen::Equip`].
    Item,
    /// Actor-owned status; defaults to [`ActivationWhen::Backpack`].
    Actor,
}

impl StatusContext {
    /// The default trigger for this context.
    pub fn default_when(self) -> ActivationWhen {
        match self {
            Self::Item => ActivationWhen::Equip,
            Self::Actor => ActivationWhen::Backpack,
        }
    }
}

/// Provenance of a status applied by another actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSource {
    /// Display name of the source status.
    pub name: String,
    /// The actor whose button applied this status; formulas evaluate
    /// against this actor when it resolves.
    pub caster: Option<ActorId>,
    /// Display name of the caster.
    pub caster_name: String,
    /// ID of the original status definition, for deduplication on
    /// re-application.
    pub status_id: StatusId,
}

/// A named bundle of typed modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDefinition {
    /// Unique identifier.
    pub id: StatusId,
    /// Display name; the lookup key for button-triggered application.
    pub name: String,
    /// Activation trigger.
    pub when: ActivationWhen,
    /// Icon reference; presentation only.
    #[serde(default)]
    pub img: String,
    /// Descriptive text; presentation only.
    #[serde(default)]
    pub text: String,
    /// Ordered modifier list.
    #[serde(default)]
    pub mods: Vec<ModifierInstance>,
    /// Provenance, present only on instances applied by another actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<StatusSource>,
}

impl StatusDefinition {
    /// Create an empty status.
    pub fn new(name: impl Into<String>, when: ActivationWhen) -> Self {
        Self {
            id: StatusId::new(),
            name: name.into(),
            when,
            img: String::new(),
            text: String::new(),
            mods: Vec::new(),
            source: None,
        }
    }

    /// Whether this status contributes on an item in the given equip
    /// state. Button statuses never auto-activate.
    pub fn active_on_item(&self, equipped: bool) -> bool {
        match self.when {
            ActivationWhen::Backpack => true,
            ActivationWhen::Equip => equipped,
            ActivationWhen::Button => false,
        }
    }

    /// Whether this status contributes on an actor. Actor-owned statuses
    /// cannot be equip-gated, so only `Backpack` is active.
    pub fn active_on_actor(&self) -> bool {
        self.when == ActivationWhen::Backpack
    }

    /// Returns true if any modifier is instant-kind; such a status is
    /// consumed after one actor sync.
    pub fn has_instant(&self) -> bool {
        self.mods.iter().any(|m| m.kind() == ModifierKind::Instant)
    }

    /// Normalize raw persisted data into a definition. Total and
    /// idempotent: normalizing the serialization of a normalized status
    /// yields the same status.
    pub fn normalize(raw: &Value, context: StatusContext, registry: &ModifierRegistry) -> Self {
        let id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(StatusId)
            .unwrap_or_default();
        let name = raw
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        // Legacy `activator` is read where `when` is absent.
        let when = raw
            .get("when")
            .or_else(|| raw.get("activator"))
            .and_then(|v| v.as_str())
            .and_then(ActivationWhen::parse)
            .unwrap_or_else(|| context.default_when());
        let img = raw
            .get("img")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let text = raw
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let mut mods: Vec<ModifierInstance> = match raw.get("mods").and_then(|v| v.as_array()) {
            Some(entries) => entries.iter().map(|m| registry.normalize(m)).collect(),
            None => Vec::new(),
        };
        // Legacy single-field shorthand migrates into a one-element
        // attribute modifier list.
        if mods.is_empty() {
            if let Some(path) = raw.get("attrPath").and_then(|v| v.as_str()) {
                let value = match raw.get("attrDelta") {
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::String(s)) => s.clone(),
                    _ => "0".to_string(),
                };
                mods.push(ModifierInstance::Attribute {
                    path: path.to_string(),
                    value,
                });
            }
        }

        let source = raw
            .get("source")
            .cloned()
            .and_then(|v| serde_json::from_value::<StatusSource>(v).ok());

        Self {
            id,
            name,
            when,
            img,
            text,
            mods,
            source,
        }
    }
}

/// Read and normalize a status list from a flag bag. Missing or
/// non-array flags read as empty.
pub fn read_statuses(
    bag: &FlagBag,
    key: &str,
    context: StatusContext,
    registry: &ModifierRegistry,
) -> Vec<StatusDefinition> {
    match bag.get(key).and_then(|v| v.as_array()) {
        Some(entries) => entries
            .iter()
            .map(|raw| StatusDefinition::normalize(raw, context, registry))
            .collect(),
        None => Vec::new(),
    }
}

/// Write a status list into a flag bag.
pub fn write_statuses(bag: &mut FlagBag, key: &str, statuses: &[StatusDefinition]) {
    bag.set(key, serde_json::to_value(statuses).unwrap_or_default());
}

/// Statuses on an item, normalized.
pub fn item_statuses(item: &Item, registry: &ModifierRegistry) -> Vec<StatusDefinition> {
    read_statuses(&item.flags, flag::ITEM_STATUSES, StatusContext::Item, registry)
}

/// Owner-authored statuses on an actor, normalized.
pub fn local_statuses(actor: &Actor, registry: &ModifierRegistry) -> Vec<StatusDefinition> {
    read_statuses(&actor.flags, flag::ACTOR_STATUSES, StatusContext::Actor, registry)
}

/// Statuses applied to an actor by others, normalized.
pub fn applied_statuses(actor: &Actor, registry: &ModifierRegistry) -> Vec<StatusDefinition> {
    read_statuses(&actor.flags, flag::APPLIED_STATUSES, StatusContext::Actor, registry)
}

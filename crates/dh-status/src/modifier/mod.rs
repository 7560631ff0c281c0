//! Modifier instances and the type-keyed handler registry.
//!
//! Every modifier is a tagged-enum variant carrying only its own fields,
//! so the accumulation engine can match exhaustively, while the
//! string-keyed [`ModifierRegistry`] keeps the "new kinds can be added
//! without touching the engine" property: each kind's normalize, format,
//! accumulate, and compute-instant behavior lives in its handler.

/// Built-in handlers for the five standard modifier kinds.
pub mod builtin;
/// The handler capability trait and the registry.
pub mod registry;

pub use registry::{ModifierHandler, ModifierRegistry};

use std::collections::BTreeMap;

use dh_core::TraitKey;
use serde::{Deserialize, Serialize};

/// A map from dotted numeric path to accumulated delta.
pub type DesiredMap = BTreeMap<String, i64>;

/// Whether a modifier contributes an ongoing delta or fires once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Recomputed on every sync and kept in step with its source.
    Persistent,
    /// Computed once when applied to an actor, then the owning status
    /// is deleted.
    Instant,
}

/// Resistance, immunity, or vulnerability to a damage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResilienceKind {
    /// Physical damage halved.
    ResistPhy,
    /// Physical damage ignored.
    ImmunePhy,
    /// Physical damage doubled.
    VulnPhy,
    /// Magical damage halved.
    ResistMag,
    /// Magical damage ignored.
    ImmuneMag,
    /// Magical damage doubled.
    VulnMag,
}

impl ResilienceKind {
    /// Parse a resilience key such as `resist_phy`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "resist_phy" => Some(Self::ResistPhy),
            "immune_phy" => Some(Self::ImmunePhy),
            "vuln_phy" => Some(Self::VulnPhy),
            "resist_mag" => Some(Self::ResistMag),
            "immune_mag" => Some(Self::ImmuneMag),
            "vuln_mag" => Some(Self::VulnMag),
            _ => None,
        }
    }

    /// Returns true if this entry concerns physical damage.
    pub fn is_physical(self) -> bool {
        matches!(self, Self::ResistPhy | Self::ImmunePhy | Self::VulnPhy)
    }
}

/// Advantage or disadvantage granted by a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Adds a die to the advantage side of the edge pool.
    #[default]
    Advantage,
    /// Adds a die to the disadvantage side.
    Disadvantage,
}

/// Which trait an advantage modifier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitScope {
    /// Every trait.
    #[default]
    All,
    /// A single trait.
    #[serde(untagged)]
    Trait(TraitKey),
}

impl TraitScope {
    /// Returns true if this scope covers the given trait (or any roll
    /// without a trait, for `All`).
    pub fn covers(self, trait_key: Option<TraitKey>) -> bool {
        match self {
            Self::All => true,
            Self::Trait(t) => trait_key == Some(t),
        }
    }
}

/// Which rolls an advantage modifier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollContext {
    /// Any roll.
    #[default]
    Any,
    /// Reaction rolls only.
    Reaction,
    /// Attack rolls only.
    Attack,
}

impl RollContext {
    /// Returns true if a modifier in this context applies to a roll made
    /// in `roll_context`.
    pub fn covers(self, roll_context: RollContext) -> bool {
        self == Self::Any || self == roll_context
    }
}

/// What an instant "marks" modifier marks on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkTarget {
    /// Wound boxes.
    #[default]
    Hp,
    /// Stress boxes.
    Stress,
    /// Spent armor slots.
    Armor,
}

impl MarkTarget {
    /// The field path this target marks.
    pub fn path(self) -> &'static str {
        match self {
            Self::Hp => dh_core::fields::path::HP_VALUE,
            Self::Stress => dh_core::fields::path::STRESS_VALUE,
            Self::Armor => dh_core::fields::path::ARMOR_VALUE,
        }
    }
}

/// One typed modifier on a status definition.
///
/// Unrecognized type keys deserialize to [`ModifierInstance::Unknown`],
/// which is a persistent no-op, so malformed data never breaks a sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModifierInstance {
    /// Ongoing delta to a numeric field, from a formula.
    Attribute {
        /// Dotted field path the delta lands on.
        #[serde(default)]
        path: String,
        /// Formula text evaluated without dice.
        #[serde(default)]
        value: String,
    },
    /// One-shot delta to a numeric field, from a dice-capable formula.
    InstantAttribute {
        /// Dotted field path the delta lands on.
        #[serde(default)]
        path: String,
        /// Formula text; may roll dice.
        #[serde(default)]
        value: String,
    },
    /// Resistance, immunity, or vulnerability to a damage kind.
    Resilience {
        /// Which resilience entry this grants.
        #[serde(default = "default_resilience")]
        value: ResilienceKind,
    },
    /// Advantage or disadvantage on matching rolls.
    Advantage {
        /// Which side of the edge pool.
        #[serde(default)]
        edge: Edge,
        /// Which trait the edge applies to.
        #[serde(default, rename = "trait")]
        trait_scope: TraitScope,
        /// Which roll contexts the edge applies to.
        #[serde(default)]
        context: RollContext,
    },
    /// One-shot marking of wound/stress/armor boxes.
    Marks {
        /// What gets marked.
        #[serde(default)]
        target: MarkTarget,
        /// How many boxes, as a dice-capable formula.
        #[serde(default)]
        value: String,
    },
    /// An unrecognized modifier type; kept but contributes nothing.
    #[serde(other)]
    Unknown,
}

fn default_resilience() -> ResilienceKind {
    ResilienceKind::ResistPhy
}

impl ModifierInstance {
    /// The registry key for this modifier's type.
    pub fn type_key(&self) -> &'static str {
        match self {
            Self::Attribute { .. } => "attribute",
            Self::InstantAttribute { .. } => "instantAttribute",
            Self::Resilience { .. } => "resilience",
            Self::Advantage { .. } => "advantage",
            Self::Marks { .. } => "marks",
            Self::Unknown => "unknown",
        }
    }

    /// Persistent or instant.
    pub fn kind(&self) -> ModifierKind {
        match self {
            Self::InstantAttribute { .. } | Self::Marks { .. } => ModifierKind::Instant,
            _ => ModifierKind::Persistent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_serde_roundtrip() {
        let m = ModifierInstance::Attribute {
            path: "resources.hp.max".to_string(),
            value: "2+@Agility".to_string(),
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"type\":\"attribute\""));
        assert_eq!(serde_json::from_str::<ModifierInstance>(&json).unwrap(), m);
    }

    #[test]
    fn unknown_type_is_total() {
        let m: ModifierInstance =
            serde_json::from_value(serde_json::json!({"type": "wizardry"})).unwrap();
        assert_eq!(m, ModifierInstance::Unknown);
        assert_eq!(m.kind(), ModifierKind::Persistent);
    }

    #[test]
    fn kinds() {
        let attr = ModifierInstance::Attribute {
            path: String::new(),
            value: String::new(),
        };
        assert_eq!(attr.kind(), ModifierKind::Persistent);
        let marks = ModifierInstance::Marks {
            target: MarkTarget::Stress,
            value: "1".to_string(),
        };
        assert_eq!(marks.kind(), ModifierKind::Instant);
    }

    #[test]
    fn trait_scope_serde() {
        let all: TraitScope = serde_json::from_value(serde_json::json!("all")).unwrap();
        assert_eq!(all, TraitScope::All);
        let one: TraitScope = serde_json::from_value(serde_json::json!("agility")).unwrap();
        assert_eq!(one, TraitScope::Trait(TraitKey::Agility));
    }

    #[test]
    fn trait_scope_covers() {
        assert!(TraitScope::All.covers(None));
        assert!(TraitScope::All.covers(Some(TraitKey::Finesse)));
        assert!(TraitScope::Trait(TraitKey::Finesse).covers(Some(TraitKey::Finesse)));
        assert!(!TraitScope::Trait(TraitKey::Finesse).covers(Some(TraitKey::Agility)));
        assert!(!TraitScope::Trait(TraitKey::Finesse).covers(None));
    }

    #[test]
    fn resilience_parse() {
        assert_eq!(ResilienceKind::parse("resist_phy"), Some(ResilienceKind::ResistPhy));
        assert_eq!(ResilienceKind::parse("IMMUNE_MAG"), Some(ResilienceKind::ImmuneMag));
        assert_eq!(ResilienceKind::parse("soggy"), None);
    }
}

//! Built-in modifier handlers.
//!
//! Five kinds ship with the engine: `attribute` (persistent field
//! delta), `instantAttribute` (one-shot field delta), `resilience`
//! (damage multiplier flag), `advantage` (edge pool contribution), and
//! `marks` (one-shot box marking). Normalization is total throughout:
//! a formula field accepts a string or a bare number, and anything else
//! coerces to an inert default.

use dh_core::DiceRoller;
use dh_formula::{Scope, evaluate, evaluate_with_dice};
use serde_json::Value;

use crate::modifier::{
    DesiredMap, Edge, MarkTarget, ModifierHandler, ModifierInstance, ModifierKind,
    ModifierRegistry, ResilienceKind, RollContext, TraitScope,
};

/// Register every built-in handler. Called by
/// [`ModifierRegistry::with_builtins`]; keys are never empty, so the
/// registrations cannot fail.
pub fn register_all(registry: &mut ModifierRegistry) {
    let _ = registry.register("attribute", Box::new(AttributeHandler));
    let _ = registry.register("instantAttribute", Box::new(InstantAttributeHandler));
    let _ = registry.register("resilience", Box::new(ResilienceHandler));
    let _ = registry.register("advantage", Box::new(AdvantageHandler));
    let _ = registry.register("marks", Box::new(MarksHandler));
}

/// Read a string field, defaulting to empty.
fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Read a formula field: a string passes through, a bare number becomes
/// its text, anything else becomes `"0"`.
fn formula_field(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

/// Persistent numeric delta at a field path.
pub struct AttributeHandler;

impl ModifierHandler for AttributeHandler {
    fn label(&self) -> &'static str {
        "Attribute"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Persistent
    }

    fn normalize(&self, raw: &Value) -> ModifierInstance {
        ModifierInstance::Attribute {
            path: string_field(raw, "path"),
            value: formula_field(raw, "value"),
        }
    }

    fn format_value(&self, modifier: &ModifierInstance) -> String {
        match modifier {
            ModifierInstance::Attribute { path, value } => {
                format!("{path} {}", FormulaDisplay(value))
            }
            _ => String::new(),
        }
    }

    fn accumulate(&self, out: &mut DesiredMap, modifier: &ModifierInstance, scope: &dyn Scope) {
        if let ModifierInstance::Attribute { path, value } = modifier {
            if path.is_empty() {
                return;
            }
            *out.entry(path.clone()).or_insert(0) += evaluate(value, scope);
        }
    }
}

/// One-shot numeric delta at a field path; may roll dice.
pub struct InstantAttributeHandler;

impl ModifierHandler for InstantAttributeHandler {
    fn label(&self) -> &'static str {
        "Instant attribute"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Instant
    }

    fn normalize(&self, raw: &Value) -> ModifierInstance {
        ModifierInstance::InstantAttribute {
            path: string_field(raw, "path"),
            value: formula_field(raw, "value"),
        }
    }

    fn format_value(&self, modifier: &ModifierInstance) -> String {
        match modifier {
            ModifierInstance::InstantAttribute { path, value } => format!("{path} {value} (once)"),
            _ => String::new(),
        }
    }

    fn compute_instant(
        &self,
        modifier: &ModifierInstance,
        scope: &dyn Scope,
        roller: &mut dyn DiceRoller,
    ) -> Option<(String, i64)> {
        match modifier {
            ModifierInstance::InstantAttribute { path, value } if !path.is_empty() => {
                Some((path.clone(), evaluate_with_dice(value, scope, roller)))
            }
            _ => None,
        }
    }
}

/// Damage resistance/immunity/vulnerability flag. Carries no numeric
/// contribution; the damage engine scans for active instances.
pub struct ResilienceHandler;

impl ModifierHandler for ResilienceHandler {
    fn label(&self) -> &'static str {
        "Resilience"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Persistent
    }

    fn normalize(&self, raw: &Value) -> ModifierInstance {
        let value = raw
            .get("value")
            .and_then(|v| v.as_str())
            .and_then(ResilienceKind::parse)
            .unwrap_or(ResilienceKind::ResistPhy);
        ModifierInstance::Resilience { value }
    }

    fn format_value(&self, modifier: &ModifierInstance) -> String {
        match modifier {
            ModifierInstance::Resilience { value } => format!("{value:?}"),
            _ => String::new(),
        }
    }
}

/// Advantage/disadvantage flag. Carries no numeric contribution; the
/// roll resolver scans for active instances matching trait and context.
pub struct AdvantageHandler;

impl ModifierHandler for AdvantageHandler {
    fn label(&self) -> &'static str {
        "Advantage"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Persistent
    }

    fn normalize(&self, raw: &Value) -> ModifierInstance {
        let edge = raw
            .get("edge")
            .cloned()
            .and_then(|v| serde_json::from_value::<Edge>(v).ok())
            .unwrap_or_default();
        let trait_scope = raw
            .get("trait")
            .cloned()
            .and_then(|v| serde_json::from_value::<TraitScope>(v).ok())
            .unwrap_or_default();
        let context = raw
            .get("context")
            .cloned()
            .and_then(|v| serde_json::from_value::<RollContext>(v).ok())
            .unwrap_or_default();
        ModifierInstance::Advantage {
            edge,
            trait_scope,
            context,
        }
    }

    fn format_value(&self, modifier: &ModifierInstance) -> String {
        match modifier {
            ModifierInstance::Advantage {
                edge, trait_scope, ..
            } => format!("{edge:?} ({trait_scope:?})"),
            _ => String::new(),
        }
    }
}

/// One-shot marking of wound/stress/armor boxes; may roll dice.
pub struct MarksHandler;

impl ModifierHandler for MarksHandler {
    fn label(&self) -> &'static str {
        "Marks"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Instant
    }

    fn normalize(&self, raw: &Value) -> ModifierInstance {
        let target = raw
            .get("target")
            .cloned()
            .and_then(|v| serde_json::from_value::<MarkTarget>(v).ok())
            .unwrap_or_default();
        ModifierInstance::Marks {
            target,
            value: formula_field(raw, "value"),
        }
    }

    fn format_value(&self, modifier: &ModifierInstance) -> String {
        match modifier {
            ModifierInstance::Marks { target, value } => format!("mark {value} {target:?}"),
            _ => String::new(),
        }
    }

    fn compute_instant(
        &self,
        modifier: &ModifierInstance,
        scope: &dyn Scope,
        roller: &mut dyn DiceRoller,
    ) -> Option<(String, i64)> {
        match modifier {
            ModifierInstance::Marks { target, value } => Some((
                target.path().to_string(),
                evaluate_with_dice(value, scope, roller),
            )),
            _ => None,
        }
    }
}

/// Formula text shown with a leading sign when it is a plain number.
struct FormulaDisplay<'a>(&'a str);

impl std::fmt::Display for FormulaDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.trim().parse::<i64>() {
            Ok(n) => write!(f, "{n:+}"),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

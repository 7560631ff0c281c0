//! Roll resolution and damage mechanics for the Daggerheart rules
//! engine.
//!
//! The duality roll pits a Hope die against a Fear die; its outcome
//! drives resource side-effects that stay reconciled as a posted roll
//! is edited live. Damage resolution buckets raw damage into wound
//! severities against per-actor thresholds, with resistance multipliers,
//! an interactive armor negotiation for player targets, and an exact
//! undo stack. The spotlight turn order replaces rounds with a single
//! always-current combatant.

/// Damage and defense: severity ladder, resistance, negotiation, undo.
pub mod damage;
/// Duality and NPC roll execution and outcome classification.
pub mod duality;
/// Error types.
pub mod error;
/// Outcome resource effects and their live-edit reconciliation.
pub mod reconcile;
/// Persisted roll state and its interactive edits.
pub mod roll_state;
/// The spotlight turn order.
pub mod spotlight;

pub use damage::{
    DamageApplication, DamageOverride, DamageState, DamageTarget, DamageType, Resistance,
    Severity, Thresholds, apply_damage, resistance, severity,
};
pub use damage::negotiate::Negotiation;
pub use damage::undo::{UndoBatch, UndoEntry, UndoStack};
pub use duality::{RollInput, RollKind, RollOutcome, classify, roll_duality, roll_npc};
pub use error::{MechError, MechResult};
pub use reconcile::{AppliedOutcome, DeltaTarget, ResourceDelta, reconcile};
pub use roll_state::{DieSlot, Experience, ExtraDie, NamedDie, RollState, RollTarget};
pub use spotlight::{Combatant, Spotlight};

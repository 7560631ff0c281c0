//! Status effects for the Daggerheart rules engine.
//!
//! A status definition is a named bundle of typed modifiers owned by an
//! item or an actor. Persistent modifiers contribute ongoing numeric
//! deltas recomputed on every sync; instant modifiers fire once when
//! their status lands on an actor and the status is consumed. This crate
//! supplies the modifier registry, the status model and its migration,
//! the accumulation engine that computes desired totals, and the
//! snapshot-diff sync pass that reconciles actors with their sources.

/// Desired-map accumulation for items and actors.
pub mod accumulate;
/// Button-triggered status application to targets.
pub mod apply;
/// Error types.
pub mod error;
/// One-shot startup migration of persisted status data.
pub mod migrate;
/// Modifier instances, handlers, and the registry.
pub mod modifier;
/// Attribute-token resolution scopes over actors.
pub mod scope;
/// Status definitions and their normalization.
pub mod status;
/// Snapshot reconciliation, reentrancy guard, and debounce.
pub mod sync;

pub use accumulate::{ActorPlan, actor_plan, item_desired_map, status_edge_counts};
pub use apply::{apply_status, remove_applied};
pub use error::{StatusError, StatusResult};
pub use modifier::{
    DesiredMap, Edge, MarkTarget, ModifierHandler, ModifierInstance, ModifierKind,
    ModifierRegistry, ResilienceKind, RollContext, TraitScope,
};
pub use scope::{ActorScope, LabelIndex};
pub use status::{
    ActivationWhen, StatusContext, StatusDefinition, StatusId, StatusSource, applied_statuses,
    item_statuses, local_statuses,
};
pub use sync::{Debouncer, SyncGuard, SyncOutcome, SyncReport, sync_actor, sync_item};

//! Resource reconciliation for posted rolls.
//!
//! Outcome effects: Hope gains the actor 1 Hope (clamped to its max);
//! Fear raises the shared Fear counter by 1 (clamped to its max);
//! Critical gains 1 Hope and clears 1 Stress (floored at 0). Every
//! committed effect is recorded as literal deltas, and a later edit
//! that changes the outcome reverses those recorded deltas exactly
//! (never a recomputation) before applying the new outcome's. All
//! writes go through the privileged mutation gate, since the acting
//! session may not own the resource (the Fear counter never belongs to
//! a player).

use dh_core::{ActorId, Mutation, Session, Table, fields::path};
use serde::{Deserialize, Serialize};

use crate::duality::RollOutcome;
use crate::error::MechResult;
use crate::roll_state::RollState;

/// Where a recorded delta landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaTarget {
    /// A numeric field on an actor.
    Field {
        /// The actor written.
        actor: ActorId,
        /// Dotted field path.
        path: String,
    },
    /// The shared Fear counter.
    Fear,
}

/// One literal committed delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDelta {
    /// Where the delta landed.
    pub target: DeltaTarget,
    /// The amount actually applied (post-clamp).
    pub amount: i64,
}

/// The outcome last committed for a roll, with its exact deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedOutcome {
    /// Which outcome was committed.
    pub outcome: RollOutcome,
    /// The literal deltas, for exact reversal.
    pub deltas: Vec<ResourceDelta>,
}

/// Commit an outcome's resource effects, recording what was applied.
pub fn apply_outcome(
    session: &Session,
    table: &mut Table,
    actor_id: ActorId,
    outcome: RollOutcome,
) -> MechResult<AppliedOutcome> {
    let mut deltas = Vec::new();
    match outcome {
        RollOutcome::Hope => {
            push_clamped_field(session, table, actor_id, path::HOPE_VALUE, 1, &mut deltas)?;
        }
        RollOutcome::Fear => {
            let applied = session.execute(table, Mutation::AdjustFear { delta: 1 })?;
            if applied != 0 {
                deltas.push(ResourceDelta {
                    target: DeltaTarget::Fear,
                    amount: applied,
                });
            }
        }
        RollOutcome::Critical => {
            push_clamped_field(session, table, actor_id, path::HOPE_VALUE, 1, &mut deltas)?;
            push_clamped_field(session, table, actor_id, path::STRESS_VALUE, -1, &mut deltas)?;
        }
    }
    Ok(AppliedOutcome { outcome, deltas })
}

/// Reverse previously-recorded deltas exactly.
pub fn reverse_outcome(
    session: &Session,
    table: &mut Table,
    applied: &AppliedOutcome,
) -> MechResult<()> {
    for delta in &applied.deltas {
        match &delta.target {
            DeltaTarget::Field { actor, path } => {
                session.execute(
                    table,
                    Mutation::AdjustField {
                        actor: *actor,
                        path: path.clone(),
                        delta: -delta.amount,
                    },
                )?;
            }
            DeltaTarget::Fear => {
                session.execute(table, Mutation::AdjustFear { delta: -delta.amount })?;
            }
        }
    }
    Ok(())
}

/// Reconcile a roll's resource effects with its current outcome.
///
/// No-op when the outcome matches what was last applied. Otherwise the
/// recorded deltas are reversed first, then the new outcome (if any)
/// is applied and recorded as the new baseline. Idempotent: calling
/// twice in a row changes nothing the second time.
pub fn reconcile(session: &Session, table: &mut Table, state: &mut RollState) -> MechResult<()> {
    let outcome = state.outcome();
    if state.applied.as_ref().map(|a| a.outcome) == outcome {
        return Ok(());
    }
    if let Some(previous) = state.applied.take() {
        reverse_outcome(session, table, &previous)?;
    }
    if let Some(outcome) = outcome {
        state.applied = Some(apply_outcome(session, table, state.actor, outcome)?);
    }
    Ok(())
}

/// Apply a field delta clamped to `0..=max` (reading the sibling `max`
/// path), through the privileged gate, recording the applied amount.
fn push_clamped_field(
    session: &Session,
    table: &mut Table,
    actor_id: ActorId,
    value_path: &str,
    delta: i64,
    deltas: &mut Vec<ResourceDelta>,
) -> MechResult<()> {
    let actor = table.require_actor(actor_id)?;
    let current = actor.fields.get(value_path);
    let max_path = value_path.replace(".value", ".max");
    let max = actor.fields.get(&max_path);
    let applied = (current + delta).clamp(0, max.max(0)) - current;
    if applied == 0 {
        return Ok(());
    }
    session.execute(
        table,
        Mutation::AdjustField {
            actor: actor_id,
            path: value_path.to_string(),
            delta: applied,
        },
    )?;
    deltas.push(ResourceDelta {
        target: DeltaTarget::Field {
            actor: actor_id,
            path: value_path.to_string(),
        },
        amount: applied,
    });
    Ok(())
}

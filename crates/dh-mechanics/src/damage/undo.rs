//! Exact undo for committed damage.
//!
//! Every commit records the literal deltas it wrote per actor. Undo
//! pops the most recent batch and reverses each recorded delta, never
//! recomputing from the formula, so an undo after intervening edits
//! still removes exactly what the commit added. Reversal floors each
//! field at zero.

use dh_core::{ActorId, Mutation, Session, Table, fields::path};
use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};

/// The literal deltas one commit wrote to one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    /// The actor written.
    pub actor: ActorId,
    /// Wounds marked (HP delta).
    pub hp: i64,
    /// Stress marked.
    pub stress: i64,
    /// Armor slots consumed.
    pub armor: i64,
}

impl UndoEntry {
    /// Whether the commit wrote nothing.
    pub fn is_noop(&self) -> bool {
        self.hp == 0 && self.stress == 0 && self.armor == 0
    }
}

/// All deltas from one damage application, undone as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoBatch {
    /// Per-actor deltas.
    pub entries: Vec<UndoEntry>,
}

impl UndoBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one actor's deltas.
    pub fn push(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A LIFO stack of committed damage batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoStack {
    batches: Vec<UndoBatch>,
}

impl UndoStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a committed batch. Empty batches are dropped.
    pub fn push(&mut self, batch: UndoBatch) {
        if !batch.is_empty() {
            self.batches.push(batch);
        }
    }

    /// Number of undoable batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Reverse the most recent batch and return it.
    ///
    /// Each recorded delta is subtracted back off its field, floored
    /// at zero. Actors deleted since the commit are skipped rather
    /// than failing the whole undo.
    pub fn undo(&mut self, session: &Session, table: &mut Table) -> MechResult<UndoBatch> {
        let batch = self.batches.pop().ok_or(MechError::NothingToUndo)?;
        for entry in &batch.entries {
            let Some(actor) = table.actor(entry.actor) else {
                continue;
            };
            let mut deltas = Vec::new();
            for (field, recorded) in [
                (path::HP_VALUE, entry.hp),
                (path::STRESS_VALUE, entry.stress),
                (path::ARMOR_VALUE, entry.armor),
            ] {
                if recorded == 0 {
                    continue;
                }
                let current = actor.fields.get(field);
                let reverted = (current - recorded).max(0);
                if reverted != current {
                    deltas.push((field, reverted - current));
                }
            }
            for (field, delta) in deltas {
                session.execute(
                    table,
                    Mutation::AdjustField {
                        actor: entry.actor,
                        path: field.to_string(),
                        delta,
                    },
                )?;
            }
        }
        Ok(batch)
    }
}

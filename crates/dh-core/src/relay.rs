//! The privileged mutation gate.
//!
//! Certain writes (the shared Fear counter, resources on actors a
//! session does not own, item transfer) may only be executed by a
//! gamemaster session. Non-privileged callers hold the same API but get
//! `PermissionDenied`; a host would route such calls through its relay to
//! a privileged session and hand back the result. Reads are unrestricted.

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::error::{CoreError, CoreResult};
use crate::item::ItemId;
use crate::table::Table;

/// The privilege level of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May mutate anything directly.
    Gamemaster,
    /// May mutate only owned actors; everything else must relay.
    Player,
}

/// A connected session: its role and the actors it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Privilege level.
    pub role: Role,
    /// Actors this session owns (write access without relaying).
    pub owned: Vec<ActorId>,
}

impl Session {
    /// A gamemaster session.
    pub fn gamemaster() -> Self {
        Self {
            role: Role::Gamemaster,
            owned: Vec::new(),
        }
    }

    /// A player session owning the given actors.
    pub fn player(owned: impl IntoIterator<Item = ActorId>) -> Self {
        Self {
            role: Role::Player,
            owned: owned.into_iter().collect(),
        }
    }

    /// Returns true for a gamemaster session.
    pub fn is_gamemaster(&self) -> bool {
        self.role == Role::Gamemaster
    }

    /// Returns true if this session may write the given actor directly.
    pub fn can_write(&self, actor: ActorId) -> bool {
        self.is_gamemaster() || self.owned.contains(&actor)
    }

    /// Error unless this is a gamemaster session.
    pub fn require_gamemaster(&self, what: &str) -> CoreResult<()> {
        if self.is_gamemaster() {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied(what.to_string()))
        }
    }

    /// Execute a privileged mutation. Returns the delta actually applied
    /// for resource adjustments (0 for transfers).
    ///
    /// The mutation either completes or leaves no partial state; item
    /// transfer rolls back its first half if the second fails.
    pub fn execute(&self, table: &mut Table, mutation: Mutation) -> CoreResult<i64> {
        match mutation {
            Mutation::AdjustField { actor, path, delta } => {
                if !self.can_write(actor) {
                    return Err(CoreError::PermissionDenied(format!(
                        "adjust {path} on {actor}"
                    )));
                }
                let doc = table.require_actor_mut(actor)?;
                doc.fields.add(&path, delta);
                Ok(delta)
            }
            Mutation::AdjustFear { delta } => {
                self.require_gamemaster("adjust the Fear counter")?;
                Ok(table.fear.adjust(delta))
            }
            Mutation::TransferItem { from, to, item } => {
                self.require_gamemaster("transfer an item")?;
                transfer_item(table, from, to, item)?;
                Ok(0)
            }
        }
    }
}

/// A mutation routed through the privileged gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Mutation {
    /// Read-then-add a numeric field on an actor.
    AdjustField {
        /// Target actor.
        actor: ActorId,
        /// Dotted field path.
        path: String,
        /// Signed delta.
        delta: i64,
    },
    /// Adjust the shared Fear counter, clamped to its range.
    AdjustFear {
        /// Signed delta.
        delta: i64,
    },
    /// Move an item from one actor to another.
    TransferItem {
        /// Source actor.
        from: ActorId,
        /// Destination actor.
        to: ActorId,
        /// Item to move.
        item: ItemId,
    },
}

/// Move an item between actors. Each half is validated; if adding to the
/// destination fails after removal from the source succeeded, the item is
/// put back and the error reports the rollback.
fn transfer_item(table: &mut Table, from: ActorId, to: ActorId, item: ItemId) -> CoreResult<()> {
    table.require_actor(to)?;
    let source = table.require_actor_mut(from)?;
    let pos = source
        .items
        .iter()
        .position(|i| i.id == item)
        .ok_or(CoreError::ItemNotFound(item))?;
    let moved = source.items.remove(pos);

    match table.actor_mut(to) {
        Some(dest) => {
            dest.items.push(moved);
            Ok(())
        }
        None => {
            // Destination vanished between validation and insert; restore.
            if let Some(source) = table.actor_mut(from) {
                source.items.push(moved);
            }
            Err(CoreError::RolledBack(format!(
                "destination actor {to} disappeared during transfer"
            )))
        }
    }
}

//! The spotlight turn order.
//!
//! There are no rounds and no initiative scores: at most one combatant
//! holds the spotlight at a time. The gamemaster moves it freely;
//! players ask for it, and the gamemaster approves or denies each
//! request. Requests are kept in arrival order and deduplicated.

use dh_core::{Actor, ActorId, Session};
use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};

/// One participant in the turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    /// The actor.
    pub actor: ActorId,
    /// Display name captured when added.
    pub name: String,
}

/// The spotlight state for one encounter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spotlight {
    combatants: Vec<Combatant>,
    current: Option<ActorId>,
    requests: Vec<ActorId>,
}

impl Spotlight {
    /// An empty encounter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an actor to the turn order. Re-adding is a no-op.
    pub fn add_combatant(&mut self, actor: &Actor) {
        if !self.is_combatant(actor.id) {
            self.combatants.push(Combatant {
                actor: actor.id,
                name: actor.name.clone(),
            });
        }
    }

    /// Remove an actor from the turn order, dropping its pending
    /// request and releasing the spotlight if it held it.
    pub fn remove_combatant(&mut self, actor: ActorId) {
        self.combatants.retain(|c| c.actor != actor);
        self.requests.retain(|&r| r != actor);
        if self.current == Some(actor) {
            self.current = None;
        }
    }

    /// The combatants in the turn order.
    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    /// Whether an actor is in the turn order.
    pub fn is_combatant(&self, actor: ActorId) -> bool {
        self.combatants.iter().any(|c| c.actor == actor)
    }

    /// Who currently holds the spotlight, if anyone.
    pub fn current(&self) -> Option<ActorId> {
        self.current
    }

    /// Pending spotlight requests, oldest first.
    pub fn pending(&self) -> &[ActorId] {
        &self.requests
    }

    /// Move the spotlight directly. Gamemaster only.
    pub fn set_spotlight(&mut self, session: &Session, actor: ActorId) -> MechResult<()> {
        session.require_gamemaster("move the spotlight")?;
        if !self.is_combatant(actor) {
            return Err(MechError::NotACombatant(actor));
        }
        self.current = Some(actor);
        self.requests.retain(|&r| r != actor);
        Ok(())
    }

    /// Clear the spotlight. Gamemaster only.
    pub fn clear_spotlight(&mut self, session: &Session) -> MechResult<()> {
        session.require_gamemaster("clear the spotlight")?;
        self.current = None;
        Ok(())
    }

    /// Queue a request for the spotlight. Duplicate requests from the
    /// same actor collapse into one.
    pub fn request(&mut self, actor: ActorId) -> MechResult<()> {
        if !self.is_combatant(actor) {
            return Err(MechError::NotACombatant(actor));
        }
        if !self.requests.contains(&actor) {
            self.requests.push(actor);
        }
        Ok(())
    }

    /// Approve a pending request: the spotlight moves to the requester
    /// and the request is cleared. Gamemaster only.
    pub fn approve(&mut self, session: &Session, actor: ActorId) -> MechResult<()> {
        session.require_gamemaster("approve a spotlight request")?;
        if !self.requests.contains(&actor) {
            return Err(MechError::NoPendingRequest(actor));
        }
        self.requests.retain(|&r| r != actor);
        self.current = Some(actor);
        Ok(())
    }

    /// Deny a pending request, leaving the spotlight where it is.
    /// Gamemaster only.
    pub fn deny(&mut self, session: &Session, actor: ActorId) -> MechResult<()> {
        session.require_gamemaster("deny a spotlight request")?;
        if !self.requests.contains(&actor) {
            return Err(MechError::NoPendingRequest(actor));
        }
        self.requests.retain(|&r| r != actor);
        Ok(())
    }
}

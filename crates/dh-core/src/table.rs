//! The session table.
//!
//! Owns every actor in the session plus the single shared Fear counter.
//! Actor lookup is by ID or case-insensitive name, mirroring how the
//! host resolves document references.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId};
use crate::error::{CoreError, CoreResult};
use crate::track::Track;

/// Default Fear capacity.
pub const DEFAULT_FEAR_MAX: i64 = 12;

/// The session state: all actors and the shared Fear counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    actors: HashMap<ActorId, Actor>,
    by_name_lower: HashMap<String, ActorId>,
    /// The shared Fear counter, writable only through a privileged session.
    pub fear: Track,
}

impl Table {
    /// Create an empty table with the default Fear capacity.
    pub fn new() -> Self {
        Self::with_fear_max(DEFAULT_FEAR_MAX)
    }

    /// Create an empty table with a configured Fear capacity.
    pub fn with_fear_max(max: i64) -> Self {
        Self {
            actors: HashMap::new(),
            by_name_lower: HashMap::new(),
            fear: Track::new("Fear", max),
        }
    }

    /// Add an actor. Returns its ID, or an error on a duplicate name.
    pub fn add_actor(&mut self, actor: Actor) -> CoreResult<ActorId> {
        let name_lower = actor.name.to_lowercase();
        if self.by_name_lower.contains_key(&name_lower) {
            return Err(CoreError::DuplicateName(actor.name.clone()));
        }
        let id = actor.id;
        self.by_name_lower.insert(name_lower, id);
        self.actors.insert(id, actor);
        Ok(id)
    }

    /// Get an actor by ID.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Get an actor by ID, mutably.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Get an actor by ID or error with `ActorNotFound`.
    pub fn require_actor(&self, id: ActorId) -> CoreResult<&Actor> {
        self.actor(id).ok_or(CoreError::ActorNotFound(id))
    }

    /// Get an actor by ID mutably or error with `ActorNotFound`.
    pub fn require_actor_mut(&mut self, id: ActorId) -> CoreResult<&mut Actor> {
        self.actors
            .get_mut(&id)
            .ok_or(CoreError::ActorNotFound(id))
    }

    /// Find an actor by name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&Actor> {
        self.by_name_lower
            .get(&name.to_lowercase())
            .and_then(|id| self.actors.get(id))
    }

    /// Remove an actor, returning it.
    pub fn remove_actor(&mut self, id: ActorId) -> CoreResult<Actor> {
        let actor = self.actors.remove(&id).ok_or(CoreError::ActorNotFound(id))?;
        self.by_name_lower.remove(&actor.name.to_lowercase());
        Ok(actor)
    }

    /// Iterate over all actors.
    pub fn all_actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Iterate over all actors, mutably.
    pub fn all_actors_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.values_mut()
    }

    /// Number of actors on the table.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

use dh_core::CoreError;

use crate::roll_state::DieSlot;

/// Alias for `Result<T, MechError>`.
pub type MechResult<T> = Result<T, MechError>;

/// Errors surfaced by roll and damage mechanics.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// A document or permission precondition failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An interactive edit referenced a die slot the roll does not have.
    #[error("no die in slot {0}")]
    UnknownDie(DieSlot),

    /// An interactive edit referenced a missing ad-hoc die.
    #[error("no extra die at index {0}")]
    UnknownExtraDie(usize),

    /// Armor can never be spent against direct damage.
    #[error("armor cannot be spent against direct damage")]
    ArmorAgainstDirect,

    /// Every allowed armor spend has been used.
    #[error("armor spend limit reached")]
    ArmorLimit,

    /// The referenced actor is not part of the turn order.
    #[error("not a combatant: {0}")]
    NotACombatant(dh_core::ActorId),

    /// No spotlight request is pending for the actor.
    #[error("no pending spotlight request for {0}")]
    NoPendingRequest(dh_core::ActorId),

    /// The undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,
}

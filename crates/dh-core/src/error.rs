use crate::actor::ActorId;
use crate::item::ItemId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by the engine.
///
/// Formula evaluation is deliberately absent here: malformed formulas
/// evaluate to 0 rather than erroring. Only explicit precondition and
/// permission checks produce a `CoreError`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested actor does not exist on the table.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// The requested item does not exist on the actor.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// A status could not be found by id or name.
    #[error("status not found: \"{0}\"")]
    StatusNotFound(String),

    /// An actor with the same name already exists on the table.
    #[error("actor already exists: \"{0}\"")]
    DuplicateName(String),

    /// The session lacks the permission for the attempted mutation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A resource deduction was refused rather than clamped.
    #[error("insufficient {resource}: need {needed}, have {available}")]
    InsufficientResource {
        /// Name of the refused resource.
        resource: String,
        /// Amount the operation required.
        needed: i64,
        /// Amount actually available.
        available: i64,
    },

    /// An operation that needs at least one target was given none.
    #[error("no targets selected")]
    NoTargets,

    /// A reference (uuid, name) could not be resolved.
    #[error("unresolvable reference: {0}")]
    MissingReference(String),

    /// A multi-step operation failed partway; already-completed steps
    /// were rolled back best-effort.
    #[error("operation failed and was rolled back: {0}")]
    RolledBack(String),
}

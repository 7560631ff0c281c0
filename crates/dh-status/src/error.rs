use dh_core::CoreError;

/// Alias for `Result<T, StatusError>`.
pub type StatusResult<T> = Result<T, StatusError>;

/// Errors surfaced by the status engine.
///
/// Formula and normalization failures never appear here: malformed
/// modifier data coerces to safe defaults and malformed formulas
/// evaluate to 0.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// A modifier type was registered under an empty key.
    #[error("modifier type key must not be empty")]
    EmptyTypeKey,

    /// A document or permission precondition failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

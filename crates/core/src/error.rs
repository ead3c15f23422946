use crate::status::ProductionStatus;
use crate::types::DbId;

/// Domain-level error type shared across the workspace.
///
/// Local domain errors (validation, not-found, precondition, conflict)
/// propagate to the caller as typed failures. Failures of outbound
/// platform calls never surface here — they are caught and logged at the
/// engine boundary.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Entity not found: {entity} with scan token {token}")]
    TokenNotFound { entity: &'static str, token: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A state-machine guard rejected a transition. Carries the unit's
    /// current status so callers can tell "wrong stage" apart from
    /// "already done" (the latter is reported as a success outcome, not
    /// an error).
    #[error("Precondition failed: requires {expected}, current status is {current}")]
    Precondition {
        expected: String,
        current: ProductionStatus,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

use crate::rights::AccessRank;

/// Error taxonomy shared by both workflows.
///
/// Business-rule failures inside transfer steps (empty tooling, BOM
/// mismatches) are *not* represented here: they are recorded in the
/// session ledger as step outcomes and surfaced to the caller as data.
/// This enum covers failures that stop the requested operation.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The actor's computed rank is below what the transition requires.
    #[error("Insufficient rights: {required} required, actor holds {actual}")]
    InsufficientRights {
        required: AccessRank,
        actual: AccessRank,
    },

    /// The re-authentication factor at the approval step was rejected.
    #[error("Re-authentication failed")]
    AuthenticationFailed,

    /// A referenced document, entity, or session is absent.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// An input or precondition check failed with no recovery path.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The underlying store failed. The current step halts; the session
    /// is left open for retry or explicit abort.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Idempotency guard: the session has already been completed.
    #[error("Transfer session is already completed")]
    AlreadyCompleted,

    /// Idempotency guard: the session has already been aborted.
    #[error("Transfer session is already aborted")]
    AlreadyAborted,
}

impl WorkflowError {
    /// Shorthand for a [`WorkflowError::NotFound`] with any id type.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        WorkflowError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True for failures of the business rules rather than the
    /// infrastructure. Saga steps recover these into the ledger; only
    /// persistence failures propagate out of a step.
    pub fn is_business(&self) -> bool {
        !matches!(self, WorkflowError::Persistence(_))
    }
}

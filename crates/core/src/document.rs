//! Document lifecycle states.
//!
//! A logical document is identified by its `name`; multiple rows may share
//! a name, one per lifecycle state. "Editing" is virtual — it is the
//! absence of a Seeking or Approved row — so it has no stored variant.
//! The store enforces at most one Approved and at most one Seeking row
//! per name with partial unique indexes.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Stored lifecycle state of a document row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Submitted and awaiting an approver's decision.
    Seeking,
    /// The single signed-off revision for its name.
    Approved,
    /// A superseded revision, kept for history.
    Obsolete,
}

impl DocumentState {
    /// Stable TEXT representation used in the `documents.state` column.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentState::Seeking => "seeking",
            DocumentState::Approved => "approved",
            DocumentState::Obsolete => "obsolete",
        }
    }

    /// Parse the stored TEXT representation.
    pub fn parse(value: &str) -> Result<Self, WorkflowError> {
        match value {
            "seeking" => Ok(DocumentState::Seeking),
            "approved" => Ok(DocumentState::Approved),
            "obsolete" => Ok(DocumentState::Obsolete),
            other => Err(WorkflowError::Validation(format!(
                "Unknown document state: '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

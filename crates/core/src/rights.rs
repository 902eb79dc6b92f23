//! Access-rank computation for gated document transitions.
//!
//! Rights are never persisted: a rank is computed per request from the
//! actor's capability and role memberships against the document's
//! configured [`AccessPolicy`]. Absence of proof always yields
//! [`AccessRank::None`] (fail closed).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::types::DbId;

/// Three-level capability outcome computed per actor per document.
///
/// Ordered so that rank checks read as comparisons
/// (`rank >= AccessRank::Edit`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessRank {
    /// No access to gated transitions.
    None = 0,
    /// May submit a revision for approval.
    Edit = 1,
    /// May approve or reject a pending revision.
    Approve = 2,
}

impl std::fmt::Display for AccessRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccessRank::None => "none",
            AccessRank::Edit => "edit",
            AccessRank::Approve => "approve",
        };
        f.write_str(s)
    }
}

/// The capability and role sets that grant each rank for a document class.
///
/// Edit rank is granted by membership in *any* edit capability or edit
/// role; Approve likewise. Ownership of the currently-approved document
/// also grants Approve, but that override is applied by the approval
/// workflow itself since it requires a document lookup.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    pub edit_capabilities: Vec<String>,
    pub edit_roles: Vec<String>,
    pub approve_capabilities: Vec<String>,
    pub approve_roles: Vec<String>,
}

/// Compute the rank granted by capability/role membership alone.
///
/// Approve implies Edit: an approver may also submit revisions.
pub fn rank_from_membership(
    capabilities: &[String],
    roles: &[String],
    policy: &AccessPolicy,
) -> AccessRank {
    if contains_any(capabilities, &policy.approve_capabilities)
        || contains_any(roles, &policy.approve_roles)
    {
        return AccessRank::Approve;
    }
    if contains_any(capabilities, &policy.edit_capabilities)
        || contains_any(roles, &policy.edit_roles)
    {
        return AccessRank::Edit;
    }
    AccessRank::None
}

fn contains_any(held: &[String], granted: &[String]) -> bool {
    held.iter().any(|h| granted.iter().any(|g| g == h))
}

/// External collaborator: resolves an actor's rank against a policy.
///
/// The Postgres-backed implementation looks up the actor's capability and
/// role memberships and delegates to [`rank_from_membership`].
#[async_trait]
pub trait AccessRightsResolver: Send + Sync {
    async fn resolve(
        &self,
        actor_id: DbId,
        policy: &AccessPolicy,
    ) -> Result<AccessRank, WorkflowError>;
}

//! Document approval state machine.
//!
//! A logical document moves Editing -> Seeking -> Approved, with
//! superseded revisions parked as Obsolete. "Editing" is the absence of
//! a Seeking row, so the machine has exactly three gated transitions:
//! submit (requires Edit rank), approve (requires Approve rank plus
//! password re-authentication), and reject (requires Approve rank).
//!
//! Rights are resolved live at each call. Ownership of the currently
//! approved revision also grants Approve rank, since the owner is the
//! one accountable for the content being superseded.

use tracing::{info, warn};

use cellworks_core::document::DocumentState;
use cellworks_core::error::WorkflowError;
use cellworks_core::notify::{Notification, Notifier};
use cellworks_core::password::CredentialVerifier;
use cellworks_core::rights::{AccessPolicy, AccessRank, AccessRightsResolver};
use cellworks_core::store::{DocumentStore, SafetyWorkflow};
use cellworks_core::types::DbId;

use async_trait::async_trait;

/// The approval workflow for one document class.
///
/// `policy` names the capability and role sets that grant Edit and
/// Approve rank for this class; `review_url` is the base link embedded
/// in approver notifications.
pub struct ApprovalWorkflow<S, R, V, N> {
    store: S,
    rights: R,
    verifier: V,
    notifier: N,
    policy: AccessPolicy,
    review_url: String,
}

impl<S, R, V, N> ApprovalWorkflow<S, R, V, N>
where
    S: DocumentStore,
    R: AccessRightsResolver,
    V: CredentialVerifier,
    N: Notifier,
{
    pub fn new(
        store: S,
        rights: R,
        verifier: V,
        notifier: N,
        policy: AccessPolicy,
        review_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            rights,
            verifier,
            notifier,
            policy,
            review_url: review_url.into(),
        }
    }

    /// Resolve the actor's rank for a document name.
    ///
    /// Membership rank is upgraded to Approve when the actor owns the
    /// currently approved revision of this name.
    pub async fn rank_for(
        &self,
        actor_id: DbId,
        name: &str,
    ) -> Result<AccessRank, WorkflowError> {
        let rank = self.rights.resolve(actor_id, &self.policy).await?;
        if rank >= AccessRank::Approve {
            return Ok(rank);
        }
        if let Some(approved) = self.store.find_approved(name).await? {
            if approved.owner_id == actor_id {
                return Ok(AccessRank::Approve);
            }
        }
        Ok(rank)
    }

    /// Submit a revision for approval: Editing -> Seeking.
    ///
    /// Refused while another revision of the same name is pending.
    /// Approvers are notified best-effort; delivery failure never undoes
    /// the submission.
    pub async fn submit_for_approval(
        &self,
        actor_id: DbId,
        name: &str,
        body: &str,
    ) -> Result<DbId, WorkflowError> {
        let rank = self.rank_for(actor_id, name).await?;
        if rank < AccessRank::Edit {
            return Err(WorkflowError::InsufficientRights {
                required: AccessRank::Edit,
                actual: rank,
            });
        }
        if self.store.find_seeking(name).await?.is_some() {
            return Err(WorkflowError::Validation(format!(
                "Document '{name}' already has a revision awaiting approval"
            )));
        }

        let pending_id = self.store.insert_seeking(name, body, actor_id).await?;
        info!(document = name, pending_id, actor_id, "Revision submitted for approval");

        let subject = format!("Approval requested: {name}");
        let body = format!(
            "A revision of '{name}' is awaiting approval.\n\nReview it at {}/{pending_id}",
            self.review_url
        );
        for capability in &self.policy.approve_capabilities {
            let notification = Notification::new(subject.as_str(), body.as_str(), capability.as_str());
            if let Err(err) = self.notifier.notify(&notification).await {
                warn!(document = name, %err, "Approver notification failed");
            }
        }
        Ok(pending_id)
    }

    /// Approve a pending revision: Seeking -> Approved, obsoleting the
    /// previous Approved revision of the same name.
    ///
    /// Rights are checked before the password so a caller without
    /// Approve rank learns nothing about credential validity. The
    /// approver re-authenticates even with a valid session.
    pub async fn approve(
        &self,
        actor_id: DbId,
        pending_id: DbId,
        password: &str,
    ) -> Result<(), WorkflowError> {
        let doc = self
            .store
            .find_by_id(pending_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("document", pending_id))?;
        if doc.state != DocumentState::Seeking {
            return Err(WorkflowError::not_found("pending document", pending_id));
        }

        let rank = self.rank_for(actor_id, &doc.name).await?;
        if rank < AccessRank::Approve {
            return Err(WorkflowError::InsufficientRights {
                required: AccessRank::Approve,
                actual: rank,
            });
        }
        if !self.verifier.verify_password(actor_id, password).await? {
            warn!(document = %doc.name, actor_id, "Approval re-authentication rejected");
            return Err(WorkflowError::AuthenticationFailed);
        }

        self.store.promote(pending_id, &doc.name, actor_id).await?;
        info!(document = %doc.name, pending_id, approver_id = actor_id, "Revision approved");
        Ok(())
    }

    /// Reject a pending revision: Seeking -> Editing (the row is
    /// discarded, not kept as history).
    pub async fn reject(&self, actor_id: DbId, pending_id: DbId) -> Result<(), WorkflowError> {
        let doc = self
            .store
            .find_by_id(pending_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("document", pending_id))?;
        if doc.state != DocumentState::Seeking {
            return Err(WorkflowError::not_found("pending document", pending_id));
        }

        let rank = self.rank_for(actor_id, &doc.name).await?;
        if rank < AccessRank::Approve {
            return Err(WorkflowError::InsufficientRights {
                required: AccessRank::Approve,
                actual: rank,
            });
        }

        self.store.delete_pending(pending_id).await?;
        info!(document = %doc.name, pending_id, actor_id, "Revision rejected");

        let subject = format!("Revision rejected: {}", doc.name);
        let body = format!("The pending revision of '{}' was rejected.", doc.name);
        for capability in &self.policy.edit_capabilities {
            let notification = Notification::new(subject.as_str(), body.as_str(), capability.as_str());
            if let Err(err) = self.notifier.notify(&notification).await {
                warn!(document = %doc.name, %err, "Rejection notification failed");
            }
        }
        Ok(())
    }
}

/// The transfer saga resubmits safety documents through the same
/// approval machine it gates everything else with.
#[async_trait]
impl<S, R, V, N> SafetyWorkflow for ApprovalWorkflow<S, R, V, N>
where
    S: DocumentStore,
    R: AccessRightsResolver,
    V: CredentialVerifier,
    N: Notifier,
{
    async fn approved_body(&self, cell_name: &str) -> Result<Option<String>, WorkflowError> {
        let approved = self.store.find_approved(cell_name).await?;
        Ok(approved.map(|doc| doc.body))
    }

    async fn submit_for_approval(
        &self,
        actor_id: DbId,
        name: &str,
        body: &str,
    ) -> Result<DbId, WorkflowError> {
        ApprovalWorkflow::submit_for_approval(self, actor_id, name, body).await
    }
}

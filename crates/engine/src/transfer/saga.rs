//! The four-step cell transfer saga.
//!
//! Steps run in mandatory order: create the target cell, copy its
//! tooling, resubmit the source's safety document for approval, copy
//! BOM-validated material. Every outcome is written to the durable
//! session ledger before the call returns, so the caller can observe
//! partial progress and a restarted process can resume.
//!
//! Error handling splits two ways. Business-rule failures inside a step
//! (missing rights for the safety resubmission, BOM mismatches) are
//! recorded in the ledger and the step call returns `Ok` — the operator
//! reads the outcome and decides. Persistence failures are recorded and
//! also returned, leaving the session open for retry or explicit abort.

use tracing::{info, warn};

use cellworks_core::error::WorkflowError;
use cellworks_core::ledger::{
    SessionStatus, TransferSession, TransferStep, TransferSummary, NOTE_NO_SAFETY_DOCUMENT,
    NOTE_NO_TOOLS,
};
use cellworks_core::notify::{Notification, Notifier};
use cellworks_core::store::{SafetyWorkflow, SessionStore, TransferStore};
use cellworks_core::types::DbId;
use cellworks_core::validation::{check_material_line, TransferRequest};

/// Orchestrates one cell transfer against the collaborator seams.
pub struct TransferSaga<T, L, W, N> {
    pub(crate) cells: T,
    pub(crate) sessions: L,
    safety: W,
    notifier: N,
    /// Capability whose holders receive the completion report.
    report_capability: String,
}

impl<T, L, W, N> TransferSaga<T, L, W, N>
where
    T: TransferStore,
    L: SessionStore,
    W: SafetyWorkflow,
    N: Notifier,
{
    pub fn new(
        cells: T,
        sessions: L,
        safety: W,
        notifier: N,
        report_capability: impl Into<String>,
    ) -> Self {
        Self {
            cells,
            sessions,
            safety,
            notifier,
            report_capability: report_capability.into(),
        }
    }

    /// Open a session for a single-cell transfer and run the create
    /// step.
    ///
    /// On create failure the failure is in the ledger and the error is
    /// returned; the session stays open so the actor can abort it.
    pub async fn begin(
        &self,
        actor_id: DbId,
        request: &TransferRequest,
    ) -> Result<TransferSession, WorkflowError> {
        request.validate()?;
        self.guard_no_open_session(actor_id).await?;
        let source = self
            .cells
            .find_cell(request.source_cell_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("work cell", request.source_cell_id))?;

        let session = TransferSession::new(
            actor_id,
            source.id,
            &request.target_name,
            request.extra_material.clone(),
        );
        self.sessions.save(&session).await?;
        info!(
            session = %session.id,
            actor_id,
            source_cell_id = source.id,
            "Transfer session opened"
        );
        self.step(session, TransferStep::CreateTarget).await
    }

    /// Run one step of the saga.
    ///
    /// The ledger is saved after the step regardless of outcome; the
    /// updated session is returned so the caller can inspect it.
    pub async fn step(
        &self,
        mut session: TransferSession,
        step: TransferStep,
    ) -> Result<TransferSession, WorkflowError> {
        session.ready_for(step)?;
        let result = match step {
            TransferStep::CreateTarget => self.create_target(&mut session).await,
            TransferStep::TransferTooling => {
                let outcome = self.try_transfer_tooling(&session).await;
                Self::settle(&mut session, step, outcome)
            }
            TransferStep::TransferSafety => {
                let outcome = self.try_transfer_safety(&session).await;
                Self::settle(&mut session, step, outcome)
            }
            TransferStep::TransferMaterial => {
                let outcome = self.try_transfer_material(&mut session).await;
                Self::settle(&mut session, step, outcome)
            }
        };
        self.sessions.save(&session).await?;
        result?;
        Ok(session)
    }

    /// Undo a partially completed transfer: delete the target cell and
    /// everything copied onto it, then drop the ledger.
    ///
    /// Idempotent: aborting an already-aborted session is a no-op.
    pub async fn abort(
        &self,
        mut session: TransferSession,
    ) -> Result<TransferSession, WorkflowError> {
        match session.status {
            SessionStatus::Aborted => return Ok(session),
            SessionStatus::Completed => return Err(WorkflowError::AlreadyCompleted),
            SessionStatus::Open => {}
        }
        if let Some(target) = session.new_cell_id {
            self.cells.compensate(target).await?;
        }
        session.status = SessionStatus::Aborted;
        self.sessions.delete(session.actor_id).await?;
        info!(session = %session.id, actor_id = session.actor_id, "Transfer aborted");
        Ok(session)
    }

    /// Close a fully attempted session and return the completion
    /// summary.
    ///
    /// The summary is also delivered (best-effort) to the holders of the
    /// report capability.
    pub async fn acknowledge(
        &self,
        mut session: TransferSession,
    ) -> Result<TransferSummary, WorkflowError> {
        match session.status {
            SessionStatus::Completed => return Err(WorkflowError::AlreadyCompleted),
            SessionStatus::Aborted => return Err(WorkflowError::AlreadyAborted),
            SessionStatus::Open => {}
        }
        if !session.queue.is_empty() {
            return Err(WorkflowError::Validation(
                "Batch queue still has cells waiting to transfer".to_string(),
            ));
        }
        // A failed create settles its item with nothing to report for
        // the later steps, so settled is the bar here, not attempted.
        if !session.item_settled() {
            return Err(WorkflowError::Validation(
                "Not every transfer step has been attempted".to_string(),
            ));
        }

        session.status = SessionStatus::Completed;
        self.sessions.delete(session.actor_id).await?;
        let summary = session.summary();
        info!(session = %session.id, actor_id = session.actor_id, "Transfer completed");

        let notification = Notification::new(
            "Cell transfer completed",
            summary.to_string(),
            self.report_capability.as_str(),
        );
        if let Err(err) = self.notifier.notify(&notification).await {
            warn!(session = %session.id, %err, "Completion report delivery failed");
        }
        Ok(summary)
    }

    /// The actor's open session, reloaded from the durable ledger.
    pub async fn status(
        &self,
        actor_id: DbId,
    ) -> Result<Option<TransferSession>, WorkflowError> {
        self.sessions.find(actor_id).await
    }

    pub(crate) async fn guard_no_open_session(
        &self,
        actor_id: DbId,
    ) -> Result<(), WorkflowError> {
        if self.sessions.find(actor_id).await?.is_some() {
            return Err(WorkflowError::Validation(
                "A transfer is already in progress for this actor".to_string(),
            ));
        }
        Ok(())
    }

    async fn create_target(&self, session: &mut TransferSession) -> Result<(), WorkflowError> {
        match self.try_create_target(session).await {
            Ok(new_cell_id) => {
                session.record_target_created(new_cell_id);
                info!(session = %session.id, new_cell_id, "Target cell created");
                Ok(())
            }
            // Nothing else may run without a target, so even a business
            // failure here halts the item.
            Err(err) => {
                session.record_failure(TransferStep::CreateTarget, err.to_string());
                warn!(session = %session.id, %err, "Target cell creation failed");
                Err(err)
            }
        }
    }

    async fn try_create_target(
        &self,
        session: &TransferSession,
    ) -> Result<DbId, WorkflowError> {
        let source_id = session.current_source()?;
        let source = self
            .cells
            .find_cell(source_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("work cell", source_id))?;
        let target_name = session.target_name.as_deref().ok_or_else(|| {
            WorkflowError::Validation("No target name recorded for this transfer".to_string())
        })?;
        self.cells
            .create_cell(target_name, &source.product_key, session.actor_id)
            .await
    }

    async fn try_transfer_tooling(
        &self,
        session: &TransferSession,
    ) -> Result<Option<String>, WorkflowError> {
        let source = session.current_source()?;
        let target = Self::target_cell_id(session)?;
        let count = self.cells.tooling_count(source).await?;
        if count == 0 {
            return Ok(Some(NOTE_NO_TOOLS.to_string()));
        }
        let copied = self
            .cells
            .copy_tooling(source, target, session.actor_id)
            .await?;
        Ok(Some(format!("copied {copied} tool assignments")))
    }

    /// Safety documents are keyed by cell id, so the resubmission lands
    /// under the target cell's id and re-enters the Seeking state there.
    async fn try_transfer_safety(
        &self,
        session: &TransferSession,
    ) -> Result<Option<String>, WorkflowError> {
        let source = session.current_source()?;
        let target = Self::target_cell_id(session)?;
        let Some(body) = self.safety.approved_body(&source.to_string()).await? else {
            return Ok(Some(NOTE_NO_SAFETY_DOCUMENT.to_string()));
        };
        self.safety
            .submit_for_approval(session.actor_id, &target.to_string(), &body)
            .await?;
        Ok(Some(
            "safety assessment resubmitted for approval".to_string(),
        ))
    }

    async fn try_transfer_material(
        &self,
        session: &mut TransferSession,
    ) -> Result<Option<String>, WorkflowError> {
        let source = session.current_source()?;
        let target = Self::target_cell_id(session)?;
        let target_cell = self
            .cells
            .find_cell(target)
            .await?
            .ok_or_else(|| WorkflowError::not_found("work cell", target))?;

        let mut lines = self.cells.material_of(source).await?;
        if let Some(extra) = session.extra_material.clone() {
            lines.push(extra);
        }

        // Validate every line first, then copy the passing ones in one
        // atomic unit. A retried step re-derives the discrepancy list
        // from scratch, so nothing is appended twice.
        session.discrepancies.clear();
        // The two cells of the transfer itself never count against the
        // quota: the source keeps its rows, the target is receiving.
        let exclude = [source, target];
        let mut passing = Vec::new();
        for line in lines {
            let quota = self
                .cells
                .bom_quota(&target_cell.product_key, &line.part_number, &exclude)
                .await?;
            match check_material_line(&line, quota.as_ref()) {
                None => passing.push(line),
                Some(discrepancy) => session.push_discrepancy(discrepancy),
            }
        }

        let moved = passing.len();
        let skipped = session.discrepancies.len();
        if !passing.is_empty() {
            self.cells
                .add_material_lines(target, &passing, session.actor_id)
                .await?;
        }
        Ok(Some(format!(
            "moved {moved} material lines, skipped {skipped}"
        )))
    }

    fn settle(
        session: &mut TransferSession,
        step: TransferStep,
        outcome: Result<Option<String>, WorkflowError>,
    ) -> Result<(), WorkflowError> {
        match outcome {
            Ok(None) => {
                session.record_success(step);
                Ok(())
            }
            Ok(Some(note)) => {
                session.record_success_with_note(step, note);
                Ok(())
            }
            Err(err) if err.is_business() => {
                session.record_failure(step, err.to_string());
                warn!(session = %session.id, %step, %err, "Transfer step failed on a business rule");
                Ok(())
            }
            Err(err) => {
                session.record_failure(step, err.to_string());
                Err(err)
            }
        }
    }

    fn target_cell_id(session: &TransferSession) -> Result<DbId, WorkflowError> {
        session.new_cell_id.ok_or_else(|| {
            WorkflowError::Validation(
                "The target cell has not been created yet".to_string(),
            )
        })
    }
}

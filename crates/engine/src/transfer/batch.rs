//! Batch queue over the transfer saga.
//!
//! A batch is a FIFO queue of source cell ids inside one session ledger.
//! Enqueueing fills the queue without starting anything; each advance
//! pops the next source, resets the per-item state, and runs the create
//! step. Intermediate steps go through the saga exactly as in the
//! single-cell case, so an advance is refused while the current item
//! still has unattempted steps.

use tracing::info;

use cellworks_core::error::WorkflowError;
use cellworks_core::ledger::{SessionStatus, TransferSession, TransferStep, TransferSummary};
use cellworks_core::notify::Notifier;
use cellworks_core::store::{SafetyWorkflow, SessionStore, TransferStore};
use cellworks_core::types::DbId;
use cellworks_core::validation::{validate_batch_sources, validate_target_name};

use super::saga::TransferSaga;

/// What an advance produced: the next item started, or the batch is done.
#[derive(Debug)]
pub enum BatchAdvance {
    /// The next source cell was popped and its target created; the
    /// returned session is mid-item.
    Started(TransferSession),
    /// The queue is empty; the session is closed and summarized.
    Finished(TransferSummary),
}

/// FIFO batch wrapper around [`TransferSaga`].
pub struct TransferBatchQueue<T, L, W, N> {
    saga: TransferSaga<T, L, W, N>,
}

impl<T, L, W, N> TransferBatchQueue<T, L, W, N>
where
    T: TransferStore,
    L: SessionStore,
    W: SafetyWorkflow,
    N: Notifier,
{
    pub fn new(saga: TransferSaga<T, L, W, N>) -> Self {
        Self { saga }
    }

    /// The wrapped saga, for running the per-item steps.
    pub fn saga(&self) -> &TransferSaga<T, L, W, N> {
        &self.saga
    }

    /// Open a batch session with the given source cells queued.
    ///
    /// Nothing is transferred yet: target names arrive one per advance.
    pub async fn enqueue(
        &self,
        actor_id: DbId,
        source_ids: Vec<DbId>,
    ) -> Result<TransferSession, WorkflowError> {
        validate_batch_sources(&source_ids)?;
        self.saga.guard_no_open_session(actor_id).await?;
        for id in &source_ids {
            if self.saga.cells.find_cell(*id).await?.is_none() {
                return Err(WorkflowError::not_found("work cell", *id));
            }
        }

        let session = TransferSession::for_batch(actor_id, source_ids);
        self.saga.sessions.save(&session).await?;
        info!(
            session = %session.id,
            actor_id,
            queued = session.queue.len(),
            "Batch transfer session opened"
        );
        Ok(session)
    }

    /// Start the next queued transfer, or close the batch when the
    /// queue is empty.
    ///
    /// Refused while the current item still has unattempted steps (a
    /// failed create settles its item, so the batch can move on).
    pub async fn advance(
        &self,
        mut session: TransferSession,
        target_name: &str,
    ) -> Result<BatchAdvance, WorkflowError> {
        match session.status {
            SessionStatus::Completed => return Err(WorkflowError::AlreadyCompleted),
            SessionStatus::Aborted => return Err(WorkflowError::AlreadyAborted),
            SessionStatus::Open => {}
        }
        if !session.item_settled() {
            return Err(WorkflowError::Validation(
                "The current transfer still has unattempted steps".to_string(),
            ));
        }

        let Some(source_id) = session.pop_next_source() else {
            let summary = self.saga.acknowledge(session).await?;
            return Ok(BatchAdvance::Finished(summary));
        };

        validate_target_name(target_name)?;
        if self.saga.cells.find_cell(source_id).await?.is_none() {
            return Err(WorkflowError::not_found("work cell", source_id));
        }
        session.reset_for(source_id, target_name);
        self.saga.sessions.save(&session).await?;
        let session = self
            .saga
            .step(session, TransferStep::CreateTarget)
            .await?;
        Ok(BatchAdvance::Started(session))
    }
}

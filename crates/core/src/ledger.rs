//! The transfer session ledger.
//!
//! A [`TransferSession`] is the durable, request-scoped record of one
//! transfer attempt (or one batch of attempts). It is an explicit value
//! passed to and returned from every saga call and persisted by the
//! session store after every mutation, so an in-flight batch survives a
//! process restart.
//!
//! Steps form a closed set ([`TransferStep`]) dispatched through a single
//! `match`, so adding a step is a compile-time-checked change rather than
//! a runtime name lookup.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::types::{DbId, Timestamp};
use crate::validation::{Discrepancy, MaterialLine};

/// The ledger operation key: one pending cell transfer per actor.
pub const OPERATION_CELL_TRANSFER: &str = "cell-transfer";

/// Recorded outcome note when the source has no tooling.
pub const NOTE_NO_TOOLS: &str = "no tools found to transfer";

/// Recorded outcome note when the source has no approved safety document.
pub const NOTE_NO_SAFETY_DOCUMENT: &str = "no safety assessment on file for the source cell";

/// The four sub-transfers, in mandatory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStep {
    /// Insert the new target cell row. Nothing else may run before this.
    CreateTarget,
    /// Re-insert the source's tool assignments scoped to the target.
    TransferTooling,
    /// Resubmit the source's approved safety document for the target.
    TransferSafety,
    /// Copy BOM-validated material lines to the target.
    TransferMaterial,
}

impl TransferStep {
    /// All steps in execution order.
    pub const ALL: [TransferStep; 4] = [
        TransferStep::CreateTarget,
        TransferStep::TransferTooling,
        TransferStep::TransferSafety,
        TransferStep::TransferMaterial,
    ];

    /// Stable name used in logs and the completion summary.
    pub fn name(self) -> &'static str {
        match self {
            TransferStep::CreateTarget => "create-target",
            TransferStep::TransferTooling => "transfer-tooling",
            TransferStep::TransferSafety => "transfer-safety",
            TransferStep::TransferMaterial => "transfer-material",
        }
    }
}

impl std::fmt::Display for TransferStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-step outcome as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step has not been attempted.
    NotStarted,
    /// The step completed.
    Succeeded,
    /// The step completed with a human-readable note (for instance an
    /// idempotent no-op such as "no tools found to transfer").
    SucceededWithNote { note: String },
    /// The step was attempted and failed; the note is operator-visible.
    Failed { note: String },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            StepOutcome::Succeeded | StepOutcome::SucceededWithNote { .. }
        )
    }

    pub fn was_attempted(&self) -> bool {
        !matches!(self, StepOutcome::NotStarted)
    }

    /// The attached note, if any.
    pub fn note(&self) -> Option<&str> {
        match self {
            StepOutcome::SucceededWithNote { note } | StepOutcome::Failed { note } => {
                Some(note)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::NotStarted => f.write_str("not started"),
            StepOutcome::Succeeded => f.write_str("succeeded"),
            StepOutcome::SucceededWithNote { note } => write!(f, "succeeded ({note})"),
            StepOutcome::Failed { note } => write!(f, "failed: {note}"),
        }
    }
}

/// Terminal-state tracking for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Completed,
    Aborted,
}

/// Outcomes for the four steps of the current transfer item.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StepOutcomes {
    create_target: StepOutcome,
    transfer_tooling: StepOutcome,
    transfer_safety: StepOutcome,
    transfer_material: StepOutcome,
}

impl Default for StepOutcomes {
    fn default() -> Self {
        Self {
            create_target: StepOutcome::NotStarted,
            transfer_tooling: StepOutcome::NotStarted,
            transfer_safety: StepOutcome::NotStarted,
            transfer_material: StepOutcome::NotStarted,
        }
    }
}

impl StepOutcomes {
    fn get(&self, step: TransferStep) -> &StepOutcome {
        match step {
            TransferStep::CreateTarget => &self.create_target,
            TransferStep::TransferTooling => &self.transfer_tooling,
            TransferStep::TransferSafety => &self.transfer_safety,
            TransferStep::TransferMaterial => &self.transfer_material,
        }
    }

    fn set(&mut self, step: TransferStep, outcome: StepOutcome) {
        match step {
            TransferStep::CreateTarget => self.create_target = outcome,
            TransferStep::TransferTooling => self.transfer_tooling = outcome,
            TransferStep::TransferSafety => self.transfer_safety = outcome,
            TransferStep::TransferMaterial => self.transfer_material = outcome,
        }
    }
}

/// Durable ledger for one transfer attempt (and its batch queue).
///
/// Invariant: `new_cell_id` is `Some` exactly when the create-target step
/// succeeded; it is only ever set through [`record_target_created`]
/// (`TransferSession::record_target_created`), and no later step runs
/// until it is set (see [`ready_for`](TransferSession::ready_for)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSession {
    /// Correlation id for logs; not the persistence key (the ledger is
    /// keyed by actor + operation).
    pub id: Uuid,
    pub actor_id: DbId,
    pub operation: String,
    /// The cell currently being transferred; `None` for a freshly
    /// enqueued batch before its first advance.
    pub source_cell_id: Option<DbId>,
    /// Assigned once cell creation succeeds.
    pub new_cell_id: Option<DbId>,
    /// Name requested for the current target cell.
    pub target_name: Option<String>,
    /// The single manually attached material line, if any.
    pub extra_material: Option<MaterialLine>,
    outcomes: StepOutcomes,
    pub discrepancies: Vec<Discrepancy>,
    /// Remaining source cell ids for batch mode (FIFO).
    pub queue: VecDeque<DbId>,
    pub status: SessionStatus,
    pub started_at: Timestamp,
}

impl TransferSession {
    /// Ledger for a single-cell transfer.
    pub fn new(
        actor_id: DbId,
        source_cell_id: DbId,
        target_name: &str,
        extra_material: Option<MaterialLine>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor_id,
            operation: OPERATION_CELL_TRANSFER.to_string(),
            source_cell_id: Some(source_cell_id),
            new_cell_id: None,
            target_name: Some(target_name.to_string()),
            extra_material,
            outcomes: StepOutcomes::default(),
            discrepancies: Vec::new(),
            queue: VecDeque::new(),
            status: SessionStatus::Open,
            started_at: Utc::now(),
        }
    }

    /// Ledger for a batch: the queue is filled, no item is in flight yet.
    pub fn for_batch(actor_id: DbId, source_ids: Vec<DbId>) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor_id,
            operation: OPERATION_CELL_TRANSFER.to_string(),
            source_cell_id: None,
            new_cell_id: None,
            target_name: None,
            extra_material: None,
            outcomes: StepOutcomes::default(),
            discrepancies: Vec::new(),
            queue: source_ids.into(),
            status: SessionStatus::Open,
            started_at: Utc::now(),
        }
    }

    /// The cell currently being transferred.
    pub fn current_source(&self) -> Result<DbId, WorkflowError> {
        self.source_cell_id.ok_or_else(|| {
            WorkflowError::Validation("No transfer is in progress".to_string())
        })
    }

    /// Whether cell creation has succeeded for the current item.
    pub fn target_created(&self) -> bool {
        self.new_cell_id.is_some()
    }

    /// Guard a step invocation against the session state.
    ///
    /// Steps after create-target require `new_cell_id`; a terminal
    /// session refuses every step. A step whose recorded outcome is a
    /// success cannot run again (re-copying would duplicate rows), but a
    /// failed step may be retried.
    pub fn ready_for(&self, step: TransferStep) -> Result<(), WorkflowError> {
        match self.status {
            SessionStatus::Completed => return Err(WorkflowError::AlreadyCompleted),
            SessionStatus::Aborted => return Err(WorkflowError::AlreadyAborted),
            SessionStatus::Open => {}
        }
        self.current_source()?;
        match step {
            TransferStep::CreateTarget => {
                if self.target_created() {
                    return Err(WorkflowError::Validation(
                        "Target cell has already been created".to_string(),
                    ));
                }
            }
            _ => {
                if !self.target_created() {
                    return Err(WorkflowError::Validation(format!(
                        "Cannot run {step}: the target cell has not been created yet"
                    )));
                }
                if self.outcomes.get(step).is_success() {
                    return Err(WorkflowError::Validation(format!(
                        "Cannot run {step} again: it has already completed"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Record a successful cell creation, assigning the new cell id.
    pub fn record_target_created(&mut self, new_cell_id: DbId) {
        self.new_cell_id = Some(new_cell_id);
        self.outcomes
            .set(TransferStep::CreateTarget, StepOutcome::Succeeded);
    }

    /// Record a plain success for a step.
    ///
    /// Create-target success must go through [`record_target_created`]
    /// (`TransferSession::record_target_created`) so the id invariant holds.
    pub fn record_success(&mut self, step: TransferStep) {
        debug_assert!(
            step != TransferStep::CreateTarget,
            "create-target success must record the new cell id"
        );
        self.outcomes.set(step, StepOutcome::Succeeded);
    }

    /// Record a success that carries a note (for instance a no-op).
    pub fn record_success_with_note(&mut self, step: TransferStep, note: impl Into<String>) {
        debug_assert!(
            step != TransferStep::CreateTarget,
            "create-target success must record the new cell id"
        );
        self.outcomes.set(
            step,
            StepOutcome::SucceededWithNote { note: note.into() },
        );
    }

    /// Record a step failure with an operator-visible note.
    pub fn record_failure(&mut self, step: TransferStep, note: impl Into<String>) {
        self.outcomes
            .set(step, StepOutcome::Failed { note: note.into() });
    }

    /// The recorded outcome for a step.
    pub fn outcome(&self, step: TransferStep) -> &StepOutcome {
        self.outcomes.get(step)
    }

    /// Append a material-validation fault.
    pub fn push_discrepancy(&mut self, discrepancy: Discrepancy) {
        self.discrepancies.push(discrepancy);
    }

    /// Whether every step of the current item has been attempted.
    pub fn all_steps_attempted(&self) -> bool {
        TransferStep::ALL
            .iter()
            .all(|step| self.outcomes.get(*step).was_attempted())
    }

    /// Whether the current item needs no further step invocations:
    /// either all steps were attempted, or create-target failed and
    /// halted the item.
    pub fn item_settled(&self) -> bool {
        if matches!(
            self.outcomes.get(TransferStep::CreateTarget),
            StepOutcome::Failed { .. }
        ) {
            return true;
        }
        self.source_cell_id.is_none() || self.all_steps_attempted()
    }

    /// Pop the next queued source cell id, if any.
    pub fn pop_next_source(&mut self) -> Option<DbId> {
        self.queue.pop_front()
    }

    /// Reset per-item state and make `source_cell_id` the current item.
    pub fn reset_for(&mut self, source_cell_id: DbId, target_name: &str) {
        self.source_cell_id = Some(source_cell_id);
        self.new_cell_id = None;
        self.target_name = Some(target_name.to_string());
        self.extra_material = None;
        self.outcomes = StepOutcomes::default();
        self.discrepancies.clear();
    }

    /// Snapshot for the single completion summary shown to the user.
    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            source_cell_id: self.source_cell_id,
            new_cell_id: self.new_cell_id,
            steps: TransferStep::ALL
                .iter()
                .map(|step| StepReport {
                    step: *step,
                    outcome: self.outcomes.get(*step).clone(),
                })
                .collect(),
            discrepancies: self.discrepancies.clone(),
        }
    }
}

/// One line of the completion summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: TransferStep,
    pub outcome: StepOutcome,
}

/// The user-facing completion summary: which steps succeeded, which
/// reported discrepancies, which failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    pub source_cell_id: Option<DbId>,
    pub new_cell_id: Option<DbId>,
    pub steps: Vec<StepReport>,
    pub discrepancies: Vec<Discrepancy>,
}

impl std::fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for report in &self.steps {
            writeln!(f, "{}: {}", report.step, report.outcome)?;
        }
        if !self.discrepancies.is_empty() {
            writeln!(f, "discrepancies:")?;
            for d in &self.discrepancies {
                writeln!(f, "  - {d}")?;
            }
        }
        Ok(())
    }
}

//! Collaborator traits for the persistent store.
//!
//! The engine never speaks SQL itself: each workflow consumes these
//! narrow interfaces, and `cellworks-engine` provides Postgres-backed
//! implementations over the `cellworks-db` repositories. Tests drive the
//! workflows with in-memory implementations.
//!
//! Multi-statement atomic units (the approve swap, the compensation
//! delete sequence) are single trait methods so the implementation can
//! wrap them in one transaction.

use async_trait::async_trait;

use crate::document::DocumentState;
use crate::error::WorkflowError;
use crate::ledger::TransferSession;
use crate::types::DbId;
use crate::validation::{BomQuota, MaterialLine};

/// The slice of a document row the approval workflow needs.
#[derive(Debug, Clone)]
pub struct DocumentHead {
    pub id: DbId,
    pub name: String,
    pub state: DocumentState,
    pub owner_id: DbId,
    pub body: String,
}

/// Store operations for the document approval state machine.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new row in state Seeking, returning its id.
    async fn insert_seeking(
        &self,
        name: &str,
        body: &str,
        owner_id: DbId,
    ) -> Result<DbId, WorkflowError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<DocumentHead>, WorkflowError>;

    /// The currently approved row for a name, if any.
    async fn find_approved(&self, name: &str) -> Result<Option<DocumentHead>, WorkflowError>;

    /// The pending (Seeking) row for a name, if any.
    async fn find_seeking(&self, name: &str) -> Result<Option<DocumentHead>, WorkflowError>;

    /// Atomically obsolete the current Approved row for `name` (if any)
    /// and promote the pending row, stamping approver id and timestamp.
    /// Must fail without effect when the pending row is no longer in
    /// state Seeking.
    async fn promote(
        &self,
        pending_id: DbId,
        name: &str,
        approver_id: DbId,
    ) -> Result<(), WorkflowError>;

    /// Delete a pending row outright (rejection discards the edit).
    async fn delete_pending(&self, pending_id: DbId) -> Result<(), WorkflowError>;
}

/// A work cell as the transfer saga sees it.
#[derive(Debug, Clone)]
pub struct CellSnapshot {
    pub id: DbId,
    pub name: String,
    /// Key into the bill of materials this cell draws from.
    pub product_key: String,
}

/// Store operations for the transfer saga.
#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn find_cell(&self, id: DbId) -> Result<Option<CellSnapshot>, WorkflowError>;

    /// Insert the new target cell row, returning its id.
    async fn create_cell(
        &self,
        name: &str,
        product_key: &str,
        created_by: DbId,
    ) -> Result<DbId, WorkflowError>;

    /// Number of tool assignments on a cell.
    async fn tooling_count(&self, cell_id: DbId) -> Result<u64, WorkflowError>;

    /// Re-insert the source's tool assignments scoped to the target,
    /// returning the number of rows copied.
    async fn copy_tooling(
        &self,
        source_cell_id: DbId,
        target_cell_id: DbId,
        assigned_by: DbId,
    ) -> Result<u64, WorkflowError>;

    /// All material lines currently assigned to a cell.
    async fn material_of(&self, cell_id: DbId) -> Result<Vec<MaterialLine>, WorkflowError>;

    /// The target BOM's allowance for one part: `None` when the part is
    /// not on the BOM, otherwise the authorized quantity and the amount
    /// committed on cells other than `exclude_cells`.
    async fn bom_quota(
        &self,
        product_key: &str,
        part_number: &str,
        exclude_cells: &[DbId],
    ) -> Result<Option<BomQuota>, WorkflowError>;

    /// Insert the validated material lines on a cell in one atomic
    /// unit, so a mid-copy failure leaves nothing behind and a retry
    /// cannot duplicate rows.
    async fn add_material_lines(
        &self,
        cell_id: DbId,
        lines: &[MaterialLine],
        assigned_by: DbId,
    ) -> Result<(), WorkflowError>;

    /// Compensation: delete the target's tooling rows, its safety
    /// document rows (matched by name = target id), its material rows,
    /// and the cell itself — in that order, in one atomic unit.
    async fn compensate(&self, target_cell_id: DbId) -> Result<(), WorkflowError>;
}

/// Durable storage for the session ledger, keyed by actor + operation.
///
/// The ledger must survive a process restart so an in-flight batch can
/// be resumed.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: &TransferSession) -> Result<(), WorkflowError>;

    async fn find(&self, actor_id: DbId) -> Result<Option<TransferSession>, WorkflowError>;

    async fn delete(&self, actor_id: DbId) -> Result<(), WorkflowError>;
}

/// The slice of the approval workflow the transfer saga consumes: read
/// the approved safety body for a cell, and resubmit it under the target
/// cell so the sign-off re-enters the Seeking state.
#[async_trait]
pub trait SafetyWorkflow: Send + Sync {
    /// Body of the approved safety document for a cell name, if any.
    async fn approved_body(&self, cell_name: &str) -> Result<Option<String>, WorkflowError>;

    /// Submit a safety document revision for approval under `name`.
    async fn submit_for_approval(
        &self,
        actor_id: DbId,
        name: &str,
        body: &str,
    ) -> Result<DbId, WorkflowError>;
}

//! Postgres-backed implementations of the collaborator traits.
//!
//! Each adapter wraps a connection pool and delegates to the
//! `cellworks-db` repositories, translating `sqlx::Error` into
//! [`WorkflowError`]. `RowNotFound` from an operation that targets a
//! specific row becomes [`WorkflowError::NotFound`]; everything else is
//! [`WorkflowError::Persistence`].

use async_trait::async_trait;
use sqlx::PgPool;

use cellworks_core::document::DocumentState;
use cellworks_core::error::WorkflowError;
use cellworks_core::ledger::{TransferSession, OPERATION_CELL_TRANSFER};
use cellworks_core::password::{verify_password, CredentialVerifier};
use cellworks_core::rights::{
    rank_from_membership, AccessPolicy, AccessRank, AccessRightsResolver,
};
use cellworks_core::store::{
    CellSnapshot, DocumentHead, DocumentStore, SessionStore, TransferStore,
};
use cellworks_core::types::DbId;
use cellworks_core::validation::{BomQuota, MaterialLine};
use cellworks_db::models::document::{CreateDocument, Document};
use cellworks_db::models::work_cell::CreateWorkCell;
use cellworks_db::repositories::{
    ActorRepo, CapabilityRepo, DocumentRepo, MaterialRepo, SessionRepo, ToolingRepo,
    WorkCellRepo,
};

fn persistence(err: sqlx::Error) -> WorkflowError {
    WorkflowError::Persistence(err.to_string())
}

fn to_head(doc: Document) -> Result<DocumentHead, WorkflowError> {
    Ok(DocumentHead {
        id: doc.id,
        name: doc.name,
        state: DocumentState::parse(&doc.state)?,
        owner_id: doc.owner_id,
        body: doc.body,
    })
}

/// [`DocumentStore`] over the `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_seeking(
        &self,
        name: &str,
        body: &str,
        owner_id: DbId,
    ) -> Result<DbId, WorkflowError> {
        let input = CreateDocument {
            name: name.to_string(),
            body: body.to_string(),
            owner_id,
        };
        let doc = DocumentRepo::create_seeking(&self.pool, &input)
            .await
            .map_err(persistence)?;
        Ok(doc.id)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<DocumentHead>, WorkflowError> {
        DocumentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(persistence)?
            .map(to_head)
            .transpose()
    }

    async fn find_approved(&self, name: &str) -> Result<Option<DocumentHead>, WorkflowError> {
        DocumentRepo::find_by_name_and_state(&self.pool, name, DocumentState::Approved)
            .await
            .map_err(persistence)?
            .map(to_head)
            .transpose()
    }

    async fn find_seeking(&self, name: &str) -> Result<Option<DocumentHead>, WorkflowError> {
        DocumentRepo::find_by_name_and_state(&self.pool, name, DocumentState::Seeking)
            .await
            .map_err(persistence)?
            .map(to_head)
            .transpose()
    }

    async fn promote(
        &self,
        pending_id: DbId,
        name: &str,
        approver_id: DbId,
    ) -> Result<(), WorkflowError> {
        DocumentRepo::promote(&self.pool, pending_id, name, approver_id)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => {
                    WorkflowError::not_found("pending document", pending_id)
                }
                other => persistence(other),
            })
    }

    async fn delete_pending(&self, pending_id: DbId) -> Result<(), WorkflowError> {
        let deleted = DocumentRepo::delete_pending(&self.pool, pending_id)
            .await
            .map_err(persistence)?;
        if !deleted {
            return Err(WorkflowError::not_found("pending document", pending_id));
        }
        Ok(())
    }
}

/// [`TransferStore`] over the work cell, tooling, material, and BOM tables.
#[derive(Clone)]
pub struct PgTransferStore {
    pool: PgPool,
}

impl PgTransferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransferStore for PgTransferStore {
    async fn find_cell(&self, id: DbId) -> Result<Option<CellSnapshot>, WorkflowError> {
        let cell = WorkCellRepo::find_by_id(&self.pool, id)
            .await
            .map_err(persistence)?;
        Ok(cell.map(|c| CellSnapshot {
            id: c.id,
            name: c.name,
            product_key: c.product_key,
        }))
    }

    async fn create_cell(
        &self,
        name: &str,
        product_key: &str,
        created_by: DbId,
    ) -> Result<DbId, WorkflowError> {
        let input = CreateWorkCell {
            name: name.to_string(),
            product_key: product_key.to_string(),
            created_by,
        };
        let cell = WorkCellRepo::create(&self.pool, &input)
            .await
            .map_err(persistence)?;
        Ok(cell.id)
    }

    async fn tooling_count(&self, cell_id: DbId) -> Result<u64, WorkflowError> {
        let count = ToolingRepo::count_by_cell(&self.pool, cell_id)
            .await
            .map_err(persistence)?;
        Ok(count as u64)
    }

    async fn copy_tooling(
        &self,
        source_cell_id: DbId,
        target_cell_id: DbId,
        assigned_by: DbId,
    ) -> Result<u64, WorkflowError> {
        ToolingRepo::copy_to_cell(&self.pool, source_cell_id, target_cell_id, assigned_by)
            .await
            .map_err(persistence)
    }

    async fn material_of(&self, cell_id: DbId) -> Result<Vec<MaterialLine>, WorkflowError> {
        let rows = MaterialRepo::list_by_cell(&self.pool, cell_id)
            .await
            .map_err(persistence)?;
        Ok(rows
            .into_iter()
            .map(|row| MaterialLine {
                part_number: row.part_number,
                quantity: row.quantity,
            })
            .collect())
    }

    async fn bom_quota(
        &self,
        product_key: &str,
        part_number: &str,
        exclude_cells: &[DbId],
    ) -> Result<Option<BomQuota>, WorkflowError> {
        let Some(line) = MaterialRepo::bom_line(&self.pool, product_key, part_number)
            .await
            .map_err(persistence)?
        else {
            return Ok(None);
        };
        let committed =
            MaterialRepo::committed_quantity(&self.pool, product_key, part_number, exclude_cells)
                .await
                .map_err(persistence)?;
        Ok(Some(BomQuota {
            bom_quantity: line.quantity,
            committed,
        }))
    }

    async fn add_material_lines(
        &self,
        cell_id: DbId,
        lines: &[MaterialLine],
        assigned_by: DbId,
    ) -> Result<(), WorkflowError> {
        MaterialRepo::insert_many(&self.pool, cell_id, lines, assigned_by)
            .await
            .map_err(persistence)
    }

    async fn compensate(&self, target_cell_id: DbId) -> Result<(), WorkflowError> {
        WorkCellRepo::delete_cascade(&self.pool, target_cell_id)
            .await
            .map_err(persistence)
    }
}

/// [`SessionStore`] over the `transfer_sessions` ledger table.
///
/// The ledger travels as JSONB; a row that fails to deserialize is a
/// persistence fault, not a missing session.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn save(&self, session: &TransferSession) -> Result<(), WorkflowError> {
        let ledger = serde_json::to_value(session)
            .map_err(|e| WorkflowError::Persistence(e.to_string()))?;
        SessionRepo::upsert(&self.pool, session.actor_id, &session.operation, &ledger)
            .await
            .map_err(persistence)
    }

    async fn find(&self, actor_id: DbId) -> Result<Option<TransferSession>, WorkflowError> {
        let Some(row) =
            SessionRepo::find_by_actor(&self.pool, actor_id, OPERATION_CELL_TRANSFER)
                .await
                .map_err(persistence)?
        else {
            return Ok(None);
        };
        let session = serde_json::from_value(row.ledger)
            .map_err(|e| WorkflowError::Persistence(e.to_string()))?;
        Ok(Some(session))
    }

    async fn delete(&self, actor_id: DbId) -> Result<(), WorkflowError> {
        SessionRepo::delete_by_actor(&self.pool, actor_id, OPERATION_CELL_TRANSFER)
            .await
            .map_err(persistence)?;
        Ok(())
    }
}

/// [`AccessRightsResolver`] over the capability and role membership tables.
#[derive(Clone)]
pub struct PgAccessRightsResolver {
    pool: PgPool,
}

impl PgAccessRightsResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessRightsResolver for PgAccessRightsResolver {
    async fn resolve(
        &self,
        actor_id: DbId,
        policy: &AccessPolicy,
    ) -> Result<AccessRank, WorkflowError> {
        let capabilities = CapabilityRepo::capabilities_of(&self.pool, actor_id)
            .await
            .map_err(persistence)?;
        let roles = CapabilityRepo::roles_of(&self.pool, actor_id)
            .await
            .map_err(persistence)?;
        Ok(rank_from_membership(&capabilities, &roles, policy))
    }
}

/// [`CredentialVerifier`] over the `actors` table.
///
/// Fails closed: an unknown or deactivated actor verifies as `false`.
/// A hash that cannot be parsed is a persistence fault.
#[derive(Clone)]
pub struct PgCredentialVerifier {
    pool: PgPool,
}

impl PgCredentialVerifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialVerifier for PgCredentialVerifier {
    async fn verify_password(
        &self,
        actor_id: DbId,
        candidate: &str,
    ) -> Result<bool, WorkflowError> {
        let Some(actor) = ActorRepo::find_by_id(&self.pool, actor_id)
            .await
            .map_err(persistence)?
        else {
            return Ok(false);
        };
        if !actor.is_active {
            return Ok(false);
        }
        verify_password(candidate, &actor.password_hash).map_err(|e| {
            WorkflowError::Persistence(format!("stored credential unusable: {e}"))
        })
    }
}

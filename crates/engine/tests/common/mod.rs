//! In-memory implementations of the collaborator traits.
//!
//! Each fake is `Clone` over a shared `Arc<Mutex<..>>` so a test can
//! hand one copy to the workflow under test and keep another for
//! assertions. Locks are held only across synchronous sections.

// Not every test binary touches every fake.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use cellworks_core::document::DocumentState;
use cellworks_core::error::WorkflowError;
use cellworks_core::ledger::TransferSession;
use cellworks_core::notify::{Notification, Notifier, NotifyError};
use cellworks_core::password::{hash_password, verify_password, CredentialVerifier};
use cellworks_core::rights::{
    rank_from_membership, AccessPolicy, AccessRank, AccessRightsResolver,
};
use cellworks_core::store::{
    CellSnapshot, DocumentHead, DocumentStore, SafetyWorkflow, SessionStore, TransferStore,
};
use cellworks_core::types::DbId;
use cellworks_core::validation::{BomQuota, MaterialLine};

// -- documents ------------------------------------------------------------

#[derive(Default)]
struct DocInner {
    next_id: DbId,
    rows: Vec<DocumentHead>,
}

#[derive(Clone, Default)]
pub struct MemDocumentStore {
    inner: Arc<Mutex<DocInner>>,
}

impl MemDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly in state Approved, for seeding history.
    pub fn seed_approved(&self, name: &str, owner_id: DbId, body: &str) -> DbId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.push(DocumentHead {
            id,
            name: name.to_string(),
            state: DocumentState::Approved,
            owner_id,
            body: body.to_string(),
        });
        id
    }

    pub fn state_of(&self, id: DbId) -> Option<DocumentState> {
        let inner = self.inner.lock().unwrap();
        inner.rows.iter().find(|r| r.id == id).map(|r| r.state)
    }
}

#[async_trait]
impl DocumentStore for MemDocumentStore {
    async fn insert_seeking(
        &self,
        name: &str,
        body: &str,
        owner_id: DbId,
    ) -> Result<DbId, WorkflowError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.push(DocumentHead {
            id,
            name: name.to_string(),
            state: DocumentState::Seeking,
            owner_id,
            body: body.to_string(),
        });
        Ok(id)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<DocumentHead>, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn find_approved(&self, name: &str) -> Result<Option<DocumentHead>, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .iter()
            .find(|r| r.name == name && r.state == DocumentState::Approved)
            .cloned())
    }

    async fn find_seeking(&self, name: &str) -> Result<Option<DocumentHead>, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .iter()
            .find(|r| r.name == name && r.state == DocumentState::Seeking)
            .cloned())
    }

    async fn promote(
        &self,
        pending_id: DbId,
        name: &str,
        _approver_id: DbId,
    ) -> Result<(), WorkflowError> {
        let mut inner = self.inner.lock().unwrap();
        let pending_seeking = inner
            .rows
            .iter()
            .any(|r| r.id == pending_id && r.state == DocumentState::Seeking);
        if !pending_seeking {
            return Err(WorkflowError::not_found("pending document", pending_id));
        }
        for row in inner.rows.iter_mut() {
            if row.name == name && row.state == DocumentState::Approved {
                row.state = DocumentState::Obsolete;
            }
        }
        for row in inner.rows.iter_mut() {
            if row.id == pending_id {
                row.state = DocumentState::Approved;
            }
        }
        Ok(())
    }

    async fn delete_pending(&self, pending_id: DbId) -> Result<(), WorkflowError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner
            .rows
            .retain(|r| !(r.id == pending_id && r.state == DocumentState::Seeking));
        if inner.rows.len() == before {
            return Err(WorkflowError::not_found("pending document", pending_id));
        }
        Ok(())
    }
}

// -- work cells / tooling / material --------------------------------------

#[derive(Default)]
struct CellInner {
    next_id: DbId,
    cells: Vec<CellSnapshot>,
    tooling: HashMap<DbId, Vec<String>>,
    material: HashMap<DbId, Vec<MaterialLine>>,
    bom: HashMap<(String, String), i64>,
    compensated: Vec<DbId>,
    fail_create: bool,
    fail_add_material: bool,
}

#[derive(Clone, Default)]
pub struct MemTransferStore {
    inner: Arc<Mutex<CellInner>>,
}

impl MemTransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cell(&self, name: &str, product_key: &str) -> DbId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.cells.push(CellSnapshot {
            id,
            name: name.to_string(),
            product_key: product_key.to_string(),
        });
        id
    }

    pub fn add_tool(&self, cell_id: DbId, tool_code: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .tooling
            .entry(cell_id)
            .or_default()
            .push(tool_code.to_string());
    }

    pub fn add_material_line(&self, cell_id: DbId, part_number: &str, quantity: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner.material.entry(cell_id).or_default().push(MaterialLine {
            part_number: part_number.to_string(),
            quantity,
        });
    }

    pub fn set_bom(&self, product_key: &str, part_number: &str, quantity: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .bom
            .insert((product_key.to_string(), part_number.to_string()), quantity);
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.inner.lock().unwrap().fail_create = fail;
    }

    pub fn set_fail_add_material(&self, fail: bool) {
        self.inner.lock().unwrap().fail_add_material = fail;
    }

    pub fn cell_exists(&self, id: DbId) -> bool {
        self.inner.lock().unwrap().cells.iter().any(|c| c.id == id)
    }

    pub fn tooling_of(&self, cell_id: DbId) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.tooling.get(&cell_id).cloned().unwrap_or_default()
    }

    pub fn material_lines(&self, cell_id: DbId) -> Vec<MaterialLine> {
        let inner = self.inner.lock().unwrap();
        inner.material.get(&cell_id).cloned().unwrap_or_default()
    }

    pub fn compensated(&self) -> Vec<DbId> {
        self.inner.lock().unwrap().compensated.clone()
    }
}

#[async_trait]
impl TransferStore for MemTransferStore {
    async fn find_cell(&self, id: DbId) -> Result<Option<CellSnapshot>, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.cells.iter().find(|c| c.id == id).cloned())
    }

    async fn create_cell(
        &self,
        name: &str,
        product_key: &str,
        _created_by: DbId,
    ) -> Result<DbId, WorkflowError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_create {
            return Err(WorkflowError::Persistence("insert failed".to_string()));
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.cells.push(CellSnapshot {
            id,
            name: name.to_string(),
            product_key: product_key.to_string(),
        });
        Ok(id)
    }

    async fn tooling_count(&self, cell_id: DbId) -> Result<u64, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.tooling.get(&cell_id).map_or(0, |t| t.len()) as u64)
    }

    async fn copy_tooling(
        &self,
        source_cell_id: DbId,
        target_cell_id: DbId,
        _assigned_by: DbId,
    ) -> Result<u64, WorkflowError> {
        let mut inner = self.inner.lock().unwrap();
        let tools = inner
            .tooling
            .get(&source_cell_id)
            .cloned()
            .unwrap_or_default();
        let copied = tools.len() as u64;
        inner.tooling.entry(target_cell_id).or_default().extend(tools);
        Ok(copied)
    }

    async fn material_of(&self, cell_id: DbId) -> Result<Vec<MaterialLine>, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.material.get(&cell_id).cloned().unwrap_or_default())
    }

    async fn bom_quota(
        &self,
        product_key: &str,
        part_number: &str,
        exclude_cells: &[DbId],
    ) -> Result<Option<BomQuota>, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        let key = (product_key.to_string(), part_number.to_string());
        let Some(bom_quantity) = inner.bom.get(&key).copied() else {
            return Ok(None);
        };
        let committed = inner
            .cells
            .iter()
            .filter(|c| c.product_key == product_key && !exclude_cells.contains(&c.id))
            .filter_map(|c| inner.material.get(&c.id))
            .flatten()
            .filter(|line| line.part_number == part_number)
            .map(|line| line.quantity)
            .sum();
        Ok(Some(BomQuota {
            bom_quantity,
            committed,
        }))
    }

    async fn add_material_lines(
        &self,
        cell_id: DbId,
        lines: &[MaterialLine],
        _assigned_by: DbId,
    ) -> Result<(), WorkflowError> {
        let mut inner = self.inner.lock().unwrap();
        // All-or-nothing, matching the transactional store.
        if inner.fail_add_material {
            return Err(WorkflowError::Persistence("insert failed".to_string()));
        }
        inner
            .material
            .entry(cell_id)
            .or_default()
            .extend(lines.iter().cloned());
        Ok(())
    }

    async fn compensate(&self, target_cell_id: DbId) -> Result<(), WorkflowError> {
        let mut inner = self.inner.lock().unwrap();
        inner.cells.retain(|c| c.id != target_cell_id);
        inner.tooling.remove(&target_cell_id);
        inner.material.remove(&target_cell_id);
        inner.compensated.push(target_cell_id);
        Ok(())
    }
}

// -- session ledger --------------------------------------------------------

/// Stores ledgers as JSON to mirror the JSONB column, so finding a
/// session exercises the same serialization the durable store relies on.
#[derive(Clone, Default)]
pub struct MemSessionStore {
    inner: Arc<Mutex<HashMap<DbId, serde_json::Value>>>,
}

impl MemSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_session(&self, actor_id: DbId) -> bool {
        self.inner.lock().unwrap().contains_key(&actor_id)
    }
}

#[async_trait]
impl SessionStore for MemSessionStore {
    async fn save(&self, session: &TransferSession) -> Result<(), WorkflowError> {
        let value = serde_json::to_value(session)
            .map_err(|e| WorkflowError::Persistence(e.to_string()))?;
        self.inner.lock().unwrap().insert(session.actor_id, value);
        Ok(())
    }

    async fn find(&self, actor_id: DbId) -> Result<Option<TransferSession>, WorkflowError> {
        let value = self.inner.lock().unwrap().get(&actor_id).cloned();
        value
            .map(|v| {
                serde_json::from_value(v).map_err(|e| WorkflowError::Persistence(e.to_string()))
            })
            .transpose()
    }

    async fn delete(&self, actor_id: DbId) -> Result<(), WorkflowError> {
        self.inner.lock().unwrap().remove(&actor_id);
        Ok(())
    }
}

// -- rights / credentials ---------------------------------------------------

#[derive(Default)]
struct RightsInner {
    capabilities: HashMap<DbId, Vec<String>>,
    roles: HashMap<DbId, Vec<String>>,
}

#[derive(Clone, Default)]
pub struct MemRights {
    inner: Arc<Mutex<RightsInner>>,
}

impl MemRights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_capability(&self, actor_id: DbId, capability: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .capabilities
            .entry(actor_id)
            .or_default()
            .push(capability.to_string());
    }

    pub fn grant_role(&self, actor_id: DbId, role: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.roles.entry(actor_id).or_default().push(role.to_string());
    }
}

#[async_trait]
impl AccessRightsResolver for MemRights {
    async fn resolve(
        &self,
        actor_id: DbId,
        policy: &AccessPolicy,
    ) -> Result<AccessRank, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        let capabilities = inner
            .capabilities
            .get(&actor_id)
            .cloned()
            .unwrap_or_default();
        let roles = inner.roles.get(&actor_id).cloned().unwrap_or_default();
        Ok(rank_from_membership(&capabilities, &roles, policy))
    }
}

/// Holds real Argon2id hashes so verification goes through the
/// production code path. Unknown actors fail closed.
#[derive(Clone, Default)]
pub struct MemVerifier {
    hashes: Arc<Mutex<HashMap<DbId, String>>>,
}

impl MemVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, actor_id: DbId, password: &str) {
        let hash = hash_password(password).unwrap();
        self.hashes.lock().unwrap().insert(actor_id, hash);
    }
}

#[async_trait]
impl CredentialVerifier for MemVerifier {
    async fn verify_password(
        &self,
        actor_id: DbId,
        candidate: &str,
    ) -> Result<bool, WorkflowError> {
        let hash = self.hashes.lock().unwrap().get(&actor_id).cloned();
        match hash {
            Some(hash) => verify_password(candidate, &hash)
                .map_err(|e| WorkflowError::Persistence(e.to_string())),
            None => Ok(false),
        }
    }
}

// -- notifications ----------------------------------------------------------

#[derive(Default)]
struct NotifierInner {
    sent: Vec<Notification>,
    fail: bool,
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<NotifierInner>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deliveries(&self) {
        self.inner.lock().unwrap().fail = true;
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.inner.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail {
            return Err(NotifyError("smtp unreachable".to_string()));
        }
        inner.sent.push(notification.clone());
        Ok(())
    }
}

// -- safety workflow --------------------------------------------------------

#[derive(Default)]
struct SafetyInner {
    approved: HashMap<String, String>,
    submitted: Vec<(DbId, String, String)>,
    next_id: DbId,
    refuse_submission: bool,
}

/// Stands in for the approval workflow on the saga's safety seam.
#[derive(Clone, Default)]
pub struct MemSafety {
    inner: Arc<Mutex<SafetyInner>>,
}

impl MemSafety {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_approved(&self, cell_name: &str, body: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .approved
            .insert(cell_name.to_string(), body.to_string());
    }

    /// Make submissions fail with a rights error, as they would for an
    /// actor without Edit rank on safety documents.
    pub fn refuse_submissions(&self) {
        self.inner.lock().unwrap().refuse_submission = true;
    }

    pub fn submitted(&self) -> Vec<(DbId, String, String)> {
        self.inner.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl SafetyWorkflow for MemSafety {
    async fn approved_body(&self, cell_name: &str) -> Result<Option<String>, WorkflowError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.approved.get(cell_name).cloned())
    }

    async fn submit_for_approval(
        &self,
        actor_id: DbId,
        name: &str,
        body: &str,
    ) -> Result<DbId, WorkflowError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.refuse_submission {
            return Err(WorkflowError::InsufficientRights {
                required: AccessRank::Edit,
                actual: AccessRank::None,
            });
        }
        inner.next_id += 1;
        inner
            .submitted
            .push((actor_id, name.to_string(), body.to_string()));
        Ok(inner.next_id)
    }
}

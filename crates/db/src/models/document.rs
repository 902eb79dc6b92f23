//! Approvable document model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cellworks_core::types::{DbId, Timestamp};

/// A row from the `documents` table.
///
/// `name` is the logical key: multiple rows share a name, one per
/// lifecycle state. `state` holds the TEXT form of
/// [`cellworks_core::document::DocumentState`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DbId,
    pub name: String,
    pub state: String,
    pub body: String,
    pub owner_id: DbId,
    pub approver_id: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new pending revision.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub name: String,
    pub body: String,
    pub owner_id: DbId,
}

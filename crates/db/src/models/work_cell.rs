//! Work cell model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cellworks_core::types::{DbId, Timestamp};

/// A row from the `work_cells` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkCell {
    pub id: DbId,
    pub name: String,
    /// Key into `bom_lines` for the product this cell builds.
    pub product_key: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new work cell.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkCell {
    pub name: String,
    pub product_key: String,
    pub created_by: DbId,
}

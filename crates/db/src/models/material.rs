//! Material assignment and bill-of-materials models.

use serde::Serialize;
use sqlx::FromRow;

use cellworks_core::types::{DbId, Timestamp};

/// A row from the `material_assignments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaterialAssignment {
    pub id: DbId,
    pub cell_id: DbId,
    pub part_number: String,
    pub quantity: i64,
    pub assigned_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `bom_lines` table: the authorized quantity of one part
/// for one product.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BomLine {
    pub id: DbId,
    pub product_key: String,
    pub part_number: String,
    pub quantity: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

//! Repository for the `material_assignments` and `bom_lines` tables.

use sqlx::PgPool;

use cellworks_core::types::DbId;
use cellworks_core::validation::MaterialLine;

use crate::models::material::{BomLine, MaterialAssignment};

/// Column list for material_assignments queries.
const ASSIGNMENT_COLUMNS: &str = "id, cell_id, part_number, quantity, assigned_by, \
    created_at, updated_at";

/// Column list for bom_lines queries.
const BOM_COLUMNS: &str = "id, product_key, part_number, quantity, created_at, updated_at";

/// Provides operations for material assignments and BOM lookups.
pub struct MaterialRepo;

impl MaterialRepo {
    /// List all material lines assigned to a cell, oldest first.
    pub async fn list_by_cell(
        pool: &PgPool,
        cell_id: DbId,
    ) -> Result<Vec<MaterialAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM material_assignments
             WHERE cell_id = $1
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, MaterialAssignment>(&query)
            .bind(cell_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a batch of material lines for a cell.
    ///
    /// Runs in one transaction: a failed insert rolls back the whole
    /// batch, so a retried copy never duplicates rows.
    pub async fn insert_many(
        pool: &PgPool,
        cell_id: DbId,
        lines: &[MaterialLine],
        assigned_by: DbId,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for line in lines {
            sqlx::query(
                "INSERT INTO material_assignments (cell_id, part_number, quantity, assigned_by)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(cell_id)
            .bind(&line.part_number)
            .bind(line.quantity)
            .bind(assigned_by)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    /// The BOM line for one part of one product, if the part is
    /// authorized at all.
    pub async fn bom_line(
        pool: &PgPool,
        product_key: &str,
        part_number: &str,
    ) -> Result<Option<BomLine>, sqlx::Error> {
        let query = format!(
            "SELECT {BOM_COLUMNS} FROM bom_lines
             WHERE product_key = $1 AND part_number = $2"
        );
        sqlx::query_as::<_, BomLine>(&query)
            .bind(product_key)
            .bind(part_number)
            .fetch_optional(pool)
            .await
    }

    /// Quantity of a part already committed on cells of the same
    /// product, excluding `exclude_cells` (the two cells involved in
    /// the transfer itself).
    pub async fn committed_quantity(
        pool: &PgPool,
        product_key: &str,
        part_number: &str,
        exclude_cells: &[DbId],
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(ma.quantity), 0)::BIGINT
             FROM material_assignments ma
             JOIN work_cells wc ON wc.id = ma.cell_id
             WHERE wc.product_key = $1
               AND ma.part_number = $2
               AND ma.cell_id <> ALL($3)",
        )
        .bind(product_key)
        .bind(part_number)
        .bind(exclude_cells)
        .fetch_one(pool)
        .await
    }
}

//! Repository for the `work_cells` table, including the compensation
//! delete sequence for the transfer saga.

use sqlx::PgPool;

use cellworks_core::types::DbId;

use crate::models::work_cell::{CreateWorkCell, WorkCell};

/// Column list for work_cells queries.
const COLUMNS: &str = "id, name, product_key, created_by, created_at, updated_at";

/// Provides operations for work cells.
pub struct WorkCellRepo;

impl WorkCellRepo {
    /// Insert a new work cell, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateWorkCell) -> Result<WorkCell, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_cells (name, product_key, created_by)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkCell>(&query)
            .bind(&input.name)
            .bind(&input.product_key)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a work cell by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkCell>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_cells WHERE id = $1");
        sqlx::query_as::<_, WorkCell>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Compensation for a partially completed transfer: delete the
    /// cell's tooling rows, its safety document rows (matched by
    /// name = cell id), its material rows, and finally the cell itself.
    ///
    /// Runs in one transaction so a failed delete leaves no orphaned
    /// child rows behind a missing parent.
    pub async fn delete_cascade(pool: &PgPool, cell_id: DbId) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM tool_assignments WHERE cell_id = $1")
            .bind(cell_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM documents WHERE name = $1")
            .bind(cell_id.to_string())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM material_assignments WHERE cell_id = $1")
            .bind(cell_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM work_cells WHERE id = $1")
            .bind(cell_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(cell_id, "Compensation deleted target cell and children");
        Ok(())
    }
}

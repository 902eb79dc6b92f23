//! Repository for the `tool_assignments` table.

use sqlx::PgPool;

use cellworks_core::types::DbId;

/// Provides operations for tool assignments.
pub struct ToolingRepo;

impl ToolingRepo {
    /// Count tool assignments on a cell.
    pub async fn count_by_cell(pool: &PgPool, cell_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tool_assignments WHERE cell_id = $1")
                .bind(cell_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Re-insert the source cell's assignments scoped to the target,
    /// returning the number of rows copied.
    pub async fn copy_to_cell(
        pool: &PgPool,
        source_cell_id: DbId,
        target_cell_id: DbId,
        assigned_by: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO tool_assignments (cell_id, tool_code, description, assigned_by)
             SELECT $2, tool_code, description, $3
             FROM tool_assignments
             WHERE cell_id = $1",
        )
        .bind(source_cell_id)
        .bind(target_cell_id)
        .bind(assigned_by)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

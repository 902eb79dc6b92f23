//! Repository for the `transfer_sessions` ledger table.
//!
//! The ledger is keyed by actor + operation: each actor has at most one
//! pending operation of a kind, and the row survives a process restart
//! so an in-flight batch can be resumed.

use sqlx::PgPool;

use cellworks_core::types::DbId;

use crate::models::transfer_session::TransferSessionRow;

/// Column list for transfer_sessions queries.
const COLUMNS: &str = "actor_id, operation, ledger, updated_at";

/// Provides durable storage for the transfer session ledger.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert or replace the ledger for an actor's operation.
    pub async fn upsert(
        pool: &PgPool,
        actor_id: DbId,
        operation: &str,
        ledger: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO transfer_sessions (actor_id, operation, ledger)
             VALUES ($1, $2, $3)
             ON CONFLICT (actor_id, operation)
             DO UPDATE SET ledger = EXCLUDED.ledger, updated_at = NOW()",
        )
        .bind(actor_id)
        .bind(operation)
        .bind(ledger)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find the ledger row for an actor's operation, if any.
    pub async fn find_by_actor(
        pool: &PgPool,
        actor_id: DbId,
        operation: &str,
    ) -> Result<Option<TransferSessionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transfer_sessions
             WHERE actor_id = $1 AND operation = $2"
        );
        sqlx::query_as::<_, TransferSessionRow>(&query)
            .bind(actor_id)
            .bind(operation)
            .fetch_optional(pool)
            .await
    }

    /// Delete the ledger row for an actor's operation.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete_by_actor(
        pool: &PgPool,
        actor_id: DbId,
        operation: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM transfer_sessions WHERE actor_id = $1 AND operation = $2")
                .bind(actor_id)
                .bind(operation)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Repository for the `documents` table.
//!
//! Partial unique indexes (`uq_documents_one_approved`,
//! `uq_documents_one_seeking`) guarantee at most one Approved and one
//! Seeking row per name, so a racing promote surfaces as a constraint
//! violation instead of a duplicate Approved row.

use sqlx::PgPool;

use cellworks_core::document::DocumentState;
use cellworks_core::types::DbId;

use crate::models::document::{CreateDocument, Document};

/// Column list for documents queries.
const COLUMNS: &str = "id, name, state, body, owner_id, approver_id, \
    approved_at, created_at, updated_at";

/// Provides lifecycle operations for approvable documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Insert a new pending revision in state Seeking, returning the row.
    pub async fn create_seeking(
        pool: &PgPool,
        input: &CreateDocument,
    ) -> Result<Document, sqlx::Error> {
        let query = format!(
            "INSERT INTO documents (name, state, body, owner_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(&input.name)
            .bind(DocumentState::Seeking.as_str())
            .bind(&input.body)
            .bind(input.owner_id)
            .fetch_one(pool)
            .await
    }

    /// Find a document row by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the single row for a name in the given state, if any.
    ///
    /// Only meaningful for Seeking and Approved, which the partial
    /// unique indexes hold to at most one row.
    pub async fn find_by_name_and_state(
        pool: &PgPool,
        name: &str,
        state: DocumentState,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE name = $1 AND state = $2");
        sqlx::query_as::<_, Document>(&query)
            .bind(name)
            .bind(state.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Promote a pending revision: obsolete the current Approved row for
    /// the name (if any) and mark the pending row Approved, stamping
    /// approver id and timestamp.
    ///
    /// Runs in one transaction. Returns `RowNotFound` (rolling back the
    /// obsolete update) when the pending row is no longer in state
    /// Seeking — a racing approve loses cleanly.
    pub async fn promote(
        pool: &PgPool,
        pending_id: DbId,
        name: &str,
        approver_id: DbId,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE documents SET state = $2, updated_at = NOW()
             WHERE name = $1 AND state = $3",
        )
        .bind(name)
        .bind(DocumentState::Obsolete.as_str())
        .bind(DocumentState::Approved.as_str())
        .execute(&mut *tx)
        .await?;

        let promoted = sqlx::query(
            "UPDATE documents
             SET state = $2, approver_id = $3, approved_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND state = $4",
        )
        .bind(pending_id)
        .bind(DocumentState::Approved.as_str())
        .bind(approver_id)
        .bind(DocumentState::Seeking.as_str())
        .execute(&mut *tx)
        .await?;

        if promoted.rows_affected() != 1 {
            // Dropping the transaction rolls back the obsolete update.
            return Err(sqlx::Error::RowNotFound);
        }

        tx.commit().await
    }

    /// Delete a pending revision outright (rejection discards the edit).
    ///
    /// Returns `true` if a Seeking row was deleted.
    pub async fn delete_pending(pool: &PgPool, pending_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND state = $2")
            .bind(pending_id)
            .bind(DocumentState::Seeking.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

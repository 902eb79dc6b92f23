//! Repository for the `actors` table.

use sqlx::PgPool;

use cellworks_core::types::DbId;

use crate::models::actor::Actor;

/// Column list for actors queries.
const COLUMNS: &str = "id, username, email, password_hash, is_active, \
    created_at, updated_at";

/// Provides credential and recipient lookups for actors.
pub struct ActorRepo;

impl ActorRepo {
    /// Find an actor by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Actor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM actors WHERE id = $1");
        sqlx::query_as::<_, Actor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Email addresses of every active actor holding a capability.
    ///
    /// Used to resolve notification recipients.
    pub async fn emails_with_capability(
        pool: &PgPool,
        capability: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT a.email
             FROM actors a
             JOIN actor_capabilities ac ON ac.actor_id = a.id
             WHERE ac.capability = $1 AND a.is_active
             ORDER BY a.email ASC",
        )
        .bind(capability)
        .fetch_all(pool)
        .await
    }
}

//! Repository for the `actor_capabilities` and `actor_roles` tables.

use sqlx::PgPool;

use cellworks_core::types::DbId;

/// Provides membership lookups used for rights computation.
pub struct CapabilityRepo;

impl CapabilityRepo {
    /// All capabilities held by an actor.
    pub async fn capabilities_of(
        pool: &PgPool,
        actor_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT capability FROM actor_capabilities
             WHERE actor_id = $1
             ORDER BY capability ASC",
        )
        .bind(actor_id)
        .fetch_all(pool)
        .await
    }

    /// All roles held by an actor.
    pub async fn roles_of(pool: &PgPool, actor_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT role FROM actor_roles
             WHERE actor_id = $1
             ORDER BY role ASC",
        )
        .bind(actor_id)
        .fetch_all(pool)
        .await
    }
}

//! Actor (user account) model.

use sqlx::FromRow;

use cellworks_core::types::{DbId, Timestamp};

/// A row from the `actors` table.
///
/// Contains the password hash -- never serialize this outward. The
/// engine only reads it to verify the approval re-authentication factor.
#[derive(Debug, Clone, FromRow)]
pub struct Actor {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

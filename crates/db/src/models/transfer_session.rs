//! Durable transfer session ledger row.

use sqlx::FromRow;

use cellworks_core::types::{DbId, Timestamp};

/// A row from the `transfer_sessions` table.
///
/// `ledger` is the JSONB serialization of
/// [`cellworks_core::ledger::TransferSession`]; the table is keyed by
/// actor + operation so each actor has at most one pending operation of
/// a kind.
#[derive(Debug, Clone, FromRow)]
pub struct TransferSessionRow {
    pub actor_id: DbId,
    pub operation: String,
    pub ledger: serde_json::Value,
    pub updated_at: Timestamp,
}

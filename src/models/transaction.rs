use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{OwnerId, Side};

/// Database row for transactions table. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub side: String,
    pub symbol: String,
    pub quantity: i64,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl Transaction {
    pub fn side(&self) -> Option<Side> {
        Side::from_db_str(&self.side)
    }
}

/// A ledger entry about to be written as part of a position mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub owner_id: OwnerId,
    pub side: Side,
    pub symbol: String,
    pub quantity: i64,
    pub price: Decimal,
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for price_samples table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceSample {
    pub id: Uuid,
    pub symbol: String,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A price observation before it is persisted. This is also the cached
/// form of a history series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPriceSample {
    pub symbol: String,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

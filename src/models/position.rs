use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_price, OwnerId, Symbol, MAX_QUANTITY};
use crate::errors::TrackerError;

/// Database row for positions table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub symbol: String,
    pub quantity: i64,
    pub purchase_price: Decimal,
    pub acquired_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated request to open a new lot.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub symbol: Symbol,
    pub quantity: i64,
    pub purchase_price: Decimal,
}

impl OpenPosition {
    pub fn new(symbol: &str, quantity: i64, purchase_price: Decimal) -> Result<Self, TrackerError> {
        let symbol = Symbol::parse(symbol)?;
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(TrackerError::Validation(format!(
                "quantity must be between 1 and {MAX_QUANTITY}"
            )));
        }
        check_price(purchase_price)?;
        Ok(Self {
            symbol,
            quantity,
            purchase_price,
        })
    }
}

/// A validated partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PositionAdjustment {
    pub quantity: Option<i64>,
    pub purchase_price: Option<Decimal>,
}

impl PositionAdjustment {
    pub fn new(quantity: Option<i64>, purchase_price: Option<Decimal>) -> Result<Self, TrackerError> {
        if let Some(q) = quantity {
            if !(0..=MAX_QUANTITY).contains(&q) {
                return Err(TrackerError::Validation(format!(
                    "quantity must be between 0 and {MAX_QUANTITY}"
                )));
            }
        }
        if let Some(p) = purchase_price {
            check_price(p)?;
        }
        Ok(Self {
            quantity,
            purchase_price,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.purchase_price.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::max_price;

    #[test]
    fn test_open_position_validates_bounds() {
        assert!(OpenPosition::new("AAPL", 10, Decimal::new(15000, 2)).is_ok());
        assert!(OpenPosition::new("AAPL", 0, Decimal::new(15000, 2)).is_err());
        assert!(OpenPosition::new("AAPL", 1, Decimal::ZERO).is_err());
        assert!(OpenPosition::new("AAPL", 1, Decimal::new(1, 3)).is_err());
        assert!(OpenPosition::new("", 1, Decimal::ONE).is_err());
    }

    #[test]
    fn test_oversized_lots_rejected() {
        let err = OpenPosition::new("AAPL", 9_000_000_000_000_000_000, Decimal::from(10_000_000_000_i64))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert!(OpenPosition::new("AAPL", MAX_QUANTITY + 1, Decimal::ONE).is_err());
        assert!(OpenPosition::new("AAPL", 1, max_price() + Decimal::new(1, 2)).is_err());
        assert!(OpenPosition::new("AAPL", MAX_QUANTITY, max_price()).is_ok());

        assert!(PositionAdjustment::new(Some(MAX_QUANTITY + 1), None).is_err());
        assert!(PositionAdjustment::new(None, Some(max_price() + Decimal::ONE)).is_err());
        assert!(PositionAdjustment::new(Some(MAX_QUANTITY), Some(max_price())).is_ok());
    }

    #[test]
    fn test_adjustment_allows_zero_quantity() {
        let adj = PositionAdjustment::new(Some(0), None).unwrap();
        assert_eq!(adj.quantity, Some(0));
        assert!(PositionAdjustment::new(Some(-1), None).is_err());
        assert!(PositionAdjustment::new(None, Some(Decimal::ZERO)).is_err());
    }

    #[test]
    fn test_empty_adjustment() {
        assert!(PositionAdjustment::default().is_empty());
        assert!(!PositionAdjustment::new(None, Some(Decimal::ONE)).unwrap().is_empty());
    }
}

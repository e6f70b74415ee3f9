use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::OwnerId;

/// A position joined against the latest known price for its symbol.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Valuation {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub symbol: String,
    pub quantity: i64,
    pub purchase_price: Decimal,
    pub acquired_at: DateTime<Utc>,
    pub current_price: Option<Decimal>,
    #[sqlx(default)]
    pub profit_loss: Option<Decimal>,
}

/// Unrealized P&L: current value minus cost basis. `None` if the result does
/// not fit in a `Decimal`.
pub fn profit_loss(quantity: i64, purchase_price: Decimal, current_price: Decimal) -> Option<Decimal> {
    let qty = Decimal::from(quantity);
    let value = current_price.checked_mul(qty)?;
    let cost = purchase_price.checked_mul(qty)?;
    value.checked_sub(cost)
}

impl Valuation {
    pub fn with_profit_loss(mut self) -> Self {
        self.profit_loss = self
            .current_price
            .and_then(|current| profit_loss(self.quantity, self.purchase_price, current));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valuation(current: Option<Decimal>) -> Valuation {
        Valuation {
            id: Uuid::new_v4(),
            owner_id: 1,
            symbol: "AAPL".into(),
            quantity: 10,
            purchase_price: Decimal::new(15000, 2),
            acquired_at: Utc::now(),
            current_price: current,
            profit_loss: None,
        }
    }

    #[test]
    fn test_profit_loss_gain_and_loss() {
        assert_eq!(
            profit_loss(10, Decimal::new(15000, 2), Decimal::new(16050, 2)),
            Some(Decimal::new(10500, 2))
        );
        assert_eq!(
            profit_loss(4, Decimal::new(15000, 2), Decimal::new(14000, 2)),
            Some(Decimal::from(-40))
        );
    }

    #[test]
    fn test_profit_loss_overflow_is_absent() {
        let huge = Decimal::from(10_000_000_000_i64);
        assert_eq!(profit_loss(9_000_000_000_000_000_000, huge, huge + Decimal::ONE), None);

        let mut v = valuation(Some(huge + Decimal::ONE));
        v.quantity = 9_000_000_000_000_000_000;
        v.purchase_price = huge;
        let v = v.with_profit_loss();
        assert_eq!(v.current_price, Some(huge + Decimal::ONE));
        assert!(v.profit_loss.is_none());
    }

    #[test]
    fn test_missing_price_yields_no_profit_loss() {
        let v = valuation(None).with_profit_loss();
        assert!(v.current_price.is_none());
        assert!(v.profit_loss.is_none());
    }

    #[test]
    fn test_profit_loss_filled_when_price_known() {
        let v = valuation(Some(Decimal::from(155))).with_profit_loss();
        assert_eq!(v.profit_loss, Some(Decimal::from(50)));
    }
}

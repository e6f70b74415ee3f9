use metrics::counter;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction as StoreTransaction};
use uuid::Uuid;

use crate::db::{position_repo, transaction_repo};
use crate::deadline::{Deadline, DeadlineExceeded};
use crate::errors::TrackerError;
use crate::models::{
    LedgerEntry, OpenPosition, OwnerId, Position, PositionAdjustment, Side, Transaction,
};

/// What one ledger operation committed.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerOutcome {
    /// Snapshot after the operation; `None` once the position is closed.
    pub position: Option<Position>,
    /// Ledger entries written by the operation, in insert order.
    pub transactions: Vec<Transaction>,
}

/// Failure inside one atomic unit, before it is mapped for the caller.
enum UnitError {
    NotFound(Uuid),
    Store(sqlx::Error),
}

impl From<sqlx::Error> for UnitError {
    fn from(e: sqlx::Error) -> Self {
        UnitError::Store(e)
    }
}

/// Position snapshot plus append-only transaction ledger.
///
/// Every mutation runs as a single store transaction: the snapshot change and
/// its ledger entries commit together or not at all. Inputs arrive already
/// validated (`OpenPosition`, `PositionAdjustment`); the ledger itself only
/// checks ownership and existence.
#[derive(Clone)]
pub struct PositionLedger {
    pool: PgPool,
    record_increases: bool,
}

impl PositionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            record_increases: true,
        }
    }

    /// Whether raising a quantity through an adjustment writes a `buy` entry.
    pub fn record_increases(mut self, enabled: bool) -> Self {
        self.record_increases = enabled;
        self
    }

    /// Open a new lot and record the matching buy.
    pub async fn add_position(
        &self,
        owner_id: OwnerId,
        open: &OpenPosition,
        deadline: Deadline,
    ) -> Result<LedgerOutcome, TrackerError> {
        let unit = async {
            let mut tx = self.pool.begin().await?;

            let position = position_repo::insert_position(
                &mut *tx,
                owner_id,
                open.symbol.as_str(),
                open.quantity,
                open.purchase_price,
            )
            .await?;

            let entry = LedgerEntry {
                owner_id,
                side: Side::Buy,
                symbol: position.symbol.clone(),
                quantity: open.quantity,
                price: open.purchase_price,
            };
            let transaction = transaction_repo::insert_transaction(&mut *tx, &entry).await?;

            Ok::<_, UnitError>((
                tx,
                LedgerOutcome {
                    position: Some(position),
                    transactions: vec![transaction],
                },
            ))
        };

        let outcome = finish("add_position", commit(deadline.run(unit).await).await)?;
        tracing::info!(
            owner_id,
            symbol = %open.symbol,
            quantity = open.quantity,
            price = %open.purchase_price,
            "Position opened"
        );
        Ok(outcome)
    }

    /// Apply a partial update. A quantity reduction records a sell of the
    /// difference at the price recorded before the update.
    pub async fn update_position(
        &self,
        owner_id: OwnerId,
        position_id: Uuid,
        adjustment: &PositionAdjustment,
        deadline: Deadline,
    ) -> Result<LedgerOutcome, TrackerError> {
        let unit = async {
            let mut tx = self.pool.begin().await?;

            let existing = position_repo::lock_owned_position(&mut *tx, owner_id, position_id)
                .await?
                .ok_or(UnitError::NotFound(position_id))?;

            let mut transactions = Vec::new();
            if let Some(entry) = adjustment_entry(&existing, adjustment, self.record_increases) {
                transactions.push(transaction_repo::insert_transaction(&mut *tx, &entry).await?);
            }

            let position = if adjustment.is_empty() {
                existing
            } else {
                position_repo::update_position(
                    &mut *tx,
                    owner_id,
                    position_id,
                    adjustment.quantity,
                    adjustment.purchase_price,
                )
                .await?
            };

            Ok::<_, UnitError>((
                tx,
                LedgerOutcome {
                    position: Some(position),
                    transactions,
                },
            ))
        };

        let outcome = finish("update_position", commit(deadline.run(unit).await).await)?;
        tracing::info!(
            owner_id,
            position_id = %position_id,
            entries = outcome.transactions.len(),
            "Position adjusted"
        );
        Ok(outcome)
    }

    /// Delete the lot and record a sell of everything it still held.
    pub async fn remove_position(
        &self,
        owner_id: OwnerId,
        position_id: Uuid,
        deadline: Deadline,
    ) -> Result<LedgerOutcome, TrackerError> {
        let unit = async {
            let mut tx = self.pool.begin().await?;

            let existing = position_repo::lock_owned_position(&mut *tx, owner_id, position_id)
                .await?
                .ok_or(UnitError::NotFound(position_id))?;

            position_repo::delete_position(&mut *tx, owner_id, position_id).await?;

            let mut transactions = Vec::new();
            if let Some(entry) = closing_entry(&existing) {
                transactions.push(transaction_repo::insert_transaction(&mut *tx, &entry).await?);
            }

            Ok::<_, UnitError>((
                tx,
                LedgerOutcome {
                    position: None,
                    transactions,
                },
            ))
        };

        let outcome = finish("remove_position", commit(deadline.run(unit).await).await)?;
        tracing::info!(owner_id, position_id = %position_id, "Position closed");
        Ok(outcome)
    }

    pub async fn get_position(
        &self,
        owner_id: OwnerId,
        position_id: Uuid,
        deadline: Deadline,
    ) -> Result<Position, TrackerError> {
        deadline
            .run(position_repo::get_owned_position(&self.pool, owner_id, position_id))
            .await
            .map_err(|e| TrackerError::store_unavailable("get_position", e))?
            .map_err(|e| TrackerError::store_unavailable("get_position", e))?
            .ok_or(TrackerError::PositionNotFound(position_id))
    }

    pub async fn list_positions(
        &self,
        owner_id: OwnerId,
        deadline: Deadline,
    ) -> Result<Vec<Position>, TrackerError> {
        deadline
            .run(position_repo::get_positions_for_owner(&self.pool, owner_id))
            .await
            .map_err(|e| TrackerError::store_unavailable("list_positions", e))?
            .map_err(|e| TrackerError::store_unavailable("list_positions", e))
    }

    /// The owner's move history, newest first.
    pub async fn list_transactions(
        &self,
        owner_id: OwnerId,
        symbol: Option<&str>,
        deadline: Deadline,
    ) -> Result<Vec<Transaction>, TrackerError> {
        deadline
            .run(transaction_repo::get_transactions_for_owner(&self.pool, owner_id, symbol))
            .await
            .map_err(|e| TrackerError::store_unavailable("list_transactions", e))?
            .map_err(|e| TrackerError::store_unavailable("list_transactions", e))
    }
}

/// Commit a staged unit. The deadline covers staging only: a commit that has
/// been sent runs to completion, so a change the store kept is never reported
/// as failed to the caller.
async fn commit<T>(
    staged: Result<Result<(StoreTransaction<'static, Postgres>, T), UnitError>, DeadlineExceeded>,
) -> Result<Result<T, UnitError>, DeadlineExceeded> {
    match staged? {
        Ok((tx, value)) => Ok(tx.commit().await.map(|()| value).map_err(UnitError::from)),
        Err(e) => Ok(Err(e)),
    }
}

/// Map the result of one atomic unit. Any store error has already rolled the
/// transaction back by the time we get here (dropped without commit).
fn finish<T>(
    operation: &'static str,
    result: Result<Result<T, UnitError>, DeadlineExceeded>,
) -> Result<T, TrackerError> {
    match result {
        Ok(Ok(value)) => {
            counter!("ledger_writes_total").increment(1);
            Ok(value)
        }
        Ok(Err(UnitError::NotFound(id))) => Err(TrackerError::PositionNotFound(id)),
        Ok(Err(UnitError::Store(e))) => {
            counter!("ledger_write_failures_total").increment(1);
            tracing::error!(operation, error = %e, "Ledger unit rolled back");
            Err(TrackerError::LedgerWriteFailed(e))
        }
        Err(e) => {
            counter!("ledger_write_failures_total").increment(1);
            tracing::error!(operation, "Ledger unit abandoned at deadline");
            Err(TrackerError::store_unavailable(operation, e))
        }
    }
}

/// Ledger entry implied by an adjustment, if any.
///
/// A decrease is a sell of the difference at the pre-update price. An
/// increase is a buy at the post-update price, but only when
/// `record_increases` is set.
pub(crate) fn adjustment_entry(
    existing: &Position,
    adjustment: &PositionAdjustment,
    record_increases: bool,
) -> Option<LedgerEntry> {
    let new_quantity = adjustment.quantity?;

    let (side, quantity, price) = if new_quantity < existing.quantity {
        (
            Side::Sell,
            existing.quantity - new_quantity,
            existing.purchase_price,
        )
    } else if new_quantity > existing.quantity && record_increases {
        (
            Side::Buy,
            new_quantity - existing.quantity,
            adjustment.purchase_price.unwrap_or(existing.purchase_price),
        )
    } else {
        return None;
    };

    Some(LedgerEntry {
        owner_id: existing.owner_id,
        side,
        symbol: existing.symbol.clone(),
        quantity,
        price,
    })
}

/// Sell of the full remaining quantity. A zero-quantity lot leaves nothing
/// to record.
pub(crate) fn closing_entry(existing: &Position) -> Option<LedgerEntry> {
    (existing.quantity > 0).then(|| LedgerEntry {
        owner_id: existing.owner_id,
        side: Side::Sell,
        symbol: existing.symbol.clone(),
        quantity: existing.quantity,
        price: existing.purchase_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn position(quantity: i64, price: Decimal) -> Position {
        Position {
            id: Uuid::new_v4(),
            owner_id: 1,
            symbol: "AAPL".into(),
            quantity,
            purchase_price: price,
            acquired_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn adjust(quantity: Option<i64>, price: Option<Decimal>) -> PositionAdjustment {
        PositionAdjustment::new(quantity, price).unwrap()
    }

    #[test]
    fn test_decrease_sells_delta_at_existing_price() {
        let existing = position(10, Decimal::new(15000, 2));
        let entry = adjustment_entry(&existing, &adjust(Some(4), Some(Decimal::from(999))), true)
            .expect("decrease should be ledgered");

        assert_eq!(entry.side, Side::Sell);
        assert_eq!(entry.quantity, 6);
        assert_eq!(entry.price, Decimal::new(15000, 2));
        assert_eq!(entry.symbol, "AAPL");
        assert_eq!(entry.owner_id, 1);
    }

    #[test]
    fn test_increase_buys_delta_when_enabled() {
        let existing = position(10, Decimal::from(150));

        let entry = adjustment_entry(&existing, &adjust(Some(15), None), true).unwrap();
        assert_eq!(entry.side, Side::Buy);
        assert_eq!(entry.quantity, 5);
        assert_eq!(entry.price, Decimal::from(150));

        let entry = adjustment_entry(&existing, &adjust(Some(12), Some(Decimal::from(160))), true)
            .unwrap();
        assert_eq!(entry.price, Decimal::from(160));
    }

    #[test]
    fn test_increase_silent_when_disabled() {
        let existing = position(10, Decimal::from(150));
        assert!(adjustment_entry(&existing, &adjust(Some(15), None), false).is_none());
    }

    #[test]
    fn test_price_only_or_same_quantity_records_nothing() {
        let existing = position(10, Decimal::from(150));
        assert!(adjustment_entry(&existing, &adjust(None, Some(Decimal::from(1))), true).is_none());
        assert!(adjustment_entry(&existing, &adjust(Some(10), None), true).is_none());
        assert!(adjustment_entry(&existing, &PositionAdjustment::default(), true).is_none());
    }

    #[test]
    fn test_reduce_to_zero_sells_everything() {
        let existing = position(7, Decimal::from(20));
        let entry = adjustment_entry(&existing, &adjust(Some(0), None), true).unwrap();
        assert_eq!(entry.side, Side::Sell);
        assert_eq!(entry.quantity, 7);
    }

    #[test]
    fn test_closing_entry() {
        let entry = closing_entry(&position(4, Decimal::from(150))).unwrap();
        assert_eq!(entry.side, Side::Sell);
        assert_eq!(entry.quantity, 4);
        assert_eq!(entry.price, Decimal::from(150));

        assert!(closing_entry(&position(0, Decimal::from(150))).is_none());
    }
}

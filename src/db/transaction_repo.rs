use sqlx::{PgExecutor, PgPool};

use crate::models::{LedgerEntry, OwnerId, Transaction};

/// Append one ledger entry. There is no update or delete counterpart.
pub async fn insert_transaction<'e, E: PgExecutor<'e>>(
    executor: E,
    entry: &LedgerEntry,
) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (owner_id, side, symbol, quantity, price)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(entry.owner_id)
    .bind(entry.side.as_str())
    .bind(&entry.symbol)
    .bind(entry.quantity)
    .bind(entry.price)
    .fetch_one(executor)
    .await
}

/// Ledger entries for an owner, newest first, optionally for one symbol.
pub async fn get_transactions_for_owner(
    pool: &PgPool,
    owner_id: OwnerId,
    symbol: Option<&str>,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE owner_id = $1 AND ($2::TEXT IS NULL OR symbol = $2)
        ORDER BY executed_at DESC, id
        "#,
    )
    .bind(owner_id)
    .bind(symbol)
    .fetch_all(pool)
    .await
}

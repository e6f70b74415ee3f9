use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{OwnerId, Position, Valuation};

/// Insert a new position lot.
pub async fn insert_position<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: OwnerId,
    symbol: &str,
    quantity: i64,
    purchase_price: Decimal,
) -> Result<Position, sqlx::Error> {
    sqlx::query_as::<_, Position>(
        r#"
        INSERT INTO positions (owner_id, symbol, quantity, purchase_price)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(symbol)
    .bind(quantity)
    .bind(purchase_price)
    .fetch_one(executor)
    .await
}

/// Load a position owned by `owner_id`.
pub async fn get_owned_position<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: OwnerId,
    id: Uuid,
) -> Result<Option<Position>, sqlx::Error> {
    sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await
}

/// Same as [`get_owned_position`] but takes a row lock for the rest of the
/// enclosing transaction.
pub async fn lock_owned_position<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: OwnerId,
    id: Uuid,
) -> Result<Option<Position>, sqlx::Error> {
    sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE id = $1 AND owner_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await
}

/// Apply a partial update; `None` leaves the column unchanged.
pub async fn update_position<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: OwnerId,
    id: Uuid,
    quantity: Option<i64>,
    purchase_price: Option<Decimal>,
) -> Result<Position, sqlx::Error> {
    sqlx::query_as::<_, Position>(
        r#"
        UPDATE positions
        SET quantity = COALESCE($3, quantity),
            purchase_price = COALESCE($4, purchase_price),
            updated_at = NOW()
        WHERE id = $1 AND owner_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(quantity)
    .bind(purchase_price)
    .fetch_one(executor)
    .await
}

pub async fn delete_position<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: OwnerId,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM positions WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// All lots held by an owner, oldest first.
pub async fn get_positions_for_owner(
    pool: &PgPool,
    owner_id: OwnerId,
) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE owner_id = $1 ORDER BY acquired_at, id",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

/// Positions joined with the most recent price sample of their symbol.
/// Symbols without samples come back with a NULL price.
pub async fn get_valuations_for_owner(
    pool: &PgPool,
    owner_id: OwnerId,
) -> Result<Vec<Valuation>, sqlx::Error> {
    sqlx::query_as::<_, Valuation>(
        r#"
        SELECT p.id, p.owner_id, p.symbol, p.quantity, p.purchase_price, p.acquired_at,
               s.price AS current_price
        FROM positions p
        LEFT JOIN LATERAL (
            SELECT ps.price
            FROM price_samples ps
            WHERE ps.symbol = p.symbol
            ORDER BY ps.observed_at DESC, ps.created_at DESC
            LIMIT 1
        ) s ON TRUE
        WHERE p.owner_id = $1
        ORDER BY p.acquired_at, p.id
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

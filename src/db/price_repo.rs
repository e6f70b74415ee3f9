use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use super::bulk::BatchInsert;
use crate::models::{NewPriceSample, PriceSample};

/// Append a single observed price.
pub async fn insert_sample<'e, E: PgExecutor<'e>>(
    executor: E,
    sample: &NewPriceSample,
) -> Result<PriceSample, sqlx::Error> {
    sqlx::query_as::<_, PriceSample>(
        r#"
        INSERT INTO price_samples (symbol, price, observed_at)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&sample.symbol)
    .bind(sample.price)
    .bind(sample.observed_at)
    .fetch_one(executor)
    .await
}

/// Current price: the sample with the latest `observed_at`.
pub async fn get_latest_sample(pool: &PgPool, symbol: &str) -> anyhow::Result<Option<PriceSample>> {
    let sample = sqlx::query_as::<_, PriceSample>(
        r#"
        SELECT * FROM price_samples
        WHERE symbol = $1
        ORDER BY observed_at DESC, created_at DESC
        LIMIT 1
        "#,
    )
    .bind(symbol)
    .fetch_optional(pool)
    .await?;

    Ok(sample)
}

pub async fn count_samples(pool: &PgPool, symbol: &str) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM price_samples WHERE symbol = $1")
        .bind(symbol)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Where price samples are persisted. Split out from the pool so the quote
/// and history paths can run against an in-memory store in tests.
#[async_trait]
pub trait PriceStore: BatchInsert<NewPriceSample> {
    async fn append_sample(&self, sample: &NewPriceSample) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgPriceStore {
    pool: PgPool,
}

impl PgPriceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn append_sample(&self, sample: &NewPriceSample) -> anyhow::Result<()> {
        insert_sample(&self.pool, sample).await?;
        Ok(())
    }
}

#[async_trait]
impl BatchInsert<NewPriceSample> for PgPriceStore {
    /// One multi-row INSERT in its own transaction: the batch commits or
    /// rolls back as a whole.
    async fn insert_batch(&self, batch: &[NewPriceSample]) -> anyhow::Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO price_samples (symbol, price, observed_at) ");
        builder.push_values(batch, |mut row, sample| {
            row.push_bind(sample.symbol.clone())
                .push_bind(sample.price)
                .push_bind(sample.observed_at);
        });

        let result = builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }
}

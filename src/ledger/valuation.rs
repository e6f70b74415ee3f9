use sqlx::PgPool;

use crate::db::position_repo;
use crate::deadline::Deadline;
use crate::errors::TrackerError;
use crate::models::{OwnerId, Valuation};

/// Read-only join of an owner's positions against the latest stored price
/// per symbol. Takes no locks.
#[derive(Clone)]
pub struct ValuationQuery {
    pool: PgPool,
}

impl ValuationQuery {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_valuation(
        &self,
        owner_id: OwnerId,
        deadline: Deadline,
    ) -> Result<Vec<Valuation>, TrackerError> {
        let rows = deadline
            .run(position_repo::get_valuations_for_owner(&self.pool, owner_id))
            .await
            .map_err(|e| TrackerError::store_unavailable("valuation", e))?
            .map_err(|e| TrackerError::store_unavailable("valuation", e))?;

        Ok(rows.into_iter().map(Valuation::with_profit_loss).collect())
    }
}

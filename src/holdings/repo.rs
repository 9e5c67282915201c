use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Holding, NewHolding};
use crate::error::StoreError;

/// Owner-scoped holdings store. `owner_id` always comes from the gate.
#[async_trait]
pub trait HoldingRepository: Send + Sync {
    async fn create(&self, owner_id: Uuid, holding: NewHolding) -> Result<Holding, StoreError>;
    /// Newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Holding>, StoreError>;
}

#[derive(Clone)]
pub struct PgHoldingRepository {
    pool: PgPool,
}

impl PgHoldingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HoldingRepository for PgHoldingRepository {
    async fn create(&self, owner_id: Uuid, holding: NewHolding) -> Result<Holding, StoreError> {
        let row = sqlx::query_as::<_, Holding>(
            r#"
            INSERT INTO holdings (owner_id, ticker_symbol, quantity, acquisition_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, ticker_symbol, quantity, acquisition_price,
                      created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&holding.ticker_symbol)
        .bind(holding.quantity)
        .bind(holding.acquisition_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Holding>, StoreError> {
        let rows = sqlx::query_as::<_, Holding>(
            r#"
            SELECT id, owner_id, ticker_symbol, quantity, acquisition_price,
                   created_at, updated_at
              FROM holdings
             WHERE owner_id = $1
             ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

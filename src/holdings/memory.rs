use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::HoldingRepository;
use super::repo_types::{Holding, NewHolding};
use crate::error::StoreError;

/// Insertion-ordered in-memory holdings store.
#[derive(Default)]
pub struct InMemoryHoldingRepository {
    rows: RwLock<Vec<Holding>>,
}

impl InMemoryHoldingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HoldingRepository for InMemoryHoldingRepository {
    async fn create(&self, owner_id: Uuid, holding: NewHolding) -> Result<Holding, StoreError> {
        let now = OffsetDateTime::now_utc();
        let row = Holding {
            id: Uuid::new_v4(),
            owner_id,
            ticker_symbol: holding.ticker_symbol,
            quantity: holding.quantity,
            acquisition_price: holding.acquisition_price,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Holding>, StoreError> {
        // Rows are appended in creation order, so reverse iteration is newest first.
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .rev()
            .filter(|h| h.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

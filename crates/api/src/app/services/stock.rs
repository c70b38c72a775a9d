use std::sync::Arc;

use chrono::Utc;

use stockwatch_core::{AdminId, StockItemId};
use stockwatch_inventory::{CreateStockItem, StockItem, UpdateStockItem};
use stockwatch_infra::StockRepository;

use super::ServiceError;

#[derive(Clone)]
pub struct StockService {
    stock: Arc<dyn StockRepository>,
}

impl StockService {
    pub fn new(stock: Arc<dyn StockRepository>) -> Self {
        Self { stock }
    }

    pub async fn list_active(&self) -> Result<Vec<StockItem>, ServiceError> {
        Ok(self.stock.list_active().await?)
    }

    pub async fn list_low_stock(&self) -> Result<Vec<StockItem>, ServiceError> {
        Ok(self.stock.list_low_stock().await?)
    }

    pub async fn add(&self, cmd: CreateStockItem) -> Result<StockItem, ServiceError> {
        let item = StockItem::create(StockItemId::new(), cmd)?;
        tracing::info!(item_id = %item.id, owner = %item.owner_id, "stock item added");
        Ok(self.stock.insert(item).await?)
    }

    /// Update an item in place; `actor_id` becomes its owner.
    pub async fn update(
        &self,
        id: StockItemId,
        cmd: UpdateStockItem,
    ) -> Result<StockItem, ServiceError> {
        let mut item = self
            .stock
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::StockNotFound)?;

        item.apply_update(&cmd)?;
        self.stock.update(&item).await?;
        tracing::info!(item_id = %item.id, actor = %cmd.actor_id, status = item.status.code(), "stock item updated");
        Ok(item)
    }
}

/// Fill in the bookkeeping fields of an update command for `actor_id`.
pub fn update_command(actor_id: AdminId) -> UpdateStockItem {
    UpdateStockItem {
        title: None,
        quantity: None,
        status: None,
        created_at: None,
        updated_at: None,
        actor_id,
        occurred_at: Utc::now(),
    }
}

use crate::core::error::StoreResult;
use crate::core::service::{DataService, MarketplaceStore};
use crate::entities::{Item, ItemStatus};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Item service that repairs divergent statuses on read
///
/// A Rented item whose rentals are all closed is reported, and stored, as
/// Available. Writes pass straight through.
#[derive(Clone)]
pub struct ReconciledItems {
    store: Arc<dyn MarketplaceStore>,
}

impl ReconciledItems {
    pub fn new(store: Arc<dyn MarketplaceStore>) -> Self {
        Self { store }
    }

    async fn repaired(&self, item: Item) -> StoreResult<Item> {
        if item.status != ItemStatus::Rented {
            return Ok(item);
        }

        let (item, repaired) = self.store.reconcile_item(&item.id).await?;
        if repaired {
            tracing::warn!(item = %item.id, status = %item.status, "repaired divergent item status");
        }
        Ok(item)
    }
}

#[async_trait]
impl DataService<Item> for ReconciledItems {
    async fn create(&self, entity: Item) -> StoreResult<Item> {
        DataService::<Item>::create(self.store.as_ref(), entity).await
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Item>> {
        match DataService::<Item>::get(self.store.as_ref(), id).await? {
            Some(item) => self.repaired(item).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list(&self) -> StoreResult<Vec<Item>> {
        let items = DataService::<Item>::list(self.store.as_ref()).await?;

        let mut checked = Vec::with_capacity(items.len());
        for item in items {
            checked.push(self.repaired(item).await?);
        }
        Ok(checked)
    }

    async fn update(&self, id: &Uuid, entity: Item) -> StoreResult<Item> {
        DataService::<Item>::update(self.store.as_ref(), id, entity).await
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<()> {
        DataService::<Item>::delete(self.store.as_ref(), id).await
    }
}

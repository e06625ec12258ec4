//! Collaborator contracts for the platform-owned storage, plus the in-memory
//! implementations used by the service and its tests. The evaluation core
//! never owns storage; everything here is an adapter boundary.

use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{
        food_box::FoodBoxConfig,
        fulfillment::FulfillmentRecord,
        order::{OrderRecord, OrderStatus},
        promotion::PromotionSettings,
    },
};

/// Key-value settings owned by the admin form boundary.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn promotion_settings(&self) -> Result<Option<PromotionSettings>, ServiceError>;
    async fn put_promotion_settings(
        &self,
        settings: PromotionSettings,
    ) -> Result<(), ServiceError>;
    /// Deletes the settings record entirely (the admin reset action).
    async fn reset_promotion_settings(&self) -> Result<(), ServiceError>;
}

/// Per-product metadata owned by the product catalog.
#[async_trait]
pub trait ProductMetaStore: Send + Sync {
    async fn food_box_config(&self, product_id: Uuid)
        -> Result<Option<FoodBoxConfig>, ServiceError>;
    async fn set_food_box_config(
        &self,
        product_id: Uuid,
        config: FoodBoxConfig,
    ) -> Result<(), ServiceError>;
}

/// Mirror of the platform's order records, including per-order fulfillment
/// metadata.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Orders in any of the given statuses, newest first, at most `limit`.
    async fn list_by_status(
        &self,
        statuses: &[OrderStatus],
        limit: usize,
    ) -> Result<Vec<OrderRecord>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<OrderRecord>, ServiceError>;
    async fn upsert(&self, order: OrderRecord) -> Result<(), ServiceError>;
    async fn set_status(&self, id: Uuid, status: OrderStatus)
        -> Result<OrderRecord, ServiceError>;
    async fn set_fulfillment(
        &self,
        id: Uuid,
        record: FulfillmentRecord,
    ) -> Result<OrderRecord, ServiceError>;
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Order {} not found", id))
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    inner: RwLock<Option<PromotionSettings>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn promotion_settings(&self) -> Result<Option<PromotionSettings>, ServiceError> {
        let guard = self
            .inner
            .read()
            .map_err(|e| ServiceError::StorageError(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn put_promotion_settings(
        &self,
        settings: PromotionSettings,
    ) -> Result<(), ServiceError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| ServiceError::StorageError(e.to_string()))?;
        *guard = Some(settings);
        Ok(())
    }

    async fn reset_promotion_settings(&self) -> Result<(), ServiceError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| ServiceError::StorageError(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// In-memory product metadata store.
#[derive(Debug, Default)]
pub struct InMemoryProductMetaStore {
    configs: DashMap<Uuid, FoodBoxConfig>,
}

impl InMemoryProductMetaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductMetaStore for InMemoryProductMetaStore {
    async fn food_box_config(
        &self,
        product_id: Uuid,
    ) -> Result<Option<FoodBoxConfig>, ServiceError> {
        Ok(self.configs.get(&product_id).map(|entry| entry.clone()))
    }

    async fn set_food_box_config(
        &self,
        product_id: Uuid,
        config: FoodBoxConfig,
    ) -> Result<(), ServiceError> {
        self.configs.insert(product_id, config);
        Ok(())
    }
}

/// In-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<Uuid, OrderRecord>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn list_by_status(
        &self,
        statuses: &[OrderStatus],
        limit: usize,
    ) -> Result<Vec<OrderRecord>, ServiceError> {
        let mut orders: Vec<OrderRecord> = self
            .orders
            .iter()
            .filter(|entry| statuses.contains(&entry.status))
            .map(|entry| entry.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit);
        Ok(orders)
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrderRecord>, ServiceError> {
        Ok(self.orders.get(&id).map(|entry| entry.clone()))
    }

    async fn upsert(&self, order: OrderRecord) -> Result<(), ServiceError> {
        self.orders.insert(order.id, order);
        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, ServiceError> {
        let mut entry = self.orders.get_mut(&id).ok_or_else(|| not_found(id))?;
        entry.status = status;
        Ok(entry.clone())
    }

    async fn set_fulfillment(
        &self,
        id: Uuid,
        record: FulfillmentRecord,
    ) -> Result<OrderRecord, ServiceError> {
        let mut entry = self.orders.get_mut(&id).ok_or_else(|| not_found(id))?;
        entry.fulfillment = record;
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn order(status: OrderStatus, age_minutes: i64) -> OrderRecord {
        OrderRecord {
            id: Uuid::new_v4(),
            customer_name: "Test Customer".into(),
            status,
            lines: vec![],
            fulfillment: FulfillmentRecord::default(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn settings_round_trip_and_reset() {
        let store = InMemorySettingsStore::new();
        assert_eq!(store.promotion_settings().await.unwrap(), None);

        let settings = PromotionSettings {
            start_date: Some("2024-06-01".into()),
            ..Default::default()
        };
        store.put_promotion_settings(settings.clone()).await.unwrap();
        assert_eq!(store.promotion_settings().await.unwrap(), Some(settings));

        store.reset_promotion_settings().await.unwrap();
        assert_eq!(store.promotion_settings().await.unwrap(), None);
    }

    #[tokio::test]
    async fn order_listing_filters_sorts_and_limits() {
        let store = InMemoryOrderStore::new();
        let newest = order(OrderStatus::Processing, 1);
        let older = order(OrderStatus::Completed, 10);
        let cancelled = order(OrderStatus::Cancelled, 5);
        for o in [&newest, &older, &cancelled] {
            store.upsert((*o).clone()).await.unwrap();
        }

        let listed = store
            .list_by_status(&[OrderStatus::Processing, OrderStatus::Completed], 20)
            .await
            .unwrap();
        assert_eq!(
            listed.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![newest.id, older.id]
        );

        let limited = store
            .list_by_status(&[OrderStatus::Processing, OrderStatus::Completed], 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, newest.id);
    }

    #[tokio::test]
    async fn set_status_on_unknown_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        let err = store
            .set_status(Uuid::new_v4(), OrderStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}

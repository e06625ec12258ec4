use std::sync::Arc;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{
        fulfillment::FoodBoxStatus,
        order::{OrderRecord, OrderStatus},
    },
    stores::OrderStore,
};

lazy_static! {
    static ref FOOD_BOX_RECEIPTS: IntCounter = IntCounter::new(
        "food_box_receipts_total",
        "Total number of food box fulfillment records marked received"
    )
    .expect("metric can be created");
}

/// One row of the food box management table: per-order box totals plus the
/// fulfillment state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct FoodBoxRow {
    pub order_id: Uuid,
    pub customer_name: String,
    pub total_quantity: i32,
    pub total_price: Decimal,
    pub status: FoodBoxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_date: Option<NaiveDate>,
}

impl FoodBoxRow {
    fn from_order(order: &OrderRecord) -> Self {
        let (total_quantity, total_price) = order.box_totals();
        Self {
            order_id: order.id,
            customer_name: order.customer_name.clone(),
            total_quantity,
            total_price,
            status: order.fulfillment.status,
            received_date: order.fulfillment.received_date,
        }
    }
}

#[derive(Clone)]
pub struct FulfillmentService {
    orders: Arc<dyn OrderStore>,
    page_limit: usize,
}

impl FulfillmentService {
    pub fn new(orders: Arc<dyn OrderStore>, page_limit: usize) -> Self {
        Self { orders, page_limit }
    }

    /// Builds the management table over processing and completed orders.
    /// Completed orders that are still pending get the automatic received
    /// transition applied (and persisted) while listing, mirroring the way
    /// the source table reconciles state on render.
    #[instrument(skip(self))]
    pub async fn management_rows(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<FoodBoxRow>, ServiceError> {
        let orders = self
            .orders
            .list_by_status(
                &[OrderStatus::Processing, OrderStatus::Completed],
                self.page_limit,
            )
            .await?;

        let mut rows = Vec::with_capacity(orders.len());
        for mut order in orders {
            if order.status == OrderStatus::Completed
                && order.fulfillment.mark_order_completed(today)
            {
                FOOD_BOX_RECEIPTS.inc();
                order = self
                    .orders
                    .set_fulfillment(order.id, order.fulfillment.clone())
                    .await?;
            }
            rows.push(FoodBoxRow::from_order(&order));
        }
        Ok(rows)
    }

    /// Manual admin update of one order's fulfillment record. Both
    /// directions are allowed.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        status: FoodBoxStatus,
        received_date: Option<NaiveDate>,
    ) -> Result<FoodBoxRow, ServiceError> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        order.fulfillment.apply_manual(status, received_date);
        if status == FoodBoxStatus::Received {
            FOOD_BOX_RECEIPTS.inc();
        }
        let order = self
            .orders
            .set_fulfillment(order_id, order.fulfillment)
            .await?;

        info!(%order_id, %status, "food box fulfillment updated");
        Ok(FoodBoxRow::from_order(&order))
    }

    /// Reaction to an order status change reported by the platform: reaching
    /// Completed marks the box received, stamping today only if the date was
    /// never set.
    #[instrument(skip(self))]
    pub async fn order_status_changed(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        today: NaiveDate,
    ) -> Result<(), ServiceError> {
        if new_status != OrderStatus::Completed {
            return Ok(());
        }

        let Some(mut order) = self.orders.get(order_id).await? else {
            // Orders we never mirrored have nothing to track.
            return Ok(());
        };

        if order.fulfillment.mark_order_completed(today) {
            FOOD_BOX_RECEIPTS.inc();
            self.orders
                .set_fulfillment(order_id, order.fulfillment)
                .await?;
            info!(%order_id, "order completed, food box marked received");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fulfillment::FulfillmentRecord, order::OrderLine};
    use crate::stores::InMemoryOrderStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn order(status: OrderStatus) -> OrderRecord {
        OrderRecord {
            id: Uuid::new_v4(),
            customer_name: "Grace Hopper".into(),
            status,
            lines: vec![OrderLine {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                quantity: 3,
                unit_food_box_price: Some(dec!(5.00)),
            }],
            fulfillment: FulfillmentRecord::default(),
            created_at: Utc::now(),
        }
    }

    async fn service_with(orders: Vec<OrderRecord>) -> (FulfillmentService, Arc<InMemoryOrderStore>) {
        let store = Arc::new(InMemoryOrderStore::new());
        for o in orders {
            store.upsert(o).await.unwrap();
        }
        (FulfillmentService::new(store.clone(), 20), store)
    }

    #[tokio::test]
    async fn completed_orders_are_marked_received_while_listing() {
        let completed = order(OrderStatus::Completed);
        let processing = order(OrderStatus::Processing);
        let (service, store) =
            service_with(vec![completed.clone(), processing.clone()]).await;

        let rows = service.management_rows(date("2024-06-05")).await.unwrap();
        assert_eq!(rows.len(), 2);

        let completed_row = rows.iter().find(|r| r.order_id == completed.id).unwrap();
        assert_eq!(completed_row.status, FoodBoxStatus::Received);
        assert_eq!(completed_row.received_date, Some(date("2024-06-05")));
        assert_eq!(completed_row.total_quantity, 3);
        assert_eq!(completed_row.total_price, dec!(15.00));

        let processing_row = rows.iter().find(|r| r.order_id == processing.id).unwrap();
        assert_eq!(processing_row.status, FoodBoxStatus::Pending);
        assert_eq!(processing_row.received_date, None);

        // the transition was persisted, not just rendered
        let stored = store.get(completed.id).await.unwrap().unwrap();
        assert_eq!(stored.fulfillment.status, FoodBoxStatus::Received);
    }

    #[tokio::test]
    async fn order_completion_stamps_the_date_once() {
        let o = order(OrderStatus::Completed);
        let (service, store) = service_with(vec![o.clone()]).await;

        service
            .order_status_changed(o.id, OrderStatus::Completed, date("2024-06-05"))
            .await
            .unwrap();
        service
            .order_status_changed(o.id, OrderStatus::Completed, date("2024-06-09"))
            .await
            .unwrap();

        let stored = store.get(o.id).await.unwrap().unwrap();
        assert_eq!(stored.fulfillment.received_date, Some(date("2024-06-05")));
    }

    #[tokio::test]
    async fn non_completed_status_changes_do_nothing() {
        let o = order(OrderStatus::Processing);
        let (service, store) = service_with(vec![o.clone()]).await;

        service
            .order_status_changed(o.id, OrderStatus::Cancelled, date("2024-06-05"))
            .await
            .unwrap();

        let stored = store.get(o.id).await.unwrap().unwrap();
        assert_eq!(stored.fulfillment.status, FoodBoxStatus::Pending);
    }

    #[tokio::test]
    async fn manual_update_reverts_and_resets_the_date() {
        let o = order(OrderStatus::Completed);
        let (service, _store) = service_with(vec![o.clone()]).await;

        let row = service
            .update_status(o.id, FoodBoxStatus::Received, Some(date("2024-06-02")))
            .await
            .unwrap();
        assert_eq!(row.status, FoodBoxStatus::Received);
        assert_eq!(row.received_date, Some(date("2024-06-02")));

        let row = service
            .update_status(o.id, FoodBoxStatus::Pending, None)
            .await
            .unwrap();
        assert_eq!(row.status, FoodBoxStatus::Pending);
        assert_eq!(row.received_date, None);
    }

    #[tokio::test]
    async fn updating_an_unknown_order_is_not_found() {
        let (service, _store) = service_with(vec![]).await;
        let err = service
            .update_status(Uuid::new_v4(), FoodBoxStatus::Received, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}

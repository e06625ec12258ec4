use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{models::order::OrderStatus, services::fulfillment::FulfillmentService};

/// Lifecycle events flowing through the service. The external platform's
/// hooks arrive here via the webhook adapter; internal admin actions are
/// announced for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderStatusChanged {
        order_id: Uuid,
        old_status: Option<OrderStatus>,
        new_status: OrderStatus,
    },
    PromotionSettingsUpdated,
    PromotionSettingsReset,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Event processing loop. Order completion drives the automatic food box
/// fulfillment transition.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, fulfillment: Arc<FulfillmentService>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::OrderStatusChanged {
                order_id,
                new_status,
                ..
            } => {
                let today = Utc::now().date_naive();
                if let Err(e) = fulfillment
                    .order_status_changed(order_id, new_status, today)
                    .await
                {
                    error!(
                        "Failed to handle order status change: order_id={}, error={}",
                        order_id, e
                    );
                }
            }
            Event::PromotionSettingsUpdated => {
                info!("Promotion settings updated");
            }
            Event::PromotionSettingsReset => {
                info!("Promotion settings reset");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            fulfillment::{FoodBoxStatus, FulfillmentRecord},
            order::OrderRecord,
        },
        stores::{InMemoryOrderStore, OrderStore as _},
    };

    #[tokio::test]
    async fn order_completion_event_marks_the_box_received() {
        let store = Arc::new(InMemoryOrderStore::new());
        let order = OrderRecord {
            id: Uuid::new_v4(),
            customer_name: "Test Customer".into(),
            status: OrderStatus::Completed,
            lines: vec![],
            fulfillment: FulfillmentRecord::default(),
            created_at: Utc::now(),
        };
        store.upsert(order.clone()).await.unwrap();

        let fulfillment = Arc::new(FulfillmentService::new(store.clone(), 20));
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let processor = tokio::spawn(process_events(rx, fulfillment));

        sender
            .send(Event::OrderStatusChanged {
                order_id: order.id,
                old_status: Some(OrderStatus::Processing),
                new_status: OrderStatus::Completed,
            })
            .await
            .unwrap();

        // closing the channel lets the loop drain and exit
        drop(sender);
        processor.await.unwrap();

        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.fulfillment.status, FoodBoxStatus::Received);
        assert!(stored.fulfillment.received_date.is_some());
    }
}

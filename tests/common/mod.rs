#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::util::ServiceExt;
use uuid::Uuid;

use promotions_api::{
    config::AppConfig,
    events::{process_events, EventSender},
    models::{
        fulfillment::FulfillmentRecord,
        order::{OrderLine, OrderRecord, OrderStatus},
    },
    stores::{
        InMemoryOrderStore, InMemoryProductMetaStore, InMemorySettingsStore, OrderStore as _,
    },
    AppState,
};

/// Test harness: the full router over in-memory stores, with the event
/// processor running.
pub struct TestApp {
    pub state: AppState,
    pub orders: Arc<InMemoryOrderStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);

        let settings = Arc::new(InMemorySettingsStore::new());
        let products = Arc::new(InMemoryProductMetaStore::new());
        let orders = Arc::new(InMemoryOrderStore::new());

        let state = AppState::new(
            cfg,
            event_sender,
            settings,
            products,
            orders.clone(),
        );

        tokio::spawn(process_events(
            event_rx,
            state.services.fulfillment.clone(),
        ));

        Self { state, orders }
    }

    pub fn router(&self) -> Router {
        promotions_api::app(self.state.clone())
    }

    pub async fn request(&self, method: Method, uri: &str, json: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match json {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("send request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn get_json(&self, uri: &str) -> Value {
        let response = self.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {} failed", uri);
        response_json(response).await
    }

    /// Seeds a mirrored order directly into the order store.
    pub async fn seed_order(
        &self,
        status: OrderStatus,
        lines: Vec<(i32, Option<Decimal>)>,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let order_id = Uuid::new_v4();
        let order = OrderRecord {
            id: order_id,
            customer_name: "Test Customer".into(),
            status,
            lines: lines
                .into_iter()
                .map(|(quantity, unit_food_box_price)| OrderLine {
                    id: Uuid::new_v4(),
                    product_id: Uuid::new_v4(),
                    quantity,
                    unit_food_box_price,
                })
                .collect(),
            fulfillment: FulfillmentRecord::default(),
            created_at,
        };
        self.orders.upsert(order).await.expect("seed order");
        order_id
    }

    /// Reads a mirrored order straight from the store.
    pub async fn orders_snapshot(&self, id: Uuid) -> OrderRecord {
        self.orders
            .get(id)
            .await
            .expect("read order")
            .expect("order exists")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}

use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    events::Event,
    models::order::{OrderLine, OrderRecord, OrderStatus},
    AppState,
};
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for platform callbacks. These are the former lifecycle
/// hooks: the storefront platform pushes order snapshots and status changes
/// here instead of this service polling for them.
pub fn webhooks_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(upsert_order))
        .route("/order-status", post(order_status_changed))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OrderLinePayload {
    pub id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[serde(default)]
    pub unit_food_box_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OrderSnapshotRequest {
    pub id: Uuid,
    #[validate(length(min = 1))]
    pub customer_name: String,
    pub status: OrderStatus,
    #[serde(default)]
    #[validate]
    pub lines: Vec<OrderLinePayload>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderAcceptedResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
}

/// Mirror an order snapshot pushed by the platform. An existing mirror keeps
/// its fulfillment record; everything else is replaced by the snapshot.
async fn upsert_order(
    State(state): State<AppState>,
    Json(payload): Json<OrderSnapshotRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let existing = state
        .orders
        .get(payload.id)
        .await
        .map_err(map_service_error)?;

    let order = OrderRecord {
        id: payload.id,
        customer_name: payload.customer_name,
        status: payload.status,
        lines: payload
            .lines
            .into_iter()
            .map(|line| OrderLine {
                id: line.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_food_box_price: line.unit_food_box_price,
            })
            .collect(),
        fulfillment: existing
            .as_ref()
            .map(|o| o.fulfillment.clone())
            .unwrap_or_default(),
        created_at: payload
            .created_at
            .or_else(|| existing.as_ref().map(|o| o.created_at))
            .unwrap_or_else(Utc::now),
    };

    state
        .orders
        .upsert(order.clone())
        .await
        .map_err(map_service_error)?;
    info!(order_id = %order.id, status = %order.status, "order snapshot mirrored");

    Ok(success_response(OrderAcceptedResponse {
        order_id: order.id,
        status: order.status,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusChangeRequest {
    pub order_id: Uuid,
    pub status: OrderStatus,
}

/// Platform report that an order's status changed. The mirrored record is
/// updated and the change is dispatched to the event loop, which owns the
/// automatic fulfillment transition.
async fn order_status_changed(
    State(state): State<AppState>,
    Json(payload): Json<OrderStatusChangeRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let previous = state
        .orders
        .get(payload.order_id)
        .await
        .map_err(map_service_error)?
        .map(|order| order.status);

    let order = state
        .orders
        .set_status(payload.order_id, payload.status)
        .await
        .map_err(map_service_error)?;

    state
        .event_sender
        .send(Event::OrderStatusChanged {
            order_id: order.id,
            old_status: previous,
            new_status: order.status,
        })
        .await
        .map_err(|e| ApiError::ServiceError(crate::errors::ServiceError::EventError(e)))?;

    Ok(success_response(OrderAcceptedResponse {
        order_id: order.id,
        status: order.status,
    }))
}

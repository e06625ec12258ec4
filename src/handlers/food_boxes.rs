use crate::handlers::common::{
    map_service_error, success_response, validate_input, EvaluationDateQuery,
};
use crate::{
    errors::ApiError,
    models::{food_box::FoodBoxConfig, fulfillment::FoodBoxStatus},
    services::fulfillment::FoodBoxRow,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, put},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Creates the router for per-product food box metadata
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/food-box", get(get_product_config))
        .route("/{id}/food-box", put(set_product_config))
}

/// Creates the router for the food box management table
pub fn food_box_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", put(update_order_status))
}

/// Food box settings for one product
async fn get_product_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let config = state
        .services
        .food_boxes
        .config_for(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(config))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FoodBoxConfigRequest {
    pub enabled: bool,
    #[validate(custom = "validate_non_negative_price")]
    pub price: Decimal,
}

fn validate_non_negative_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("price");
        err.message = Some("price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Store food box settings for one product
async fn set_product_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FoodBoxConfigRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let config = FoodBoxConfig {
        enabled: payload.enabled,
        price: payload.price,
    };
    state
        .services
        .food_boxes
        .set_config(id, config.clone())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(config))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FoodBoxOrdersResponse {
    pub orders: Vec<FoodBoxRow>,
}

/// The management table: recent processing/completed orders with their box
/// totals and fulfillment state
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<EvaluationDateQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let orders = state
        .services
        .fulfillment
        .management_rows(query.today())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(FoodBoxOrdersResponse { orders }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFulfillmentRequest {
    pub status: FoodBoxStatus,
    #[serde(default)]
    pub received_date: Option<NaiveDate>,
}

/// Manual fulfillment update for one order; both directions are allowed
async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFulfillmentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let row = state
        .services
        .fulfillment
        .update_status(id, payload.status, payload.received_date)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(row))
}

use crate::handlers::common::{
    map_service_error, success_response, validate_input, EvaluationDateQuery,
};
use crate::{
    errors::ApiError,
    models::cart::{CartAdjustment, CartLine, PricedCartLine},
    AppState,
};
use axum::{
    extract::{Json, Query, State},
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Creates the router for cart fee evaluation
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/fees", post(evaluate_fees))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CartLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EvaluateFeesRequest {
    #[validate(custom = "validate_non_negative")]
    pub subtotal: Decimal,
    #[serde(default)]
    #[validate]
    pub lines: Vec<CartLineRequest>,
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("subtotal");
        err.message = Some("subtotal must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartFeesResponse {
    /// Signed adjustments for the fee sink, in application order
    pub fees: Vec<CartAdjustment>,
    /// Cart lines annotated with their per-unit food box price
    pub lines: Vec<PricedCartLine>,
}

/// Recompute all cart fees from source-of-truth state. The caller replaces
/// any previously applied fees with this result on every cart mutation;
/// nothing is accumulated server-side.
async fn evaluate_fees(
    State(state): State<AppState>,
    Query(query): Query<EvaluationDateQuery>,
    Json(payload): Json<EvaluateFeesRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let today = query.today();
    let lines: Vec<CartLine> = payload
        .lines
        .iter()
        .map(|line| CartLine {
            product_id: line.product_id,
            quantity: line.quantity,
        })
        .collect();

    let mut fees = Vec::new();

    if let Some(discount) = state
        .services
        .promotions
        .cart_discount(payload.subtotal, today)
        .await
        .map_err(map_service_error)?
    {
        fees.push(discount);
    }

    let (priced_lines, surcharge) = state
        .services
        .food_boxes
        .cart_surcharge(&lines)
        .await
        .map_err(map_service_error)?;
    fees.extend(surcharge);

    Ok(success_response(CartFeesResponse {
        fees,
        lines: priced_lines,
    }))
}

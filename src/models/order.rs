use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::fulfillment::FulfillmentRecord;

/// Externally-tracked order lifecycle state, as reported by the platform.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OrderStatus {
    Processing,
    Completed,
    Cancelled,
}

/// One order line with the per-unit food box price that was computed for it
/// at checkout time, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_food_box_price: Option<Decimal>,
}

/// Snapshot of a platform-owned order, mirrored into the order store so the
/// fulfillment table can be built without calling back into the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderRecord {
    pub id: Uuid,
    pub customer_name: String,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub fulfillment: FulfillmentRecord,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Total box quantity and box price across lines that carry a food box
    /// charge. Lines without one are not counted.
    pub fn box_totals(&self) -> (i32, Decimal) {
        self.lines
            .iter()
            .filter_map(|line| {
                line.unit_food_box_price
                    .filter(|price| *price > Decimal::ZERO)
                    .map(|price| (line.quantity, price * Decimal::from(line.quantity)))
            })
            .fold((0, Decimal::ZERO), |(qty, total), (q, t)| {
                (qty + q, total + t)
            })
    }
}

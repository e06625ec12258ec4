use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Label for the aggregated food box fee on a cart.
pub const FOOD_BOX_FEE_LABEL: &str = "Food Box Charge";

/// A cart line as submitted by the storefront: just the product and how many.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A cart line with the per-unit food box price resolved from the owning
/// product. `unit_food_box_price` is present only for qualifying lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricedCartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_food_box_price: Option<Decimal>,
}

impl PricedCartLine {
    /// This line's contribution to the food box fee. Quantity is taken at
    /// face value; lines without a resolved unit price contribute nothing.
    pub fn box_subtotal(&self) -> Decimal {
        match self.unit_food_box_price {
            Some(price) => price * Decimal::from(self.quantity),
            None => Decimal::ZERO,
        }
    }
}

/// Total food box surcharge across a cart; zero when no line qualifies.
pub fn food_box_surcharge(lines: &[PricedCartLine]) -> Decimal {
    lines.iter().map(PricedCartLine::box_subtotal).sum()
}

/// A signed monetary adjustment handed to the cart's fee sink. Discounts are
/// negative, surcharges positive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartAdjustment {
    pub label: String,
    pub amount: Decimal,
}

impl CartAdjustment {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

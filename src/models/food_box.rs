use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-product food box settings, owned by the product catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FoodBoxConfig {
    pub enabled: bool,
    pub price: Decimal,
}

impl FoodBoxConfig {
    /// The per-unit charge this product contributes, if any. Disabled
    /// products and non-positive prices contribute nothing.
    pub fn unit_charge(&self) -> Option<Decimal> {
        (self.enabled && self.price > Decimal::ZERO).then_some(self.price)
    }
}

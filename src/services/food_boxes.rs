use std::sync::Arc;

use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{
        cart::{food_box_surcharge, CartAdjustment, CartLine, PricedCartLine, FOOD_BOX_FEE_LABEL},
        food_box::FoodBoxConfig,
    },
    stores::ProductMetaStore,
};

lazy_static! {
    static ref FOOD_BOX_FEES_APPLIED: IntCounter = IntCounter::new(
        "food_box_fees_applied_total",
        "Total number of food box fees applied to carts"
    )
    .expect("metric can be created");
}

#[derive(Clone)]
pub struct FoodBoxService {
    products: Arc<dyn ProductMetaStore>,
}

impl FoodBoxService {
    pub fn new(products: Arc<dyn ProductMetaStore>) -> Self {
        Self { products }
    }

    pub async fn config_for(&self, product_id: Uuid) -> Result<FoodBoxConfig, ServiceError> {
        Ok(self
            .products
            .food_box_config(product_id)
            .await?
            .unwrap_or_default())
    }

    pub async fn set_config(
        &self,
        product_id: Uuid,
        config: FoodBoxConfig,
    ) -> Result<(), ServiceError> {
        self.products.set_food_box_config(product_id, config).await
    }

    /// Resolves each line's per-unit box charge from the owning product.
    pub async fn price_lines(
        &self,
        lines: &[CartLine],
    ) -> Result<Vec<PricedCartLine>, ServiceError> {
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let unit_price = self
                .products
                .food_box_config(line.product_id)
                .await?
                .and_then(|config| config.unit_charge());
            priced.push(PricedCartLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_food_box_price: unit_price,
            });
        }
        Ok(priced)
    }

    /// Annotated lines plus the aggregated "Food Box Charge" fee when any
    /// line qualifies.
    #[instrument(skip(self, lines))]
    pub async fn cart_surcharge(
        &self,
        lines: &[CartLine],
    ) -> Result<(Vec<PricedCartLine>, Option<CartAdjustment>), ServiceError> {
        let priced = self.price_lines(lines).await?;
        let total = food_box_surcharge(&priced);

        let fee = if total > Decimal::ZERO {
            FOOD_BOX_FEES_APPLIED.inc();
            Some(CartAdjustment::new(FOOD_BOX_FEE_LABEL, total))
        } else {
            None
        };

        Ok((priced, fee))
    }
}

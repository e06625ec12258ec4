use std::sync::Arc;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    models::{
        cart::CartAdjustment,
        promotion::{PromotionConfig, PromotionRule},
    },
    stores::SettingsStore,
};

lazy_static! {
    static ref SEASONAL_DISCOUNTS_APPLIED: IntCounter = IntCounter::new(
        "seasonal_discounts_applied_total",
        "Total number of seasonal discount fees applied to carts"
    )
    .expect("metric can be created");
}

/// Display data for the storefront promotion banner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct BannerData {
    pub percentage: Decimal,
}

#[derive(Clone)]
pub struct PromotionService {
    settings: Arc<dyn SettingsStore>,
}

impl PromotionService {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Parses the stored settings into a rule, surfacing validation errors.
    /// Used by the admin settings endpoints; storefront evaluation goes
    /// through [`PromotionService::active_config`] instead.
    pub async fn current_rule(&self) -> Result<PromotionRule, ServiceError> {
        let Some(settings) = self.settings.promotion_settings().await? else {
            return Ok(PromotionRule::Disabled);
        };
        Ok(settings.parse()?)
    }

    /// Fail-closed view of the stored settings: disabled or malformed
    /// settings both evaluate to no promotion.
    async fn active_config(&self) -> Result<Option<PromotionConfig>, ServiceError> {
        let Some(settings) = self.settings.promotion_settings().await? else {
            return Ok(None);
        };
        match settings.parse() {
            Ok(rule) => Ok(rule.as_config().cloned()),
            Err(invalid) => {
                warn!(error = %invalid, "stored promotion settings are malformed; treating promotion as inactive");
                Ok(None)
            }
        }
    }

    /// Banner decision for the given date. The banner only requires the
    /// window to have started; it keeps showing after the end date.
    #[instrument(skip(self))]
    pub async fn banner(&self, today: NaiveDate) -> Result<Option<BannerData>, ServiceError> {
        Ok(self
            .active_config()
            .await?
            .filter(|config| config.is_banner_active(today))
            .map(|config| BannerData {
                percentage: config.percentage,
            }))
    }

    /// Seasonal discount for a cart subtotal, as a negative adjustment, or
    /// `None` outside the window or when the computed amount is not positive.
    #[instrument(skip(self))]
    pub async fn cart_discount(
        &self,
        subtotal: Decimal,
        today: NaiveDate,
    ) -> Result<Option<CartAdjustment>, ServiceError> {
        let Some(config) = self.active_config().await? else {
            return Ok(None);
        };

        if !config.is_discount_active(today) {
            debug!(%today, "promotion window not active, no discount");
            return Ok(None);
        }

        let amount = config.discount_amount(subtotal);
        if amount <= Decimal::ZERO {
            return Ok(None);
        }

        SEASONAL_DISCOUNTS_APPLIED.inc();
        Ok(Some(CartAdjustment::new(config.scope.fee_label(), -amount)))
    }
}

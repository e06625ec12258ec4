use std::sync::Arc;

use crate::{
    services::{
        food_boxes::FoodBoxService, fulfillment::FulfillmentService, promotions::PromotionService,
    },
    stores::{OrderStore, ProductMetaStore, SettingsStore},
};

pub mod cart;
pub mod common;
pub mod food_boxes;
pub mod promotions;
pub mod webhooks;

/// Services shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub promotions: Arc<PromotionService>,
    pub food_boxes: Arc<FoodBoxService>,
    pub fulfillment: Arc<FulfillmentService>,
}

impl AppServices {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        products: Arc<dyn ProductMetaStore>,
        orders: Arc<dyn OrderStore>,
        management_page_limit: usize,
    ) -> Self {
        Self {
            promotions: Arc::new(PromotionService::new(settings)),
            food_boxes: Arc::new(FoodBoxService::new(products)),
            fulfillment: Arc::new(FulfillmentService::new(orders, management_page_limit)),
        }
    }
}

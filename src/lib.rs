//! Promotions API Library
//!
//! This crate provides the core functionality for the promotions API:
//! seasonal promotion evaluation, food box surcharges, and box fulfillment
//! tracking over platform-owned storage.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod services;
pub mod stores;

use std::sync::Arc;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use stores::{OrderStore, ProductMetaStore, SettingsStore};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub settings: Arc<dyn SettingsStore>,
    pub products: Arc<dyn ProductMetaStore>,
    pub orders: Arc<dyn OrderStore>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires stores and services together over the given collaborators.
    pub fn new(
        config: config::AppConfig,
        event_sender: events::EventSender,
        settings: Arc<dyn SettingsStore>,
        products: Arc<dyn ProductMetaStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        let services = handlers::AppServices::new(
            settings.clone(),
            products.clone(),
            orders.clone(),
            config.management_page_limit,
        );
        Self {
            config,
            event_sender,
            settings,
            products,
            orders,
            services,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// Enhanced API routes function
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Promotion settings and storefront evaluation
        .nest("/promotions", handlers::promotions::promotions_routes())
        // Cart fee evaluation (the fee sink recomputes through this)
        .nest("/cart", handlers::cart::cart_routes())
        // Per-product food box metadata
        .nest("/products", handlers::food_boxes::products_routes())
        // Food box management table
        .nest("/food-boxes", handlers::food_boxes::food_box_routes())
        // Platform lifecycle callbacks
        .nest("/webhooks", handlers::webhooks::webhooks_routes())
}

/// Full application router with the request logging middleware applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "promotions-api up" }))
        .nest("/api/v1", api_v1_routes())
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

async fn api_status() -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "promotions-api",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> ApiResult<Value> {
    // The stores are in-process; reachability of the settings store stands in
    // for a storage ping.
    let settings_status = match state.settings.promotion_settings().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": settings_status,
        "checks": {
            "settings_store": settings_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

// Request logging middleware
async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    tracing::info!(method = %method, uri = %uri, "Incoming request");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        elapsed_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}

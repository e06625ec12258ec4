use crate::handlers::common::{
    map_service_error, no_content_response, success_response, EvaluationDateQuery,
};
use crate::{
    errors::ApiError,
    events::Event,
    models::promotion::{PromotionConfig, PromotionRule, PromotionSettings},
    services::promotions::BannerData,
    AppState,
};
use axum::{
    extract::{Json, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

/// Creates the router for promotion settings and storefront evaluation
pub fn promotions_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", put(update_settings))
        .route("/settings/reset", post(reset_settings))
        .route("/banner", get(get_banner))
}

/// Validation outcome of the stored settings, surfaced to the admin so a
/// fail-closed promotion is distinguishable from a disabled one.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RuleView {
    Disabled,
    Scheduled { config: PromotionConfig },
    Invalid { message: String },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsView {
    pub settings: PromotionSettings,
    pub rule: RuleView,
}

fn settings_view(settings: PromotionSettings) -> SettingsView {
    let rule = match settings.parse() {
        Ok(PromotionRule::Disabled) => RuleView::Disabled,
        Ok(PromotionRule::Scheduled(config)) => RuleView::Scheduled { config },
        Err(invalid) => RuleView::Invalid {
            message: invalid.to_string(),
        },
    };
    SettingsView { settings, rule }
}

/// Current promotion settings as stored, with their validation outcome
async fn get_settings(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let settings = state
        .settings
        .promotion_settings()
        .await
        .map_err(map_service_error)?
        .unwrap_or_default();

    Ok(success_response(settings_view(settings)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<String>,
    #[serde(default)]
    pub discount_type: Option<String>,
}

/// Store submitted promotion settings. Stored as submitted, like the admin
/// options form; the response carries the validation outcome so a bad
/// submission is visible immediately.
async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let settings = PromotionSettings {
        start_date: payload.start_date,
        end_date: payload.end_date,
        discount_percentage: payload.discount_percentage,
        discount_type: payload.discount_type,
    };

    state
        .settings
        .put_promotion_settings(settings.clone())
        .await
        .map_err(map_service_error)?;

    if let Err(e) = state.event_sender.send(Event::PromotionSettingsUpdated).await {
        warn!("Failed to publish settings event: {}", e);
    }

    Ok(success_response(settings_view(settings)))
}

/// Clear the promotion settings entirely (the admin reset action)
async fn reset_settings(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .settings
        .reset_promotion_settings()
        .await
        .map_err(map_service_error)?;

    if let Err(e) = state.event_sender.send(Event::PromotionSettingsReset).await {
        warn!("Failed to publish settings event: {}", e);
    }

    Ok(no_content_response())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BannerResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<BannerData>,
}

/// Storefront banner decision for today (or a pinned date)
async fn get_banner(
    State(state): State<AppState>,
    Query(query): Query<EvaluationDateQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let banner = state
        .services
        .promotions
        .banner(query.today())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(BannerResponse {
        active: banner.is_some(),
        banner,
    }))
}

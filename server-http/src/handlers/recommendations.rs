use super::{bad_request, domain_error, ApiError};
use crate::models::{ChatRequest, ChatResponse, SettingsBody};
use crate::state::AppState;
use axum::{extract::State, Extension, Json};
use readshelf::auth::Identity;
use readshelf::recommend::Recommendation;
use tracing::info;

/// GET /api/recommendations/automated
pub async fn automated(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    match state.recommendations.automated(&identity).await {
        Ok(recommendations) => Ok(Json(recommendations)),
        Err(e) => Err(domain_error(e)),
    }
}

/// POST /api/recommendations/chat
pub async fn chat(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = match req.message.as_deref() {
        Some(message) if !message.is_empty() => message,
        _ => return Err(bad_request("Message is required")),
    };

    info!("CHAT_RECOMMENDATION: user={}", identity.user_id);

    match state.recommendations.chat(&identity, message).await {
        Ok(recommendation) => Ok(Json(ChatResponse { recommendation })),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/recommendations/settings
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<SettingsBody>, ApiError> {
    match state.recommendations.settings(&identity).await {
        Ok(settings) => Ok(Json(SettingsBody {
            automated_recommendations_enabled: settings.automated_recommendations_enabled,
        })),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/recommendations/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SettingsBody>,
) -> Result<Json<SettingsBody>, ApiError> {
    match state
        .recommendations
        .update_settings(&identity, req.automated_recommendations_enabled)
        .await
    {
        Ok(settings) => Ok(Json(SettingsBody {
            automated_recommendations_enabled: settings.automated_recommendations_enabled,
        })),
        Err(e) => Err(domain_error(e)),
    }
}

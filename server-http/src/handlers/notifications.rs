use super::{domain_error, ApiError};
use crate::models::{MessageResponse, ShareBookRequest};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use readshelf::auth::Identity;
use readshelf::models::Notification;
use readshelf::notifications::NotificationView;
use tracing::info;

/// GET /api/notifications
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<NotificationView>>, ApiError> {
    match state.notifications.list(&identity).await {
        Ok(views) => Ok(Json(views)),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/notifications/{notification_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(notification_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.notifications.mark_read(&identity, &notification_id).await {
        Ok(()) => Ok(Json(MessageResponse::new("Notification marked as read"))),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.notifications.mark_all_read(&identity).await {
        Ok(()) => Ok(Json(MessageResponse::new("All notifications marked as read"))),
        Err(e) => Err(domain_error(e)),
    }
}

/// POST /api/notifications/share-book
pub async fn share_book(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ShareBookRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    info!(
        "SHARE_BOOK: volume={}, from={}, to={}",
        req.volume_id, identity.user_id, req.to_user_id
    );

    match state
        .notifications
        .share_book(&identity, &req.volume_id, &req.to_user_id, req.message)
        .await
    {
        Ok(notification) => Ok((StatusCode::CREATED, Json(notification))),
        Err(e) => Err(domain_error(e)),
    }
}

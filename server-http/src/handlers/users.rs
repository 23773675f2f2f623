use super::{bad_request, domain_error, ApiError};
use crate::models::{
    AvailabilityResponse, FollowRequest, MessageResponse, ProfilePictureRequest, QueryParams,
    RegisterRequest, UpdateUsernameRequest, UsernameQuery,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use readshelf::auth::Identity;
use readshelf::models::{User, UserSummary};
use readshelf::users::UserProfile;
use tracing::info;

/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if req.uid.is_empty() {
        return Err(bad_request("Identity uid is required"));
    }

    info!("REGISTER: username={}", req.username);

    match state.users.register(req.uid, req.email, req.username).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/users/check-username
pub async fn check_username(
    State(state): State<AppState>,
    Query(params): Query<UsernameQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let username = match params.username.as_deref() {
        Some(username) if !username.is_empty() => username,
        _ => return Err(bad_request("Username parameter is required")),
    };

    match state.users.username_available(username).await {
        Ok(available) => Ok(Json(AvailabilityResponse { available })),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/users/username
pub async fn update_username(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateUsernameRequest>,
) -> Result<Json<User>, ApiError> {
    info!("UPDATE_USERNAME: user={}", identity.user_id);

    match state.users.update_username(&identity, req.username).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/users/profile-picture
pub async fn update_profile_picture(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ProfilePictureRequest>,
) -> Result<Json<User>, ApiError> {
    if req.profile_picture.is_empty() {
        return Err(bad_request("Profile picture URL is required"));
    }

    match state
        .users
        .update_profile_picture(&identity, req.profile_picture)
        .await
    {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(domain_error(e)),
    }
}

/// POST /api/users/follow
pub async fn follow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!(
        "FOLLOW: user={}, target={}",
        identity.user_id, req.target_user_id
    );

    match state.users.follow(&identity, &req.target_user_id).await {
        Ok(()) => Ok(Json(MessageResponse::new("User followed successfully"))),
        Err(e) => Err(domain_error(e)),
    }
}

/// POST /api/users/unfollow
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.users.unfollow(&identity, &req.target_user_id).await {
        Ok(()) => Ok(Json(MessageResponse::new("User unfollowed successfully"))),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/users/followers
pub async fn followers(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    match state.users.followers(&identity).await {
        Ok(summaries) => Ok(Json(summaries)),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/users/following
pub async fn following(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    match state.users.following(&identity).await {
        Ok(summaries) => Ok(Json(summaries)),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/users/profile
pub async fn my_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserProfile>, ApiError> {
    match state.users.profile(&identity, None).await {
        Ok(profile) => Ok(Json(profile)),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/users/profile/{user_id}
pub async fn user_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    match state.users.profile(&identity, Some(&user_id)).await {
        Ok(profile) => Ok(Json(profile)),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/users/search
pub async fn search_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let query = match params.query.as_deref() {
        Some(query) if !query.is_empty() => query,
        _ => return Err(bad_request("Query parameter is required")),
    };

    match state.users.search(&identity, query).await {
        Ok(summaries) => Ok(Json(summaries)),
        Err(e) => Err(domain_error(e)),
    }
}

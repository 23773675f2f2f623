use super::{bad_request, domain_error, ApiError};
use crate::models::{
    AuthorPreferencesRequest, CategoryPreferencesRequest, LanguagePreferencesRequest,
    MessageResponse, QueryParams, TropeFavoriteRequest, TropePreferencesRequest,
};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use readshelf::auth::Identity;
use readshelf::models::{Author, Trope};
use readshelf::preferences::PreferencesView;

/// GET /api/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<PreferencesView>, ApiError> {
    match state.preferences.preferences(&identity).await {
        Ok(view) => Ok(Json(view)),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/preferences/tropes
pub async fn list_tropes(State(state): State<AppState>) -> Result<Json<Vec<Trope>>, ApiError> {
    match state.preferences.list_tropes().await {
        Ok(tropes) => Ok(Json(tropes)),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/preferences/tropes
pub async fn update_tropes(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<TropePreferencesRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state
        .preferences
        .update_tropes(&identity, req.liked_trope_ids, req.disliked_trope_ids)
        .await
    {
        Ok(()) => Ok(Json(MessageResponse::new(
            "Trope preferences updated successfully",
        ))),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/preferences/categories
pub async fn update_categories(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CategoryPreferencesRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state
        .preferences
        .update_categories(&identity, req.liked_categories, req.disliked_categories)
        .await
    {
        Ok(()) => Ok(Json(MessageResponse::new(
            "Category preferences updated successfully",
        ))),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/preferences/authors
pub async fn update_authors(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<AuthorPreferencesRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state
        .preferences
        .update_authors(&identity, req.liked_authors, req.disliked_authors)
        .await
    {
        Ok(()) => Ok(Json(MessageResponse::new(
            "Author preferences updated successfully",
        ))),
        Err(e) => Err(domain_error(e)),
    }
}

/// PATCH /api/preferences/languages
pub async fn update_languages(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<LanguagePreferencesRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state
        .preferences
        .update_languages(&identity, req.languages)
        .await
    {
        Ok(()) => Ok(Json(MessageResponse::new(
            "Language preferences updated successfully",
        ))),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/preferences/authors/search
pub async fn search_authors(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<Author>>, ApiError> {
    let query = match params.query.as_deref() {
        Some(query) if !query.is_empty() => query,
        _ => return Err(bad_request("Query parameter is required")),
    };

    match state.preferences.search_authors(query).await {
        Ok(authors) => Ok(Json(authors)),
        Err(e) => Err(domain_error(e)),
    }
}

/// POST /api/tropes/favorite
pub async fn trope_favorite(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<TropeFavoriteRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state
        .preferences
        .mark_trope_favorite(&identity, &req.trope_id)
        .await
    {
        Ok(()) => Ok(Json(MessageResponse::new(
            "Trope marcada como favorita com sucesso",
        ))),
        Err(e) => Err(domain_error(e)),
    }
}

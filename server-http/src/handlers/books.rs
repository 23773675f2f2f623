use super::{bad_request, domain_error, ApiError};
use crate::models::{AddHistoryRequest, MessageResponse, QueryParams, SearchParams, VolumeRequest};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use catalog::{normalize_search_results, SearchSummary};
use readshelf::auth::Identity;
use readshelf::library::{AuthorSuggestion, BookDetails, HistoryEntry};
use readshelf::models::Book;
use tracing::info;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// GET /api/books/search
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchSummary>, ApiError> {
    let query = match params.query.as_deref() {
        Some(query) if !query.is_empty() => query,
        _ => return Err(bad_request("Query parameter is required")),
    };

    let response = state
        .gateway
        .search(
            query,
            params.start_index.unwrap_or(0),
            params.max_results.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await;

    Ok(Json(normalize_search_results(&response)))
}

/// GET /api/books/{volume_id}
pub async fn book_details(
    State(state): State<AppState>,
    Path(volume_id): Path<String>,
) -> Result<Json<BookDetails>, ApiError> {
    match state.library.book_details(&volume_id).await {
        Ok(details) => Ok(Json(details)),
        Err(e) => Err(domain_error(e)),
    }
}

/// POST /api/books/history
pub async fn add_to_history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<AddHistoryRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!("ADD_HISTORY: volume={}, user={}", req.volume_id, identity.user_id);

    match state
        .library
        .add_to_history(&identity, &req.volume_id, req.rating, req.review)
        .await
    {
        Ok(()) => Ok(Json(MessageResponse::new(
            "Livro adicionado ao histórico com sucesso",
        ))),
        Err(e) => Err(domain_error(e)),
    }
}

/// DELETE /api/books/history/{volume_id}
pub async fn remove_from_history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(volume_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!("REMOVE_HISTORY: volume={}, user={}", volume_id, identity.user_id);

    match state.library.remove_from_history(&identity, &volume_id).await {
        Ok(()) => Ok(Json(MessageResponse::new(
            "Livro removido do histórico com sucesso",
        ))),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/books/history
pub async fn read_history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    match state.library.read_history(&identity).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => Err(domain_error(e)),
    }
}

/// POST /api/books/favorite
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.library.toggle_favorite(&identity, &req.volume_id).await {
        Ok(true) => Ok(Json(MessageResponse::new("Livro adicionado aos favoritos"))),
        Ok(false) => Ok(Json(MessageResponse::new("Livro removido dos favoritos"))),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/books/favorites
pub async fn favorites(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Book>>, ApiError> {
    match state.library.favorites(&identity).await {
        Ok(books) => Ok(Json(books)),
        Err(e) => Err(domain_error(e)),
    }
}

/// POST /api/books/reading-list
pub async fn toggle_reading_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state
        .library
        .toggle_reading_list(&identity, &req.volume_id)
        .await
    {
        Ok(true) => Ok(Json(MessageResponse::new(
            "Livro adicionado à lista de leitura",
        ))),
        Ok(false) => Ok(Json(MessageResponse::new(
            "Livro removido da lista de leitura",
        ))),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/books/reading-list
pub async fn reading_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Book>>, ApiError> {
    match state.library.reading_list(&identity).await {
        Ok(books) => Ok(Json(books)),
        Err(e) => Err(domain_error(e)),
    }
}

/// GET /api/books/categories
pub async fn common_categories(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Json<Vec<String>> {
    Json(state.library.common_categories(params.query.as_deref()).await)
}

/// GET /api/books/authors
pub async fn common_authors(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<AuthorSuggestion>>, ApiError> {
    let query = match params.query.as_deref() {
        Some(query) if !query.is_empty() => query,
        _ => return Err(bad_request("Query parameter is required")),
    };

    Ok(Json(state.library.common_authors(query).await))
}

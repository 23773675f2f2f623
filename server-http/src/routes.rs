use crate::handlers;
use crate::middleware::auth_middleware;
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use shared::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState, config: &Config) -> Router {
    // Routes reachable without a bearer token
    let public = Router::new()
        .route("/books/search", get(handlers::books::search_catalog))
        .route("/books/categories", get(handlers::books::common_categories))
        .route("/books/authors", get(handlers::books::common_authors))
        .route("/books/{volume_id}", get(handlers::books::book_details))
        .route("/users/register", post(handlers::users::register))
        .route("/users/check-username", get(handlers::users::check_username));

    // Everything else requires a verified identity
    let protected = Router::new()
        .route(
            "/books/history",
            post(handlers::books::add_to_history).get(handlers::books::read_history),
        )
        .route(
            "/books/history/{volume_id}",
            delete(handlers::books::remove_from_history),
        )
        .route("/books/favorite", post(handlers::books::toggle_favorite))
        .route("/books/favorites", get(handlers::books::favorites))
        .route(
            "/books/reading-list",
            post(handlers::books::toggle_reading_list).get(handlers::books::reading_list),
        )
        .route("/users/username", patch(handlers::users::update_username))
        .route(
            "/users/profile-picture",
            patch(handlers::users::update_profile_picture),
        )
        .route("/users/follow", post(handlers::users::follow))
        .route("/users/unfollow", post(handlers::users::unfollow))
        .route("/users/followers", get(handlers::users::followers))
        .route("/users/following", get(handlers::users::following))
        .route("/users/profile", get(handlers::users::my_profile))
        .route("/users/profile/{user_id}", get(handlers::users::user_profile))
        .route("/users/search", get(handlers::users::search_users))
        .route("/notifications", get(handlers::notifications::list))
        .route(
            "/notifications/read-all",
            patch(handlers::notifications::mark_all_read),
        )
        .route(
            "/notifications/{notification_id}/read",
            patch(handlers::notifications::mark_read),
        )
        .route(
            "/notifications/share-book",
            post(handlers::notifications::share_book),
        )
        .route("/preferences", get(handlers::preferences::get_preferences))
        .route(
            "/preferences/tropes",
            get(handlers::preferences::list_tropes)
                .patch(handlers::preferences::update_tropes),
        )
        .route(
            "/preferences/categories",
            patch(handlers::preferences::update_categories),
        )
        .route(
            "/preferences/authors",
            patch(handlers::preferences::update_authors),
        )
        .route(
            "/preferences/authors/search",
            get(handlers::preferences::search_authors),
        )
        .route(
            "/preferences/languages",
            patch(handlers::preferences::update_languages),
        )
        .route("/tropes/favorite", post(handlers::preferences::trope_favorite))
        .route(
            "/recommendations/automated",
            get(handlers::recommendations::automated),
        )
        .route("/recommendations/chat", post(handlers::recommendations::chat))
        .route(
            "/recommendations/settings",
            get(handlers::recommendations::get_settings)
                .patch(handlers::recommendations::update_settings),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", public.merge(protected))
        // Middleware
        .layer(cors_layer(config))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

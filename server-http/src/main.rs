use catalog::{CatalogConfig, CatalogGateway, HttpCatalogTransport};
use readshelf::auth::{HttpTokenVerifier, TokenVerifier};
use readshelf::genai::{GenerativeHttpModel, TextModel};
use readshelf::library::LibraryService;
use readshelf::notifications::NotificationService;
use readshelf::persistence::{
    SledAuthorRepository, SledBookRepository, SledCategoryRepository, SledLanguageRepository,
    SledNotificationRepository, SledRatingRepository, SledSettingsRepository,
    SledTropeRepository, SledUserRepository,
};
use readshelf::preferences::PreferenceService;
use readshelf::recommend::RecommendationService;
use readshelf::repository::{
    AuthorRepository, BookRepository, CategoryRepository, LanguageRepository,
    NotificationRepository, RatingRepository, SettingsRepository, TropeRepository, UserRepository,
};
use readshelf::users::UserService;
use server_http::{build_router, AppState};
use shared::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting Readshelf HTTP Server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Load configuration from environment variables
    let config = Arc::new(Config::from_env());

    let data_dir = std::path::Path::new(&config.data_dir).join(".readshelf");
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        warn!("Failed to create data directory: {}", e);
    }

    // Repositories
    let users: Arc<dyn UserRepository> = Arc::new(
        SledUserRepository::new(data_dir.join("users.sled"))
            .expect("Failed to open user store"),
    );
    let books: Arc<dyn BookRepository> = Arc::new(
        SledBookRepository::new(data_dir.join("books.sled"))
            .expect("Failed to open book store"),
    );
    let ratings: Arc<dyn RatingRepository> = Arc::new(
        SledRatingRepository::new(data_dir.join("ratings.sled"))
            .expect("Failed to open rating store"),
    );
    let notifications: Arc<dyn NotificationRepository> = Arc::new(
        SledNotificationRepository::new(data_dir.join("notifications.sled"))
            .expect("Failed to open notification store"),
    );
    let tropes: Arc<dyn TropeRepository> = Arc::new(
        SledTropeRepository::new(data_dir.join("tropes.sled"))
            .expect("Failed to open trope store"),
    );
    let authors: Arc<dyn AuthorRepository> = Arc::new(
        SledAuthorRepository::new(data_dir.join("authors.sled"))
            .expect("Failed to open author store"),
    );
    let categories: Arc<dyn CategoryRepository> = Arc::new(
        SledCategoryRepository::new(data_dir.join("categories.sled"))
            .expect("Failed to open category store"),
    );
    let languages: Arc<dyn LanguageRepository> = Arc::new(
        SledLanguageRepository::new(data_dir.join("languages.sled"))
            .expect("Failed to open language store"),
    );
    let settings: Arc<dyn SettingsRepository> = Arc::new(
        SledSettingsRepository::new(data_dir.join("settings.sled"))
            .expect("Failed to open settings store"),
    );

    // External collaborators
    info!("Connecting catalog gateway to {}", config.books_api_url);
    let transport = Arc::new(
        HttpCatalogTransport::new(config.books_api_url.clone(), config.books_api_key.clone())
            .expect("Failed to build catalog client"),
    );
    let gateway = Arc::new(CatalogGateway::new(
        transport,
        CatalogConfig {
            cache_ttl: Duration::from_secs(config.catalog_cache_ttl_secs),
            cache_capacity: config.catalog_cache_capacity,
            ..CatalogConfig::default()
        },
    ));

    let verifier: Arc<dyn TokenVerifier> = Arc::new(
        HttpTokenVerifier::new(config.identity_url.clone())
            .expect("Failed to build identity client"),
    );

    let model: Arc<dyn TextModel> = Arc::new(
        GenerativeHttpModel::new(config.genai_api_url.clone(), config.genai_api_key.clone())
            .expect("Failed to build text model client"),
    );

    // Services
    let library = Arc::new(LibraryService::new(
        books.clone(),
        users.clone(),
        ratings.clone(),
        gateway.clone(),
    ));
    let user_service = Arc::new(UserService::new(users.clone(), notifications.clone()));
    let notification_service = Arc::new(NotificationService::new(
        notifications.clone(),
        users.clone(),
        books.clone(),
        library.clone(),
    ));
    let preference_service = Arc::new(PreferenceService::new(
        users.clone(),
        tropes.clone(),
        authors,
        categories,
        languages.clone(),
    ));
    let recommendation_service = Arc::new(RecommendationService::new(
        users,
        books,
        ratings,
        tropes,
        languages,
        settings,
        gateway.clone(),
        model,
    ));

    // Seed the trope table; a failure here degrades the preference
    // screens but should not stop the server
    if let Err(e) = preference_service.seed_tropes().await {
        warn!("Trope seeding failed: {}", e);
    }

    let state = AppState {
        verifier,
        gateway,
        library,
        users: user_service,
        notifications: notification_service,
        preferences: preference_service,
        recommendations: recommendation_service,
    };

    // Build router
    let router = build_router(state, &config);

    // Start server
    let address = format!("{}:{}", config.host, config.http_port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .expect("Failed to bind HTTP listener");

    info!("HTTP Server listening on http://{address}");

    // Graceful shutdown handler
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server error");

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}

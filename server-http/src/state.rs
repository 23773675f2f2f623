use catalog::CatalogGateway;
use readshelf::auth::TokenVerifier;
use readshelf::library::LibraryService;
use readshelf::notifications::NotificationService;
use readshelf::preferences::PreferenceService;
use readshelf::recommend::RecommendationService;
use readshelf::users::UserService;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub gateway: Arc<CatalogGateway>,
    pub library: Arc<LibraryService>,
    pub users: Arc<UserService>,
    pub notifications: Arc<NotificationService>,
    pub preferences: Arc<PreferenceService>,
    pub recommendations: Arc<RecommendationService>,
}

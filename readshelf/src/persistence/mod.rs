// Sled-backed repository implementations. One database file per store;
// records are JSON documents, alternate lookups go through secondary
// index trees.

mod books;
mod notifications;
mod preferences;
mod ratings;
mod users;

pub use books::SledBookRepository;
pub use notifications::SledNotificationRepository;
pub use preferences::{
    SledAuthorRepository, SledCategoryRepository, SledLanguageRepository, SledSettingsRepository,
    SledTropeRepository,
};
pub use ratings::SledRatingRepository;
pub use users::SledUserRepository;

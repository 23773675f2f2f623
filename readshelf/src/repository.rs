use crate::error::Result;
use crate::models::{
    Author, Book, Category, Language, Notification, Rating, Trope, TropeCategory, User,
    UserSettings,
};
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: User) -> Result<User>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Update a user
    async fn update(&self, user: User) -> Result<User>;

    /// Check if an email is registered
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Check if a username is taken
    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Case-insensitive substring search over usernames, excluding one id
    async fn search_by_username(
        &self,
        query: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<User>>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert or overwrite a book, keyed by its volume id
    async fn upsert(&self, book: Book) -> Result<Book>;

    /// Find a book by its volume id
    async fn find_by_volume_id(&self, volume_id: &str) -> Result<Option<Book>>;

    /// Find every book in the given id list that exists
    async fn find_many(&self, volume_ids: &[String]) -> Result<Vec<Book>>;
}

#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Insert or overwrite the rating one user gave one volume
    async fn upsert(&self, rating: Rating) -> Result<Rating>;

    /// Find the rating one user gave one volume
    async fn find(&self, user_id: &str, volume_id: &str) -> Result<Option<Rating>>;

    /// Delete the rating one user gave one volume
    async fn delete_for(&self, user_id: &str, volume_id: &str) -> Result<bool>;

    /// All ratings by a user, newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Rating>>;

    /// All ratings of a volume, newest first
    async fn list_by_volume(&self, volume_id: &str) -> Result<Vec<Rating>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Create a new notification
    async fn create(&self, notification: Notification) -> Result<Notification>;

    /// Find a notification by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>>;

    /// All notifications for a recipient, newest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>>;

    /// Mark one notification as read
    async fn mark_read(&self, id: &str) -> Result<()>;

    /// Mark every unread notification of a recipient as read
    async fn mark_all_read(&self, user_id: &str) -> Result<()>;
}

#[async_trait]
pub trait TropeRepository: Send + Sync {
    /// Create a trope or refresh its description/category
    async fn upsert_by_name(
        &self,
        name: &str,
        description: &str,
        category: TropeCategory,
    ) -> Result<Trope>;

    /// Find a trope by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Trope>>;

    /// Find multiple tropes by IDs; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Trope>>;

    /// All tropes, ordered by name
    async fn list_all(&self) -> Result<Vec<Trope>>;
}

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Create an author if the name is new, otherwise return the record
    async fn upsert_by_name(&self, name: &str) -> Result<Author>;

    /// Case-insensitive substring search, ordered by name
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Author>>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a category if the name is new, otherwise return the record
    async fn upsert_by_name(&self, name: &str) -> Result<Category>;
}

#[async_trait]
pub trait LanguageRepository: Send + Sync {
    /// Register a language code if unknown, otherwise keep the record
    async fn upsert(&self, code: &str, name: &str) -> Result<Language>;

    /// Find a language by code
    async fn find_by_code(&self, code: &str) -> Result<Option<Language>>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Find a user's settings record
    async fn find(&self, user_id: &str) -> Result<Option<UserSettings>>;

    /// Insert or overwrite a user's settings record
    async fn put(&self, settings: UserSettings) -> Result<UserSettings>;
}

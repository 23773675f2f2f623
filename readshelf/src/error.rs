use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("Book not found")]
    BookNotFound,

    #[error("Notification not found")]
    NotificationNotFound,

    #[error("Trope not found")]
    TropeNotFound,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Invalid username: {0}")]
    InvalidUsername(&'static str),

    #[error("Already following this user")]
    AlreadyFollowing,

    #[error("Couldn't parse recommendations")]
    RecommendationParse,

    #[error("Text model error: {0}")]
    TextModel(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for DomainError {
    fn from(err: sled::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

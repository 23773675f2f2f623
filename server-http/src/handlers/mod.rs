pub mod books;
pub mod health;
pub mod notifications;
pub mod preferences;
pub mod recommendations;
pub mod users;

use crate::models::ErrorResponse;
use axum::{http::StatusCode, Json};
use readshelf::DomainError;

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a domain error to its HTTP representation.
pub(crate) fn domain_error(err: DomainError) -> ApiError {
    let status = match err {
        DomainError::UserNotFound
        | DomainError::BookNotFound
        | DomainError::NotificationNotFound
        | DomainError::TropeNotFound => StatusCode::NOT_FOUND,
        DomainError::EmailTaken
        | DomainError::UsernameTaken
        | DomainError::InvalidUsername(_)
        | DomainError::AlreadyFollowing => StatusCode::BAD_REQUEST,
        DomainError::RecommendationParse
        | DomainError::TextModel(_)
        | DomainError::Storage(_)
        | DomainError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(ErrorResponse::new(err.to_string())))
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

// readshelf/src/lib.rs
//
// Domain crate for the reading tracker: models, repository ports and
// their sled implementations, the delegated identity verifier, and the
// services the HTTP surface is built on.

pub mod auth;
pub mod error;
pub mod genai;
pub mod library;
pub mod models;
pub mod notifications;
pub mod persistence;
pub mod preferences;
pub mod recommend;
pub mod repository;
pub mod users;

pub use error::DomainError;

use crate::auth::Identity;
use crate::error::{DomainError, Result};
use crate::library::LibraryService;
use crate::models::{Book, Notification, NotificationKind, UserSummary};
use crate::repository::{BookRepository, NotificationRepository, UserRepository};
use crate::users::ensure_user;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

const DEFAULT_SHARE_MESSAGE: &str = "te recomendou um livro";

/// A notification enriched with its sender and book, as listed to the
/// recipient.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub from_user: Option<UserSummary>,
    pub book: Option<Book>,
}

pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
    books: Arc<dyn BookRepository>,
    library: Arc<LibraryService>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserRepository>,
        books: Arc<dyn BookRepository>,
        library: Arc<LibraryService>,
    ) -> Self {
        Self {
            notifications,
            users,
            books,
            library,
        }
    }

    pub async fn list(&self, identity: &Identity) -> Result<Vec<NotificationView>> {
        let notifications = self.notifications.list_for_user(&identity.user_id).await?;

        let mut views = Vec::with_capacity(notifications.len());
        for notification in notifications {
            let from_user = match &notification.from_user_id {
                Some(id) => self
                    .users
                    .find_by_id(id)
                    .await?
                    .as_ref()
                    .map(UserSummary::public),
                None => None,
            };

            let book = match &notification.volume_id {
                Some(volume_id) => self.books.find_by_volume_id(volume_id).await?,
                None => None,
            };

            views.push(NotificationView {
                id: notification.id,
                kind: notification.kind,
                message: notification.message,
                is_read: notification.is_read,
                created_at: notification.created_at,
                from_user,
                book,
            });
        }

        Ok(views)
    }

    /// Mark one notification as read; only its recipient may.
    pub async fn mark_read(&self, identity: &Identity, notification_id: &str) -> Result<()> {
        let notification = self
            .notifications
            .find_by_id(notification_id)
            .await?
            .ok_or(DomainError::NotificationNotFound)?;

        if notification.user_id != identity.user_id {
            return Err(DomainError::NotificationNotFound);
        }

        self.notifications.mark_read(notification_id).await
    }

    pub async fn mark_all_read(&self, identity: &Identity) -> Result<()> {
        self.notifications.mark_all_read(&identity.user_id).await
    }

    /// Share a book with another reader.
    pub async fn share_book(
        &self,
        identity: &Identity,
        volume_id: &str,
        to_user_id: &str,
        message: Option<String>,
    ) -> Result<Notification> {
        self.users
            .find_by_id(to_user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let sender = ensure_user(&self.users, identity).await?;
        let book = self.library.ensure_book(volume_id).await?;

        info!("{} shared {} with {}", sender.id, book.volume_id, to_user_id);

        self.notifications
            .create(Notification::new(
                NotificationKind::BookShare,
                message.unwrap_or_else(|| DEFAULT_SHARE_MESSAGE.to_string()),
                to_user_id.to_string(),
                Some(sender.id),
                Some(book.volume_id),
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{
        SledBookRepository, SledNotificationRepository, SledRatingRepository, SledUserRepository,
    };
    use crate::repository::RatingRepository;
    use catalog::transport::TransportError;
    use catalog::volume::{SearchResponse, Volume, VolumeInfo};
    use catalog::{CatalogGateway, CatalogTransport};
    use std::result::Result;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct SingleVolumeTransport {
        volume: Mutex<Option<Volume>>,
    }

    #[async_trait::async_trait]
    impl CatalogTransport for SingleVolumeTransport {
        async fn search(
            &self,
            _query: &str,
            _start_index: u32,
            _max_results: u32,
        ) -> Result<SearchResponse, TransportError> {
            Ok(SearchResponse::empty())
        }

        async fn fetch_volume(&self, _volume_id: &str) -> Result<Volume, TransportError> {
            self.volume
                .lock()
                .unwrap()
                .take()
                .ok_or(TransportError::NoResponse)
        }
    }

    fn identity(user_id: &str) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
            username: Some(user_id.to_string()),
        }
    }

    fn build(temp_dir: &TempDir) -> (NotificationService, Arc<dyn UserRepository>) {
        let users: Arc<dyn UserRepository> =
            Arc::new(SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap());
        let books: Arc<dyn BookRepository> =
            Arc::new(SledBookRepository::new(temp_dir.path().join("books.sled")).unwrap());
        let ratings: Arc<dyn RatingRepository> =
            Arc::new(SledRatingRepository::new(temp_dir.path().join("ratings.sled")).unwrap());
        let notifications: Arc<dyn NotificationRepository> = Arc::new(
            SledNotificationRepository::new(temp_dir.path().join("notifications.sled")).unwrap(),
        );

        let transport = Arc::new(SingleVolumeTransport {
            volume: Mutex::new(Some(Volume {
                id: "abcd1234efgh".to_string(),
                volume_info: Some(VolumeInfo {
                    title: Some("Dune".to_string()),
                    ..VolumeInfo::default()
                }),
            })),
        });
        let gateway = Arc::new(CatalogGateway::with_defaults(transport));
        let library = Arc::new(LibraryService::new(
            books.clone(),
            users.clone(),
            ratings,
            gateway,
        ));

        (
            NotificationService::new(notifications, users.clone(), books, library),
            users,
        )
    }

    #[tokio::test]
    async fn test_share_book_requires_recipient() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = build(&temp_dir);

        let result = service
            .share_book(&identity("uid-1"), "abcd1234efgh", "uid-9", None)
            .await;
        assert!(matches!(result, Err(DomainError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_share_book_creates_notification_with_default_message() {
        let temp_dir = TempDir::new().unwrap();
        let (service, users) = build(&temp_dir);

        users
            .create(crate::models::User::new(
                "uid-2".to_string(),
                "bruna@example.com".to_string(),
                "bruna".to_string(),
            ))
            .await
            .unwrap();

        let created = service
            .share_book(&identity("uid-1"), "abcd1234efgh", "uid-2", None)
            .await
            .unwrap();

        assert_eq!(created.kind, NotificationKind::BookShare);
        assert_eq!(created.message, DEFAULT_SHARE_MESSAGE);
        assert_eq!(created.volume_id.as_deref(), Some("abcd1234efgh"));

        let listed = service.list(&identity("uid-2")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].book.as_ref().unwrap().title, "Dune");
        assert_eq!(listed[0].from_user.as_ref().unwrap().id, "uid-1");
    }

    #[tokio::test]
    async fn test_mark_read_checks_ownership() {
        let temp_dir = TempDir::new().unwrap();
        let (service, users) = build(&temp_dir);

        users
            .create(crate::models::User::new(
                "uid-2".to_string(),
                "bruna@example.com".to_string(),
                "bruna".to_string(),
            ))
            .await
            .unwrap();

        let created = service
            .share_book(&identity("uid-1"), "abcd1234efgh", "uid-2", None)
            .await
            .unwrap();

        let not_mine = service.mark_read(&identity("uid-3"), &created.id).await;
        assert!(matches!(not_mine, Err(DomainError::NotificationNotFound)));

        service.mark_read(&identity("uid-2"), &created.id).await.unwrap();
        let listed = service.list(&identity("uid-2")).await.unwrap();
        assert!(listed[0].is_read);
    }
}

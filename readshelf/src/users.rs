use crate::auth::Identity;
use crate::error::{DomainError, Result};
use crate::models::{Notification, NotificationKind, User, UserSummary};
use crate::repository::{NotificationRepository, UserRepository};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

const USER_SEARCH_LIMIT: usize = 10;

/// Load the user behind a verified identity, creating the record on
/// first touch. Identities are minted by the external provider, so a
/// verified caller without a local record is a new account, not an
/// error.
pub async fn ensure_user(users: &Arc<dyn UserRepository>, identity: &Identity) -> Result<User> {
    if let Some(user) = users.find_by_id(&identity.user_id).await? {
        return Ok(user);
    }

    let user = User::new(
        identity.user_id.clone(),
        identity.email.clone().unwrap_or_default(),
        identity.username.clone().unwrap_or_default(),
    );
    users.create(user).await
}

/// Profile view: counts derived from the shelf and follow lists, email
/// only disclosed to the account owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub followers_count: usize,
    pub following_count: usize,
    pub books_count: usize,
    pub favorites_count: usize,
    pub is_following: bool,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            users,
            notifications,
        }
    }

    pub async fn register(&self, uid: String, email: String, username: String) -> Result<User> {
        if self.users.email_exists(&email).await? {
            return Err(DomainError::EmailTaken);
        }
        if self.users.username_exists(&username).await? {
            return Err(DomainError::UsernameTaken);
        }

        info!("Registering user {username}");
        self.users.create(User::new(uid, email, username)).await
    }

    pub async fn username_available(&self, username: &str) -> Result<bool> {
        Ok(!self.users.username_exists(username).await?)
    }

    pub async fn update_username(&self, identity: &Identity, username: String) -> Result<User> {
        validate_username(&username)?;

        if let Some(existing) = self.users.find_by_username(&username).await? {
            if existing.id != identity.user_id {
                return Err(DomainError::UsernameTaken);
            }
        }

        let mut user = ensure_user(&self.users, identity).await?;
        user.username = username;
        user.updated_at = chrono::Utc::now();
        self.users.update(user).await
    }

    pub async fn update_profile_picture(&self, identity: &Identity, url: String) -> Result<User> {
        let mut user = ensure_user(&self.users, identity).await?;
        user.profile_picture = Some(url);
        user.updated_at = chrono::Utc::now();
        self.users.update(user).await
    }

    /// Follow another reader and notify them.
    pub async fn follow(&self, identity: &Identity, target_user_id: &str) -> Result<()> {
        let mut target = self
            .users
            .find_by_id(target_user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let mut me = ensure_user(&self.users, identity).await?;

        if me.following.iter().any(|id| id == target_user_id) {
            return Err(DomainError::AlreadyFollowing);
        }

        me.following.push(target_user_id.to_string());
        target.followers.push(me.id.clone());

        let follower_username = me.username.clone();
        let follower_id = me.id.clone();
        self.users.update(me).await?;
        self.users.update(target).await?;

        self.notifications
            .create(Notification::new(
                NotificationKind::Follow,
                format!("{follower_username} começou a te seguir"),
                target_user_id.to_string(),
                Some(follower_id),
                None,
            ))
            .await?;

        Ok(())
    }

    pub async fn unfollow(&self, identity: &Identity, target_user_id: &str) -> Result<()> {
        let mut me = ensure_user(&self.users, identity).await?;
        me.following.retain(|id| id != target_user_id);
        self.users.update(me).await?;

        if let Some(mut target) = self.users.find_by_id(target_user_id).await? {
            target.followers.retain(|id| id != &identity.user_id);
            self.users.update(target).await?;
        }

        Ok(())
    }

    pub async fn followers(&self, identity: &Identity) -> Result<Vec<UserSummary>> {
        let user = ensure_user(&self.users, identity).await?;
        self.summaries(&user.followers).await
    }

    pub async fn following(&self, identity: &Identity) -> Result<Vec<UserSummary>> {
        let user = ensure_user(&self.users, identity).await?;
        self.summaries(&user.following).await
    }

    pub async fn profile(
        &self,
        identity: &Identity,
        target_user_id: Option<&str>,
    ) -> Result<UserProfile> {
        let target_id = target_user_id.unwrap_or(&identity.user_id);
        let user = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let is_self = target_id == identity.user_id;
        let is_following = if is_self {
            false
        } else {
            match self.users.find_by_id(&identity.user_id).await? {
                Some(me) => me.following.iter().any(|id| id == target_id),
                None => false,
            }
        };

        Ok(UserProfile {
            id: user.id.clone(),
            username: user.username.clone(),
            email: is_self.then(|| user.email.clone()),
            profile_picture: user.profile_picture.clone(),
            followers_count: user.followers.len(),
            following_count: user.following.len(),
            books_count: user.history.len(),
            favorites_count: user.favorites.len(),
            is_following,
        })
    }

    pub async fn search(&self, identity: &Identity, query: &str) -> Result<Vec<UserSummary>> {
        let found = self
            .users
            .search_by_username(query, &identity.user_id, USER_SEARCH_LIMIT)
            .await?;

        Ok(found.iter().map(UserSummary::public).collect())
    }

    async fn summaries(&self, ids: &[String]) -> Result<Vec<UserSummary>> {
        let mut summaries = Vec::new();
        for id in ids {
            if let Some(user) = self.users.find_by_id(id).await? {
                summaries.push(UserSummary::with_email(&user));
            }
        }
        Ok(summaries)
    }
}

/// Username rules enforced at the service boundary.
pub fn validate_username(username: &str) -> Result<()> {
    if username.len() < 3 {
        return Err(DomainError::InvalidUsername(
            "must be at least 3 characters long",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DomainError::InvalidUsername(
            "can only contain letters, numbers, and underscore",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{SledNotificationRepository, SledUserRepository};
    use tempfile::TempDir;

    fn identity(user_id: &str, username: &str) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
            username: Some(username.to_string()),
        }
    }

    fn service(temp_dir: &TempDir) -> (UserService, Arc<dyn NotificationRepository>) {
        let users: Arc<dyn UserRepository> =
            Arc::new(SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap());
        let notifications: Arc<dyn NotificationRepository> = Arc::new(
            SledNotificationRepository::new(temp_dir.path().join("notifications.sled")).unwrap(),
        );
        (
            UserService::new(users, notifications.clone()),
            notifications,
        )
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ana_reads").is_ok());
        assert!(matches!(
            validate_username("ab"),
            Err(DomainError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("ana reads"),
            Err(DomainError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("ana-reads"),
            Err(DomainError::InvalidUsername(_))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        service
            .register(
                "uid-1".to_string(),
                "ana@example.com".to_string(),
                "ana".to_string(),
            )
            .await
            .unwrap();

        let same_email = service
            .register(
                "uid-2".to_string(),
                "ana@example.com".to_string(),
                "outra".to_string(),
            )
            .await;
        assert!(matches!(same_email, Err(DomainError::EmailTaken)));

        let same_username = service
            .register(
                "uid-3".to_string(),
                "outra@example.com".to_string(),
                "ana".to_string(),
            )
            .await;
        assert!(matches!(same_username, Err(DomainError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_follow_updates_both_sides_and_notifies() {
        let temp_dir = TempDir::new().unwrap();
        let (service, notifications) = service(&temp_dir);

        service
            .register(
                "uid-2".to_string(),
                "bruna@example.com".to_string(),
                "bruna".to_string(),
            )
            .await
            .unwrap();

        let ana = identity("uid-1", "ana");
        service.follow(&ana, "uid-2").await.unwrap();

        let again = service.follow(&ana, "uid-2").await;
        assert!(matches!(again, Err(DomainError::AlreadyFollowing)));

        let created = notifications.list_for_user("uid-2").await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].kind, NotificationKind::Follow);
        assert_eq!(created[0].message, "ana começou a te seguir");

        let profile = service.profile(&ana, Some("uid-2")).await.unwrap();
        assert!(profile.is_following);
        assert_eq!(profile.followers_count, 1);
        assert_eq!(profile.email, None);
    }

    #[tokio::test]
    async fn test_unfollow_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        service
            .register(
                "uid-2".to_string(),
                "bruna@example.com".to_string(),
                "bruna".to_string(),
            )
            .await
            .unwrap();

        let ana = identity("uid-1", "ana");
        service.follow(&ana, "uid-2").await.unwrap();
        service.unfollow(&ana, "uid-2").await.unwrap();
        service.unfollow(&ana, "uid-2").await.unwrap();

        let profile = service.profile(&ana, Some("uid-2")).await.unwrap();
        assert!(!profile.is_following);
        assert_eq!(profile.followers_count, 0);
    }

    #[tokio::test]
    async fn test_profile_discloses_email_only_to_self() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        service
            .register(
                "uid-1".to_string(),
                "uid-1@example.com".to_string(),
                "ana".to_string(),
            )
            .await
            .unwrap();

        let ana = identity("uid-1", "ana");
        let own = service.profile(&ana, None).await.unwrap();
        assert_eq!(own.email.as_deref(), Some("uid-1@example.com"));

        let unknown = service.profile(&ana, Some("uid-9")).await;
        assert!(matches!(unknown, Err(DomainError::UserNotFound)));
    }
}

use crate::error::{DomainError, Result};
use crate::models::Notification;
use crate::repository::NotificationRepository;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;

const NOTIFICATIONS_TREE: &str = "notifications";
const NOTIFICATIONS_BY_USER_TREE: &str = "notifications_by_user";

#[derive(Clone)]
pub struct SledNotificationRepository {
    db: Db,
}

impl SledNotificationRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn notifications_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(NOTIFICATIONS_TREE)?)
    }

    fn by_user_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(NOTIFICATIONS_BY_USER_TREE)?)
    }
}

#[async_trait]
impl NotificationRepository for SledNotificationRepository {
    async fn create(&self, notification: Notification) -> Result<Notification> {
        let notifications_tree = self.notifications_tree()?;
        let by_user_tree = self.by_user_tree()?;

        let notification_json = serde_json::to_vec(&notification)?;

        // Store notification by ID
        notifications_tree.insert(notification.id.as_bytes(), notification_json)?;

        // Store ID under the recipient for listing
        let user_key = format!("{}/{}", notification.user_id, notification.id);
        by_user_tree.insert(user_key.as_bytes(), notification.id.as_bytes())?;

        Ok(notification)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>> {
        let notifications_tree = self.notifications_tree()?;

        if let Some(data) = notifications_tree.get(id.as_bytes())? {
            let notification: Notification = serde_json::from_slice(&data)?;
            return Ok(Some(notification));
        }

        Ok(None)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>> {
        let notifications_tree = self.notifications_tree()?;
        let by_user_tree = self.by_user_tree()?;
        let mut notifications = Vec::new();

        for item in by_user_tree.scan_prefix(format!("{user_id}/").as_bytes()) {
            let (_, id) = item?;
            if let Some(data) = notifications_tree.get(&id)? {
                let notification: Notification = serde_json::from_slice(&data)?;
                notifications.push(notification);
            }
        }

        // Newest first
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_read(&self, id: &str) -> Result<()> {
        let notifications_tree = self.notifications_tree()?;

        if let Some(data) = notifications_tree.get(id.as_bytes())? {
            let mut notification: Notification = serde_json::from_slice(&data)?;
            notification.is_read = true;
            notifications_tree.insert(id.as_bytes(), serde_json::to_vec(&notification)?)?;
            Ok(())
        } else {
            Err(DomainError::NotificationNotFound)
        }
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<()> {
        let notifications_tree = self.notifications_tree()?;
        let by_user_tree = self.by_user_tree()?;

        for item in by_user_tree.scan_prefix(format!("{user_id}/").as_bytes()) {
            let (_, id) = item?;
            if let Some(data) = notifications_tree.get(&id)? {
                let mut notification: Notification = serde_json::from_slice(&data)?;
                if !notification.is_read {
                    notification.is_read = true;
                    notifications_tree.insert(&id, serde_json::to_vec(&notification)?)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use tempfile::TempDir;

    fn follow_notification(recipient: &str, from: &str) -> Notification {
        Notification::new(
            NotificationKind::Follow,
            "começou a te seguir".to_string(),
            recipient.to_string(),
            Some(from.to_string()),
            None,
        )
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_recipient() {
        let temp_dir = TempDir::new().unwrap();
        let repo =
            SledNotificationRepository::new(temp_dir.path().join("notifications.sled")).unwrap();

        repo.create(follow_notification("uid-1", "uid-2")).await.unwrap();
        repo.create(follow_notification("uid-1", "uid-3")).await.unwrap();
        repo.create(follow_notification("uid-2", "uid-1")).await.unwrap();

        assert_eq!(repo.list_for_user("uid-1").await.unwrap().len(), 2);
        assert_eq!(repo.list_for_user("uid-2").await.unwrap().len(), 1);
        assert!(repo.list_for_user("uid-3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_and_mark_all_read() {
        let temp_dir = TempDir::new().unwrap();
        let repo =
            SledNotificationRepository::new(temp_dir.path().join("notifications.sled")).unwrap();

        let first = repo.create(follow_notification("uid-1", "uid-2")).await.unwrap();
        repo.create(follow_notification("uid-1", "uid-3")).await.unwrap();

        repo.mark_read(&first.id).await.unwrap();
        let listed = repo.list_for_user("uid-1").await.unwrap();
        assert_eq!(listed.iter().filter(|n| n.is_read).count(), 1);

        repo.mark_all_read("uid-1").await.unwrap();
        let listed = repo.list_for_user("uid-1").await.unwrap();
        assert!(listed.iter().all(|n| n.is_read));
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id_errors() {
        let temp_dir = TempDir::new().unwrap();
        let repo =
            SledNotificationRepository::new(temp_dir.path().join("notifications.sled")).unwrap();

        let result = repo.mark_read("missing").await;
        assert!(matches!(result, Err(DomainError::NotificationNotFound)));
    }
}

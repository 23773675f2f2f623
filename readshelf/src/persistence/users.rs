use crate::error::Result;
use crate::models::User;
use crate::repository::UserRepository;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;

const USERS_TREE: &str = "users";
const USERS_BY_EMAIL_TREE: &str = "users_by_email";
const USERS_BY_USERNAME_TREE: &str = "users_by_username";

#[derive(Clone)]
pub struct SledUserRepository {
    db: Db,
}

impl SledUserRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn users_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(USERS_TREE)?)
    }

    fn email_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(USERS_BY_EMAIL_TREE)?)
    }

    fn username_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(USERS_BY_USERNAME_TREE)?)
    }

    fn load(&self, tree: &sled::Tree, id: &[u8]) -> Result<Option<User>> {
        if let Some(data) = tree.get(id)? {
            let user: User = serde_json::from_slice(&data)?;
            return Ok(Some(user));
        }
        Ok(None)
    }
}

#[async_trait]
impl UserRepository for SledUserRepository {
    async fn create(&self, user: User) -> Result<User> {
        let users_tree = self.users_tree()?;
        let email_tree = self.email_tree()?;
        let username_tree = self.username_tree()?;

        let user_json = serde_json::to_vec(&user)?;

        // Store user by ID
        users_tree.insert(user.id.as_bytes(), user_json)?;

        // Store ID by email and username for lookups. Identity providers
        // sometimes hand us no username at first touch; empty values are
        // not indexed so they never collide.
        if !user.email.is_empty() {
            email_tree.insert(user.email.as_bytes(), user.id.as_bytes())?;
        }
        if !user.username.is_empty() {
            username_tree.insert(user.username.as_bytes(), user.id.as_bytes())?;
        }

        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let users_tree = self.users_tree()?;
        self.load(&users_tree, id.as_bytes())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        if email.is_empty() {
            return Ok(None);
        }

        let email_tree = self.email_tree()?;
        let users_tree = self.users_tree()?;

        if let Some(user_id) = email_tree.get(email.as_bytes())? {
            return self.load(&users_tree, &user_id);
        }

        Ok(None)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        if username.is_empty() {
            return Ok(None);
        }

        let username_tree = self.username_tree()?;
        let users_tree = self.users_tree()?;

        if let Some(user_id) = username_tree.get(username.as_bytes())? {
            return self.load(&users_tree, &user_id);
        }

        Ok(None)
    }

    async fn update(&self, user: User) -> Result<User> {
        let users_tree = self.users_tree()?;
        let email_tree = self.email_tree()?;
        let username_tree = self.username_tree()?;

        // Drop stale index entries when email or username changed
        if let Some(previous) = self.load(&users_tree, user.id.as_bytes())? {
            if previous.email != user.email && !previous.email.is_empty() {
                email_tree.remove(previous.email.as_bytes())?;
            }
            if previous.username != user.username && !previous.username.is_empty() {
                username_tree.remove(previous.username.as_bytes())?;
            }
        }

        let user_json = serde_json::to_vec(&user)?;
        users_tree.insert(user.id.as_bytes(), user_json)?;

        if !user.email.is_empty() {
            email_tree.insert(user.email.as_bytes(), user.id.as_bytes())?;
        }
        if !user.username.is_empty() {
            username_tree.insert(user.username.as_bytes(), user.id.as_bytes())?;
        }

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        if email.is_empty() {
            return Ok(false);
        }
        let email_tree = self.email_tree()?;
        Ok(email_tree.contains_key(email.as_bytes())?)
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        if username.is_empty() {
            return Ok(false);
        }
        let username_tree = self.username_tree()?;
        Ok(username_tree.contains_key(username.as_bytes())?)
    }

    async fn search_by_username(
        &self,
        query: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<User>> {
        let users_tree = self.users_tree()?;
        let needle = query.to_lowercase();
        let mut matches = Vec::new();

        for item in users_tree.iter() {
            let (_, data) = item?;
            let user: User = serde_json::from_slice(&data)?;

            if user.id != exclude_id && user.username.to_lowercase().contains(&needle) {
                matches.push(user);
                if matches.len() == limit {
                    break;
                }
            }
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_user(id: &str, email: &str, username: &str) -> User {
        User::new(id.to_string(), email.to_string(), username.to_string())
    }

    #[tokio::test]
    async fn test_create_and_lookups() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap();

        let user = sample_user("uid-1", "ana@example.com", "ana");
        repo.create(user).await.unwrap();

        assert!(repo.find_by_id("uid-1").await.unwrap().is_some());
        assert_eq!(
            repo.find_by_email("ana@example.com")
                .await
                .unwrap()
                .unwrap()
                .id,
            "uid-1"
        );
        assert_eq!(
            repo.find_by_username("ana").await.unwrap().unwrap().id,
            "uid-1"
        );
        assert!(repo.email_exists("ana@example.com").await.unwrap());
        assert!(repo.username_exists("ana").await.unwrap());
        assert!(!repo.username_exists("bruna").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_username_is_not_indexed() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap();

        repo.create(sample_user("uid-1", "a@example.com", ""))
            .await
            .unwrap();
        repo.create(sample_user("uid-2", "b@example.com", ""))
            .await
            .unwrap();

        assert!(!repo.username_exists("").await.unwrap());
        assert!(repo.find_by_username("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_moves_username_index() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap();

        let mut user = repo
            .create(sample_user("uid-1", "ana@example.com", "ana"))
            .await
            .unwrap();

        user.username = "ana_reads".to_string();
        repo.update(user).await.unwrap();

        assert!(!repo.username_exists("ana").await.unwrap());
        assert_eq!(
            repo.find_by_username("ana_reads").await.unwrap().unwrap().id,
            "uid-1"
        );
    }

    #[tokio::test]
    async fn test_search_excludes_requester_and_limits() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap();

        repo.create(sample_user("uid-1", "a@example.com", "leitor_ana"))
            .await
            .unwrap();
        repo.create(sample_user("uid-2", "b@example.com", "Leitor_Bruna"))
            .await
            .unwrap();
        repo.create(sample_user("uid-3", "c@example.com", "carlos"))
            .await
            .unwrap();

        let found = repo.search_by_username("leitor", "uid-1", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "uid-2");
    }
}

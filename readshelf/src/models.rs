use catalog::BookRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reader. Relationship lists (shelves, follow graph, preference rows)
/// live inside the record itself; every entry is an id or name resolved
/// through the owning repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity-provider uid; minted outside this system.
    pub id: String,
    pub email: String,
    pub username: String,
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub reading_list: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub favorite_tropes: Vec<String>,
    #[serde(default)]
    pub liked_tropes: Vec<String>,
    #[serde(default)]
    pub disliked_tropes: Vec<String>,
    #[serde(default)]
    pub liked_categories: Vec<String>,
    #[serde(default)]
    pub disliked_categories: Vec<String>,
    #[serde(default)]
    pub liked_authors: Vec<String>,
    #[serde(default)]
    pub disliked_authors: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: String, email: String, username: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            username,
            profile_picture: None,
            history: Vec::new(),
            favorites: Vec::new(),
            reading_list: Vec::new(),
            following: Vec::new(),
            followers: Vec::new(),
            favorite_tropes: Vec::new(),
            liked_tropes: Vec::new(),
            disliked_tropes: Vec::new(),
            liked_categories: Vec::new(),
            disliked_categories: Vec::new(),
            liked_authors: Vec::new(),
            disliked_authors: Vec::new(),
            languages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_preferences(&self) -> bool {
        !self.liked_tropes.is_empty()
            || !self.disliked_tropes.is_empty()
            || !self.liked_categories.is_empty()
            || !self.disliked_categories.is_empty()
            || !self.liked_authors.is_empty()
            || !self.disliked_authors.is_empty()
    }
}

/// Compact user shape for listings (followers, search results,
/// notification senders).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}

impl UserSummary {
    /// Summary including the email, as shown to the account owner's own
    /// follower/following listings.
    pub fn with_email(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: Some(user.email.clone()),
            profile_picture: user.profile_picture.clone(),
        }
    }

    /// Public summary without the email.
    pub fn public(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: None,
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// A catalog volume persisted locally. Keyed by the upstream volume id;
/// the record is the normalized shape, so no field is ever missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub volume_id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_url: Option<String>,
    pub published_date: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Vec<String>,
    pub isbn: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        Self {
            volume_id: record.volume_id,
            title: record.title,
            author: record.author,
            description: record.description,
            cover_url: record.cover_url,
            published_date: record.published_date,
            page_count: record.page_count,
            categories: record.categories,
            isbn: record.isbn,
            created_at: Utc::now(),
        }
    }
}

/// One reader's rating and review of one volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub user_id: String,
    pub volume_id: String,
    pub rating: u8,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(user_id: String, volume_id: String, rating: u8, review: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            volume_id,
            rating,
            review,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Follow,
    BookShare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    /// Recipient.
    pub user_id: String,
    pub from_user_id: Option<String>,
    pub volume_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        message: String,
        user_id: String,
        from_user_id: Option<String>,
        volume_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            message,
            user_id,
            from_user_id,
            volume_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TropeCategory {
    Romance,
    SciFiFantasy,
    Drama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trope {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: TropeCategory,
}

impl Trope {
    pub fn new(name: String, description: String, category: TropeCategory) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            category,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    pub automated_recommendations_enabled: bool,
}

impl UserSettings {
    /// Automated recommendations default to enabled.
    pub fn default_for(user_id: String) -> Self {
        Self {
            user_id,
            automated_recommendations_enabled: true,
        }
    }
}

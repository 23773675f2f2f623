use crate::auth::Identity;
use crate::error::{DomainError, Result};
use crate::models::{Book, Rating, User};
use crate::repository::{BookRepository, RatingRepository, UserRepository};
use crate::users::ensure_user;
use catalog::{normalize_book, CatalogGateway};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Fixed browse list shown when no category query is given.
const COMMON_CATEGORIES: [&str; 15] = [
    "Ficção",
    "Fantasia",
    "Ficção científica",
    "Romance",
    "Mistério",
    "Thriller",
    "Terror",
    "Biografia",
    "História",
    "Autoajuda",
    "Young Adult",
    "Infantil",
    "Poesia",
    "Drama",
    "HQs",
];

/// A shelf entry: the book plus the owner's rating of it, if any.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub book: Book,
    pub rating: Option<Rating>,
}

/// A review as shown on a book's detail page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub rating: u8,
    pub review: Option<String>,
    pub username: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub ratings: Vec<ReviewEntry>,
}

#[derive(Debug, Serialize)]
pub struct AuthorSuggestion {
    pub name: String,
    pub id: String,
}

/// Shelf operations: reading history, favorites and the reading list,
/// all backed by locally persisted books that are created on demand from
/// the catalog gateway.
pub struct LibraryService {
    books: Arc<dyn BookRepository>,
    users: Arc<dyn UserRepository>,
    ratings: Arc<dyn RatingRepository>,
    gateway: Arc<CatalogGateway>,
}

impl LibraryService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        users: Arc<dyn UserRepository>,
        ratings: Arc<dyn RatingRepository>,
        gateway: Arc<CatalogGateway>,
    ) -> Self {
        Self {
            books,
            users,
            ratings,
            gateway,
        }
    }

    /// Load a book, fetching and persisting it from the catalog when it
    /// is not stored yet. The gateway always returns a structurally
    /// complete volume (a sentinel fallback at worst), so this always
    /// yields a storable record.
    pub async fn ensure_book(&self, volume_id: &str) -> Result<Book> {
        if let Some(book) = self.books.find_by_volume_id(volume_id).await? {
            return Ok(book);
        }

        let volume = self.gateway.get_by_id(volume_id).await;
        let book = Book::from(normalize_book(&volume));
        self.books.upsert(book).await
    }

    /// Add a volume to the caller's history and record their rating.
    pub async fn add_to_history(
        &self,
        identity: &Identity,
        volume_id: &str,
        rating: u8,
        review: Option<String>,
    ) -> Result<()> {
        let book = self.ensure_book(volume_id).await?;
        let mut user = ensure_user(&self.users, identity).await?;

        if !user.history.iter().any(|id| id == &book.volume_id) {
            user.history.push(book.volume_id.clone());
            user.updated_at = chrono::Utc::now();
            self.users.update(user).await?;
        }

        let record = match self.ratings.find(&identity.user_id, volume_id).await? {
            Some(mut existing) => {
                existing.rating = rating;
                existing.review = review;
                existing.updated_at = chrono::Utc::now();
                existing
            }
            None => Rating::new(
                identity.user_id.clone(),
                volume_id.to_string(),
                rating,
                review,
            ),
        };
        self.ratings.upsert(record).await?;

        info!("Added {volume_id} to history of {}", identity.user_id);
        Ok(())
    }

    /// Remove a volume from the caller's history along with their rating.
    pub async fn remove_from_history(&self, identity: &Identity, volume_id: &str) -> Result<()> {
        let book = self
            .books
            .find_by_volume_id(volume_id)
            .await?
            .ok_or(DomainError::BookNotFound)?;

        self.ratings.delete_for(&identity.user_id, volume_id).await?;

        let mut user = ensure_user(&self.users, identity).await?;
        user.history.retain(|id| id != &book.volume_id);
        user.updated_at = chrono::Utc::now();
        self.users.update(user).await?;

        Ok(())
    }

    /// Toggle a volume on the caller's favorites shelf. Returns whether
    /// the book is a favorite afterwards.
    pub async fn toggle_favorite(&self, identity: &Identity, volume_id: &str) -> Result<bool> {
        let book = self.ensure_book(volume_id).await?;
        let mut user = ensure_user(&self.users, identity).await?;

        let now_favorite = if user.favorites.iter().any(|id| id == &book.volume_id) {
            user.favorites.retain(|id| id != &book.volume_id);
            false
        } else {
            user.favorites.push(book.volume_id.clone());
            true
        };

        user.updated_at = chrono::Utc::now();
        self.users.update(user).await?;
        Ok(now_favorite)
    }

    /// Toggle a volume on the caller's reading list. Returns whether the
    /// book is on the list afterwards.
    pub async fn toggle_reading_list(&self, identity: &Identity, volume_id: &str) -> Result<bool> {
        let book = self.ensure_book(volume_id).await?;
        let mut user = ensure_user(&self.users, identity).await?;

        let now_listed = if user.reading_list.iter().any(|id| id == &book.volume_id) {
            user.reading_list.retain(|id| id != &book.volume_id);
            false
        } else {
            user.reading_list.push(book.volume_id.clone());
            true
        };

        user.updated_at = chrono::Utc::now();
        self.users.update(user).await?;
        Ok(now_listed)
    }

    pub async fn read_history(&self, identity: &Identity) -> Result<Vec<HistoryEntry>> {
        let user = ensure_user(&self.users, identity).await?;
        let books = self.books.find_many(&user.history).await?;

        let mut entries = Vec::with_capacity(books.len());
        for book in books {
            let rating = self.ratings.find(&user.id, &book.volume_id).await?;
            entries.push(HistoryEntry { book, rating });
        }
        Ok(entries)
    }

    pub async fn reading_list(&self, identity: &Identity) -> Result<Vec<Book>> {
        let user = ensure_user(&self.users, identity).await?;
        self.books.find_many(&user.reading_list).await
    }

    pub async fn favorites(&self, identity: &Identity) -> Result<Vec<Book>> {
        let user = ensure_user(&self.users, identity).await?;
        self.books.find_many(&user.favorites).await
    }

    /// Book detail page: the record plus everyone's reviews.
    pub async fn book_details(&self, volume_id: &str) -> Result<BookDetails> {
        let book = self.ensure_book(volume_id).await?;
        let ratings = self.ratings.list_by_volume(volume_id).await?;

        let mut reviews = Vec::with_capacity(ratings.len());
        for rating in ratings {
            let reviewer: Option<User> = self.users.find_by_id(&rating.user_id).await?;
            let (username, email) = reviewer
                .map(|u| (u.username, u.email))
                .unwrap_or_default();
            reviews.push(ReviewEntry {
                rating: rating.rating,
                review: rating.review,
                username,
                email,
                created_at: rating.created_at,
            });
        }

        Ok(BookDetails {
            book,
            ratings: reviews,
        })
    }

    /// Category browse: with a query, a deduplicated first-seen list of
    /// the categories found by a subject search; without one, a fixed
    /// common list.
    pub async fn common_categories(&self, query: Option<&str>) -> Vec<String> {
        let query = match query {
            Some(q) if !q.is_empty() => q,
            _ => {
                return COMMON_CATEGORIES.iter().map(|c| c.to_string()).collect();
            }
        };

        let response = self.gateway.search(&format!("subject:{query}"), 0, 10).await;

        let mut categories: Vec<String> = Vec::new();
        for item in &response.items {
            if let Some(info) = &item.volume_info {
                for category in info.categories.clone().unwrap_or_default() {
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
            }
        }
        categories
    }

    /// Author browse: frequency-ranked authors from an author search.
    pub async fn common_authors(&self, query: &str) -> Vec<AuthorSuggestion> {
        let response = self.gateway.search(&format!("inauthor:{query}"), 0, 20).await;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for item in &response.items {
            if let Some(info) = &item.volume_info {
                for author in info.authors.clone().unwrap_or_default() {
                    *counts.entry(author).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        ranked
            .into_iter()
            .map(|(name, _)| {
                let id = name.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
                AuthorSuggestion { name, id }
            })
            .collect()
    }
}

use crate::error::Result;
use crate::models::Book;
use crate::repository::BookRepository;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;

const BOOKS_TREE: &str = "books";

#[derive(Clone)]
pub struct SledBookRepository {
    db: Db,
}

impl SledBookRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn books_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(BOOKS_TREE)?)
    }
}

#[async_trait]
impl BookRepository for SledBookRepository {
    async fn upsert(&self, book: Book) -> Result<Book> {
        let books_tree = self.books_tree()?;
        let book_json = serde_json::to_vec(&book)?;
        books_tree.insert(book.volume_id.as_bytes(), book_json)?;
        Ok(book)
    }

    async fn find_by_volume_id(&self, volume_id: &str) -> Result<Option<Book>> {
        let books_tree = self.books_tree()?;

        if let Some(data) = books_tree.get(volume_id.as_bytes())? {
            let book: Book = serde_json::from_slice(&data)?;
            return Ok(Some(book));
        }

        Ok(None)
    }

    async fn find_many(&self, volume_ids: &[String]) -> Result<Vec<Book>> {
        let books_tree = self.books_tree()?;
        let mut books = Vec::new();

        for volume_id in volume_ids {
            if let Some(data) = books_tree.get(volume_id.as_bytes())? {
                let book: Book = serde_json::from_slice(&data)?;
                books.push(book);
            }
        }

        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::BookRecord;
    use tempfile::TempDir;

    fn sample_book(volume_id: &str, title: &str) -> Book {
        Book::from(BookRecord {
            volume_id: volume_id.to_string(),
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            description: "No description available.".to_string(),
            cover_url: None,
            published_date: None,
            page_count: None,
            categories: vec![],
            isbn: None,
        })
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_volume_id() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledBookRepository::new(temp_dir.path().join("books.sled")).unwrap();

        repo.upsert(sample_book("abcd1234efgh", "Dune")).await.unwrap();
        repo.upsert(sample_book("abcd1234efgh", "Dune Messiah"))
            .await
            .unwrap();

        let found = repo.find_by_volume_id("abcd1234efgh").await.unwrap().unwrap();
        assert_eq!(found.title, "Dune Messiah");
    }

    #[tokio::test]
    async fn test_find_many_skips_missing_ids() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledBookRepository::new(temp_dir.path().join("books.sled")).unwrap();

        repo.upsert(sample_book("abcd1234efgh", "Dune")).await.unwrap();

        let found = repo
            .find_many(&["abcd1234efgh".to_string(), "missing12345".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].volume_id, "abcd1234efgh");
    }
}

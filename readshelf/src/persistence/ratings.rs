use crate::error::Result;
use crate::models::Rating;
use crate::repository::RatingRepository;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;

const RATINGS_TREE: &str = "ratings";
const RATINGS_BY_VOLUME_TREE: &str = "ratings_by_volume";

/// Ratings are keyed `{user_id}/{volume_id}` so one prefix scan lists a
/// user's ratings; a mirror tree keyed `{volume_id}/{user_id}` serves the
/// per-volume listing.
#[derive(Clone)]
pub struct SledRatingRepository {
    db: Db,
}

impl SledRatingRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn ratings_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(RATINGS_TREE)?)
    }

    fn by_volume_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(RATINGS_BY_VOLUME_TREE)?)
    }

    fn collect_prefix(tree: &sled::Tree, prefix: &str) -> Result<Vec<Rating>> {
        let mut ratings = Vec::new();

        for item in tree.scan_prefix(prefix.as_bytes()) {
            let (_, data) = item?;
            let rating: Rating = serde_json::from_slice(&data)?;
            ratings.push(rating);
        }

        // Newest first
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }
}

#[async_trait]
impl RatingRepository for SledRatingRepository {
    async fn upsert(&self, rating: Rating) -> Result<Rating> {
        let ratings_tree = self.ratings_tree()?;
        let by_volume_tree = self.by_volume_tree()?;

        let rating_json = serde_json::to_vec(&rating)?;
        let user_key = format!("{}/{}", rating.user_id, rating.volume_id);
        let volume_key = format!("{}/{}", rating.volume_id, rating.user_id);

        ratings_tree.insert(user_key.as_bytes(), rating_json.clone())?;
        by_volume_tree.insert(volume_key.as_bytes(), rating_json)?;

        Ok(rating)
    }

    async fn find(&self, user_id: &str, volume_id: &str) -> Result<Option<Rating>> {
        let ratings_tree = self.ratings_tree()?;
        let user_key = format!("{user_id}/{volume_id}");

        if let Some(data) = ratings_tree.get(user_key.as_bytes())? {
            let rating: Rating = serde_json::from_slice(&data)?;
            return Ok(Some(rating));
        }

        Ok(None)
    }

    async fn delete_for(&self, user_id: &str, volume_id: &str) -> Result<bool> {
        let ratings_tree = self.ratings_tree()?;
        let by_volume_tree = self.by_volume_tree()?;

        let user_key = format!("{user_id}/{volume_id}");
        let volume_key = format!("{volume_id}/{user_id}");

        let existed = ratings_tree.remove(user_key.as_bytes())?.is_some();
        by_volume_tree.remove(volume_key.as_bytes())?;

        Ok(existed)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Rating>> {
        let ratings_tree = self.ratings_tree()?;
        Self::collect_prefix(&ratings_tree, &format!("{user_id}/"))
    }

    async fn list_by_volume(&self, volume_id: &str) -> Result<Vec<Rating>> {
        let by_volume_tree = self.by_volume_tree()?;
        Self::collect_prefix(&by_volume_tree, &format!("{volume_id}/"))
    }
}

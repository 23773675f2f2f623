use crate::error::Result;
use crate::models::{Author, Category, Language, Trope, TropeCategory, UserSettings};
use crate::repository::{
    AuthorRepository, CategoryRepository, LanguageRepository, SettingsRepository, TropeRepository,
};
use async_trait::async_trait;
use sled::Db;
use std::path::Path;

const TROPES_TREE: &str = "tropes";
const TROPES_BY_NAME_TREE: &str = "tropes_by_name";
const AUTHORS_TREE: &str = "authors";
const AUTHORS_BY_NAME_TREE: &str = "authors_by_name";
const CATEGORIES_TREE: &str = "categories";
const CATEGORIES_BY_NAME_TREE: &str = "categories_by_name";
const LANGUAGES_TREE: &str = "languages";
const SETTINGS_TREE: &str = "settings";

#[derive(Clone)]
pub struct SledTropeRepository {
    db: Db,
}

impl SledTropeRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tropes_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(TROPES_TREE)?)
    }

    fn name_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(TROPES_BY_NAME_TREE)?)
    }
}

#[async_trait]
impl TropeRepository for SledTropeRepository {
    async fn upsert_by_name(
        &self,
        name: &str,
        description: &str,
        category: TropeCategory,
    ) -> Result<Trope> {
        let tropes_tree = self.tropes_tree()?;
        let name_tree = self.name_tree()?;

        // Existing tropes keep their id; description and category refresh
        let trope = match name_tree.get(name.as_bytes())? {
            Some(id) => match tropes_tree.get(&id)? {
                Some(data) => {
                    let mut trope: Trope = serde_json::from_slice(&data)?;
                    trope.description = description.to_string();
                    trope.category = category;
                    trope
                }
                None => Trope::new(name.to_string(), description.to_string(), category),
            },
            None => Trope::new(name.to_string(), description.to_string(), category),
        };

        tropes_tree.insert(trope.id.as_bytes(), serde_json::to_vec(&trope)?)?;
        name_tree.insert(name.as_bytes(), trope.id.as_bytes())?;

        Ok(trope)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Trope>> {
        let tropes_tree = self.tropes_tree()?;

        if let Some(data) = tropes_tree.get(id.as_bytes())? {
            let trope: Trope = serde_json::from_slice(&data)?;
            return Ok(Some(trope));
        }

        Ok(None)
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Trope>> {
        let tropes_tree = self.tropes_tree()?;
        let mut tropes = Vec::new();

        for id in ids {
            if let Some(data) = tropes_tree.get(id.as_bytes())? {
                let trope: Trope = serde_json::from_slice(&data)?;
                tropes.push(trope);
            }
        }

        Ok(tropes)
    }

    async fn list_all(&self) -> Result<Vec<Trope>> {
        let tropes_tree = self.tropes_tree()?;
        let mut tropes = Vec::new();

        for item in tropes_tree.iter() {
            let (_, data) = item?;
            let trope: Trope = serde_json::from_slice(&data)?;
            tropes.push(trope);
        }

        tropes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tropes)
    }
}

#[derive(Clone)]
pub struct SledAuthorRepository {
    db: Db,
}

impl SledAuthorRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn authors_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(AUTHORS_TREE)?)
    }

    fn name_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(AUTHORS_BY_NAME_TREE)?)
    }
}

#[async_trait]
impl AuthorRepository for SledAuthorRepository {
    async fn upsert_by_name(&self, name: &str) -> Result<Author> {
        let authors_tree = self.authors_tree()?;
        let name_tree = self.name_tree()?;

        if let Some(id) = name_tree.get(name.as_bytes())? {
            if let Some(data) = authors_tree.get(&id)? {
                let author: Author = serde_json::from_slice(&data)?;
                return Ok(author);
            }
        }

        let author = Author::new(name.to_string());
        authors_tree.insert(author.id.as_bytes(), serde_json::to_vec(&author)?)?;
        name_tree.insert(name.as_bytes(), author.id.as_bytes())?;

        Ok(author)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Author>> {
        let authors_tree = self.authors_tree()?;
        let needle = query.to_lowercase();
        let mut matches = Vec::new();

        for item in authors_tree.iter() {
            let (_, data) = item?;
            let author: Author = serde_json::from_slice(&data)?;
            if author.name.to_lowercase().contains(&needle) {
                matches.push(author);
            }
        }

        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches.truncate(limit);
        Ok(matches)
    }
}

#[derive(Clone)]
pub struct SledCategoryRepository {
    db: Db,
}

impl SledCategoryRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn categories_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(CATEGORIES_TREE)?)
    }

    fn name_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(CATEGORIES_BY_NAME_TREE)?)
    }
}

#[async_trait]
impl CategoryRepository for SledCategoryRepository {
    async fn upsert_by_name(&self, name: &str) -> Result<Category> {
        let categories_tree = self.categories_tree()?;
        let name_tree = self.name_tree()?;

        if let Some(id) = name_tree.get(name.as_bytes())? {
            if let Some(data) = categories_tree.get(&id)? {
                let category: Category = serde_json::from_slice(&data)?;
                return Ok(category);
            }
        }

        let category = Category::new(name.to_string());
        categories_tree.insert(category.id.as_bytes(), serde_json::to_vec(&category)?)?;
        name_tree.insert(name.as_bytes(), category.id.as_bytes())?;

        Ok(category)
    }
}

#[derive(Clone)]
pub struct SledLanguageRepository {
    db: Db,
}

impl SledLanguageRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn languages_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(LANGUAGES_TREE)?)
    }
}

#[async_trait]
impl LanguageRepository for SledLanguageRepository {
    async fn upsert(&self, code: &str, name: &str) -> Result<Language> {
        let languages_tree = self.languages_tree()?;

        // Known codes keep their stored name
        if let Some(data) = languages_tree.get(code.as_bytes())? {
            let language: Language = serde_json::from_slice(&data)?;
            return Ok(language);
        }

        let language = Language {
            code: code.to_string(),
            name: name.to_string(),
        };
        languages_tree.insert(code.as_bytes(), serde_json::to_vec(&language)?)?;

        Ok(language)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Language>> {
        let languages_tree = self.languages_tree()?;

        if let Some(data) = languages_tree.get(code.as_bytes())? {
            let language: Language = serde_json::from_slice(&data)?;
            return Ok(Some(language));
        }

        Ok(None)
    }
}

#[derive(Clone)]
pub struct SledSettingsRepository {
    db: Db,
}

impl SledSettingsRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn settings_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(SETTINGS_TREE)?)
    }
}

#[async_trait]
impl SettingsRepository for SledSettingsRepository {
    async fn find(&self, user_id: &str) -> Result<Option<UserSettings>> {
        let settings_tree = self.settings_tree()?;

        if let Some(data) = settings_tree.get(user_id.as_bytes())? {
            let settings: UserSettings = serde_json::from_slice(&data)?;
            return Ok(Some(settings));
        }

        Ok(None)
    }

    async fn put(&self, settings: UserSettings) -> Result<UserSettings> {
        let settings_tree = self.settings_tree()?;
        settings_tree.insert(settings.user_id.as_bytes(), serde_json::to_vec(&settings)?)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_trope_upsert_is_idempotent_on_id() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledTropeRepository::new(temp_dir.path().join("tropes.sled")).unwrap();

        let first = repo
            .upsert_by_name("Slow Burn", "old description", TropeCategory::Romance)
            .await
            .unwrap();
        let second = repo
            .upsert_by_name("Slow Burn", "new description", TropeCategory::Romance)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.description, "new description");
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_trope_list_is_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledTropeRepository::new(temp_dir.path().join("tropes.sled")).unwrap();

        repo.upsert_by_name("Time Travel", "d", TropeCategory::SciFiFantasy)
            .await
            .unwrap();
        repo.upsert_by_name("Chosen One", "d", TropeCategory::SciFiFantasy)
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Chosen One", "Time Travel"]);
    }

    #[tokio::test]
    async fn test_author_upsert_and_search() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledAuthorRepository::new(temp_dir.path().join("authors.sled")).unwrap();

        let first = repo.upsert_by_name("Frank Herbert").await.unwrap();
        let again = repo.upsert_by_name("Frank Herbert").await.unwrap();
        repo.upsert_by_name("Ursula K. Le Guin").await.unwrap();

        assert_eq!(first.id, again.id);

        let found = repo.search("herbert", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Frank Herbert");
    }

    #[tokio::test]
    async fn test_language_upsert_keeps_first_name() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledLanguageRepository::new(temp_dir.path().join("languages.sled")).unwrap();

        repo.upsert("pt", "Português").await.unwrap();
        let kept = repo.upsert("pt", "Portuguese").await.unwrap();

        assert_eq!(kept.name, "Português");
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledSettingsRepository::new(temp_dir.path().join("settings.sled")).unwrap();

        assert!(repo.find("uid-1").await.unwrap().is_none());

        let mut settings = UserSettings::default_for("uid-1".to_string());
        repo.put(settings.clone()).await.unwrap();
        assert!(repo
            .find("uid-1")
            .await
            .unwrap()
            .unwrap()
            .automated_recommendations_enabled);

        settings.automated_recommendations_enabled = false;
        repo.put(settings).await.unwrap();
        assert!(!repo
            .find("uid-1")
            .await
            .unwrap()
            .unwrap()
            .automated_recommendations_enabled);
    }
}

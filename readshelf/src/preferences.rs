use crate::auth::Identity;
use crate::error::{DomainError, Result};
use crate::models::{Author, Language, Trope, TropeCategory};
use crate::repository::{
    AuthorRepository, CategoryRepository, LanguageRepository, TropeRepository, UserRepository,
};
use crate::users::ensure_user;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

const AUTHOR_SEARCH_LIMIT: usize = 10;

/// Seed rows for the trope table. Kept as data so startup can upsert
/// them idempotently.
const TROPE_SEED: [(&str, &str, TropeCategory); 34] = [
    (
        "Enemies to Lovers",
        "Inimigos que se apaixonam",
        TropeCategory::Romance,
    ),
    (
        "Friends to Lovers",
        "Amigos que viram casal",
        TropeCategory::Romance,
    ),
    (
        "Fake Dating",
        "Relacionamento de mentira que vira real",
        TropeCategory::Romance,
    ),
    (
        "Grumpy x Sunshine",
        "Mal-humorado com pessoa radiante",
        TropeCategory::Romance,
    ),
    (
        "Forced Proximity",
        "Obrigados a conviver juntos — tipo viagem ou confinamento",
        TropeCategory::Romance,
    ),
    (
        "Only One Bed",
        "Só tem uma cama! e agora?...",
        TropeCategory::Romance,
    ),
    ("Love Triangle", "Triângulo amoroso", TropeCategory::Romance),
    (
        "Second Chance Romance",
        "Reconciliação com ex ou amor antigo",
        TropeCategory::Romance,
    ),
    (
        "Slow Burn",
        "Relacionamento que demora a acontecer",
        TropeCategory::Romance,
    ),
    (
        "Forbidden Love",
        "Amor proibido — por regras, família, sociedade etc.",
        TropeCategory::Romance,
    ),
    (
        "Childhood Friends",
        "Amizade de infância que vira romance",
        TropeCategory::Romance,
    ),
    (
        "Marriage of Convenience",
        "Casamento por contrato ou interesse",
        TropeCategory::Romance,
    ),
    ("Soulmates", "Almas gêmeas ou destino", TropeCategory::Romance),
    (
        "Age Gap",
        "Diferença de idade considerável",
        TropeCategory::Romance,
    ),
    (
        "Workplace Romance",
        "Romance no trabalho",
        TropeCategory::Romance,
    ),
    (
        "Opposites Attract",
        "Personalidades opostas se atraem",
        TropeCategory::Romance,
    ),
    (
        "Mutual Pining",
        "Ambos apaixonados, mas sem saber do outro",
        TropeCategory::Romance,
    ),
    (
        "Chosen One",
        "O escolhido pra salvar o mundo",
        TropeCategory::SciFiFantasy,
    ),
    (
        "Found Family",
        "Grupo que vira uma família real, mesmo sem laços de sangue",
        TropeCategory::SciFiFantasy,
    ),
    (
        "Dystopian Society",
        "Sociedade distópica/controladora",
        TropeCategory::SciFiFantasy,
    ),
    ("Time Travel", "Viagem no tempo", TropeCategory::SciFiFantasy),
    (
        "Parallel Worlds",
        "Mundos paralelos ou alternativos",
        TropeCategory::SciFiFantasy,
    ),
    (
        "Post-Apocalyptic Survival",
        "Sobrevivência após o fim do mundo",
        TropeCategory::SciFiFantasy,
    ),
    (
        "Space Romance",
        "Amor entre as estrelas, literalmente",
        TropeCategory::SciFiFantasy,
    ),
    (
        "Superpowered Romance",
        "Um ou ambos com poderes",
        TropeCategory::SciFiFantasy,
    ),
    (
        "Artificial Intelligence Love",
        "Romance com IA/androides",
        TropeCategory::SciFiFantasy,
    ),
    (
        "Royal x Rebel",
        "Membro da realeza se apaixona por alguém do povo ou rebelde",
        TropeCategory::SciFiFantasy,
    ),
    (
        "Unreliable Narrator",
        "Narrador que mente ou distorce a história",
        TropeCategory::Drama,
    ),
    (
        "Dual Timeline",
        "Duas linhas temporais entrelaçadas",
        TropeCategory::Drama,
    ),
    ("Revenge Plot", "Trama de vingança", TropeCategory::Drama),
    (
        "Mystery Lover",
        "Um dos dois tem um segredo perigoso",
        TropeCategory::Drama,
    ),
    (
        "Coming of Age",
        "Amadurecimento e descobertas da juventude",
        TropeCategory::Drama,
    ),
    (
        "Redemption Arc",
        "Personagem busca redenção",
        TropeCategory::Drama,
    ),
    (
        "Whodunnit",
        "Quem é o culpado? estilo mistério",
        TropeCategory::Drama,
    ),
];

/// A user's resolved preference rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesView {
    pub liked_tropes: Vec<Trope>,
    pub disliked_tropes: Vec<Trope>,
    pub liked_categories: Vec<String>,
    pub disliked_categories: Vec<String>,
    pub liked_authors: Vec<String>,
    pub disliked_authors: Vec<String>,
    pub languages: Vec<Language>,
}

pub struct PreferenceService {
    users: Arc<dyn UserRepository>,
    tropes: Arc<dyn TropeRepository>,
    authors: Arc<dyn AuthorRepository>,
    categories: Arc<dyn CategoryRepository>,
    languages: Arc<dyn LanguageRepository>,
}

impl PreferenceService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tropes: Arc<dyn TropeRepository>,
        authors: Arc<dyn AuthorRepository>,
        categories: Arc<dyn CategoryRepository>,
        languages: Arc<dyn LanguageRepository>,
    ) -> Self {
        Self {
            users,
            tropes,
            authors,
            categories,
            languages,
        }
    }

    /// Upsert the built-in trope rows. Idempotent across restarts.
    pub async fn seed_tropes(&self) -> Result<()> {
        for (name, description, category) in TROPE_SEED {
            self.tropes.upsert_by_name(name, description, category).await?;
        }
        info!("Seeded {} tropes", TROPE_SEED.len());
        Ok(())
    }

    pub async fn list_tropes(&self) -> Result<Vec<Trope>> {
        self.tropes.list_all().await
    }

    pub async fn mark_trope_favorite(&self, identity: &Identity, trope_id: &str) -> Result<()> {
        self.tropes
            .find_by_id(trope_id)
            .await?
            .ok_or(DomainError::TropeNotFound)?;

        let mut user = ensure_user(&self.users, identity).await?;
        if !user.favorite_tropes.iter().any(|id| id == trope_id) {
            user.favorite_tropes.push(trope_id.to_string());
            user.updated_at = chrono::Utc::now();
            self.users.update(user).await?;
        }

        Ok(())
    }

    pub async fn preferences(&self, identity: &Identity) -> Result<PreferencesView> {
        let user = self
            .users
            .find_by_id(&identity.user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let liked_tropes = self.tropes.find_by_ids(&user.liked_tropes).await?;
        let disliked_tropes = self.tropes.find_by_ids(&user.disliked_tropes).await?;

        let mut languages = Vec::with_capacity(user.languages.len());
        for code in &user.languages {
            let language = match self.languages.find_by_code(code).await? {
                Some(language) => language,
                None => Language {
                    code: code.clone(),
                    name: code.clone(),
                },
            };
            languages.push(language);
        }

        Ok(PreferencesView {
            liked_tropes,
            disliked_tropes,
            liked_categories: user.liked_categories,
            disliked_categories: user.disliked_categories,
            liked_authors: user.liked_authors,
            disliked_authors: user.disliked_authors,
            languages,
        })
    }

    /// Replace the caller's trope preferences. Unknown ids are dropped.
    pub async fn update_tropes(
        &self,
        identity: &Identity,
        liked: Vec<String>,
        disliked: Vec<String>,
    ) -> Result<()> {
        let liked = self.known_trope_ids(liked).await?;
        let disliked = self.known_trope_ids(disliked).await?;

        let mut user = ensure_user(&self.users, identity).await?;
        user.liked_tropes = liked;
        user.disliked_tropes = disliked;
        user.updated_at = chrono::Utc::now();
        self.users.update(user).await?;
        Ok(())
    }

    /// Replace the caller's category preferences, registering any new
    /// category names along the way.
    pub async fn update_categories(
        &self,
        identity: &Identity,
        liked: Vec<String>,
        disliked: Vec<String>,
    ) -> Result<()> {
        for name in liked.iter().chain(disliked.iter()) {
            self.categories.upsert_by_name(name).await?;
        }

        let mut user = ensure_user(&self.users, identity).await?;
        user.liked_categories = liked;
        user.disliked_categories = disliked;
        user.updated_at = chrono::Utc::now();
        self.users.update(user).await?;
        Ok(())
    }

    /// Replace the caller's author preferences, registering any new
    /// author names along the way.
    pub async fn update_authors(
        &self,
        identity: &Identity,
        liked: Vec<String>,
        disliked: Vec<String>,
    ) -> Result<()> {
        for name in liked.iter().chain(disliked.iter()) {
            self.authors.upsert_by_name(name).await?;
        }

        let mut user = ensure_user(&self.users, identity).await?;
        user.liked_authors = liked;
        user.disliked_authors = disliked;
        user.updated_at = chrono::Utc::now();
        self.users.update(user).await?;
        Ok(())
    }

    /// Replace the caller's reading languages.
    pub async fn update_languages(&self, identity: &Identity, codes: Vec<String>) -> Result<()> {
        for code in &codes {
            self.languages.upsert(code, &language_name(code)).await?;
        }

        let mut user = ensure_user(&self.users, identity).await?;
        user.languages = codes;
        user.updated_at = chrono::Utc::now();
        self.users.update(user).await?;
        Ok(())
    }

    pub async fn search_authors(&self, query: &str) -> Result<Vec<Author>> {
        self.authors.search(query, AUTHOR_SEARCH_LIMIT).await
    }

    async fn known_trope_ids(&self, ids: Vec<String>) -> Result<Vec<String>> {
        let known = self.tropes.find_by_ids(&ids).await?;
        Ok(known.into_iter().map(|t| t.id).collect())
    }
}

fn language_name(code: &str) -> String {
    match code {
        "pt" => "Português".to_string(),
        "en" => "Inglês".to_string(),
        other => other.to_string(),
    }
}

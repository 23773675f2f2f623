use crate::auth::Identity;
use crate::error::{DomainError, Result};
use crate::genai::TextModel;
use crate::models::{Book, Rating, User, UserSettings};
use crate::repository::{
    BookRepository, LanguageRepository, RatingRepository, SettingsRepository, TropeRepository,
    UserRepository,
};
use catalog::{normalize_book, CatalogGateway};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::warn;

/// How many recent ratings feed the prompt.
const HISTORY_WINDOW: usize = 20;

const CHAT_FALLBACK: &str = "I'm sorry, I'm having trouble generating recommendations right now. Please try again in a few minutes.";

/// A recommendation as returned to the caller: the model's suggestion,
/// opportunistically enriched with catalog data when a matching volume
/// is found.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    pub description: String,
    pub volume_id: Option<String>,
    pub cover_url: Option<String>,
}

/// The shape we try to parse out of the model's free text. Every field
/// defaults: the model owes us nothing structurally.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RecommendationSeed {
    title: String,
    author: String,
    description: String,
}

impl Default for RecommendationSeed {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            description: String::new(),
        }
    }
}

struct RatedBook {
    title: String,
    author: String,
    rating: u8,
}

pub struct RecommendationService {
    users: Arc<dyn UserRepository>,
    books: Arc<dyn BookRepository>,
    ratings: Arc<dyn RatingRepository>,
    tropes: Arc<dyn TropeRepository>,
    languages: Arc<dyn LanguageRepository>,
    settings: Arc<dyn SettingsRepository>,
    gateway: Arc<CatalogGateway>,
    model: Arc<dyn TextModel>,
}

impl RecommendationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        books: Arc<dyn BookRepository>,
        ratings: Arc<dyn RatingRepository>,
        tropes: Arc<dyn TropeRepository>,
        languages: Arc<dyn LanguageRepository>,
        settings: Arc<dyn SettingsRepository>,
        gateway: Arc<CatalogGateway>,
        model: Arc<dyn TextModel>,
    ) -> Self {
        Self {
            users,
            books,
            ratings,
            tropes,
            languages,
            settings,
            gateway,
            model,
        }
    }

    pub async fn settings(&self, identity: &Identity) -> Result<UserSettings> {
        match self.settings.find(&identity.user_id).await? {
            Some(settings) => Ok(settings),
            None => {
                self.settings
                    .put(UserSettings::default_for(identity.user_id.clone()))
                    .await
            }
        }
    }

    pub async fn update_settings(&self, identity: &Identity, enabled: bool) -> Result<UserSettings> {
        self.settings
            .put(UserSettings {
                user_id: identity.user_id.clone(),
                automated_recommendations_enabled: enabled,
            })
            .await
    }

    /// Generate recommendations from the user's preference rows and
    /// rating history. Returns an empty list when the feature is
    /// disabled or there is no signal to work from.
    pub async fn automated(&self, identity: &Identity) -> Result<Vec<Recommendation>> {
        let user = self
            .users
            .find_by_id(&identity.user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let settings = self.settings(identity).await?;
        if !settings.automated_recommendations_enabled {
            return Ok(Vec::new());
        }

        let history = self.rated_books(&user.id).await?;
        if history.is_empty() && !user.has_preferences() {
            return Ok(Vec::new());
        }

        let prompt = self.automated_prompt(&user, &history).await?;
        let text = self
            .model
            .generate(&prompt)
            .await
            .map_err(|e| DomainError::TextModel(e.to_string()))?;

        let seeds = parse_recommendations(&text)?;
        Ok(self.enrich(seeds).await)
    }

    /// Free-form chat recommendation. Model failures degrade to a fixed
    /// apology, not an error, so the conversation surface never breaks.
    pub async fn chat(&self, identity: &Identity, message: &str) -> Result<String> {
        let user = self
            .users
            .find_by_id(&identity.user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let history = self.rated_books(&user.id).await?;
        let reading_list = self.books.find_many(&user.reading_list).await?;
        let prompt = self
            .chat_prompt(&user, &history, &reading_list, message)
            .await?;

        match self.model.generate(&prompt).await {
            Ok(text) => Ok(text),
            Err(err) => {
                warn!("chat recommendation degraded to fallback: {err}");
                Ok(CHAT_FALLBACK.to_string())
            }
        }
    }

    async fn rated_books(&self, user_id: &str) -> Result<Vec<RatedBook>> {
        let ratings: Vec<Rating> = self
            .ratings
            .list_by_user(user_id)
            .await?
            .into_iter()
            .take(HISTORY_WINDOW)
            .collect();

        let mut rated = Vec::with_capacity(ratings.len());
        for rating in ratings {
            if let Some(book) = self.books.find_by_volume_id(&rating.volume_id).await? {
                rated.push(RatedBook {
                    title: book.title,
                    author: book.author,
                    rating: rating.rating,
                });
            }
        }
        Ok(rated)
    }

    /// Shared prompt section describing the user's preferences and
    /// rating history.
    async fn preferences_text(&self, user: &User, history: &[RatedBook]) -> Result<String> {
        let mut text = String::new();

        if user.languages.is_empty() {
            text.push_str(
                "The user hasn't specified language preferences. Please recommend books in Portuguese or English.\n",
            );
        } else {
            let mut names = Vec::with_capacity(user.languages.len());
            for code in &user.languages {
                let name = self
                    .languages
                    .find_by_code(code)
                    .await?
                    .map(|l| l.name)
                    .unwrap_or_else(|| code.clone());
                names.push(name);
            }
            let _ = writeln!(
                text,
                "The user reads books in the following languages: {}. ONLY recommend books in these languages.",
                names.join(", ")
            );
        }

        let liked_tropes = self.tropes.find_by_ids(&user.liked_tropes).await?;
        if !liked_tropes.is_empty() {
            let names: Vec<String> = liked_tropes.into_iter().map(|t| t.name).collect();
            let _ = writeln!(text, "Tropes the user likes: {}", names.join(", "));
        }

        let disliked_tropes = self.tropes.find_by_ids(&user.disliked_tropes).await?;
        if !disliked_tropes.is_empty() {
            let names: Vec<String> = disliked_tropes.into_iter().map(|t| t.name).collect();
            let _ = writeln!(text, "Tropes the user dislikes: {}", names.join(", "));
        }

        if !user.liked_categories.is_empty() {
            let _ = writeln!(
                text,
                "Categories the user likes: {}",
                user.liked_categories.join(", ")
            );
        }
        if !user.disliked_categories.is_empty() {
            let _ = writeln!(
                text,
                "Categories the user dislikes: {}",
                user.disliked_categories.join(", ")
            );
        }
        if !user.liked_authors.is_empty() {
            let _ = writeln!(
                text,
                "Authors the user likes: {}",
                user.liked_authors.join(", ")
            );
        }
        if !user.disliked_authors.is_empty() {
            let _ = writeln!(
                text,
                "Authors the user dislikes: {}",
                user.disliked_authors.join(", ")
            );
        }

        if !history.is_empty() {
            text.push_str("\nBooks the user has rated:\n");
            for book in history {
                let _ = writeln!(
                    text,
                    "- \"{}\" by {} - Rated {}/5",
                    book.title, book.author, book.rating
                );
            }
        }

        Ok(text)
    }

    async fn automated_prompt(&self, user: &User, history: &[RatedBook]) -> Result<String> {
        let mut prompt = String::from(
            "Based on the following user preferences and reading history, recommend 5 books:\n\n",
        );
        prompt.push_str(&self.preferences_text(user, history).await?);
        prompt.push_str(
            "\nPlease recommend books that match the user's preferences. For each book, provide the title, author, and a brief description. Format your response as a JSON array with objects containing title, author, and description properties.",
        );
        Ok(prompt)
    }

    async fn chat_prompt(
        &self,
        user: &User,
        history: &[RatedBook],
        reading_list: &[Book],
        message: &str,
    ) -> Result<String> {
        let mut preferences = String::from("USER PREFERENCES:\n");
        preferences.push_str(&self.preferences_text(user, history).await?);

        let mut reading_list_text = String::new();
        if !reading_list.is_empty() {
            reading_list_text.push_str("\nREADING LIST (to be read):\n");
            for (index, book) in reading_list.iter().enumerate() {
                let _ = writeln!(
                    reading_list_text,
                    "{}. \"{}\" by {}",
                    index + 1,
                    book.title,
                    book.author
                );
            }
        }

        Ok(format!(
            "As an AI book recommendation assistant, please respond to the following request from a user:\n\n\
\"{message}\"\n\n\
{preferences}\n\
{reading_list_text}\n\
Please make use of the user's preferences when they ask for personalized recommendations.\n\n\
For each recommendation, include:\n\
1. Title and author\n\
2. Brief description\n\
3. If they're asking specifically about their \"to be read\" list or which book to read first, explain why they should read it based on their preferences.\n\
   Otherwise, explain why you're recommending it based on their request and preferences.\n\n\
IMPORTANT: For each book you recommend, include a link format exactly like this example: [Book Title](/books/VOLUME_ID)\n\
If you can't find the exact volume id, just use the book title as an identifier.\n\n\
Format each recommendation with clear headings and keep your overall response friendly and helpful. And please always try to match the language of the user's request. The default language of the site is portuguese."
        ))
    }

    /// Look each suggestion up in the catalog and graft on the volume
    /// id, cover and normalized description of the first hit. Misses
    /// leave the suggestion as the model produced it.
    async fn enrich(&self, seeds: Vec<RecommendationSeed>) -> Vec<Recommendation> {
        let lookups = seeds.into_iter().map(|seed| {
            let gateway = self.gateway.clone();
            async move {
                let query = format!("intitle:\"{}\" inauthor:\"{}\"", seed.title, seed.author);
                let response = gateway.search(&query, 0, 1).await;

                match response.items.first() {
                    Some(volume) => {
                        let record = normalize_book(volume);
                        Recommendation {
                            title: seed.title,
                            author: seed.author,
                            description: record.description,
                            volume_id: Some(record.volume_id),
                            cover_url: record.cover_url,
                        }
                    }
                    None => Recommendation {
                        title: seed.title,
                        author: seed.author,
                        description: seed.description,
                        volume_id: None,
                        cover_url: None,
                    },
                }
            }
        });

        join_all(lookups).await
    }
}

/// Best-effort extraction of a JSON array from model output: direct
/// parse first, then the first bracket-balanced slice with newlines
/// flattened and trailing commas dropped.
fn parse_recommendations(text: &str) -> Result<Vec<RecommendationSeed>> {
    let trimmed = text.trim();

    if let Ok(seeds) = serde_json::from_str::<Vec<RecommendationSeed>>(trimmed) {
        return Ok(seeds);
    }

    let slice = extract_json_array(trimmed).ok_or(DomainError::RecommendationParse)?;
    let cleaned = strip_trailing_commas(&slice.replace('\n', " "));

    serde_json::from_str::<Vec<RecommendationSeed>>(&cleaned)
        .map_err(|_| DomainError::RecommendationParse)
}

/// First bracket-balanced `[...]` slice of the text, if any.
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;

    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Drop commas that directly precede a closing bracket or brace.
fn strip_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == ']' || chars[j] == '}') {
                i += 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

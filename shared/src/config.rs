use tracing::warn;

/// Process configuration, loaded once at startup from the environment.
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub data_dir: String,
    pub allowed_origins: Vec<String>,
    pub books_api_url: String,
    pub books_api_key: Option<String>,
    pub identity_url: String,
    pub genai_api_url: String,
    pub genai_api_key: String,
    pub catalog_cache_ttl_secs: u64,
    pub catalog_cache_capacity: u64,
}

impl Config {
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_BOOKS_API_URL: &str = "https://www.googleapis.com/books/v1/volumes";
    const DEFAULT_GENAI_API_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
    const DEFAULT_IDENTITY_URL: &str = "http://localhost:9099/verify";

    pub fn from_env() -> Self {
        let host = std::env::var("READSHELF_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = std::env::var("READSHELF_HTTP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .unwrap_or(3000);

        Self {
            host,
            http_port,
            data_dir: std::env::var("READSHELF_DATA_DIR")
                .unwrap_or_else(|_| Self::DEFAULT_DATA_DIR.to_string()),
            allowed_origins: std::env::var("READSHELF_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            books_api_url: std::env::var("READSHELF_BOOKS_API_URL")
                .unwrap_or_else(|_| Self::DEFAULT_BOOKS_API_URL.to_string()),
            books_api_key: std::env::var("READSHELF_BOOKS_API_KEY").ok(),
            identity_url: std::env::var("READSHELF_IDENTITY_URL").unwrap_or_else(|_| {
                warn!("READSHELF_IDENTITY_URL not set, using local default");
                Self::DEFAULT_IDENTITY_URL.to_string()
            }),
            genai_api_url: std::env::var("READSHELF_GENAI_API_URL")
                .unwrap_or_else(|_| Self::DEFAULT_GENAI_API_URL.to_string()),
            genai_api_key: std::env::var("READSHELF_GENAI_API_KEY").unwrap_or_else(|_| {
                warn!("READSHELF_GENAI_API_KEY not set, recommendation calls will be rejected upstream");
                String::new()
            }),
            catalog_cache_ttl_secs: std::env::var("READSHELF_CATALOG_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse::<u64>()
                .unwrap_or(3600),
            catalog_cache_capacity: std::env::var("READSHELF_CATALOG_CACHE_CAPACITY")
                .unwrap_or_else(|_| "10000".to_string())
                .parse::<u64>()
                .unwrap_or(10_000),
        }
    }
}

// Generative-text port. The model is an opaque completion function: a
// prompt goes in, free text comes out with no structural guarantee, so
// callers parse defensively.

pub mod http;

pub use http::GenerativeHttpModel;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model returned status {0}")]
    Status(u16),

    #[error("model response had no text")]
    EmptyResponse,

    #[error("http client build failed: {0}")]
    Client(String),
}

#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenAiError>;
}

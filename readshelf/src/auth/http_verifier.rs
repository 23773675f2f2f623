use super::{Identity, TokenVerifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    user_id: String,
    email: Option<String>,
    username: Option<String>,
}

/// Resolves bearer tokens against the identity provider's verification
/// endpoint. Any transport, status or decoding failure collapses to
/// `None` so callers can treat the whole provider as a black box.
pub struct HttpTokenVerifier {
    client: Client,
    verify_url: String,
}

impl HttpTokenVerifier {
    pub fn new(verify_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            verify_url: verify_url.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Option<Identity> {
        let response = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let body: VerifyResponse = response.json().await.ok()?;

        Some(Identity {
            user_id: body.user_id,
            email: body.email,
            username: body.username,
        })
    }
}

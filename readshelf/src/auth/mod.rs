// Delegated identity. Token issuance and verification belong to an
// external provider; this module only defines the verified-identity
// shape and the port the HTTP layer resolves bearer tokens through.

pub mod http_verifier;

pub use http_verifier::HttpTokenVerifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A verified caller identity as reported by the external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Token verification port. Verification never errors: anything short of
/// a confirmed identity is `None`.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<Identity>;
}

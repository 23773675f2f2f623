use crate::models::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Extract the bearer token from an Authorization header value
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    // Authorization: Bearer <token>
    let mut parts = auth_header.split_whitespace();

    if parts.next()? != "Bearer" {
        return None;
    }

    let token = parts.next()?;
    if token.is_empty() || parts.next().is_some() {
        return None;
    }

    Some(token)
}

/// Authentication middleware: resolves the bearer token through the
/// identity provider and attaches the verified identity to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    let token = match token {
        Some(token) => token,
        None => return Err(unauthorized()),
    };

    let identity = match state.verifier.verify(token).await {
        Some(identity) => identity,
        None => return Err(unauthorized()),
    };

    // Attach identity to request extensions
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized: Authentication required")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token("Bearer abc.def.ghi"),
            Some("abc.def.ghi")
        );

        // Wrong scheme or shape
        assert!(extract_bearer_token("Basic dXNlcjpwYXNz").is_none());
        assert!(extract_bearer_token("Bearer").is_none());
        assert!(extract_bearer_token("Bearer one two").is_none());
        assert!(extract_bearer_token("").is_none());
    }
}

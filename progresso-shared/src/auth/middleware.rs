//! Session authentication for Axum
//!
//! Reads the session token from `Authorization: Bearer <token>` or, failing
//! that, the `progresso.session-token` cookie and validates it into a
//! [`SessionUser`], which the API's session layer inserts into the request
//! extensions.
//!
//! # Example
//!
//! ```
//! use axum::http::HeaderMap;
//! use progresso_shared::auth::middleware::{authenticate_request, AuthError};
//!
//! let headers = HeaderMap::new();
//! let result = authenticate_request(&headers, "a-session-secret-of-at-least-32-bytes");
//! assert!(matches!(result, Err(AuthError::MissingSession)));
//! ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::session::{validate_session_token, SessionClaims, SessionError, SESSION_COOKIE_NAME};

/// The authenticated user of the current request
///
/// Taken from the session token alone; the store is not consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User ID
    pub id: Uuid,

    /// Login name
    pub username: String,

    /// Display name
    pub name: String,
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            name: claims.name,
        }
    }
}

/// Error type for session authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Neither a bearer token nor a session cookie was sent
    #[error("Missing session")]
    MissingSession,

    /// Token failed validation
    #[error("Invalid session: {0}")]
    InvalidSession(#[from] SessionError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::MissingSession => "Authentication required".to_string(),
            AuthError::InvalidSession(SessionError::Expired) => "Session expired".to_string(),
            AuthError::InvalidSession(_) => "Invalid session".to_string(),
        };

        let body = json!({
            "error": "unauthorized",
            "message": message,
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Extracts the raw session token from request headers
///
/// A bearer token wins over the cookie.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Validates the session carried by `headers` and returns its claims
pub fn session_claims(headers: &HeaderMap, secret: &str) -> Result<SessionClaims, AuthError> {
    let token = extract_session_token(headers).ok_or(AuthError::MissingSession)?;

    Ok(validate_session_token(&token, secret)?)
}

/// Validates the session carried by `headers`
pub fn authenticate_request(headers: &HeaderMap, secret: &str) -> Result<SessionUser, AuthError> {
    session_claims(headers, secret).map(SessionUser::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn token_for(username: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let claims = SessionClaims::new(id, username, Duration::hours(1));
        (id, create_session_token(&claims, SECRET).unwrap())
    }

    #[test]
    fn test_bearer_token() {
        let (id, token) = token_for("alice");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let user = authenticate_request(&headers, SECRET).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "alice");
        assert_eq!(user.name, "alice");
    }

    #[test]
    fn test_cookie_token() {
        let (id, token) = token_for("bob");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE_NAME, token)).unwrap(),
        );

        let user = authenticate_request(&headers, SECRET).unwrap();
        assert_eq!(user.id, id);
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let (bearer_id, bearer) = token_for("alice");
        let (_, cookie) = token_for("bob");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer)).unwrap(),
        );
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE_NAME, cookie)).unwrap(),
        );

        assert_eq!(authenticate_request(&headers, SECRET).unwrap().id, bearer_id);
    }

    #[test]
    fn test_missing_and_invalid() {
        let headers = HeaderMap::new();
        assert!(matches!(
            authenticate_request(&headers, SECRET),
            Err(AuthError::MissingSession)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            authenticate_request(&headers, SECRET),
            Err(AuthError::MissingSession)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(matches!(
            authenticate_request(&headers, SECRET),
            Err(AuthError::InvalidSession(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingSession.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidSession(SessionError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

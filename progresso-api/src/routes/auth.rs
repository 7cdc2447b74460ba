//! Authentication endpoints
//!
//! - `POST /api/auth/login` - verify or provision the user, issue a session
//! - `POST /api/auth/logout` - clear the session cookie
//! - `GET /api/auth/session` - the decoded session

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use progresso_shared::auth::{
    authenticator::{authenticate, AuthnError, Credentials},
    middleware::SessionUser,
    session::{create_session_token, SessionClaims, SESSION_COOKIE_NAME},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,

    /// Plaintext password
    pub password: String,
}

/// Session payload returned by login and the session endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Authenticated user
    pub user: SessionUser,

    /// Signed session token, also set as a cookie (login only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// When the session stops being valid
    pub expires_at: DateTime<Utc>,
}

fn session_cookie(token: String, max_age_hours: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::hours(max_age_hours))
        .build()
}

/// Login endpoint
///
/// The first login for a username creates the account.
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "username": "alice", "password": "secret1" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user": { "id": "uuid", "username": "alice", "name": "alice" },
///   "token": "eyJ...",
///   "expiresAt": "2025-12-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: any failure, always with message "Invalid credentials",
///   including a body that is not a login request
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<SessionResponse>)> {
    let Json(req) = body.map_err(|rejection| {
        tracing::info!(reason = %rejection.body_text(), "Login rejected");
        ApiError::Unauthorized("Invalid credentials".to_string())
    })?;

    let credentials = Credentials {
        username: req.username,
        password: req.password,
    };

    let identity = authenticate(&state.db, &credentials).await.map_err(|e| {
        match &e {
            AuthnError::Store(_) | AuthnError::Password(_) => {
                tracing::error!(username = %credentials.username, error = %e, "Login failed");
            }
            AuthnError::Validation(_) | AuthnError::InvalidCredentials => {
                tracing::info!(username = %credentials.username, reason = %e, "Login rejected");
            }
        }
        ApiError::from(e)
    })?;

    let session = &state.config.session;
    let claims = SessionClaims::new(identity.id, &identity.username, session.ttl());
    let token = create_session_token(&claims, &session.secret)?;

    tracing::info!(user_id = %identity.id, "Session issued");

    let cookie = session_cookie(token.clone(), session.ttl_hours, state.config.api.production);

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            expires_at: claims.expires_at(),
            user: SessionUser::from(claims),
            token: Some(token),
        }),
    ))
}

/// Logout endpoint
///
/// Sessions are stateless, so this only expires the cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let mut cookie = session_cookie(String::new(), 0, state.config.api.production);
    cookie.make_removal();

    (jar.add(cookie), Json(json!({ "success": true })))
}

/// Session endpoint
///
/// Returns the identity decoded from the caller's token.
pub async fn session(Extension(claims): Extension<SessionClaims>) -> Json<SessionResponse> {
    Json(SessionResponse {
        expires_at: claims.expires_at(),
        user: SessionUser::from(claims),
        token: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), 720, false);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("progresso.session-token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=2592000"));
        assert!(!rendered.contains("Secure"));

        assert!(session_cookie("abc".to_string(), 1, true).to_string().contains("Secure"));
    }

    #[test]
    fn test_login_response_shape() {
        let claims = SessionClaims::new(uuid::Uuid::new_v4(), "alice", chrono::Duration::hours(1));
        let response = SessionResponse {
            expires_at: claims.expires_at(),
            user: SessionUser::from(claims),
            token: Some("t".to_string()),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user"]["username"], "alice");
        assert_eq!(json["user"]["name"], "alice");
        assert_eq!(json["token"], "t");
        assert!(json["expiresAt"].is_string());
    }
}

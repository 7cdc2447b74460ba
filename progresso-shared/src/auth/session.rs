//! Session tokens
//!
//! A session is an HS256-signed JWT carrying the authenticated identity. The
//! server keeps no session state: every protected request is authorized from
//! the token alone.
//!
//! # Claims
//!
//! - `sub`: user ID
//! - `username`: login name
//! - `name`: display name (mirrors `username`)
//! - `iss`: always `progresso`
//! - `iat` / `nbf` / `exp`: Unix timestamps
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use progresso_shared::auth::session::{create_session_token, validate_session_token, SessionClaims};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let secret = "a-session-secret-of-at-least-32-bytes";
//! let user_id = Uuid::new_v4();
//!
//! let claims = SessionClaims::new(user_id, "alice", Duration::hours(1));
//! let token = create_session_token(&claims, secret)?;
//!
//! let validated = validate_session_token(&token, secret)?;
//! assert_eq!(validated.sub, user_id);
//! assert_eq!(validated.name, "alice");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every session token
pub const SESSION_ISSUER: &str = "progresso";

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "progresso.session-token";

/// Default session lifetime (30 days)
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 720;

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to sign token
    #[error("Failed to create session token: {0}")]
    CreateError(String),

    /// Signature, issuer or shape is wrong
    #[error("Invalid session token: {0}")]
    Invalid(String),

    /// Token has expired
    #[error("Session has expired")]
    Expired,
}

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Login name
    pub username: String,

    /// Display name
    pub name: String,

    /// Issuer - always "progresso"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Creates claims for `user_id` valid for `ttl` from now
    pub fn new(user_id: Uuid, username: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + ttl;

        Self {
            sub: user_id,
            username: username.to_string(),
            name: username.to_string(),
            iss: SESSION_ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Checks if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Expiration as a UTC timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Signs session claims into a token string
pub fn create_session_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| SessionError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a session token and returns its claims
///
/// Checks signature, issuer, expiry and not-before.
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid(e.to_string()),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_mirror_username_into_name() {
        let user_id = Uuid::new_v4();
        let claims = SessionClaims::new(user_id, "alice", Duration::hours(1));

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.iss, SESSION_ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate() {
        let claims = SessionClaims::new(Uuid::new_v4(), "bob", Duration::hours(720));
        let token = create_session_token(&claims, SECRET).expect("Should create token");

        let validated = validate_session_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated, claims);
        assert_eq!(validated.expires_at().timestamp(), claims.exp);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let claims = SessionClaims::new(Uuid::new_v4(), "bob", Duration::hours(1));
        let token = create_session_token(&claims, SECRET).unwrap();

        let result = validate_session_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_expired_session() {
        let claims = SessionClaims::new(Uuid::new_v4(), "bob", Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_session_token(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_session_token(&token, SECRET),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let mut claims = SessionClaims::new(Uuid::new_v4(), "bob", Duration::hours(1));
        claims.iss = "someone-else".to_string();
        let token = create_session_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_session_token(&token, SECRET),
            Err(SessionError::Invalid(_))
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            validate_session_token("not.a.jwt", SECRET),
            Err(SessionError::Invalid(_))
        ));
    }
}

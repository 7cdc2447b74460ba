//! Credentials login with get-or-create semantics
//!
//! The first login for an unknown username provisions the account; later
//! logins must present the same password. Concurrent first logins for one
//! username are resolved by the store's unique constraint, and the loser is
//! verified against the winning row.
//!
//! The flow is generic over [`CredentialStore`], implemented for [`PgPool`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::password::{hash_password, verify_password, PasswordError};
use crate::models::user::{CreateUser, User};

/// Login input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    /// Login name
    #[validate(length(min = 3, max = 64, message = "Username must be 3 to 64 characters"))]
    pub username: String,

    /// Plaintext password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID
    pub id: Uuid,

    /// Login name
    pub username: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Reasons a login attempt produced no identity
#[derive(Debug, thiserror::Error)]
pub enum AuthnError {
    /// Username or password has the wrong shape
    #[error("Invalid credentials shape: {0}")]
    Validation(#[from] ValidationErrors),

    /// Password does not match the stored hash
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Credential store failed
    #[error("Credential store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Hashing or verification failed
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Persistence needed by [`authenticate`]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a user by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    /// Inserts a user; returns `None` if the username is already taken
    async fn insert_if_absent(&self, data: CreateUser) -> Result<Option<User>, sqlx::Error>;
}

#[async_trait]
impl CredentialStore for PgPool {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        User::find_by_username(self, username).await
    }

    async fn insert_if_absent(&self, data: CreateUser) -> Result<Option<User>, sqlx::Error> {
        User::create_if_absent(self, data).await
    }
}

fn verify_against(user: &User, password: &str) -> Result<Identity, AuthnError> {
    if verify_password(password, &user.password_hash)? {
        Ok(Identity::from(user))
    } else {
        Err(AuthnError::InvalidCredentials)
    }
}

/// Verifies or provisions the user behind `credentials`
///
/// Never creates a second user for a username.
pub async fn authenticate<S>(store: &S, credentials: &Credentials) -> Result<Identity, AuthnError>
where
    S: CredentialStore + ?Sized,
{
    credentials.validate()?;

    if let Some(user) = store.find_by_username(&credentials.username).await? {
        return verify_against(&user, &credentials.password);
    }

    let password_hash = hash_password(&credentials.password)?;
    let created = store
        .insert_if_absent(CreateUser {
            username: credentials.username.clone(),
            password_hash,
        })
        .await?;

    match created {
        Some(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "Provisioned user on first login");
            Ok(Identity::from(&user))
        }
        None => {
            // Lost a race against a concurrent first login
            tracing::debug!(username = %credentials.username, "Username claimed concurrently, verifying against winner");
            let user = store
                .find_by_username(&credentials.username)
                .await?
                .ok_or(AuthnError::InvalidCredentials)?;
            verify_against(&user, &credentials.password)
        }
    }
}

//! Authentication utilities
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing
//! - [`session`]: signed session tokens
//! - [`authenticator`]: get-or-create credentials login
//! - [`middleware`]: request authentication for Axum
//!
//! # Example
//!
//! ```no_run
//! use chrono::Duration;
//! use progresso_shared::auth::authenticator::{authenticate, Credentials};
//! use progresso_shared::auth::session::{create_session_token, SessionClaims};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials {
//!     username: "alice".to_string(),
//!     password: "secret1".to_string(),
//! };
//! let identity = authenticate(&pool, &credentials).await?;
//!
//! let claims = SessionClaims::new(identity.id, &identity.username, Duration::hours(720));
//! let token = create_session_token(&claims, "a-session-secret-of-at-least-32-bytes")?;
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod middleware;
pub mod password;
pub mod session;

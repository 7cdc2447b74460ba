//! Current user endpoint
//!
//! ```text
//! GET /api/user
//! ```
//!
//! ```json
//! { "id": "uuid", "username": "alice" }
//! ```

use axum::{Extension, Json};
use progresso_shared::{auth::middleware::SessionUser, models::user::UserSummary};

/// Returns the user behind the current session
///
/// Read from the token; the database is not consulted.
pub async fn current_user(Extension(user): Extension<SessionUser>) -> Json<UserSummary> {
    Json(UserSummary {
        id: user.id,
        username: user.username,
    })
}

use serde::{Deserialize, Serialize};

/// Authenticated user context extracted from the JWT by the auth
/// middleware and read by handlers from request extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

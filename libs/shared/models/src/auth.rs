use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Authenticated principal extracted from a validated bearer token.
/// Carries what the token asserts; the user directory remains the source
/// of truth for role payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Token subjects are user ids; a non-UUID subject never matches a
    /// stored record.
    pub fn user_id(&self) -> Option<Uuid> {
        self.id.parse().ok()
    }
}

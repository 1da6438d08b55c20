use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use bookstore_auth::Role;
use bookstore_db::Document;

/// Stored user record.
///
/// Deliberately not `Serialize`: the password hash must never reach a
/// response body, so the whole record stays off the wire.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
}

impl Document for User {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Registration request body. Fields default to empty so that missing and
/// blank inputs surface as validation errors rather than body-parse failures.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

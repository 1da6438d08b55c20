use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::role::Role;

/// Claims carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub role: Role,
    /// Expiry as a unix timestamp.
    pub exp: usize,
}

/// Authenticated identity attached to a request after token verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl TryFrom<&Claims> for AuthUser {
    type Error = TokenError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)?;
        Ok(Self {
            id,
            role: claims.role,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed token, or expiry in the past. One variant on
    /// purpose: callers must not be able to distinguish the cases.
    #[error("invalid or expired token")]
    Invalid,
}

/// Issues and verifies HS256-signed bearer tokens with a process-wide secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Produce a token embedding `{sub, role}` that expires `ttl_secs` from now.
    pub fn issue(&self, user_id: Uuid, role: Role, ttl_secs: i64) -> Result<String, TokenError> {
        let exp = OffsetDateTime::now_utc().unix_timestamp() + ttl_secs;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: exp as usize,
        };

        tracing::debug!(user_id = %user_id, role = role.as_str(), ttl_secs, "issuing token");

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Invalid)
    }

    /// Check signature and expiry; return the decoded claims on success.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

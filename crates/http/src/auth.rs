//! Bearer-token authentication middleware.
//!
//! Protected routes are wrapped with [`require_auth`], which extracts the
//! `Authorization: Bearer <token>` header, verifies the token, and attaches
//! the decoded [`AuthUser`] to the request extensions. A missing header is an
//! explicit 401, never an unhandled fall-through to the verifier.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use bookstore_auth::{AuthUser, TokenService};

use crate::error::ApiError;

pub async fn require_auth(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token =
        bearer_token(&req).ok_or_else(|| ApiError::unauthorized("No token provided"))?;

    let claims = tokens
        .verify(&token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let user = AuthUser::try_from(&claims)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

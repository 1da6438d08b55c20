//! Error taxonomy and wire mapping for the BookStore HTTP layer.
//!
//! Every business-rule failure is translated at the handler boundary into the
//! JSON shape `{"errors": [{"field"?, "message"}]}` with an explicit status
//! code. Infrastructure failures become a generic 500; their detail is logged
//! server-side and never leaks into the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One entry in the `errors` array of an error response.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Application error types that map to HTTP responses.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input. The status is carried per call site:
    /// registration and book creation reject with 401, login with 400
    /// (both inherited wire behaviors).
    #[error("validation failed")]
    Validation {
        errors: Vec<FieldError>,
        status: StatusCode,
    },

    /// Uniqueness violation (email, book title).
    #[error("duplicate: {message}")]
    Duplicate { message: String },

    /// Login failure. Deliberately non-specific: unknown email and wrong
    /// password must be indistinguishable to the caller.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(errors: Vec<FieldError>, status: StatusCode) -> Self {
        Self::Validation { errors, status }
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::Validation { errors, status } => (status, errors),
            ApiError::Duplicate { message } => {
                (StatusCode::BAD_REQUEST, vec![FieldError::message(message)])
            }
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                vec![FieldError::message("Invalid credentials")],
            ),
            ApiError::Unauthorized { message } => {
                (StatusCode::UNAUTHORIZED, vec![FieldError::message(message)])
            }
            ApiError::Forbidden { message } => {
                (StatusCode::FORBIDDEN, vec![FieldError::message(message)])
            }
            ApiError::NotFound { message } => {
                (StatusCode::NOT_FOUND, vec![FieldError::message(message)])
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![FieldError::message("Internal server error")],
                )
            }
        };

        if status != StatusCode::INTERNAL_SERVER_ERROR {
            tracing::debug!(status = %status.as_u16(), "request rejected");
        }

        (status, Json(json!({ "errors": errors }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_carries_call_site_status() {
        let error = ApiError::validation(
            vec![FieldError::new("email", "Please include a valid email")],
            StatusCode::UNAUTHORIZED,
        );
        assert_eq!(error.into_response().status(), StatusCode::UNAUTHORIZED);

        let error = ApiError::validation(
            vec![FieldError::new("password", "Password is required")],
            StatusCode::BAD_REQUEST,
        );
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn duplicate_maps_to_400() {
        let response = ApiError::duplicate("User already exists").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_credentials_maps_to_400() {
        let response = ApiError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_failures_map_to_401_and_403() {
        let unauthorized = ApiError::unauthorized("No token provided").into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let forbidden = ApiError::forbidden("Only admin can add books").into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::not_found("Could not find a book by this id").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_maps_to_500() {
        let response = ApiError::Internal(anyhow::anyhow!("store exploded")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn field_error_serialization_skips_missing_field() {
        let with_field = serde_json::to_value(FieldError::new("name", "Name is required")).unwrap();
        assert_eq!(
            with_field,
            serde_json::json!({"field": "name", "message": "Name is required"})
        );

        let bare = serde_json::to_value(FieldError::message("Invalid credentials")).unwrap();
        assert_eq!(bare, serde_json::json!({"message": "Invalid credentials"}));
    }
}

pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::json;

use bookstore_auth::{PasswordHasher, Role, TokenService};
use bookstore_db::DbError;
use bookstore_http::{ApiError, FieldError};
use bookstore_kernel::{InitCtx, Module};

use models::{LoginRequest, RegisterRequest, TokenResponse, User};
use store::UserStore;

/// Tokens handed out at registration are short-lived; login tokens last 100
/// hours. The asymmetry is inherited wire behavior and kept on purpose.
pub const REGISTER_TOKEN_TTL_SECS: i64 = 3_600;
pub const LOGIN_TOKEN_TTL_SECS: i64 = 360_000;

const MIN_PASSWORD_CHARS: usize = 8;
const ADMIN_SIGNUP_HEADER: &str = "admin-signup-key";

/// Shared state for the users module.
#[derive(Clone)]
pub struct UsersState {
    pub store: UserStore,
    pub tokens: Arc<TokenService>,
    pub hasher: PasswordHasher,
    pub admin_signup_key: String,
}

/// Users module: registration and login.
pub struct UsersModule {
    state: UsersState,
}

impl UsersModule {
    pub fn new(state: UsersState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            admin_signup_enabled = !self.state.admin_signup_key.is_empty(),
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Register a new user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/RegisterUser" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "The user was successfully registered" },
                            "400": { "description": "User already exists" },
                            "401": { "description": "Invalid input" }
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Login a user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/LoginUser" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "The user was successfully logged in" },
                            "400": { "description": "Invalid credentials" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "RegisterUser": {
                        "type": "object",
                        "required": ["name", "email", "password"],
                        "properties": {
                            "name": { "type": "string" },
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string", "minLength": 8 }
                        },
                        "example": {
                            "name": "John Doe",
                            "email": "john.doe@example.com",
                            "password": "password1234"
                        }
                    },
                    "LoginUser": {
                        "type": "object",
                        "required": ["email", "password"],
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }
}

/// Create a new instance of the users module
pub fn create_module(state: UsersState) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(state))
}

/// POST /api/users/register
async fn register(
    State(state): State<UsersState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let errors = validate_registration(&req);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors, StatusCode::UNAUTHORIZED));
    }

    // Advisory pre-check; the store's unique email index is authoritative.
    if state.store.find_by_email(&req.email).await.is_some() {
        return Err(ApiError::duplicate("User already exists"));
    }

    let password_hash = state
        .hasher
        .hash(&req.password)
        .map_err(|err| ApiError::Internal(err.into()))?;

    let role = admin_signup_role(&headers, &state.admin_signup_key);

    let user = User {
        id: uuid::Uuid::new_v4(),
        name: req.name,
        email: req.email,
        password_hash,
        role,
        created_at: time::OffsetDateTime::now_utc(),
    };

    let user = state.store.insert(user).await.map_err(|err| match err {
        DbError::UniqueViolation { .. } => ApiError::duplicate("User already exists"),
        other => ApiError::Internal(other.into()),
    })?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");

    let token = state
        .tokens
        .issue(user.id, user.role, REGISTER_TOKEN_TTL_SECS)
        .map_err(|err| ApiError::Internal(err.into()))?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// POST /api/users/login
async fn login(
    State(state): State<UsersState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let errors = validate_login(&req);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors, StatusCode::BAD_REQUEST));
    }

    // Unknown email and wrong password take the same exit so the response
    // cannot be used to probe for account existence.
    let user = state
        .store
        .find_by_email(&req.email)
        .await
        .ok_or(ApiError::InvalidCredentials)?;

    if !state.hasher.verify(&req.password, &user.password_hash) {
        tracing::warn!(user_id = %user.id, "failed login attempt");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(user.id, user.role, LOGIN_TOKEN_TTL_SECS)
        .map_err(|err| ApiError::Internal(err.into()))?;

    Ok(Json(TokenResponse { token }))
}

/// Admin only when the signup key is configured and the header matches it
/// exactly; anything else falls through to a regular user.
fn admin_signup_role(headers: &HeaderMap, admin_signup_key: &str) -> Role {
    match headers
        .get(ADMIN_SIGNUP_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(supplied) if !admin_signup_key.is_empty() && supplied == admin_signup_key => {
            Role::Admin
        }
        _ => Role::User,
    }
}

fn validate_registration(req: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if req.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "Please include a valid email"));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(FieldError::new(
            "password",
            "Please enter a password with 8 or more characters",
        ));
    }
    errors
}

fn validate_login(req: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "Please include a valid email"));
    }
    if req.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }
    errors
}

/// Minimal well-formedness check: `local@domain` with a dotted domain and no
/// whitespace. Exact-match uniqueness handles the rest.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

//! Signup and login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use database::{validation, DatabaseError, Role, User};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, Result};
use crate::extract::JsonBody;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signup result.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login result: the account (without password) and a session token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: User,
    pub token: String,
}

/// Register a new account with role `user`.
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Provide name, email, and password".to_string(),
        ));
    }

    let name = validation::require_text("name", &req.name, validation::MAX_SHORT_TEXT_LENGTH)?;
    validation::validate_email(&req.email)?;

    let hash = hash_password(&req.password)?;
    let user_id = database::user::create_user(state.db.pool(), name, &req.email, &hash, Role::User)
        .await
        .map_err(|err| match err {
            DatabaseError::AlreadyExists { .. } => {
                ApiError::Validation("Email already registered".to_string())
            }
            other => other.into(),
        })?;

    info!(user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered".to_string(),
            user_id,
        }),
    ))
}

/// Check credentials and issue a session token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Provide email and password".to_string(),
        ));
    }

    let Some(credentials) = database::user::find_credentials(state.db.pool(), &req.email).await?
    else {
        warn!("Login attempt for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&req.password, &credentials.password) {
        warn!(user_id = credentials.id, "Login attempt with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let user = credentials.into_user();
    let token = state.tokens.issue(&user)?;

    info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user,
        token,
    }))
}

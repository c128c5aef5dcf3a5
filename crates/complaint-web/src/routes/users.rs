//! User administration.

use axum::extract::State;
use axum::Json;
use database::{DatabaseError, Role, User, UserSummary};
use serde::Deserialize;

use super::MessageResponse;
use crate::auth::{AdminUser, StaffUser};
use crate::error::{ApiError, Result};
use crate::extract::{JsonBody, PathParam};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    #[serde(default)]
    pub role: Option<String>,
}

/// All accounts, newest first.
pub async fn list_users(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<Vec<User>>> {
    let users = database::user::list_users(state.db.pool()).await?;
    Ok(Json(users))
}

/// Admin accounts as `{id, name}`, for escalation targets.
pub async fn list_admins(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<Vec<UserSummary>>> {
    let admins = database::user::list_admins(state.db.pool()).await?;
    Ok(Json(admins))
}

/// Change another account's role.
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<RoleRequest>,
) -> Result<Json<MessageResponse>> {
    let Some(raw) = req.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) else {
        return Err(ApiError::Validation("Role is required.".to_string()));
    };
    let role: Role = raw.parse().map_err(|_| {
        ApiError::Validation(
            "Invalid role specified. Must be one of: user, staff, admin".to_string(),
        )
    })?;

    if id == admin.id {
        return Err(ApiError::Forbidden(
            "Admins cannot change their own role.".to_string(),
        ));
    }

    database::user::update_role(state.db.pool(), id, role)
        .await
        .map_err(|err| match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound("User not found.".to_string()),
            other => other.into(),
        })?;

    Ok(Json(MessageResponse::new(format!(
        "Role updated to {} for user {}",
        role, id
    ))))
}

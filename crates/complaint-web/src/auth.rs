//! Session tokens and request authentication.
//!
//! Login issues an HS256 JWT. Protected handlers take an [`AuthUser`]
//! (any role), [`StaffUser`] or [`AdminUser`] extractor. The role is always
//! re-read from the database so a role change applies to existing tokens.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use database::{Role, User};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Display name at issue time.
    pub name: String,
    /// Role at issue time.
    pub role: Role,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Signing and verification keys.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    /// Build keys from a shared secret.
    pub fn from_secret(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for `user`.
    pub fn issue(&self, user: &User) -> Result<String> {
        let role: Role = user.role.parse()?;
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| {
                warn!(error = %err, "Rejected session token");
                ApiError::Unauthorized
            })
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    /// Staff or admin.
    pub fn is_staff(&self) -> bool {
        self.role >= Role::Staff
    }

    /// Require at least `role`.
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role >= role {
            Ok(())
        } else {
            warn!(user_id = self.id, role = %self.role, required = %role, "Insufficient role");
            Err(ApiError::Forbidden(format!("Requires {} role", role)))
        }
    }

    /// Allow acting on `user_id`'s data only for that user or staff.
    pub fn ensure_self_or_staff(&self, user_id: i64) -> Result<()> {
        if self.id == user_id || self.is_staff() {
            Ok(())
        } else {
            warn!(user_id = self.id, target = user_id, "Cross-user access denied");
            Err(ApiError::Forbidden(
                "Not allowed to act for another user".to_string(),
            ))
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::Unauthorized)?
        .to_str()
        .map_err(|_| ApiError::Unauthorized)?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized);
    }
    Ok(token)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = state.tokens.verify(bearer_token(parts)?)?;
        let id: i64 = claims.sub.parse().map_err(|_| ApiError::Unauthorized)?;

        let user = match database::user::get_user(state.db.pool(), id).await {
            Ok(user) => user,
            Err(database::DatabaseError::NotFound { .. }) => {
                warn!(user_id = id, "Token for unknown user");
                return Err(ApiError::Unauthorized);
            }
            Err(err) => return Err(err.into()),
        };

        Ok(AuthUser {
            id: user.id,
            role: user.role.parse()?,
            name: user.name,
        })
    }
}

/// An authenticated staff member or admin.
#[derive(Debug, Clone)]
pub struct StaffUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require(Role::Staff)?;
        Ok(StaffUser(user))
    }
}

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require(Role::Admin)?;
        Ok(AdminUser(user))
    }
}

//! User accounts and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DatabaseError, Result};
use crate::models::{User, UserCredentials, UserSummary};
use crate::validation::ValidationError;

/// Account role. Ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Staff,
    Admin,
}

impl Role {
    /// Get the stored column value for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::Invalid {
                field: "role".to_string(),
                reason: "must be one of: user, staff, admin".to_string(),
            }),
        }
    }
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a new user and return its ID.
///
/// `password_hash` must already be hashed; this layer never sees plaintext.
pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<i64> {
    let email = normalize_email(email);

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password, role)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&email)
    .bind(password_hash)
    .bind(role.as_str())
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: email.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(result.last_insert_rowid())
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, role, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("User", id))
}

/// Get a user and password hash by email, for login.
pub async fn find_credentials(pool: &SqlitePool, email: &str) -> Result<Option<UserCredentials>> {
    let record = sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, name, email, password, role, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List all users, newest first.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, role, created_at
        FROM users
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// List administrators by name.
pub async fn list_admins(pool: &SqlitePool) -> Result<Vec<UserSummary>> {
    let admins = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, name
        FROM users
        WHERE role = 'admin'
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(admins)
}

/// Overwrite a user's role.
pub async fn update_role(pool: &SqlitePool, id: i64, role: Role) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET role = ?
        WHERE id = ?
        "#,
    )
    .bind(role.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("User", id));
    }

    info!(user_id = id, role = %role, "User role updated");
    Ok(())
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

//! HTTP API for the complaint tracker.
//!
//! Submitters file complaints (with an optional attachment) and follow their
//! timelines; staff triage them through the `/api/admin` routes.

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod password;
pub mod routes;
pub mod state;
pub mod uploads;

use axum::Router;
use database::{Database, DatabaseError, Role};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::BootstrapAdmin;
use crate::state::AppState;

/// Build the application: API routes, attachment files and middleware.
pub fn app(state: AppState) -> Router {
    routes::router(state.max_upload_bytes)
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create the configured administrator unless the email is already taken.
///
/// Returns whether an account was created.
pub async fn ensure_bootstrap_admin(db: &Database, admin: &BootstrapAdmin) -> error::Result<bool> {
    let hash = password::hash_password(&admin.password)?;

    match database::user::create_user(db.pool(), &admin.name, &admin.email, &hash, Role::Admin)
        .await
    {
        Ok(user_id) => {
            info!(user_id, email = %admin.email, "Bootstrap admin created");
            Ok(true)
        }
        Err(DatabaseError::AlreadyExists { .. }) => {
            info!(email = %admin.email, "Bootstrap admin already present");
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

//! Route handlers for the complaint API.

pub mod admin;
pub mod auth;
pub mod complaints;
pub mod feedback;
pub mod health;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use serde::{Deserialize, Deserializer, Serialize};

use crate::state::AppState;

/// Build the router with all routes.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Accounts
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        // Submitter side
        .route(
            "/api/complaints",
            post(complaints::submit).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/complaints/stats", get(complaints::stats))
        .route("/api/complaints/user/:user_id", get(complaints::list_for_user))
        .route("/api/complaints/download/:filename", get(complaints::download))
        .route("/api/complaints/:id", get(complaints::get_complaint))
        .route("/api/feedback", post(feedback::submit))
        // Triage
        .route("/api/admin/dashboard-stats", get(admin::dashboard_stats))
        .route("/api/admin/complaints", get(admin::list_complaints))
        .route("/api/admin/complaints/:id/assign", post(admin::assign))
        .route("/api/admin/complaints/:id/reply", post(admin::reply))
        .route("/api/admin/complaints/:id/escalate", post(admin::escalate))
        .route(
            "/api/admin/complaints/:id/escalations",
            get(admin::list_escalations),
        )
        .route("/api/admin/complaints/status/:id", patch(admin::update_status))
        .route("/api/admin/feedback", get(admin::list_feedback))
        .route("/api/admin/config", get(admin::get_config).put(admin::put_config))
        .route("/api/admin/reports/export", post(admin::export_report))
        // User administration
        .route("/api/admin/users", get(users::list_users))
        .route("/api/admin/users/", get(users::list_users))
        .route("/api/admin/users/admins", get(users::list_admins))
        .route("/api/admin/users/role/:id", patch(users::update_role))
}

/// `{"message": "..."}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Accept an ID as a JSON number or numeric string; blank means absent.
///
/// HTML selects submit their values as strings.
pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdValue {
        Int(i64),
        Text(String),
    }

    match Option::<IdValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdValue::Int(value)) => Ok(Some(value)),
        Some(IdValue::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(IdValue::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{}'", text))),
    }
}

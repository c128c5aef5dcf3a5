//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    pub database: String,
}

/// Health check endpoint; 503 when the database is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    match database::user::count_users(state.db.pool()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(Health {
                status: "ok".to_string(),
                database: "ok".to_string(),
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Health {
                    status: "degraded".to_string(),
                    database: "unavailable".to_string(),
                }),
            )
        }
    }
}

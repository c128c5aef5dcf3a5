//! Feedback submission.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::{optional_id, MessageResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "optional_id")]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Record a rating (1-5) with an optional comment.
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<FeedbackRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let (Some(user_id), Some(rating)) = (req.user_id, req.rating) else {
        return Err(ApiError::Validation(
            "User ID and rating are required.".to_string(),
        ));
    };
    auth.ensure_self_or_staff(user_id)?;

    let comment = req.comment.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let feedback_id =
        database::feedback::create_feedback(state.db.pool(), user_id, rating, comment).await?;
    info!(feedback_id, user_id, rating, "Feedback recorded");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Thank you for your feedback!")),
    ))
}

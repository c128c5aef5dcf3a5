//! Submitter-side complaint routes.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use database::lifecycle::{self, NewComplaint};
use database::{ComplaintWithTimeline, UserStats};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::extract::PathParam;
use crate::state::AppState;
use crate::uploads::UploadStore;

const MISSING_FIELDS: &str =
    "Missing required complaint fields (user_id, category, subject, or description).";

/// Submission result.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    #[serde(rename = "complaintId")]
    pub complaint_id: i64,
}

/// Query for per-user statistics.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub user_id: Option<String>,
}

/// Multipart fields of a submission.
#[derive(Debug, Default)]
struct SubmissionForm {
    user_id: Option<String>,
    kind: Option<String>,
    category: Option<String>,
    subject: Option<String>,
    description: Option<String>,
    urgency: Option<String>,
    /// Stored attachment, staged before the database write.
    stored_file: Option<String>,
}

impl SubmissionForm {
    fn is_anonymous(&self) -> bool {
        self.kind.as_deref().map(str::trim) == Some("Anonymous")
    }
}

/// Submit a complaint (multipart form, optional attachment).
///
/// A staged attachment is deleted again if the submission fails.
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let multipart = multipart?;
    let mut form = SubmissionForm::default();

    let result = match read_form(&state.uploads, multipart, &mut form).await {
        Ok(()) => create_complaint(&state, &auth, &form).await,
        Err(err) => Err(err),
    };

    let complaint_id = match result {
        Ok(id) => id,
        Err(err) => {
            if let Some(filename) = &form.stored_file {
                state.uploads.remove(filename).await;
            }
            return Err(err);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Complaint submitted successfully!".to_string(),
            complaint_id,
        }),
    ))
}

async fn read_form(
    uploads: &UploadStore,
    mut multipart: Multipart,
    form: &mut SubmissionForm,
) -> Result<()> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" | "file_path" => {
                let original = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if let Some(original) = original.filter(|n| !n.is_empty()) {
                    if !bytes.is_empty() && form.stored_file.is_none() {
                        form.stored_file = Some(uploads.save(&original, &bytes).await?);
                    }
                }
            }
            "user_id" => form.user_id = Some(field.text().await?),
            "type" => form.kind = Some(field.text().await?),
            "category" => form.category = Some(field.text().await?),
            "subject" => form.subject = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            "urgency" => form.urgency = Some(field.text().await?),
            other => warn!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(())
}

async fn create_complaint(
    state: &AppState,
    auth: &AuthUser,
    form: &SubmissionForm,
) -> Result<i64> {
    fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    let (Some(user_id), Some(category), Some(subject), Some(description)) = (
        present(&form.user_id),
        present(&form.category),
        present(&form.subject),
        present(&form.description),
    ) else {
        return Err(ApiError::Validation(MISSING_FIELDS.to_string()));
    };

    let user_id: i64 = user_id
        .parse()
        .map_err(|_| ApiError::Validation("user_id must be a number".to_string()))?;
    auth.ensure_self_or_staff(user_id)?;

    let complaint_id = lifecycle::submit(
        state.db.pool(),
        &NewComplaint {
            user_id,
            is_anonymous: form.is_anonymous(),
            category,
            subject,
            description,
            urgency: form.urgency.as_deref(),
            file_path: form.stored_file.as_deref(),
        },
    )
    .await?;

    Ok(complaint_id)
}

/// Resolved, pending and total counts for one user.
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<UserStats>> {
    let user_id = query
        .user_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ApiError::Validation("Valid user_id parameter is required for stats.".to_string())
        })?;
    auth.ensure_self_or_staff(user_id)?;

    let stats = database::stats::user_stats(state.db.pool(), user_id).await?;
    Ok(Json(stats))
}

/// A user's complaints with timelines, newest first.
pub async fn list_for_user(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(user_id): PathParam<i64>,
) -> Result<Json<Vec<ComplaintWithTimeline>>> {
    auth.ensure_self_or_staff(user_id)?;

    let complaints = database::complaint::list_for_user(state.db.pool(), user_id).await?;
    Ok(Json(complaints))
}

/// One complaint with its timeline.
pub async fn get_complaint(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<ComplaintWithTimeline>> {
    let complaint = database::complaint::get_with_timeline(state.db.pool(), id)
        .await
        .map_err(|err| match err {
            database::DatabaseError::NotFound { .. } => {
                ApiError::NotFound("Complaint not found.".to_string())
            }
            other => other.into(),
        })?;
    auth.ensure_self_or_staff(complaint.complaint.user_id)?;

    Ok(Json(complaint))
}

/// Download a stored attachment.
pub async fn download(
    State(state): State<AppState>,
    PathParam(filename): PathParam<String>,
) -> Result<impl IntoResponse> {
    let bytes = state
        .uploads
        .read(&filename)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found.".to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", filename);
    Ok((
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

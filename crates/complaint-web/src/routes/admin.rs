//! Staff-side triage routes: dashboard, complaint lifecycle, feedback,
//! settings and report export.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use database::lifecycle;
use database::{ComplaintStatus, ComplaintWithTimeline, Escalation, Feedback, ReportFilter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{optional_id, MessageResponse};
use crate::auth::{AdminUser, StaffUser};
use crate::error::{ApiError, Result};
use crate::export::report_csv;
use crate::extract::{JsonBody, PathParam};
use crate::state::AppState;

/// Shown when no complaint has been resolved yet.
const NO_AVERAGE: &str = "–";

/// Dashboard counters.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub new: i64,
    pub review: i64,
    pub resolved: i64,
    pub total: i64,
    /// Mean resolution time in days, one decimal.
    #[serde(rename = "avgTime")]
    pub avg_time: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[serde(default, deserialize_with = "optional_id")]
    pub staff_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EscalateRequest {
    #[serde(default, deserialize_with = "optional_id")]
    pub escalated_to: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Report export filters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Dashboard counters across all complaints.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<DashboardResponse>> {
    let stats = database::stats::dashboard_stats(state.db.pool()).await?;

    Ok(Json(DashboardResponse {
        new: stats.new,
        review: stats.review,
        resolved: stats.resolved,
        total: stats.total,
        avg_time: format_average(stats.avg_resolution_days),
    }))
}

fn format_average(days: Option<f64>) -> String {
    match days {
        Some(days) => format!("{:.1}", days),
        None => NO_AVERAGE.to_string(),
    }
}

/// Every complaint with submitter, assignee and timeline, newest first.
pub async fn list_complaints(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<Vec<ComplaintWithTimeline>>> {
    let complaints = database::complaint::list_all(state.db.pool()).await?;
    Ok(Json(complaints))
}

/// Assign a complaint to a staff member.
pub async fn assign(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<AssignRequest>,
) -> Result<Json<MessageResponse>> {
    let staff_id = req
        .staff_id
        .ok_or_else(|| ApiError::Validation("staff_id is required.".to_string()))?;

    lifecycle::assign(state.db.pool(), state.policy, id, staff_id, staff.id).await?;

    Ok(Json(MessageResponse::new("Complaint assigned successfully")))
}

/// Record a reply on the complaint timeline.
pub async fn reply(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<ReplyRequest>,
) -> Result<Json<MessageResponse>> {
    let Some(text) = non_blank(req.reply.as_deref()) else {
        return Err(ApiError::Validation("Reply text is required.".to_string()));
    };

    lifecycle::reply(state.db.pool(), id, text, staff.id).await?;

    Ok(Json(MessageResponse::new("Reply sent successfully")))
}

/// Change a complaint's status, optionally with a comment.
pub async fn update_status(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<StatusRequest>,
) -> Result<Json<MessageResponse>> {
    let Some(raw) = non_blank(req.status.as_deref()) else {
        return Err(ApiError::Validation("Status is required.".to_string()));
    };
    let status: ComplaintStatus = raw.parse()?;

    lifecycle::change_status(
        state.db.pool(),
        state.policy,
        id,
        status,
        non_blank(req.comment.as_deref()),
        staff.id,
    )
    .await?;

    Ok(Json(MessageResponse::new(
        "Complaint status and timeline updated successfully",
    )))
}

/// Escalate a complaint to another user.
pub async fn escalate(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<EscalateRequest>,
) -> Result<Json<MessageResponse>> {
    let (Some(escalated_to), Some(reason)) = (req.escalated_to, non_blank(req.reason.as_deref()))
    else {
        return Err(ApiError::Validation(
            "Missing required escalation details.".to_string(),
        ));
    };

    lifecycle::escalate(
        state.db.pool(),
        state.policy,
        id,
        escalated_to,
        reason,
        staff.id,
    )
    .await?;

    Ok(Json(MessageResponse::new("Complaint escalated successfully")))
}

/// Escalations recorded for one complaint, oldest first.
pub async fn list_escalations(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Vec<Escalation>>> {
    // Unknown complaint is a 404, not an empty list.
    database::complaint::get_complaint(state.db.pool(), id).await?;

    let escalations = lifecycle::list_escalations(state.db.pool(), id).await?;
    Ok(Json(escalations))
}

/// All feedback with submitter details, newest first.
pub async fn list_feedback(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<Vec<Feedback>>> {
    let feedback = database::feedback::list_feedback(state.db.pool()).await?;
    Ok(Json(feedback))
}

/// All settings as one object.
pub async fn get_config(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<BTreeMap<String, String>>> {
    let config = database::system_config::get_all(state.db.pool()).await?;
    Ok(Json(config))
}

/// Upsert every key of the body object.
pub async fn put_config(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<MessageResponse>> {
    let entries = config_entries(body)?;

    database::system_config::upsert_many(state.db.pool(), &entries).await?;
    info!(keys = entries.len(), by = admin.id, "Settings updated");

    Ok(Json(MessageResponse::new("Settings updated successfully")))
}

/// Flatten a settings object into key/value text pairs.
fn config_entries(body: Value) -> Result<Vec<(String, String)>> {
    let Value::Object(map) = body else {
        return Err(ApiError::Validation(
            "Settings must be a JSON object.".to_string(),
        ));
    };
    if map.is_empty() {
        return Err(ApiError::Validation("No settings provided.".to_string()));
    }

    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => Ok((key, text)),
            Value::Number(number) => Ok((key, number.to_string())),
            _ => Err(ApiError::Validation(format!(
                "Setting '{}' must be a string or number.",
                key
            ))),
        })
        .collect()
}

/// Export matching complaints as a CSV attachment.
pub async fn export_report(
    State(state): State<AppState>,
    _staff: StaffUser,
    JsonBody(req): JsonBody<ExportRequest>,
) -> Result<impl IntoResponse> {
    let filter = ReportFilter {
        start_date: req.start_date,
        end_date: req.end_date,
        category: req.category,
    };

    let rows = database::report::complaint_report(state.db.pool(), &filter).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound(
            "No data found for the selected criteria.".to_string(),
        ));
    }

    let csv = report_csv(&rows)?;
    info!(rows = rows.len(), "Report exported");

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"complaints-report.csv\"",
            ),
        ],
        csv,
    ))
}

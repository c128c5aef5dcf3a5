//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account, safe to return to clients (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unique login email.
    pub email: String,
    /// One of `user`, `staff`, `admin`.
    pub role: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// An account row including its password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

impl UserCredentials {
    /// Drop the password hash.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Minimal user reference for pickers (e.g. the escalation target list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
}

/// A complaint joined with the names of its submitter and assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Complaint {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Submitting user.
    pub user_id: i64,
    /// Whether the submitter asked to stay anonymous.
    pub is_anonymous: bool,
    pub category: String,
    pub subject: String,
    pub description: String,
    /// Stored attachment filename, if any.
    pub file_path: Option<String>,
    /// Free-form priority label.
    pub urgency: Option<String>,
    /// Current status display string.
    pub status: String,
    /// Assigned staff member, if any.
    pub assigned_to: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
    /// Set only while the complaint is resolved.
    pub resolved_at: Option<String>,
    /// Submitter name.
    pub user_name: Option<String>,
    /// Assignee name.
    pub staff_name: Option<String>,
}

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ComplaintUpdate {
    pub id: i64,
    pub complaint_id: i64,
    pub status: String,
    pub comment: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_at: String,
}

/// A complaint with its full timeline, oldest entry first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintWithTimeline {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub timeline: Vec<ComplaintUpdate>,
}

/// A recorded escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Escalation {
    pub id: i64,
    pub complaint_id: i64,
    pub escalated_to: i64,
    pub reason: String,
    pub created_at: String,
}

/// A feedback entry joined with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    /// 1 to 5.
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
    pub user_name: String,
    pub user_email: String,
}

/// One row of the complaint report export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReportRow {
    pub id: i64,
    pub subject: String,
    pub category: String,
    pub status: String,
    pub user_name: Option<String>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

/// Per-user complaint counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total: i64,
    pub resolved: i64,
    pub pending: i64,
}

/// Counts across all complaints for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Status `New`.
    pub new: i64,
    /// Status `Under Review` or `Assigned`.
    pub review: i64,
    /// Status `Resolved`.
    pub resolved: i64,
    /// All complaints.
    pub total: i64,
    /// Mean days from creation to resolution over resolved complaints.
    pub avg_resolution_days: Option<f64>,
}

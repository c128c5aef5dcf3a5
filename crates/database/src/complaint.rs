//! Complaint read queries.
//!
//! All mutations live in [`crate::lifecycle`].

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Complaint, ComplaintUpdate, ComplaintWithTimeline};

/// Complaint columns joined with submitter and assignee names.
const COMPLAINT_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.is_anonymous, c.category, c.subject, c.description,
           c.file_path, c.urgency, c.status, c.assigned_to, c.created_at, c.resolved_at,
           u.name AS user_name, s.name AS staff_name
    FROM complaints c
    LEFT JOIN users u ON c.user_id = u.id
    LEFT JOIN users s ON c.assigned_to = s.id
"#;

/// Get a complaint by ID.
pub async fn get_complaint(pool: &SqlitePool, id: i64) -> Result<Complaint> {
    let sql = format!("{COMPLAINT_SELECT} WHERE c.id = ?");

    sqlx::query_as::<_, Complaint>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Complaint", id))
}

/// Get a complaint with its timeline.
pub async fn get_with_timeline(pool: &SqlitePool, id: i64) -> Result<ComplaintWithTimeline> {
    let complaint = get_complaint(pool, id).await?;
    let timeline = timeline(pool, id).await?;
    Ok(ComplaintWithTimeline {
        complaint,
        timeline,
    })
}

/// Timeline entries for one complaint, oldest first.
pub async fn timeline(pool: &SqlitePool, complaint_id: i64) -> Result<Vec<ComplaintUpdate>> {
    let rows = sqlx::query_as::<_, ComplaintUpdate>(
        r#"
        SELECT id, complaint_id, status, comment, updated_by, updated_at
        FROM complaint_updates
        WHERE complaint_id = ?
        ORDER BY updated_at ASC, id ASC
        "#,
    )
    .bind(complaint_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All complaints submitted by a user, newest first, each with its timeline.
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<ComplaintWithTimeline>> {
    let sql = format!("{COMPLAINT_SELECT} WHERE c.user_id = ? ORDER BY c.created_at DESC, c.id DESC");
    let complaints = sqlx::query_as::<_, Complaint>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    if complaints.is_empty() {
        return Ok(Vec::new());
    }

    let updates = sqlx::query_as::<_, ComplaintUpdate>(
        r#"
        SELECT cu.id, cu.complaint_id, cu.status, cu.comment, cu.updated_by, cu.updated_at
        FROM complaint_updates cu
        INNER JOIN complaints c ON c.id = cu.complaint_id
        WHERE c.user_id = ?
        ORDER BY cu.updated_at ASC, cu.id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(attach_timelines(complaints, updates))
}

/// Every complaint, newest first, each with its timeline.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ComplaintWithTimeline>> {
    let sql = format!("{COMPLAINT_SELECT} ORDER BY c.created_at DESC, c.id DESC");
    let complaints = sqlx::query_as::<_, Complaint>(&sql).fetch_all(pool).await?;

    let updates = sqlx::query_as::<_, ComplaintUpdate>(
        r#"
        SELECT id, complaint_id, status, comment, updated_by, updated_at
        FROM complaint_updates
        ORDER BY updated_at ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(attach_timelines(complaints, updates))
}

/// Group ordered updates under their complaints, keeping the update order.
fn attach_timelines(
    complaints: Vec<Complaint>,
    updates: Vec<ComplaintUpdate>,
) -> Vec<ComplaintWithTimeline> {
    let mut by_complaint: HashMap<i64, Vec<ComplaintUpdate>> = HashMap::new();
    for update in updates {
        by_complaint.entry(update.complaint_id).or_default().push(update);
    }

    complaints
        .into_iter()
        .map(|complaint| {
            let timeline = by_complaint.remove(&complaint.id).unwrap_or_default();
            ComplaintWithTimeline {
                complaint,
                timeline,
            }
        })
        .collect()
}

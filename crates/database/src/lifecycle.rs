//! Complaint lifecycle mutations.
//!
//! Every operation here writes its primary change and exactly one timeline
//! row inside a single transaction. Dropping the transaction on an early
//! return rolls both back.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::{DatabaseError, Result};
use crate::models::Escalation;
use crate::status::{ComplaintStatus, TransitionPolicy};
use crate::validation::{
    optional_text, require_text, validate_id, MAX_LONG_TEXT_LENGTH, MAX_SHORT_TEXT_LENGTH,
};

/// Timeline comment written when a complaint is created.
pub const SUBMITTED_COMMENT: &str = "Complaint submitted by user.";

/// Fields of a complaint being submitted.
#[derive(Debug, Clone, Default)]
pub struct NewComplaint<'a> {
    pub user_id: i64,
    pub is_anonymous: bool,
    pub category: &'a str,
    pub subject: &'a str,
    pub description: &'a str,
    pub urgency: Option<&'a str>,
    /// Stored attachment filename.
    pub file_path: Option<&'a str>,
}

/// Create a complaint in status `New` with its initial timeline row.
///
/// Returns the new complaint ID.
pub async fn submit(pool: &SqlitePool, complaint: &NewComplaint<'_>) -> Result<i64> {
    validate_id("user_id", complaint.user_id)?;
    let category = require_text("category", complaint.category, MAX_SHORT_TEXT_LENGTH)?;
    let subject = require_text("subject", complaint.subject, MAX_SHORT_TEXT_LENGTH)?;
    let description = require_text("description", complaint.description, MAX_LONG_TEXT_LENGTH)?;
    let urgency = optional_text("urgency", complaint.urgency, MAX_SHORT_TEXT_LENGTH)?;

    let mut tx = pool.begin().await?;

    ensure_user(&mut tx, complaint.user_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO complaints
            (user_id, is_anonymous, category, subject, description, file_path, urgency, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(complaint.user_id)
    .bind(complaint.is_anonymous)
    .bind(category)
    .bind(subject)
    .bind(description)
    .bind(complaint.file_path)
    .bind(urgency)
    .bind(ComplaintStatus::New.as_str())
    .execute(&mut *tx)
    .await?;
    let complaint_id = result.last_insert_rowid();

    insert_update(
        &mut tx,
        complaint_id,
        ComplaintStatus::New,
        Some(SUBMITTED_COMMENT),
        complaint.user_id,
    )
    .await?;

    tx.commit().await?;

    info!(complaint_id, user_id = complaint.user_id, "Complaint submitted");
    Ok(complaint_id)
}

/// Move a complaint to `status`.
///
/// `resolved_at` is stamped when the new status is `Resolved` and cleared
/// for every other status.
pub async fn change_status(
    pool: &SqlitePool,
    policy: TransitionPolicy,
    complaint_id: i64,
    status: ComplaintStatus,
    comment: Option<&str>,
    updated_by: i64,
) -> Result<()> {
    let comment = optional_text("comment", comment, MAX_LONG_TEXT_LENGTH)?;

    let mut tx = pool.begin().await?;

    ensure_transition(&mut tx, policy, complaint_id, status).await?;
    write_status(&mut tx, complaint_id, status).await?;
    insert_update(&mut tx, complaint_id, status, comment, updated_by).await?;

    tx.commit().await?;

    info!(complaint_id, status = %status, updated_by, "Complaint status changed");
    Ok(())
}

/// Assign a complaint to a staff member and put it under review.
pub async fn assign(
    pool: &SqlitePool,
    policy: TransitionPolicy,
    complaint_id: i64,
    staff_id: i64,
    updated_by: i64,
) -> Result<()> {
    validate_id("staff_id", staff_id)?;
    let status = ComplaintStatus::UnderReview;

    let mut tx = pool.begin().await?;

    ensure_transition(&mut tx, policy, complaint_id, status).await?;
    ensure_user(&mut tx, staff_id).await?;

    sqlx::query(
        r#"
        UPDATE complaints
        SET assigned_to = ?, status = ?, resolved_at = NULL
        WHERE id = ?
        "#,
    )
    .bind(staff_id)
    .bind(status.as_str())
    .bind(complaint_id)
    .execute(&mut *tx)
    .await?;

    let comment = format!("Assigned to staff ID {}", staff_id);
    insert_update(&mut tx, complaint_id, status, Some(&comment), updated_by).await?;

    tx.commit().await?;

    info!(complaint_id, staff_id, updated_by, "Complaint assigned");
    Ok(())
}

/// Append a public reply to the timeline.
///
/// The complaint's own status is left as it was.
pub async fn reply(
    pool: &SqlitePool,
    complaint_id: i64,
    reply: &str,
    updated_by: i64,
) -> Result<()> {
    let reply = require_text("reply", reply, MAX_LONG_TEXT_LENGTH)?;

    let mut tx = pool.begin().await?;

    current_status(&mut tx, complaint_id).await?;
    insert_update(
        &mut tx,
        complaint_id,
        ComplaintStatus::ReplySent,
        Some(reply),
        updated_by,
    )
    .await?;

    tx.commit().await?;

    info!(complaint_id, updated_by, "Reply added");
    Ok(())
}

/// Escalate a complaint to another user.
///
/// Records the escalation, marks the complaint `Escalated` and logs both
/// target and reason on the timeline. Returns the escalation ID.
pub async fn escalate(
    pool: &SqlitePool,
    policy: TransitionPolicy,
    complaint_id: i64,
    escalated_to: i64,
    reason: &str,
    updated_by: i64,
) -> Result<i64> {
    validate_id("escalated_to", escalated_to)?;
    let reason = require_text("reason", reason, MAX_LONG_TEXT_LENGTH)?;
    let status = ComplaintStatus::Escalated;

    let mut tx = pool.begin().await?;

    ensure_transition(&mut tx, policy, complaint_id, status).await?;
    ensure_user(&mut tx, escalated_to).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO escalations (complaint_id, escalated_to, reason)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(complaint_id)
    .bind(escalated_to)
    .bind(reason)
    .execute(&mut *tx)
    .await?;
    let escalation_id = result.last_insert_rowid();

    write_status(&mut tx, complaint_id, status).await?;

    let comment = format!("Escalated to user ID {}. Reason: {}", escalated_to, reason);
    insert_update(&mut tx, complaint_id, status, Some(&comment), updated_by).await?;

    tx.commit().await?;

    info!(complaint_id, escalation_id, escalated_to, updated_by, "Complaint escalated");
    Ok(escalation_id)
}

/// Escalations recorded for a complaint, oldest first.
pub async fn list_escalations(pool: &SqlitePool, complaint_id: i64) -> Result<Vec<Escalation>> {
    let rows = sqlx::query_as::<_, Escalation>(
        r#"
        SELECT id, complaint_id, escalated_to, reason, created_at
        FROM escalations
        WHERE complaint_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(complaint_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stored status string of a complaint; NotFound if it does not exist.
async fn current_status(conn: &mut SqliteConnection, complaint_id: i64) -> Result<String> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT status
        FROM complaints
        WHERE id = ?
        "#,
    )
    .bind(complaint_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Complaint", complaint_id))
}

async fn ensure_transition(
    conn: &mut SqliteConnection,
    policy: TransitionPolicy,
    complaint_id: i64,
    to: ComplaintStatus,
) -> Result<()> {
    let current = current_status(conn, complaint_id).await?;

    if policy == TransitionPolicy::Open {
        return Ok(());
    }

    match current.parse::<ComplaintStatus>() {
        Ok(from) => policy.check(from, to),
        Err(_) => Err(DatabaseError::InvalidTransition {
            from: current,
            to: to.to_string(),
        }),
    }
}

async fn ensure_user(conn: &mut SqliteConnection, user_id: i64) -> Result<()> {
    let found = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(DatabaseError::not_found("User", user_id)),
    }
}

/// Write the status column and keep `resolved_at` in step with it.
async fn write_status(
    conn: &mut SqliteConnection,
    complaint_id: i64,
    status: ComplaintStatus,
) -> Result<()> {
    let query = if status == ComplaintStatus::Resolved {
        r#"
        UPDATE complaints
        SET status = ?, resolved_at = datetime('now')
        WHERE id = ?
        "#
    } else {
        r#"
        UPDATE complaints
        SET status = ?, resolved_at = NULL
        WHERE id = ?
        "#
    };

    let result = sqlx::query(query)
        .bind(status.as_str())
        .bind(complaint_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Complaint", complaint_id));
    }

    Ok(())
}

async fn insert_update(
    conn: &mut SqliteConnection,
    complaint_id: i64,
    status: ComplaintStatus,
    comment: Option<&str>,
    updated_by: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO complaint_updates (complaint_id, status, comment, updated_by)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(complaint_id)
    .bind(status.as_str())
    .bind(comment)
    .bind(updated_by)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complaint::{get_complaint, get_with_timeline, list_all, list_for_user, timeline};
    use crate::stats::{dashboard_stats, user_stats};
    use crate::user::{create_user, Role};
    use crate::Database;

    const OPEN: TransitionPolicy = TransitionPolicy::Open;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn add_user(db: &Database, name: &str, role: Role) -> i64 {
        let email = format!("{}@example.com", name.to_lowercase());
        create_user(db.pool(), name, &email, "hash", role).await.unwrap()
    }

    async fn leak_complaint(db: &Database, user_id: i64) -> i64 {
        submit(
            db.pool(),
            &NewComplaint {
                user_id,
                category: "Maintenance",
                subject: "Leak",
                description: "Pipe leaking",
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_creates_complaint_and_new_entry() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;

        let id = leak_complaint(&db, user).await;

        let detail = get_with_timeline(db.pool(), id).await.unwrap();
        assert_eq!(detail.complaint.status, "New");
        assert_eq!(detail.complaint.user_name.as_deref(), Some("Alice"));
        assert!(detail.complaint.resolved_at.is_none());
        assert_eq!(detail.timeline.len(), 1);
        assert_eq!(detail.timeline[0].status, "New");
        assert_eq!(detail.timeline[0].comment.as_deref(), Some(SUBMITTED_COMMENT));
        assert_eq!(detail.timeline[0].updated_by, Some(user));
        assert_eq!(count(&db, "complaints").await, 1);
        assert_eq!(count(&db, "complaint_updates").await, 1);
    }

    #[tokio::test]
    async fn test_submit_missing_fields() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;

        let result = submit(
            db.pool(),
            &NewComplaint {
                user_id: user,
                category: "Maintenance",
                subject: "  ",
                description: "Pipe leaking",
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(DatabaseError::Validation(_))));
        assert_eq!(count(&db, "complaints").await, 0);
    }

    #[tokio::test]
    async fn test_submit_for_unknown_user() {
        let db = test_db().await;

        let result = submit(
            db.pool(),
            &NewComplaint {
                user_id: 42,
                category: "Maintenance",
                subject: "Leak",
                description: "Pipe leaking",
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(DatabaseError::NotFound { entity: "User", .. })));
        assert_eq!(count(&db, "complaints").await, 0);
        assert_eq!(count(&db, "complaint_updates").await, 0);
    }

    #[tokio::test]
    async fn test_resolve_then_reopen_scenario() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let admin = add_user(&db, "Root", Role::Admin).await;
        let id = leak_complaint(&db, user).await;

        change_status(db.pool(), OPEN, id, ComplaintStatus::Resolved, Some("Fixed"), admin)
            .await
            .unwrap();
        let complaint = get_complaint(db.pool(), id).await.unwrap();
        assert_eq!(complaint.status, "Resolved");
        assert!(complaint.resolved_at.is_some());

        change_status(db.pool(), OPEN, id, ComplaintStatus::New, None, admin)
            .await
            .unwrap();
        let complaint = get_complaint(db.pool(), id).await.unwrap();
        assert_eq!(complaint.status, "New");
        assert!(complaint.resolved_at.is_none());

        let entries = timeline(db.pool(), id).await.unwrap();
        let statuses: Vec<&str> = entries.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(statuses, vec!["New", "Resolved", "New"]);
    }

    #[tokio::test]
    async fn test_every_non_resolved_status_clears_resolved_at() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let id = leak_complaint(&db, user).await;

        for status in ComplaintStatus::ALL {
            change_status(db.pool(), OPEN, id, ComplaintStatus::Resolved, None, user)
                .await
                .unwrap();
            change_status(db.pool(), OPEN, id, status, None, user)
                .await
                .unwrap();

            let complaint = get_complaint(db.pool(), id).await.unwrap();
            assert_eq!(complaint.status, status.as_str());
            assert_eq!(complaint.resolved_at.is_some(), status == ComplaintStatus::Resolved);
        }
    }

    #[tokio::test]
    async fn test_escalation_scenario() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let staff = add_user(&db, "Sam", Role::Staff).await;
        let senior = add_user(&db, "Senior", Role::Admin).await;
        let id = leak_complaint(&db, user).await;

        let escalation_id = escalate(db.pool(), OPEN, id, senior, "needs senior review", staff)
            .await
            .unwrap();

        let escalations = list_escalations(db.pool(), id).await.unwrap();
        assert_eq!(escalations.len(), 1);
        assert_eq!(escalations[0].id, escalation_id);
        assert_eq!(escalations[0].escalated_to, senior);
        assert_eq!(escalations[0].reason, "needs senior review");

        let detail = get_with_timeline(db.pool(), id).await.unwrap();
        assert_eq!(detail.complaint.status, "Escalated");
        assert_eq!(detail.timeline.len(), 2);
        let last = &detail.timeline[1];
        assert_eq!(last.status, "Escalated");
        let comment = last.comment.as_deref().unwrap();
        assert!(comment.contains(&senior.to_string()));
        assert!(comment.contains("needs senior review"));
    }

    #[tokio::test]
    async fn test_escalate_to_unknown_user_writes_nothing() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let id = leak_complaint(&db, user).await;

        let result = escalate(db.pool(), OPEN, id, 999, "why not", user).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { entity: "User", .. })));

        assert_eq!(count(&db, "escalations").await, 0);
        assert_eq!(get_complaint(db.pool(), id).await.unwrap().status, "New");
        assert_eq!(timeline(db.pool(), id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assign_forces_under_review() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let staff = add_user(&db, "Sam", Role::Staff).await;
        let id = leak_complaint(&db, user).await;

        change_status(db.pool(), OPEN, id, ComplaintStatus::Resolved, None, staff)
            .await
            .unwrap();
        assign(db.pool(), OPEN, id, staff, staff).await.unwrap();

        let detail = get_with_timeline(db.pool(), id).await.unwrap();
        assert_eq!(detail.complaint.status, "Under Review");
        assert_eq!(detail.complaint.assigned_to, Some(staff));
        assert_eq!(detail.complaint.staff_name.as_deref(), Some("Sam"));
        assert!(detail.complaint.resolved_at.is_none());

        let last = detail.timeline.last().unwrap();
        assert_eq!(last.status, "Under Review");
        assert_eq!(
            last.comment.as_deref(),
            Some(format!("Assigned to staff ID {}", staff).as_str())
        );
    }

    #[tokio::test]
    async fn test_reply_leaves_status_untouched() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let staff = add_user(&db, "Sam", Role::Staff).await;
        let id = leak_complaint(&db, user).await;

        reply(db.pool(), id, "We are on it", staff).await.unwrap();

        let detail = get_with_timeline(db.pool(), id).await.unwrap();
        assert_eq!(detail.complaint.status, "New");
        let last = detail.timeline.last().unwrap();
        assert_eq!(last.status, "Reply Sent");
        assert_eq!(last.comment.as_deref(), Some("We are on it"));
    }

    #[tokio::test]
    async fn test_operations_on_missing_complaint() {
        let db = test_db().await;
        let staff = add_user(&db, "Sam", Role::Staff).await;

        let not_found = |r: &Result<()>| {
            matches!(r, Err(DatabaseError::NotFound { entity: "Complaint", .. }))
        };

        assert!(not_found(
            &change_status(db.pool(), OPEN, 77, ComplaintStatus::Resolved, None, staff).await
        ));
        assert!(not_found(&assign(db.pool(), OPEN, 77, staff, staff).await));
        assert!(not_found(&reply(db.pool(), 77, "hello", staff).await));
        assert_eq!(count(&db, "complaint_updates").await, 0);
    }

    #[tokio::test]
    async fn test_timeline_counts_every_operation() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let staff = add_user(&db, "Sam", Role::Staff).await;
        let admin = add_user(&db, "Root", Role::Admin).await;
        let id = leak_complaint(&db, user).await;

        assign(db.pool(), OPEN, id, staff, admin).await.unwrap();
        reply(db.pool(), id, "Looking", staff).await.unwrap();
        change_status(db.pool(), OPEN, id, ComplaintStatus::Assigned, None, staff)
            .await
            .unwrap();
        escalate(db.pool(), OPEN, id, admin, "stuck", staff).await.unwrap();
        change_status(db.pool(), OPEN, id, ComplaintStatus::Resolved, None, admin)
            .await
            .unwrap();

        let entries = timeline(db.pool(), id).await.unwrap();
        assert_eq!(entries.len(), 6);
        assert!(entries
            .windows(2)
            .all(|w| w[0].updated_at <= w[1].updated_at && w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_guarded_policy_rejects_reopen_to_new() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let id = leak_complaint(&db, user).await;
        let guarded = TransitionPolicy::Guarded;

        change_status(db.pool(), guarded, id, ComplaintStatus::Resolved, None, user)
            .await
            .unwrap();
        let result = change_status(db.pool(), guarded, id, ComplaintStatus::New, None, user).await;
        assert!(matches!(result, Err(DatabaseError::InvalidTransition { .. })));

        let complaint = get_complaint(db.pool(), id).await.unwrap();
        assert_eq!(complaint.status, "Resolved");
        assert!(complaint.resolved_at.is_some());
        assert_eq!(timeline(db.pool(), id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_user_stats_escalated_gap() {
        let db = test_db().await;
        let user = add_user(&db, "Alice", Role::User).await;
        let admin = add_user(&db, "Root", Role::Admin).await;

        let resolved = leak_complaint(&db, user).await;
        let escalated = leak_complaint(&db, user).await;
        leak_complaint(&db, user).await;

        change_status(db.pool(), OPEN, resolved, ComplaintStatus::Resolved, None, admin)
            .await
            .unwrap();
        escalate(db.pool(), OPEN, escalated, admin, "urgent", admin)
            .await
            .unwrap();

        let stats = user_stats(db.pool(), user).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.pending, 1);
        assert!(stats.resolved + stats.pending < stats.total);

        let empty = user_stats(db.pool(), admin).await.unwrap();
        assert_eq!((empty.total, empty.resolved, empty.pending), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let db = test_db().await;
        let stats = dashboard_stats(db.pool()).await.unwrap();
        assert_eq!(stats.total, 0);
        assert!(stats.avg_resolution_days.is_none());

        let user = add_user(&db, "Alice", Role::User).await;
        let a = leak_complaint(&db, user).await;
        let b = leak_complaint(&db, user).await;
        leak_complaint(&db, user).await;
        change_status(db.pool(), OPEN, a, ComplaintStatus::Resolved, None, user)
            .await
            .unwrap();
        assign(db.pool(), OPEN, b, user, user).await.unwrap();

        let stats = dashboard_stats(db.pool()).await.unwrap();
        assert_eq!(stats.new, 1);
        assert_eq!(stats.review, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.total, 3);
        let avg = stats.avg_resolution_days.unwrap();
        assert!((0.0..1.0).contains(&avg));
    }

    #[tokio::test]
    async fn test_lists_embed_timelines() {
        let db = test_db().await;
        let alice = add_user(&db, "Alice", Role::User).await;
        let bob = add_user(&db, "Bob", Role::User).await;
        let first = leak_complaint(&db, alice).await;
        let second = leak_complaint(&db, alice).await;
        leak_complaint(&db, bob).await;
        reply(db.pool(), first, "ack", bob).await.unwrap();

        let mine = list_for_user(db.pool(), alice).await.unwrap();
        assert_eq!(mine.len(), 2);
        // Newest first.
        assert_eq!(mine[0].complaint.id, second);
        assert_eq!(mine[0].timeline.len(), 1);
        assert_eq!(mine[1].timeline.len(), 2);

        assert!(list_for_user(db.pool(), 999).await.unwrap().is_empty());
        assert_eq!(list_all(db.pool()).await.unwrap().len(), 3);
    }
}

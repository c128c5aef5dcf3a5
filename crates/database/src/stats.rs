//! Aggregate counts for dashboards.

use sqlx::SqlitePool;

use crate::models::{DashboardStats, UserStats};
use crate::Result;

/// Resolved, pending and total counts for one user's complaints.
///
/// Escalated complaints count toward `total` only, so
/// `resolved + pending <= total`.
pub async fn user_stats(pool: &SqlitePool, user_id: i64) -> Result<UserStats> {
    let (resolved, pending, total) = sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
        SELECT
            COUNT(CASE WHEN TRIM(status) = 'Resolved' THEN 1 END) AS resolved,
            COUNT(CASE WHEN TRIM(status) IN ('New', 'Under Review', 'Assigned', 'Reply Sent') THEN 1 END) AS pending,
            COUNT(*) AS total
        FROM complaints
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(UserStats {
        total,
        resolved,
        pending,
    })
}

/// Status buckets and average resolution time across all complaints.
pub async fn dashboard_stats(pool: &SqlitePool) -> Result<DashboardStats> {
    let (new, review, resolved, total, avg_resolution_days) =
        sqlx::query_as::<_, (i64, i64, i64, i64, Option<f64>)>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'New' THEN 1 ELSE 0 END), 0) AS new_count,
                COALESCE(SUM(CASE WHEN status IN ('Under Review', 'Assigned') THEN 1 ELSE 0 END), 0) AS review_count,
                COALESCE(SUM(CASE WHEN status = 'Resolved' THEN 1 ELSE 0 END), 0) AS resolved_count,
                COUNT(*) AS total_count,
                AVG(
                    CASE WHEN status = 'Resolved' AND resolved_at IS NOT NULL
                    THEN julianday(resolved_at) - julianday(created_at)
                    END
                ) AS avg_resolution_days
            FROM complaints
            "#,
        )
        .fetch_one(pool)
        .await?;

    Ok(DashboardStats {
        new,
        review,
        resolved,
        total,
        avg_resolution_days,
    })
}

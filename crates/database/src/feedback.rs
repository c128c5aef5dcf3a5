//! User feedback storage.

use sqlx::SqlitePool;

use crate::models::Feedback;
use crate::validation::{optional_text, validate_rating, MAX_LONG_TEXT_LENGTH};
use crate::Result;

/// Record a feedback entry and return its ID.
///
/// NotFound if `user_id` has no account.
pub async fn create_feedback(
    pool: &SqlitePool,
    user_id: i64,
    rating: i64,
    comment: Option<&str>,
) -> Result<i64> {
    validate_rating(rating)?;
    let comment = optional_text("comment", comment, MAX_LONG_TEXT_LENGTH)?;

    crate::user::get_user(pool, user_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO feedback (user_id, rating, comment)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List all feedback with author details, newest first.
pub async fn list_feedback(pool: &SqlitePool) -> Result<Vec<Feedback>> {
    let rows = sqlx::query_as::<_, Feedback>(
        r#"
        SELECT f.id, f.user_id, f.rating, f.comment, f.created_at,
               u.name AS user_name, u.email AS user_email
        FROM feedback f
        INNER JOIN users u ON f.user_id = u.id
        ORDER BY f.created_at DESC, f.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

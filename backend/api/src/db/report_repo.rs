use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::Report;

/// Full report row for the admin listing: reporter plus the reported comment
/// and its author.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReportDetails {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub reporter_id: Uuid,
    pub reporter_username: String,
    pub reporter_email: String,
    pub comment_id: Uuid,
    pub comment_content: String,
    pub comment_author_id: Uuid,
    pub comment_author_username: String,
}

/// Reported comments grouped by report volume.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReportedCommentGroup {
    pub comment_id: Uuid,
    pub comment_content: String,
    pub comment_author_id: Uuid,
    pub comment_author_username: String,
    pub report_count: i64,
    pub last_reported_at: DateTime<Utc>,
}

/// Insert a report; `None` when this user already reported the comment.
pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    comment_id: Uuid,
    message: &str,
) -> Result<Option<Report>, sqlx::Error> {
    sqlx::query_as::<_, Report>(
        r#"
        INSERT INTO reports (user_id, comment_id, message)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, comment_id) DO NOTHING
        RETURNING id, user_id, comment_id, message, created_at
        "#,
    )
    .bind(user_id)
    .bind(comment_id)
    .bind(message)
    .fetch_optional(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<ReportDetails>, sqlx::Error> {
    sqlx::query_as::<_, ReportDetails>(
        r#"
        SELECT r.id, r.message, r.created_at,
               ru.id AS reporter_id, ru.username AS reporter_username, ru.email AS reporter_email,
               c.id AS comment_id, c.content AS comment_content,
               cu.id AS comment_author_id, cu.username AS comment_author_username
        FROM reports r
        JOIN users ru ON ru.id = r.user_id
        JOIN comments c ON c.id = r.comment_id
        JOIN users cu ON cu.id = c.user_id
        ORDER BY r.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn group_by_comment(pool: &PgPool) -> Result<Vec<ReportedCommentGroup>, sqlx::Error> {
    sqlx::query_as::<_, ReportedCommentGroup>(
        r#"
        SELECT c.id AS comment_id, c.content AS comment_content,
               cu.id AS comment_author_id, cu.username AS comment_author_username,
               COUNT(r.id) AS report_count, MAX(r.created_at) AS last_reported_at
        FROM reports r
        JOIN comments c ON c.id = r.comment_id
        JOIN users cu ON cu.id = c.user_id
        GROUP BY c.id, c.content, cu.id, cu.username
        ORDER BY report_count DESC, last_reported_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reports WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

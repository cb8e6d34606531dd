use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::models::Comment;

const COMMENT_COLUMNS: &str =
    "id, user_id, song_id, playlist_id, parent_id, content, likes, created_at";

/// The target a comment is attached to: exactly one of song or playlist.
#[derive(Debug, Clone, Copy)]
pub enum CommentTarget {
    Song(Uuid),
    Playlist(Uuid),
}

impl CommentTarget {
    fn columns(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            CommentTarget::Song(id) => (Some(id), None),
            CommentTarget::Playlist(id) => (None, Some(id)),
        }
    }
}

/// Listing row with the author joined in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub song_id: Option<Uuid>,
    pub playlist_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    target: CommentTarget,
    parent_id: Option<Uuid>,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    let (song_id, playlist_id) = target.columns();

    sqlx::query_as::<_, Comment>(&format!(
        r#"
        INSERT INTO comments (user_id, song_id, playlist_id, parent_id, content)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(song_id)
    .bind(playlist_id)
    .bind(parent_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_target(
    pool: &PgPool,
    target: CommentTarget,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
    let (song_id, playlist_id) = target.columns();

    sqlx::query_as::<_, CommentWithAuthor>(
        r#"
        SELECT c.id, c.user_id, u.username, c.song_id, c.playlist_id, c.parent_id,
               c.content, c.likes, c.created_at
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE ($1::uuid IS NULL OR c.song_id = $1)
          AND ($2::uuid IS NULL OR c.playlist_id = $2)
        ORDER BY c.created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(song_id)
    .bind(playlist_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_for_target(pool: &PgPool, target: CommentTarget) -> Result<i64, sqlx::Error> {
    let (song_id, playlist_id) = target.columns();

    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS count
        FROM comments
        WHERE ($1::uuid IS NULL OR song_id = $1)
          AND ($2::uuid IS NULL OR playlist_id = $2)
        "#,
    )
    .bind(song_id)
    .bind(playlist_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Insert a like; 0 rows means the user already liked this comment.
pub async fn add_like(pool: &PgPool, user_id: Uuid, comment_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO comment_likes (user_id, comment_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, comment_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(comment_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn remove_like(
    pool: &PgPool,
    user_id: Uuid,
    comment_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comment_likes WHERE user_id = $1 AND comment_id = $2")
        .bind(user_id)
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Recompute the denormalized like counter from the join table.
pub async fn recount_likes(pool: &PgPool, comment_id: Uuid) -> Result<i32, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE comments
        SET likes = (SELECT COUNT(*)::INT FROM comment_likes WHERE comment_id = $1)
        WHERE id = $1
        RETURNING likes
        "#,
    )
    .bind(comment_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i32, _>("likes"))
}

/// Delete a comment and its one-level replies together with every like and
/// report that references them. Runs on an open transaction.
pub async fn purge(
    tx: &mut Transaction<'_, Postgres>,
    comment_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM comments WHERE id = $1 OR parent_id = $1")
            .bind(comment_id)
            .fetch_all(&mut **tx)
            .await?;

    if ids.is_empty() {
        return Ok(0);
    }

    sqlx::query("DELETE FROM reports WHERE comment_id = ANY($1)")
        .bind(&ids)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM comment_likes WHERE comment_id = ANY($1)")
        .bind(&ids)
        .execute(&mut **tx)
        .await?;

    let result = sqlx::query("DELETE FROM comments WHERE id = ANY($1)")
        .bind(&ids)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

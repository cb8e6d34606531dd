use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::models::ArtistVerification;

const VERIFICATION_COLUMNS: &str = "id, user_id, stage_name, real_name, bio, facebook_url, \
     youtube_url, spotify_url, instagram_url, website_url, released_song_links, id_document_url, \
     authorization_doc_url, profile_image_url, contact_email, contact_phone, status, admin_notes, \
     rejection_reason, reviewed_by, reviewed_at, created_at, updated_at";

/// Admin listing row: the request plus its requester.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VerificationWithRequester {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requester_username: String,
    pub requester_email: String,
    pub requester_role: String,
    pub stage_name: String,
    pub contact_email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationStats {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub total_artists: i64,
}

#[derive(Debug, Default)]
pub struct NewVerification<'a> {
    pub user_id: Uuid,
    pub stage_name: &'a str,
    pub real_name: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub facebook_url: Option<&'a str>,
    pub youtube_url: Option<&'a str>,
    pub spotify_url: Option<&'a str>,
    pub instagram_url: Option<&'a str>,
    pub website_url: Option<&'a str>,
    pub released_song_links: serde_json::Value,
    pub id_document_url: Option<&'a str>,
    pub authorization_doc_url: Option<&'a str>,
    pub profile_image_url: Option<&'a str>,
    pub contact_email: &'a str,
    pub contact_phone: Option<&'a str>,
}

pub async fn create(
    pool: &PgPool,
    req: NewVerification<'_>,
) -> Result<ArtistVerification, sqlx::Error> {
    sqlx::query_as::<_, ArtistVerification>(&format!(
        r#"
        INSERT INTO artist_verifications
            (user_id, stage_name, real_name, bio, facebook_url, youtube_url, spotify_url,
             instagram_url, website_url, released_song_links, id_document_url,
             authorization_doc_url, profile_image_url, contact_email, contact_phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {VERIFICATION_COLUMNS}
        "#
    ))
    .bind(req.user_id)
    .bind(req.stage_name)
    .bind(req.real_name)
    .bind(req.bio)
    .bind(req.facebook_url)
    .bind(req.youtube_url)
    .bind(req.spotify_url)
    .bind(req.instagram_url)
    .bind(req.website_url)
    .bind(req.released_song_links)
    .bind(req.id_document_url)
    .bind(req.authorization_doc_url)
    .bind(req.profile_image_url)
    .bind(req.contact_email)
    .bind(req.contact_phone)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ArtistVerification>, sqlx::Error> {
    sqlx::query_as::<_, ArtistVerification>(&format!(
        "SELECT {VERIFICATION_COLUMNS} FROM artist_verifications WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn has_pending(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        "SELECT EXISTS(SELECT 1 FROM artist_verifications WHERE user_id = $1 AND status = 'pending')",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<bool, _>(0))
}

pub async fn list_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ArtistVerification>, sqlx::Error> {
    sqlx::query_as::<_, ArtistVerification>(&format!(
        r#"
        SELECT {VERIFICATION_COLUMNS}
        FROM artist_verifications
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_admin(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<VerificationWithRequester>, sqlx::Error> {
    sqlx::query_as::<_, VerificationWithRequester>(
        r#"
        SELECT v.id, v.user_id, u.username AS requester_username, u.email AS requester_email,
               u.role AS requester_role, v.stage_name, v.contact_email, v.status, v.created_at
        FROM artist_verifications v
        JOIN users u ON u.id = v.user_id
        WHERE ($1::text IS NULL OR v.status = $1)
        ORDER BY v.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_admin(pool: &PgPool, status: Option<&str>) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count FROM artist_verifications WHERE ($1::text IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Flip a pending request to approved. Returns `None` when the request was
/// already processed (status no longer pending).
pub async fn mark_approved(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    reviewer: Uuid,
    admin_notes: Option<&str>,
) -> Result<Option<ArtistVerification>, sqlx::Error> {
    sqlx::query_as::<_, ArtistVerification>(&format!(
        r#"
        UPDATE artist_verifications
        SET status = 'approved', admin_notes = COALESCE($3, admin_notes),
            reviewed_by = $2, reviewed_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {VERIFICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(reviewer)
    .bind(admin_notes)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn mark_rejected(
    pool: &PgPool,
    id: Uuid,
    reviewer: Uuid,
    rejection_reason: &str,
    admin_notes: Option<&str>,
) -> Result<Option<ArtistVerification>, sqlx::Error> {
    sqlx::query_as::<_, ArtistVerification>(&format!(
        r#"
        UPDATE artist_verifications
        SET status = 'rejected', rejection_reason = $3, admin_notes = COALESCE($4, admin_notes),
            reviewed_by = $2, reviewed_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {VERIFICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(reviewer)
    .bind(rejection_reason)
    .bind(admin_notes)
    .fetch_optional(pool)
    .await
}

pub async fn stats(pool: &PgPool) -> Result<VerificationStats, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE status = 'approved') AS approved,
            COUNT(*) FILTER (WHERE status = 'rejected') AS rejected,
            (SELECT COUNT(*) FROM users WHERE role = 'artist') AS total_artists
        FROM artist_verifications
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(VerificationStats {
        pending: row.get::<i64, _>("pending"),
        approved: row.get::<i64, _>("approved"),
        rejected: row.get::<i64, _>("rejected"),
        total_artists: row.get::<i64, _>("total_artists"),
    })
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Row, Transaction};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::ArtistProfile;

const PROFILE_COLUMNS: &str = "id, user_id, stage_name, bio, avatar_url, cover_url, social_links, \
     total_followers, total_plays, verified, contact_email, country, genres, created_at, updated_at";

/// Public listing row for `GET /artists`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ArtistSummary {
    pub id: Uuid,
    pub username: String,
    pub stage_name: Option<String>,
    pub avatar_url: Option<String>,
    pub verified: Option<bool>,
    pub total_followers: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ProfilePatch {
    pub stage_name: Option<String>,
    pub bio: Option<String>,
    pub social_links: Option<serde_json::Value>,
    pub contact_email: Option<String>,
    pub country: Option<String>,
    pub genres: Option<serde_json::Value>,
}

pub async fn list_artists(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ArtistSummary>, sqlx::Error> {
    sqlx::query_as::<_, ArtistSummary>(
        r#"
        SELECT u.id, u.username, p.stage_name, p.avatar_url, p.verified,
               p.total_followers, u.created_at
        FROM users u
        LEFT JOIN artist_profiles p ON p.user_id = u.id
        WHERE u.role = 'artist'
        ORDER BY u.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_artists(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM users WHERE role = 'artist'")
        .fetch_one(pool)
        .await?;

    Ok(row.get::<i64, _>("count"))
}

pub async fn get_profile(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<ArtistProfile>, sqlx::Error> {
    sqlx::query_as::<_, ArtistProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM artist_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Find-or-create for `GET /artists/me/profile`: first access materializes a
/// default profile with the username as stage name.
pub async fn ensure_profile(
    pool: &PgPool,
    user_id: Uuid,
    default_stage_name: &str,
) -> Result<ArtistProfile, sqlx::Error> {
    sqlx::query_as::<_, ArtistProfile>(&format!(
        r#"
        INSERT INTO artist_profiles (user_id, stage_name)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = artist_profiles.updated_at
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(default_stage_name)
    .fetch_one(pool)
    .await
}

/// Create (or re-verify) the artist profile from an approved verification
/// request, inside the approval transaction.
pub async fn create_verified_profile(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    stage_name: &str,
    bio: Option<&str>,
    avatar_url: Option<&str>,
    social_links: serde_json::Value,
    contact_email: Option<&str>,
) -> Result<ArtistProfile, sqlx::Error> {
    sqlx::query_as::<_, ArtistProfile>(&format!(
        r#"
        INSERT INTO artist_profiles (user_id, stage_name, bio, avatar_url, social_links, verified, contact_email)
        VALUES ($1, $2, $3, $4, $5, TRUE, $6)
        ON CONFLICT (user_id) DO UPDATE SET
            stage_name = EXCLUDED.stage_name,
            bio = COALESCE(EXCLUDED.bio, artist_profiles.bio),
            avatar_url = COALESCE(EXCLUDED.avatar_url, artist_profiles.avatar_url),
            social_links = EXCLUDED.social_links,
            verified = TRUE,
            contact_email = COALESCE(EXCLUDED.contact_email, artist_profiles.contact_email),
            updated_at = NOW()
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(stage_name)
    .bind(bio)
    .bind(avatar_url)
    .bind(social_links)
    .bind(contact_email)
    .fetch_one(&mut **tx)
    .await
}

pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    patch: ProfilePatch,
) -> Result<Option<ArtistProfile>, sqlx::Error> {
    sqlx::query_as::<_, ArtistProfile>(&format!(
        r#"
        UPDATE artist_profiles SET
            stage_name = COALESCE($2, stage_name),
            bio = COALESCE($3, bio),
            social_links = COALESCE($4, social_links),
            contact_email = COALESCE($5, contact_email),
            country = COALESCE($6, country),
            genres = COALESCE($7, genres),
            updated_at = NOW()
        WHERE user_id = $1
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(patch.stage_name)
    .bind(patch.bio)
    .bind(patch.social_links)
    .bind(patch.contact_email)
    .bind(patch.country)
    .bind(patch.genres)
    .fetch_optional(pool)
    .await
}

pub async fn set_avatar(
    pool: &PgPool,
    user_id: Uuid,
    url: &str,
) -> Result<Option<ArtistProfile>, sqlx::Error> {
    sqlx::query_as::<_, ArtistProfile>(&format!(
        r#"
        UPDATE artist_profiles SET avatar_url = $2, updated_at = NOW()
        WHERE user_id = $1
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(url)
    .fetch_optional(pool)
    .await
}

pub async fn set_cover(
    pool: &PgPool,
    user_id: Uuid,
    url: &str,
) -> Result<Option<ArtistProfile>, sqlx::Error> {
    sqlx::query_as::<_, ArtistProfile>(&format!(
        r#"
        UPDATE artist_profiles SET cover_url = $2, updated_at = NOW()
        WHERE user_id = $1
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(url)
    .fetch_optional(pool)
    .await
}

pub async fn is_following(
    pool: &PgPool,
    follower_id: Uuid,
    artist_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        "SELECT EXISTS(SELECT 1 FROM artist_follows WHERE follower_id = $1 AND artist_id = $2)",
    )
    .bind(follower_id)
    .bind(artist_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<bool, _>(0))
}

pub async fn follow(pool: &PgPool, follower_id: Uuid, artist_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO artist_follows (follower_id, artist_id)
        VALUES ($1, $2)
        ON CONFLICT (follower_id, artist_id) DO NOTHING
        "#,
    )
    .bind(follower_id)
    .bind(artist_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn unfollow(
    pool: &PgPool,
    follower_id: Uuid,
    artist_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM artist_follows WHERE follower_id = $1 AND artist_id = $2")
            .bind(follower_id)
            .bind(artist_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}

/// Adjust the denormalized follower counter, clamped at zero.
pub async fn adjust_followers(
    pool: &PgPool,
    artist_id: Uuid,
    delta: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE artist_profiles
        SET total_followers = GREATEST(total_followers + $2, 0), updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(artist_id)
    .bind(delta)
    .execute(pool)
    .await?;

    Ok(())
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{User, UserProfile};

/// Account listing row without credentials, for the admin surface.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub tier_code: String,
    pub created_at: DateTime<Utc>,
}

/// User joined with their profile, flattened for `GET /auth/me`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FlatProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub tier_code: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, username, email, password_hash, role, status, tier_code, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, role, status, tier_code, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, role, status, tier_code, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_accounts_by_role(
    pool: &PgPool,
    role: &str,
) -> Result<Vec<AccountSummary>, sqlx::Error> {
    sqlx::query_as::<_, AccountSummary>(
        r#"
        SELECT id, username, email, role, status, tier_code, created_at
        FROM users
        WHERE role = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(role)
    .fetch_all(pool)
    .await
}

/// Change the account role inside an open transaction (verification approval).
pub async fn set_role(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    role: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(role)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn create_profile(
    pool: &PgPool,
    user_id: Uuid,
    avatar_url: &str,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO user_profiles (user_id, avatar_url)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
        RETURNING id, user_id, avatar_url, bio, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(avatar_url)
    .fetch_one(pool)
    .await
}

pub async fn upsert_bio(
    pool: &PgPool,
    user_id: Uuid,
    bio: &str,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO user_profiles (user_id, bio)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET bio = EXCLUDED.bio, updated_at = NOW()
        RETURNING id, user_id, avatar_url, bio, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(bio)
    .fetch_one(pool)
    .await
}

pub async fn upsert_avatar(
    pool: &PgPool,
    user_id: Uuid,
    avatar_url: &str,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO user_profiles (user_id, avatar_url)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET avatar_url = EXCLUDED.avatar_url, updated_at = NOW()
        RETURNING id, user_id, avatar_url, bio, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(avatar_url)
    .fetch_one(pool)
    .await
}

pub async fn flat_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<FlatProfile>, sqlx::Error> {
    sqlx::query_as::<_, FlatProfile>(
        r#"
        SELECT u.id, u.username AS name, u.email, u.role, u.tier_code, p.bio, p.avatar_url
        FROM users u
        LEFT JOIN user_profiles p ON p.user_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Password-change verification codes: one outstanding 6-digit code per user.
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PasswordResetCode;

pub async fn upsert_code(
    pool: &PgPool,
    user_id: Uuid,
    code: &str,
    expires_at: DateTime<Utc>,
) -> Result<PasswordResetCode, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetCode>(
        r#"
        INSERT INTO password_reset_codes (user_id, code, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
            SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at, created_at = NOW()
        RETURNING id, user_id, code, expires_at, created_at
        "#,
    )
    .bind(user_id)
    .bind(code)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<PasswordResetCode>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetCode>(
        r#"
        SELECT id, user_id, code, expires_at, created_at
        FROM password_reset_codes
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM password_reset_codes WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

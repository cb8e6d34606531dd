use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::UserSubscription;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, tier_id, status, provider, provider_ref, \
     start_at, end_at, created_at, updated_at";

pub async fn find_by_provider_ref(
    pool: &PgPool,
    user_id: Uuid,
    provider: &str,
    provider_ref: &str,
) -> Result<Option<UserSubscription>, sqlx::Error> {
    sqlx::query_as::<_, UserSubscription>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM user_subscriptions
        WHERE user_id = $1 AND provider = $2 AND provider_ref = $3
        "#
    ))
    .bind(user_id)
    .bind(provider)
    .bind(provider_ref)
    .fetch_optional(pool)
    .await
}

/// The user's most recent active subscription, by start time.
pub async fn latest_active(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserSubscription>, sqlx::Error> {
    sqlx::query_as::<_, UserSubscription>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM user_subscriptions
        WHERE user_id = $1 AND status = 'active'
        ORDER BY start_at DESC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn mark_expired(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE user_subscriptions SET status = 'expired', updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Expire every currently-active subscription for the user (upgrade prologue).
pub async fn expire_active(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE user_subscriptions
        SET status = 'expired', end_at = $2, updated_at = NOW()
        WHERE user_id = $1 AND status = 'active'
        "#,
    )
    .bind(user_id)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn insert_active(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    tier_id: Uuid,
    provider: &str,
    provider_ref: Option<&str>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> Result<UserSubscription, sqlx::Error> {
    sqlx::query_as::<_, UserSubscription>(&format!(
        r#"
        INSERT INTO user_subscriptions (user_id, tier_id, status, provider, provider_ref, start_at, end_at)
        VALUES ($1, $2, 'active', $3, $4, $5, $6)
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(tier_id)
    .bind(provider)
    .bind(provider_ref)
    .bind(start_at)
    .bind(end_at)
    .fetch_one(&mut **tx)
    .await
}

/// Update the denormalized tier columns on the user row inside the upgrade
/// transaction.
pub async fn set_user_tier(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    tier_code: &str,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET tier_code = $2, status = $3, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(tier_code)
        .bind(status)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Same as [`set_user_tier`] but outside a transaction (lazy expiry path).
pub async fn set_user_tier_pool(
    pool: &PgPool,
    user_id: Uuid,
    tier_code: &str,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET tier_code = $2, status = $3, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(tier_code)
        .bind(status)
        .execute(pool)
        .await?;

    Ok(())
}

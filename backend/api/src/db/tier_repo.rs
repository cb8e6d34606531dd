use serde_json::json;
use sqlx::PgPool;

use crate::models::{Tier, FREE_TIER_CODE, PRO_TIER_CODE};

const TIER_COLUMNS: &str = "id, code, name, features, is_active, created_at, updated_at";

/// Feature set the free tier falls back to when no tier row applies.
pub fn free_features() -> serde_json::Value {
    json!({"max_playlists": 5, "offline": false})
}

fn pro_features() -> serde_json::Value {
    json!({"max_playlists": 1000, "offline": true})
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Tier>, sqlx::Error> {
    sqlx::query_as::<_, Tier>(&format!(
        "SELECT {TIER_COLUMNS} FROM tiers WHERE is_active = TRUE ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Tier>, sqlx::Error> {
    sqlx::query_as::<_, Tier>(&format!("SELECT {TIER_COLUMNS} FROM tiers WHERE code = $1"))
        .bind(code)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: uuid::Uuid) -> Result<Option<Tier>, sqlx::Error> {
    sqlx::query_as::<_, Tier>(&format!("SELECT {TIER_COLUMNS} FROM tiers WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Insert the free/pro defaults when missing. Idempotent.
pub async fn seed_defaults(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tiers (code, name, features)
        VALUES ($1, 'Free', $2), ($3, 'Pro', $4)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(FREE_TIER_CODE)
    .bind(free_features())
    .bind(PRO_TIER_CODE)
    .bind(pro_features())
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_fallback_features() {
        let features = free_features();
        assert_eq!(features["max_playlists"], 5);
        assert_eq!(features["offline"], false);
    }

    #[test]
    fn pro_features_allow_offline() {
        let features = pro_features();
        assert_eq!(features["max_playlists"], 1000);
        assert_eq!(features["offline"], true);
    }
}

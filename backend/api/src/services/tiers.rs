use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::tier_repo;
use crate::error::{AppError, Result};
use crate::models::FREE_TIER_CODE;

/// Feature lookups against the user's denormalized tier, with the free
/// defaults standing in when the tier row is missing or inactive.
#[derive(Clone)]
pub struct TierService {
    pool: PgPool,
}

impl TierService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn features_for_user(&self, user_id: Uuid) -> Result<(String, Value)> {
        let user = crate::db::user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(tier) = tier_repo::find_by_code(&self.pool, &user.tier_code)
            .await?
            .filter(|t| t.is_active)
        {
            return Ok((tier.code, tier.features));
        }

        Ok((FREE_TIER_CODE.to_string(), tier_repo::free_features()))
    }

    /// Playlist cap for the user's tier. Missing or malformed feature values
    /// fall back to the free limit.
    pub async fn playlist_limit(&self, user_id: Uuid) -> Result<(String, i64)> {
        let (code, features) = self.features_for_user(user_id).await?;
        let limit = max_playlists(&features);
        Ok((code, limit))
    }
}

fn max_playlists(features: &Value) -> i64 {
    features
        .get("max_playlists")
        .and_then(Value::as_i64)
        .unwrap_or_else(|| {
            tier_repo::free_features()["max_playlists"]
                .as_i64()
                .unwrap_or(5)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_limit_from_features() {
        assert_eq!(max_playlists(&json!({"max_playlists": 1000})), 1000);
    }

    #[test]
    fn malformed_features_fall_back_to_free_limit() {
        assert_eq!(max_playlists(&json!({})), 5);
        assert_eq!(max_playlists(&json!({"max_playlists": "many"})), 5);
    }
}

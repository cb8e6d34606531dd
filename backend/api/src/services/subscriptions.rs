/// Subscription upgrade and effective-tier resolution.
use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{subscription_repo, tier_repo};
use crate::error::{is_unique_violation, AppError, Result};
use crate::models::{Tier, UserSubscription, FREE_TIER_CODE, PRO_TIER_CODE};

const VALID_MONTHS: [u32; 3] = [1, 6, 12];
const DEFAULT_PROVIDER: &str = "vnpay";

/// Where the effective tier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierSource {
    Subscription,
    Denormalized,
    Fallback,
}

#[derive(Debug, Serialize)]
pub struct EffectiveTier {
    pub tier_code: String,
    pub features: serde_json::Value,
    pub source: TierSource,
    pub end_at: Option<DateTime<Utc>>,
    pub remaining_ms: Option<i64>,
}

pub struct UpgradeOutcome {
    pub subscription: UserSubscription,
    pub already_processed: bool,
}

#[derive(Clone)]
pub struct SubscriptionService {
    pool: PgPool,
}

impl SubscriptionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upgrade the user to pro for 1, 6 or 12 calendar months.
    ///
    /// Replayed payment references short-circuit to the existing subscription.
    /// The state transition (expire currently-active rows, insert the new one,
    /// refresh the user's denormalized tier) happens in one transaction; a
    /// unique-violation race on the payment reference also reports the replay.
    pub async fn upgrade(
        &self,
        user_id: Uuid,
        months: u32,
        provider: Option<&str>,
        provider_ref: Option<&str>,
    ) -> Result<UpgradeOutcome> {
        if !VALID_MONTHS.contains(&months) {
            return Err(AppError::BadRequest(
                "months must be 1, 6 or 12".to_string(),
            ));
        }

        let provider = provider.unwrap_or(DEFAULT_PROVIDER);

        if let Some(provider_ref) = provider_ref {
            if let Some(existing) = subscription_repo::find_by_provider_ref(
                &self.pool, user_id, provider, provider_ref,
            )
            .await?
            {
                return Ok(UpgradeOutcome {
                    subscription: existing,
                    already_processed: true,
                });
            }
        }

        let pro = match purchasable(tier_repo::find_by_code(&self.pool, PRO_TIER_CODE).await?) {
            Some(tier) => tier,
            None => {
                tier_repo::seed_defaults(&self.pool).await?;
                purchasable(tier_repo::find_by_code(&self.pool, PRO_TIER_CODE).await?)
                    .ok_or_else(|| AppError::Internal("pro tier missing after seed".to_string()))?
            }
        };

        let now = Utc::now();
        let end_at = add_months_clamped(now, months);

        let mut tx = self.pool.begin().await?;

        subscription_repo::expire_active(&mut tx, user_id, now).await?;

        let subscription = match subscription_repo::insert_active(
            &mut tx,
            user_id,
            pro.id,
            provider,
            provider_ref,
            now,
            end_at,
        )
        .await
        {
            Ok(subscription) => subscription,
            // Two replayed callbacks can race past the idempotency lookup;
            // the unique index on (user_id, provider, provider_ref) wins.
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                let existing = subscription_repo::find_by_provider_ref(
                    &self.pool,
                    user_id,
                    provider,
                    provider_ref.unwrap_or_default(),
                )
                .await?
                .ok_or(AppError::Conflict(
                    "Subscription already processed".to_string(),
                ))?;
                return Ok(UpgradeOutcome {
                    subscription: existing,
                    already_processed: true,
                });
            }
            Err(e) => return Err(e.into()),
        };

        subscription_repo::set_user_tier(&mut tx, user_id, PRO_TIER_CODE, "active").await?;

        tx.commit().await?;

        tracing::info!(%user_id, months, provider, "subscription upgraded");

        Ok(UpgradeOutcome {
            subscription,
            already_processed: false,
        })
    }

    /// Resolve the user's effective tier, expiring a lapsed subscription on
    /// the way (lazy expiry: the row flips to expired and the user's
    /// denormalized tier reverts to free before answering).
    pub async fn effective_tier(&self, user_id: Uuid) -> Result<EffectiveTier> {
        let now = Utc::now();

        if let Some(sub) = subscription_repo::latest_active(&self.pool, user_id).await? {
            match sub.end_at {
                Some(end_at) if end_at <= now => {
                    subscription_repo::mark_expired(&self.pool, sub.id).await?;
                    subscription_repo::set_user_tier_pool(
                        &self.pool,
                        user_id,
                        FREE_TIER_CODE,
                        "unactive",
                    )
                    .await?;
                    tracing::info!(%user_id, subscription_id = %sub.id, "subscription lazily expired");
                }
                _ => {
                    let tier = tier_repo::find_by_id(&self.pool, sub.tier_id).await?;

                    if let Some(tier) = tier.filter(|t| t.is_active) {
                        return Ok(EffectiveTier {
                            tier_code: tier.code,
                            features: tier.features,
                            source: TierSource::Subscription,
                            end_at: sub.end_at,
                            remaining_ms: sub
                                .end_at
                                .map(|e| (e - now).num_milliseconds().max(0)),
                        });
                    }
                }
            }
        }

        // No live subscription: trust the denormalized column when it maps to
        // an active tier, otherwise fall back to the free defaults.
        let user = crate::db::user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(tier) = tier_repo::find_by_code(&self.pool, &user.tier_code)
            .await?
            .filter(|t| t.is_active)
        {
            return Ok(EffectiveTier {
                tier_code: tier.code,
                features: tier.features,
                source: TierSource::Denormalized,
                end_at: None,
                remaining_ms: None,
            });
        }

        Ok(EffectiveTier {
            tier_code: FREE_TIER_CODE.to_string(),
            features: tier_repo::free_features(),
            source: TierSource::Fallback,
            end_at: None,
            remaining_ms: None,
        })
    }
}

/// Only active tiers can be bought; a deactivated pro row blocks the upgrade.
fn purchasable(tier: Option<Tier>) -> Option<Tier> {
    tier.filter(|t| t.is_active)
}

/// Calendar-month addition with day clamping (Jan 31 + 1 month = Feb 28/29).
pub fn add_months_clamped(start: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    start
        .checked_add_months(Months::new(months))
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn jan_31_clamps_to_feb_28() {
        assert_eq!(add_months_clamped(utc(2025, 1, 31), 1), utc(2025, 2, 28));
    }

    #[test]
    fn leap_year_keeps_feb_29() {
        assert_eq!(add_months_clamped(utc(2024, 1, 31), 1), utc(2024, 2, 29));
    }

    #[test]
    fn year_rollover() {
        assert_eq!(add_months_clamped(utc(2025, 8, 15), 6), utc(2026, 2, 15));
        assert_eq!(add_months_clamped(utc(2025, 3, 1), 12), utc(2026, 3, 1));
    }

    #[test]
    fn plain_months_are_untouched() {
        assert_eq!(add_months_clamped(utc(2025, 4, 10), 1), utc(2025, 5, 10));
    }

    fn tier_row(is_active: bool) -> Tier {
        let now = utc(2025, 1, 1);
        Tier {
            id: Uuid::new_v4(),
            code: PRO_TIER_CODE.to_string(),
            name: "Pro".to_string(),
            features: serde_json::json!({"max_playlists": 1000}),
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn deactivated_tier_cannot_be_purchased() {
        assert!(purchasable(Some(tier_row(false))).is_none());
        assert!(purchasable(None).is_none());
        assert!(purchasable(Some(tier_row(true))).is_some());
    }

    #[test]
    fn tier_source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(TierSource::Subscription).unwrap(),
            "subscription"
        );
        assert_eq!(
            serde_json::to_value(TierSource::Fallback).unwrap(),
            "fallback"
        );
    }
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::db::tier_repo;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::services::SubscriptionService;

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub months: u32,
    pub provider: Option<String>,
    pub provider_ref: Option<String>,
}

/// GET /api/v1/subscription/tiers — seeds the defaults when empty.
pub async fn list_tiers(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let mut tiers = tier_repo::list_active(pool.get_ref()).await?;
    if tiers.is_empty() {
        tier_repo::seed_defaults(pool.get_ref()).await?;
        tiers = tier_repo::list_active(pool.get_ref()).await?;
    }

    Ok(HttpResponse::Ok().json(tiers))
}

/// GET /api/v1/subscription/me — effective tier with lazy expiry.
pub async fn my_subscription(
    subscriptions: web::Data<SubscriptionService>,
    auth: AuthUser,
) -> Result<HttpResponse> {
    let effective = subscriptions.effective_tier(auth.id).await?;
    Ok(HttpResponse::Ok().json(effective))
}

/// POST /api/v1/subscription/upgrade
pub async fn upgrade(
    subscriptions: web::Data<SubscriptionService>,
    auth: AuthUser,
    payload: web::Json<UpgradeRequest>,
) -> Result<HttpResponse> {
    let outcome = subscriptions
        .upgrade(
            auth.id,
            payload.months,
            payload.provider.as_deref(),
            payload.provider_ref.as_deref(),
        )
        .await?;

    if outcome.already_processed {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "This payment has already been processed",
            "subscription": outcome.subscription,
        })));
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Subscription upgraded successfully",
        "subscription": outcome.subscription,
    })))
}

use sqlx::PgPool;

use crate::config::AdminSeedConfig;
use crate::db::user_repo;
use crate::error::Result;
use crate::models::{User, DEFAULT_AVATAR_URL, ROLE_ADMIN};
use crate::security::password;

pub enum SeedOutcome {
    Created(User),
    Promoted(User),
    AlreadyAdmin(User),
}

/// Find-or-create the bootstrap admin account. An existing account with the
/// configured email is promoted to admin instead of duplicated.
pub async fn ensure_admin(pool: &PgPool, config: &AdminSeedConfig) -> Result<SeedOutcome> {
    if let Some(user) = user_repo::find_by_email(pool, &config.email).await? {
        if user.role == ROLE_ADMIN {
            return Ok(SeedOutcome::AlreadyAdmin(user));
        }

        let promoted = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, role, status, tier_code, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(ROLE_ADMIN)
        .fetch_one(pool)
        .await?;

        return Ok(SeedOutcome::Promoted(promoted));
    }

    let hash = password::hash_password(&config.password)?;
    let user = user_repo::create_user(pool, "admin", &config.email, &hash).await?;
    user_repo::create_profile(pool, user.id, DEFAULT_AVATAR_URL).await?;

    let admin = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET role = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, username, email, password_hash, role, status, tier_code, created_at, updated_at
        "#,
    )
    .bind(user.id)
    .bind(ROLE_ADMIN)
    .fetch_one(pool)
    .await?;

    Ok(SeedOutcome::Created(admin))
}

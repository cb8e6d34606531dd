use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod album_repo;
pub mod artist_repo;
pub mod comment_repo;
pub mod favorite_repo;
pub mod folder_repo;
pub mod password_reset_repo;
pub mod playlist_repo;
pub mod report_repo;
pub mod song_repo;
pub mod subscription_repo;
pub mod tier_repo;
pub mod user_repo;
pub mod verification_repo;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}

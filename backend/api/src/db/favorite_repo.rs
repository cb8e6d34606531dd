use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Favorite, Song};

pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Favorite>, sqlx::Error> {
    sqlx::query_as::<_, Favorite>(
        r#"
        SELECT id, user_id, song_id, created_at
        FROM favorites
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_songs_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Song>, sqlx::Error> {
    sqlx::query_as::<_, Song>(
        r#"
        SELECT s.id, s.title, s.artist, s.artist_id, s.album_id, s.album, s.audio_url,
               s.image_url, s.duration, s.genre, s.lyrics, s.play_count, s.is_published,
               s.is_explicit, s.release_date, s.created_at, s.updated_at
        FROM favorites f
        JOIN songs s ON s.id = f.song_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Idempotent add: a duplicate returns the existing row.
pub async fn add(pool: &PgPool, user_id: Uuid, song_id: Uuid) -> Result<Favorite, sqlx::Error> {
    let inserted = sqlx::query_as::<_, Favorite>(
        r#"
        INSERT INTO favorites (user_id, song_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, song_id) DO NOTHING
        RETURNING id, user_id, song_id, created_at
        "#,
    )
    .bind(user_id)
    .bind(song_id)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(favorite) => Ok(favorite),
        None => sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, song_id, created_at FROM favorites WHERE user_id = $1 AND song_id = $2",
        )
        .bind(user_id)
        .bind(song_id)
        .fetch_one(pool)
        .await,
    }
}

pub async fn remove(pool: &PgPool, user_id: Uuid, song_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND song_id = $2")
        .bind(user_id)
        .bind(song_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Playlist, Song};

const PLAYLIST_COLUMNS: &str = "id, user_id, name, image_url, folder_id, created_at, updated_at";

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    folder_id: Option<Uuid>,
) -> Result<Playlist, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(&format!(
        r#"
        INSERT INTO playlists (user_id, name, folder_id)
        VALUES ($1, $2, $3)
        RETURNING {PLAYLIST_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(folder_id)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Playlist>, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Playlist>, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_folder(pool: &PgPool, folder_id: Uuid) -> Result<Vec<Playlist>, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE folder_id = $1 ORDER BY created_at DESC"
    ))
    .bind(folder_id)
    .fetch_all(pool)
    .await
}

pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM playlists WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get::<i64, _>("count"))
}

pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Playlist, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(&format!(
        r#"
        UPDATE playlists SET name = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {PLAYLIST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn set_folder(
    pool: &PgPool,
    id: Uuid,
    folder_id: Option<Uuid>,
) -> Result<Playlist, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(&format!(
        r#"
        UPDATE playlists SET folder_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {PLAYLIST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(folder_id)
    .fetch_one(pool)
    .await
}

pub async fn set_image(pool: &PgPool, id: Uuid, image_url: &str) -> Result<Playlist, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(&format!(
        r#"
        UPDATE playlists SET image_url = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {PLAYLIST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(image_url)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn songs_of(pool: &PgPool, playlist_id: Uuid) -> Result<Vec<Song>, sqlx::Error> {
    sqlx::query_as::<_, Song>(
        r#"
        SELECT s.id, s.title, s.artist, s.artist_id, s.album_id, s.album, s.audio_url,
               s.image_url, s.duration, s.genre, s.lyrics, s.play_count, s.is_published,
               s.is_explicit, s.release_date, s.created_at, s.updated_at
        FROM playlist_songs ps
        JOIN songs s ON s.id = ps.song_id
        WHERE ps.playlist_id = $1
        ORDER BY ps.created_at ASC
        "#,
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await
}

/// Idempotent insert into the join table; 0 rows means it was already there.
pub async fn add_song(pool: &PgPool, playlist_id: Uuid, song_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO playlist_songs (playlist_id, song_id)
        VALUES ($1, $2)
        ON CONFLICT (playlist_id, song_id) DO NOTHING
        "#,
    )
    .bind(playlist_id)
    .bind(song_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn remove_song(
    pool: &PgPool,
    playlist_id: Uuid,
    song_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = $1 AND song_id = $2")
            .bind(playlist_id)
            .bind(song_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}

use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::Song;

const SONG_COLUMNS: &str = "id, title, artist, artist_id, album_id, album, audio_url, image_url, \
     duration, genre, lyrics, play_count, is_published, is_explicit, release_date, \
     created_at, updated_at";

/// Field set for inserting a song. Optional metadata stays NULL when absent.
#[derive(Debug, Default)]
pub struct NewSong<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub artist_id: Option<Uuid>,
    pub album_id: Option<Uuid>,
    pub album: Option<&'a str>,
    pub audio_url: &'a str,
    pub image_url: Option<&'a str>,
    pub duration: i32,
    pub genre: Option<&'a str>,
    pub lyrics: Option<&'a str>,
    pub is_published: bool,
    pub is_explicit: bool,
    pub release_date: Option<NaiveDate>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct SongPatch {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_id: Option<Option<Uuid>>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub genre: Option<String>,
    pub lyrics: Option<String>,
    pub is_published: Option<bool>,
    pub is_explicit: Option<bool>,
    pub release_date: Option<NaiveDate>,
}

pub async fn create(pool: &PgPool, song: NewSong<'_>) -> Result<Song, sqlx::Error> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        INSERT INTO songs (title, artist, artist_id, album_id, album, audio_url, image_url,
                           duration, genre, lyrics, is_published, is_explicit, release_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {SONG_COLUMNS}
        "#
    ))
    .bind(song.title)
    .bind(song.artist)
    .bind(song.artist_id)
    .bind(song.album_id)
    .bind(song.album)
    .bind(song.audio_url)
    .bind(song.image_url)
    .bind(song.duration)
    .bind(song.genre)
    .bind(song.lyrics)
    .bind(song.is_published)
    .bind(song.is_explicit)
    .bind(song.release_date)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Song>, sqlx::Error> {
    sqlx::query_as::<_, Song>(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_published(
    pool: &PgPool,
    genre: Option<&str>,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Song>, sqlx::Error> {
    let search_pattern = search.map(|s| format!("%{}%", s));

    sqlx::query_as::<_, Song>(&format!(
        r#"
        SELECT {SONG_COLUMNS}
        FROM songs
        WHERE is_published = TRUE
          AND ($1::text IS NULL OR genre = $1)
          AND ($2::text IS NULL OR title ILIKE $2 OR artist ILIKE $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(genre)
    .bind(search_pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_published(
    pool: &PgPool,
    genre: Option<&str>,
    search: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let search_pattern = search.map(|s| format!("%{}%", s));

    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS count
        FROM songs
        WHERE is_published = TRUE
          AND ($1::text IS NULL OR genre = $1)
          AND ($2::text IS NULL OR title ILIKE $2 OR artist ILIKE $2)
        "#,
    )
    .bind(genre)
    .bind(search_pattern)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Bump the play counter; `None` when the song does not exist.
pub async fn increment_play_count(pool: &PgPool, id: Uuid) -> Result<Option<i64>, sqlx::Error> {
    let row = sqlx::query(
        "UPDATE songs SET play_count = play_count + 1, updated_at = NOW() WHERE id = $1 RETURNING play_count",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get::<i64, _>("play_count")))
}

pub async fn update(pool: &PgPool, id: Uuid, patch: SongPatch) -> Result<Option<Song>, sqlx::Error> {
    // album_id uses a sentinel pair so the patch can distinguish "leave alone"
    // from "detach" (set NULL).
    let (set_album_id, album_id) = match patch.album_id {
        Some(value) => (true, value),
        None => (false, None),
    };

    sqlx::query_as::<_, Song>(&format!(
        r#"
        UPDATE songs SET
            title = COALESCE($2, title),
            artist = COALESCE($3, artist),
            album = COALESCE($4, album),
            album_id = CASE WHEN $5 THEN $6 ELSE album_id END,
            audio_url = COALESCE($7, audio_url),
            image_url = COALESCE($8, image_url),
            genre = COALESCE($9, genre),
            lyrics = COALESCE($10, lyrics),
            is_published = COALESCE($11, is_published),
            is_explicit = COALESCE($12, is_explicit),
            release_date = COALESCE($13, release_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {SONG_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(patch.title)
    .bind(patch.artist)
    .bind(patch.album)
    .bind(set_album_id)
    .bind(album_id)
    .bind(patch.audio_url)
    .bind(patch.image_url)
    .bind(patch.genre)
    .bind(patch.lyrics)
    .bind(patch.is_published)
    .bind(patch.is_explicit)
    .bind(patch.release_date)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM songs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn list_by_artist(
    pool: &PgPool,
    artist_id: Uuid,
    include_hidden: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Song>, sqlx::Error> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        SELECT {SONG_COLUMNS}
        FROM songs
        WHERE artist_id = $1 AND ($2 OR is_published = TRUE)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(artist_id)
    .bind(include_hidden)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_by_artist(
    pool: &PgPool,
    artist_id: Uuid,
    include_hidden: bool,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count FROM songs WHERE artist_id = $1 AND ($2 OR is_published = TRUE)",
    )
    .bind(artist_id)
    .bind(include_hidden)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count"))
}

pub async fn sum_plays_by_artist(pool: &PgPool, artist_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COALESCE(SUM(play_count), 0)::BIGINT AS total FROM songs WHERE artist_id = $1",
    )
    .bind(artist_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("total"))
}

pub async fn list_by_album(
    pool: &PgPool,
    album_id: Uuid,
    published_only: bool,
) -> Result<Vec<Song>, sqlx::Error> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        SELECT {SONG_COLUMNS}
        FROM songs
        WHERE album_id = $1 AND (NOT $2 OR is_published = TRUE)
        ORDER BY created_at ASC
        "#
    ))
    .bind(album_id)
    .bind(published_only)
    .fetch_all(pool)
    .await
}

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::models::Album;

const ALBUM_COLUMNS: &str = "id, artist_id, title, description, cover_url, release_date, genre, \
     total_tracks, total_duration, total_plays, is_published, album_type, created_at, updated_at";

#[derive(Debug, Default)]
pub struct NewAlbum<'a> {
    pub artist_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub cover_url: Option<&'a str>,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<&'a str>,
    pub album_type: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct AlbumPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<String>,
    pub is_published: Option<bool>,
    pub album_type: Option<String>,
}

pub async fn create(pool: &PgPool, album: NewAlbum<'_>) -> Result<Album, sqlx::Error> {
    sqlx::query_as::<_, Album>(&format!(
        r#"
        INSERT INTO albums (artist_id, title, description, cover_url, release_date, genre, album_type)
        VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'album'))
        RETURNING {ALBUM_COLUMNS}
        "#
    ))
    .bind(album.artist_id)
    .bind(album.title)
    .bind(album.description)
    .bind(album.cover_url)
    .bind(album.release_date)
    .bind(album.genre)
    .bind(album.album_type)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Album>, sqlx::Error> {
    sqlx::query_as::<_, Album>(&format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: AlbumPatch,
) -> Result<Option<Album>, sqlx::Error> {
    sqlx::query_as::<_, Album>(&format!(
        r#"
        UPDATE albums SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            cover_url = COALESCE($4, cover_url),
            release_date = COALESCE($5, release_date),
            genre = COALESCE($6, genre),
            is_published = COALESCE($7, is_published),
            album_type = COALESCE($8, album_type),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {ALBUM_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(patch.title)
    .bind(patch.description)
    .bind(patch.cover_url)
    .bind(patch.release_date)
    .bind(patch.genre)
    .bind(patch.is_published)
    .bind(patch.album_type)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_artist(
    pool: &PgPool,
    artist_id: Uuid,
    include_unpublished: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Album>, sqlx::Error> {
    sqlx::query_as::<_, Album>(&format!(
        r#"
        SELECT {ALBUM_COLUMNS}
        FROM albums
        WHERE artist_id = $1 AND ($2 OR is_published = TRUE)
        ORDER BY release_date DESC NULLS LAST, created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(artist_id)
    .bind(include_unpublished)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_by_artist(
    pool: &PgPool,
    artist_id: Uuid,
    include_unpublished: bool,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count FROM albums WHERE artist_id = $1 AND ($2 OR is_published = TRUE)",
    )
    .bind(artist_id)
    .bind(include_unpublished)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Adjust the denormalized track counter, clamped at zero.
pub async fn adjust_total_tracks(
    pool: &PgPool,
    album_id: Uuid,
    delta: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE albums SET total_tracks = GREATEST(total_tracks + $2, 0), updated_at = NOW() WHERE id = $1",
    )
    .bind(album_id)
    .bind(delta)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete an album inside a transaction: songs detach rather than delete.
pub async fn delete_with_detach(
    tx: &mut Transaction<'_, Postgres>,
    album_id: Uuid,
) -> Result<u64, sqlx::Error> {
    sqlx::query("UPDATE songs SET album_id = NULL, updated_at = NOW() WHERE album_id = $1")
        .bind(album_id)
        .execute(&mut **tx)
        .await?;

    let result = sqlx::query("DELETE FROM albums WHERE id = $1")
        .bind(album_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::song_repo;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::services::storage::{SONG_AUDIO_PREFIX, SONG_COVER_PREFIX};
use crate::services::StorageService;
use crate::utils::multipart::collect_form;
use crate::utils::pagination::{offset, PageEnvelope, PageQuery};

const DEFAULT_SONG_PAGE_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct SongListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub genre: Option<String>,
    pub search: Option<String>,
}

/// GET /api/v1/songs — published catalog, newest first.
pub async fn list_songs(
    pool: web::Data<PgPool>,
    query: web::Query<SongListQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_SONG_PAGE_LIMIT);
    let genre = query.genre.as_deref().filter(|g| !g.is_empty());
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    let items =
        song_repo::list_published(pool.get_ref(), genre, search, limit, offset(page, limit))
            .await?;
    let total = song_repo::count_published(pool.get_ref(), genre, search).await?;

    Ok(HttpResponse::Ok().json(PageEnvelope::new(items, page, limit, total)))
}

/// GET /api/v1/songs/{id}
pub async fn get_song(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let song = song_repo::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;

    Ok(HttpResponse::Ok().json(song))
}

/// POST /api/v1/songs/{id}/play — public play counter.
pub async fn register_play(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let play_count = song_repo::increment_play_count(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "play_count": play_count })))
}

/// POST /api/v1/songs/upload (admin, multipart)
pub async fn upload_song(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = collect_form(payload).await?;

    let title = form
        .field("title")
        .ok_or_else(|| AppError::BadRequest("Title and artist are required".to_string()))?
        .to_string();
    let artist = form
        .field("artist")
        .ok_or_else(|| AppError::BadRequest("Title and artist are required".to_string()))?
        .to_string();
    let album = form.field("album").map(str::to_string);

    let audio_url = match form.file("audio") {
        Some(part) => {
            storage
                .upload(
                    SONG_AUDIO_PREFIX,
                    &part.filename,
                    &part.content_type,
                    part.data.clone(),
                )
                .await?
        }
        None => return Err(AppError::BadRequest("Audio file is required".to_string())),
    };

    let image_url = match form.file("image") {
        Some(part) => Some(
            storage
                .upload(
                    SONG_COVER_PREFIX,
                    &part.filename,
                    &part.content_type,
                    part.data.clone(),
                )
                .await?,
        ),
        None => None,
    };

    let song = song_repo::create(
        pool.get_ref(),
        song_repo::NewSong {
            title: &title,
            artist: &artist,
            artist_id: None,
            album_id: None,
            album: album.as_deref(),
            audio_url: &audio_url,
            image_url: image_url.as_deref(),
            duration: 0,
            genre: form.field("genre"),
            lyrics: None,
            is_published: true,
            is_explicit: false,
            release_date: None,
        },
    )
    .await?;

    tracing::info!(song_id = %song.id, title = %song.title, "song uploaded");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Song uploaded successfully",
        "song": song,
    })))
}

/// PUT /api/v1/songs/{id} (admin, multipart partial update)
pub async fn update_song(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    auth.require_admin()?;

    let id = path.into_inner();
    let form = collect_form(payload).await?;

    let mut patch = song_repo::SongPatch::default();
    patch.title = form.field("title").map(str::to_string);
    patch.artist = form.field("artist").map(str::to_string);
    patch.album = form.field("album").map(str::to_string);
    patch.genre = form.field("genre").map(str::to_string);

    if let Some(part) = form.file("audio") {
        patch.audio_url = Some(
            storage
                .upload(
                    SONG_AUDIO_PREFIX,
                    &part.filename,
                    &part.content_type,
                    part.data.clone(),
                )
                .await?,
        );
    }
    if let Some(part) = form.file("image") {
        patch.image_url = Some(
            storage
                .upload(
                    SONG_COVER_PREFIX,
                    &part.filename,
                    &part.content_type,
                    part.data.clone(),
                )
                .await?,
        );
    }

    let song = song_repo::update(pool.get_ref(), id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Song updated successfully",
        "song": song,
    })))
}

/// DELETE /api/v1/songs/{id} (admin)
pub async fn delete_song(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    auth.require_admin()?;

    let deleted = song_repo::delete(pool.get_ref(), path.into_inner()).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Song not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Song deleted successfully",
    })))
}

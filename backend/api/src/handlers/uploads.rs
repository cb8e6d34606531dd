use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::db::{song_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::services::storage::{AVATAR_PREFIX, SONG_AUDIO_PREFIX, SONG_COVER_PREFIX};
use crate::services::StorageService;
use crate::utils::multipart::collect_form;

/// POST /api/v1/upload/song — authenticated pass-through upload.
pub async fn upload_song(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    _auth: AuthUser,
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

    let audio = form
        .file("audio")
        .ok_or_else(|| AppError::BadRequest("Audio file is required".to_string()))?;

    let audio_url = storage
        .upload(
            SONG_AUDIO_PREFIX,
            &audio.filename,
            &audio.content_type,
            audio.data.clone(),
        )
        .await?;

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
            album: form.field("album"),
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

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Song uploaded successfully",
        "song": song,
        "audio_url": audio_url,
        "image_url": image_url,
    })))
}

/// POST /api/v1/upload/avatar — stores and saves the caller's avatar.
pub async fn upload_avatar(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    auth: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = collect_form(payload).await?;

    let part = form
        .file("avatar")
        .ok_or_else(|| AppError::BadRequest("Avatar file is required".to_string()))?;

    let avatar_url = storage
        .upload(
            AVATAR_PREFIX,
            &part.filename,
            &part.content_type,
            part.data.clone(),
        )
        .await?;

    user_repo::upsert_avatar(pool.get_ref(), auth.id, &avatar_url).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Avatar uploaded successfully",
        "avatar_url": avatar_url,
    })))
}

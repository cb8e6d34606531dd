use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{folder_repo, playlist_repo, song_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Playlist, Song};
use crate::services::storage::PLAYLIST_COVER_PREFIX;
use crate::services::{StorageService, TierService};
use crate::utils::multipart::collect_form;

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    #[serde(default)]
    pub folder_id: Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub folder_id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistWithSongs {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub songs: Vec<Song>,
}

/// Clients send folder ids as null, empty string or zero to mean "root".
fn normalize_folder_id(value: &Value) -> Result<Option<Uuid>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() || s == "0" => Ok(None),
        Value::String(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| AppError::BadRequest("Invalid folder id".to_string())),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(None),
        _ => Err(AppError::BadRequest("Invalid folder id".to_string())),
    }
}

async fn owned_playlist(pool: &PgPool, id: Uuid, auth: &AuthUser) -> Result<Playlist> {
    let playlist = playlist_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

    if playlist.user_id != auth.id {
        return Err(AppError::Authorization(
            "You do not own this playlist".to_string(),
        ));
    }

    Ok(playlist)
}

async fn check_folder_ownership(pool: &PgPool, folder_id: Uuid, auth: &AuthUser) -> Result<()> {
    let folder = folder_repo::find_by_id(pool, folder_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Folder not found".to_string()))?;

    if folder.user_id != auth.id {
        return Err(AppError::Authorization(
            "You do not own this folder".to_string(),
        ));
    }

    Ok(())
}

/// POST /api/v1/playlists — tier-capped creation.
pub async fn create_playlist(
    pool: web::Data<PgPool>,
    tiers: web::Data<TierService>,
    auth: AuthUser,
    payload: web::Json<CreatePlaylistRequest>,
) -> Result<HttpResponse> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    let folder_id = normalize_folder_id(&payload.folder_id)?;
    if let Some(folder_id) = folder_id {
        check_folder_ownership(pool.get_ref(), folder_id, &auth).await?;
    }

    // The cap reads the database tier, never the JWT claim.
    let (tier, max_playlists) = tiers.playlist_limit(auth.id).await?;
    let current_count = playlist_repo::count_by_user(pool.get_ref(), auth.id).await?;

    if current_count >= max_playlists {
        tracing::info!(user_id = %auth.id, %tier, current_count, "playlist cap reached");
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "message": "Playlist limit reached for your tier",
            "tier": tier,
            "current_count": current_count,
            "max_playlists": max_playlists,
        })));
    }

    let playlist =
        playlist_repo::create(pool.get_ref(), auth.id, payload.name.trim(), folder_id).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Playlist created successfully",
        "playlist": playlist,
    })))
}

/// GET /api/v1/playlists/me — the caller's playlists with their songs.
pub async fn my_playlists(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse> {
    let playlists = playlist_repo::list_by_user(pool.get_ref(), auth.id).await?;

    let mut out = Vec::with_capacity(playlists.len());
    for playlist in playlists {
        let songs = playlist_repo::songs_of(pool.get_ref(), playlist.id).await?;
        out.push(PlaylistWithSongs { playlist, songs });
    }

    Ok(HttpResponse::Ok().json(out))
}

/// PUT /api/v1/playlists/{id}
pub async fn update_playlist(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: web::Json<UpdatePlaylistRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let mut playlist = owned_playlist(pool.get_ref(), id, &auth).await?;

    if let Some(name) = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        playlist = playlist_repo::rename(pool.get_ref(), id, name).await?;
    }

    if let Some(raw) = &payload.folder_id {
        let folder_id = normalize_folder_id(raw)?;
        if let Some(folder_id) = folder_id {
            check_folder_ownership(pool.get_ref(), folder_id, &auth).await?;
        }
        playlist = playlist_repo::set_folder(pool.get_ref(), id, folder_id).await?;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Playlist updated successfully",
        "playlist": playlist,
    })))
}

/// PUT /api/v1/playlists/{id}/image (multipart `image`)
pub async fn set_playlist_image(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_playlist(pool.get_ref(), id, &auth).await?;

    let form = collect_form(payload).await?;
    let part = form
        .file("image")
        .ok_or_else(|| AppError::BadRequest("Image file is required".to_string()))?;

    let image_url = storage
        .upload(
            PLAYLIST_COVER_PREFIX,
            &part.filename,
            &part.content_type,
            part.data.clone(),
        )
        .await?;

    playlist_repo::set_image(pool.get_ref(), id, &image_url).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Playlist image updated successfully",
        "image_url": image_url,
    })))
}

/// DELETE /api/v1/playlists/{id}
pub async fn delete_playlist(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_playlist(pool.get_ref(), id, &auth).await?;

    playlist_repo::delete(pool.get_ref(), id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Playlist deleted successfully",
    })))
}

/// GET /api/v1/playlists/{id}/songs
pub async fn playlist_songs(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_playlist(pool.get_ref(), id, &auth).await?;

    let songs = playlist_repo::songs_of(pool.get_ref(), id).await?;

    Ok(HttpResponse::Ok().json(songs))
}

/// POST /api/v1/playlists/{playlist_id}/songs/{song_id}
pub async fn add_song_to_playlist(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (playlist_id, song_id) = path.into_inner();
    owned_playlist(pool.get_ref(), playlist_id, &auth).await?;

    if song_repo::find_by_id(pool.get_ref(), song_id).await?.is_none() {
        return Err(AppError::NotFound("Song not found".to_string()));
    }

    let inserted = playlist_repo::add_song(pool.get_ref(), playlist_id, song_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": if inserted > 0 {
            "Song added to playlist"
        } else {
            "Song is already in the playlist"
        },
    })))
}

/// DELETE /api/v1/playlists/{playlist_id}/songs/{song_id}
pub async fn remove_song_from_playlist(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (playlist_id, song_id) = path.into_inner();
    owned_playlist(pool.get_ref(), playlist_id, &auth).await?;

    let removed = playlist_repo::remove_song(pool.get_ref(), playlist_id, song_id).await?;
    if removed == 0 {
        return Err(AppError::NotFound(
            "Song is not in the playlist".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Song removed from playlist",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn folder_id_normalization() {
        assert_eq!(normalize_folder_id(&Value::Null).unwrap(), None);
        assert_eq!(normalize_folder_id(&json!("")).unwrap(), None);
        assert_eq!(normalize_folder_id(&json!("0")).unwrap(), None);
        assert_eq!(normalize_folder_id(&json!(0)).unwrap(), None);

        let id = Uuid::new_v4();
        assert_eq!(
            normalize_folder_id(&json!(id.to_string())).unwrap(),
            Some(id)
        );
        assert!(normalize_folder_id(&json!("not-a-uuid")).is_err());
        assert!(normalize_folder_id(&json!(7)).is_err());
    }
}

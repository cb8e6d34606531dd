use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{favorite_repo, song_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub song_id: Uuid,
}

/// GET /api/v1/favorites
pub async fn list_favorites(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse> {
    let favorites = favorite_repo::list_by_user(pool.get_ref(), auth.id).await?;
    Ok(HttpResponse::Ok().json(favorites))
}

/// GET /api/v1/favorites/songs — full song objects.
pub async fn favorite_songs(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse> {
    let songs = favorite_repo::list_songs_by_user(pool.get_ref(), auth.id).await?;
    Ok(HttpResponse::Ok().json(songs))
}

/// POST /api/v1/favorites — idempotent add.
pub async fn add_favorite(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    payload: web::Json<AddFavoriteRequest>,
) -> Result<HttpResponse> {
    if song_repo::find_by_id(pool.get_ref(), payload.song_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Song not found".to_string()));
    }

    let favorite = favorite_repo::add(pool.get_ref(), auth.id, payload.song_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Song added to favorites",
        "favorite": favorite,
    })))
}

/// DELETE /api/v1/favorites/{song_id}
pub async fn remove_favorite(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let removed = favorite_repo::remove(pool.get_ref(), auth.id, path.into_inner()).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Song is not in favorites".to_string()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Song removed from favorites",
    })))
}

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{album_repo, artist_repo, song_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{Song, ROLE_ARTIST};
use crate::services::storage::{
    ARTIST_AVATAR_PREFIX, ARTIST_COVER_PREFIX, SONG_AUDIO_PREFIX, SONG_COVER_PREFIX,
};
use crate::services::StorageService;
use crate::utils::multipart::{collect_form, CollectedForm};
use crate::utils::pagination::{offset, PageEnvelope, PageQuery};

const DEFAULT_ARTIST_PAGE_LIMIT: i64 = 20;

/// Distinguishes an absent JSON field from an explicit `null`.
fn double_option<'de, T, D>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MySongsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub include_hidden: bool,
}

#[derive(Debug, Deserialize)]
pub struct MyAlbumsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub include_unpublished: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArtistProfileRequest {
    pub stage_name: Option<String>,
    pub bio: Option<String>,
    pub social_links: Option<serde_json::Value>,
    pub contact_email: Option<String>,
    pub country: Option<String>,
    pub genres: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArtistSongRequest {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub lyrics: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub album_id: Option<Option<Uuid>>,
    pub release_date: Option<NaiveDate>,
    pub is_explicit: Option<bool>,
    pub is_published: Option<bool>,
}

/// GET /api/v1/artists — public listing, newest first.
pub async fn list_artists(
    pool: web::Data<PgPool>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_ARTIST_PAGE_LIMIT);

    let items = artist_repo::list_artists(pool.get_ref(), limit, offset(page, limit)).await?;
    let total = artist_repo::count_artists(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(PageEnvelope::new(items, page, limit, total)))
}

/// GET /api/v1/artists/{id} — public detail with counts and follow state.
pub async fn get_artist(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    maybe_auth: MaybeAuthUser,
) -> Result<HttpResponse> {
    let artist_id = path.into_inner();

    let user = user_repo::find_by_id(pool.get_ref(), artist_id)
        .await?
        .filter(|u| u.role == ROLE_ARTIST)
        .ok_or_else(|| AppError::NotFound("Artist not found".to_string()))?;

    let profile = artist_repo::get_profile(pool.get_ref(), artist_id).await?;

    let song_count = song_repo::count_by_artist(pool.get_ref(), artist_id, false).await?;
    let album_count = album_repo::count_by_artist(pool.get_ref(), artist_id, false).await?;

    let is_following = match maybe_auth.0 {
        Some(auth) => artist_repo::is_following(pool.get_ref(), auth.id, artist_id).await?,
        None => false,
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "created_at": user.created_at,
        "profile": profile,
        "song_count": song_count,
        "album_count": album_count,
        "is_following": is_following,
    })))
}

/// GET /api/v1/artists/{id}/songs — published only.
pub async fn artist_songs(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let artist_id = path.into_inner();
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_ARTIST_PAGE_LIMIT);

    let items =
        song_repo::list_by_artist(pool.get_ref(), artist_id, false, limit, offset(page, limit))
            .await?;
    let total = song_repo::count_by_artist(pool.get_ref(), artist_id, false).await?;

    Ok(HttpResponse::Ok().json(PageEnvelope::new(items, page, limit, total)))
}

/// GET /api/v1/artists/{id}/albums — published only, by release date.
pub async fn artist_albums(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let artist_id = path.into_inner();
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_ARTIST_PAGE_LIMIT);

    let items =
        album_repo::list_by_artist(pool.get_ref(), artist_id, false, limit, offset(page, limit))
            .await?;
    let total = album_repo::count_by_artist(pool.get_ref(), artist_id, false).await?;

    Ok(HttpResponse::Ok().json(PageEnvelope::new(items, page, limit, total)))
}

/// POST /api/v1/artists/{id}/follow — toggle.
pub async fn toggle_follow(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let artist_id = path.into_inner();

    if artist_id == auth.id {
        return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
    }

    user_repo::find_by_id(pool.get_ref(), artist_id)
        .await?
        .filter(|u| u.role == ROLE_ARTIST)
        .ok_or_else(|| AppError::NotFound("Artist not found".to_string()))?;

    if artist_repo::is_following(pool.get_ref(), auth.id, artist_id).await? {
        artist_repo::unfollow(pool.get_ref(), auth.id, artist_id).await?;
        artist_repo::adjust_followers(pool.get_ref(), artist_id, -1).await?;

        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Unfollowed successfully",
            "is_following": false,
        })))
    } else {
        artist_repo::follow(pool.get_ref(), auth.id, artist_id).await?;
        artist_repo::adjust_followers(pool.get_ref(), artist_id, 1).await?;

        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Followed successfully",
            "is_following": true,
        })))
    }
}

/// GET /api/v1/artists/me/profile — first access creates the profile.
pub async fn my_profile(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse> {
    let user = user_repo::find_by_id(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let profile = artist_repo::ensure_profile(pool.get_ref(), auth.id, &user.username).await?;

    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/v1/artists/me/profile
pub async fn update_my_profile(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    payload: web::Json<UpdateArtistProfileRequest>,
) -> Result<HttpResponse> {
    let user = user_repo::find_by_id(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Materialize the profile before patching it.
    artist_repo::ensure_profile(pool.get_ref(), auth.id, &user.username).await?;

    let payload = payload.into_inner();
    let profile = artist_repo::update_profile(
        pool.get_ref(),
        auth.id,
        artist_repo::ProfilePatch {
            stage_name: payload.stage_name,
            bio: payload.bio,
            social_links: payload.social_links,
            contact_email: payload.contact_email,
            country: payload.country,
            genres: payload.genres,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Artist profile not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Profile updated successfully",
        "profile": profile,
    })))
}

/// POST /api/v1/artists/me/image/{type} — avatar or cover upload.
pub async fn upload_image(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let image_type = path.into_inner();
    if image_type != "avatar" && image_type != "cover" {
        return Err(AppError::BadRequest(
            "Image type must be avatar or cover".to_string(),
        ));
    }

    let form = collect_form(payload).await?;
    let part = form
        .file("image")
        .ok_or_else(|| AppError::BadRequest("Image file is required".to_string()))?;

    let user = user_repo::find_by_id(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    artist_repo::ensure_profile(pool.get_ref(), auth.id, &user.username).await?;

    let prefix = if image_type == "avatar" {
        ARTIST_AVATAR_PREFIX
    } else {
        ARTIST_COVER_PREFIX
    };

    let url = storage
        .upload(prefix, &part.filename, &part.content_type, part.data.clone())
        .await?;

    let profile = if image_type == "avatar" {
        artist_repo::set_avatar(pool.get_ref(), auth.id, &url).await?
    } else {
        artist_repo::set_cover(pool.get_ref(), auth.id, &url).await?
    }
    .ok_or_else(|| AppError::NotFound("Artist profile not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Image uploaded successfully",
        "url": url,
        "profile": profile,
    })))
}

/// GET /api/v1/artists/me/songs
pub async fn my_songs(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    query: web::Query<MySongsQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_ARTIST_PAGE_LIMIT);

    let items = song_repo::list_by_artist(
        pool.get_ref(),
        auth.id,
        query.include_hidden,
        limit,
        offset(page, limit),
    )
    .await?;
    let total = song_repo::count_by_artist(pool.get_ref(), auth.id, query.include_hidden).await?;

    Ok(HttpResponse::Ok().json(PageEnvelope::new(items, page, limit, total)))
}

fn parse_release_date(form: &CollectedForm) -> Result<Option<NaiveDate>> {
    match form.field("release_date") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest("Invalid release date".to_string())),
        None => Ok(None),
    }
}

/// POST /api/v1/artists/me/songs (multipart, `audio` required)
pub async fn upload_my_song(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    auth: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = collect_form(payload).await?;

    let title = form
        .field("title")
        .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?
        .to_string();

    let audio = form
        .file("audio")
        .ok_or_else(|| AppError::BadRequest("Audio file is required".to_string()))?;

    let user = user_repo::find_by_id(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Display name comes from the stage name when the profile has one.
    let artist_name = artist_repo::get_profile(pool.get_ref(), auth.id)
        .await?
        .map(|p| p.stage_name)
        .unwrap_or_else(|| user.username.clone());

    let album_id = match form.field("album_id") {
        Some(raw) => {
            let id = Uuid::parse_str(raw)
                .map_err(|_| AppError::BadRequest("Invalid album id".to_string()))?;
            let album = album_repo::find_by_id(pool.get_ref(), id)
                .await?
                .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;
            if album.artist_id != auth.id {
                return Err(AppError::Authorization(
                    "You do not own this album".to_string(),
                ));
            }
            Some(id)
        }
        None => None,
    };

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

    let release_date = parse_release_date(&form)?;
    let is_explicit = form.field("is_explicit") == Some("true");

    let song = song_repo::create(
        pool.get_ref(),
        song_repo::NewSong {
            title: &title,
            artist: &artist_name,
            artist_id: Some(auth.id),
            album_id,
            album: None,
            audio_url: &audio_url,
            image_url: image_url.as_deref(),
            duration: 0,
            genre: form.field("genre"),
            lyrics: form.field("lyrics"),
            is_published: true,
            is_explicit,
            release_date,
        },
    )
    .await?;

    if let Some(album_id) = album_id {
        album_repo::adjust_total_tracks(pool.get_ref(), album_id, 1).await?;
    }

    tracing::info!(artist_id = %auth.id, song_id = %song.id, "artist uploaded song");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Song uploaded successfully",
        "song": song,
    })))
}

async fn owned_song(pool: &PgPool, id: Uuid, auth: &AuthUser) -> Result<Song> {
    let song = song_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;

    if song.artist_id != Some(auth.id) {
        return Err(AppError::Authorization(
            "You can only edit your own songs".to_string(),
        ));
    }

    Ok(song)
}

/// PUT /api/v1/artists/me/songs/{id}
pub async fn update_my_song(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateArtistSongRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_song(pool.get_ref(), id, &auth).await?;

    let payload = payload.into_inner();

    if let Some(Some(album_id)) = payload.album_id {
        let album = album_repo::find_by_id(pool.get_ref(), album_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;
        if album.artist_id != auth.id {
            return Err(AppError::Authorization(
                "You do not own this album".to_string(),
            ));
        }
    }

    let patch = song_repo::SongPatch {
        title: payload.title,
        genre: payload.genre,
        lyrics: payload.lyrics,
        album_id: payload.album_id,
        release_date: payload.release_date,
        is_explicit: payload.is_explicit,
        is_published: payload.is_published,
        ..Default::default()
    };

    let song = song_repo::update(pool.get_ref(), id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Song updated",
        "song": song,
    })))
}

/// DELETE /api/v1/artists/me/songs/{id}
pub async fn delete_my_song(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let song = owned_song(pool.get_ref(), id, &auth).await?;

    song_repo::delete(pool.get_ref(), id).await?;

    if let Some(album_id) = song.album_id {
        album_repo::adjust_total_tracks(pool.get_ref(), album_id, -1).await?;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Song deleted successfully",
    })))
}

/// GET /api/v1/artists/me/albums — albums with their published tracks.
pub async fn my_albums(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    query: web::Query<MyAlbumsQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_ARTIST_PAGE_LIMIT);

    let albums = album_repo::list_by_artist(
        pool.get_ref(),
        auth.id,
        query.include_unpublished,
        limit,
        offset(page, limit),
    )
    .await?;
    let total =
        album_repo::count_by_artist(pool.get_ref(), auth.id, query.include_unpublished).await?;

    let mut items = Vec::with_capacity(albums.len());
    for album in albums {
        let songs = song_repo::list_by_album(pool.get_ref(), album.id, true).await?;
        items.push(serde_json::json!({
            "album": album,
            "songs": songs,
        }));
    }

    Ok(HttpResponse::Ok().json(PageEnvelope::new(items, page, limit, total)))
}

/// POST /api/v1/artists/me/albums (multipart, `cover` optional)
pub async fn create_album(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    auth: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = collect_form(payload).await?;

    let title = form
        .field("title")
        .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?
        .to_string();

    let cover_url = match form.file("cover") {
        Some(part) => Some(
            storage
                .upload(
                    crate::services::storage::ALBUM_COVER_PREFIX,
                    &part.filename,
                    &part.content_type,
                    part.data.clone(),
                )
                .await?,
        ),
        None => None,
    };

    let release_date = parse_release_date(&form)?;

    let album = album_repo::create(
        pool.get_ref(),
        album_repo::NewAlbum {
            artist_id: auth.id,
            title: &title,
            description: form.field("description"),
            cover_url: cover_url.as_deref(),
            release_date,
            genre: form.field("genre"),
            album_type: form.field("album_type"),
        },
    )
    .await?;

    tracing::info!(artist_id = %auth.id, album_id = %album.id, "album created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Album created successfully",
        "album": album,
    })))
}

async fn owned_album(pool: &PgPool, id: Uuid, auth: &AuthUser) -> Result<crate::models::Album> {
    let album = album_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;

    if album.artist_id != auth.id {
        return Err(AppError::Authorization(
            "You can only edit your own albums".to_string(),
        ));
    }

    Ok(album)
}

/// PUT /api/v1/artists/me/albums/{id} (multipart partial update)
pub async fn update_album(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_album(pool.get_ref(), id, &auth).await?;

    let form = collect_form(payload).await?;

    let cover_url = match form.file("cover") {
        Some(part) => Some(
            storage
                .upload(
                    crate::services::storage::ALBUM_COVER_PREFIX,
                    &part.filename,
                    &part.content_type,
                    part.data.clone(),
                )
                .await?,
        ),
        None => None,
    };

    let is_published = match form.field("is_published") {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    };

    let patch = album_repo::AlbumPatch {
        title: form.field("title").map(str::to_string),
        description: form.field("description").map(str::to_string),
        cover_url,
        release_date: parse_release_date(&form)?,
        genre: form.field("genre").map(str::to_string),
        is_published,
        album_type: form.field("album_type").map(str::to_string),
    };

    let album = album_repo::update(pool.get_ref(), id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Album updated successfully",
        "album": album,
    })))
}

/// DELETE /api/v1/artists/me/albums/{id} — songs detach, not delete.
pub async fn delete_album(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_album(pool.get_ref(), id, &auth).await?;

    let mut tx = pool.begin().await?;
    album_repo::delete_with_detach(&mut tx, id).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Album deleted successfully",
    })))
}

/// GET /api/v1/artists/me/stats
pub async fn my_stats(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse> {
    let profile = artist_repo::get_profile(pool.get_ref(), auth.id).await?;

    let total_songs = song_repo::count_by_artist(pool.get_ref(), auth.id, true).await?;
    let total_albums = album_repo::count_by_artist(pool.get_ref(), auth.id, true).await?;
    let total_plays = song_repo::sum_plays_by_artist(pool.get_ref(), auth.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "total_followers": profile.as_ref().map(|p| p.total_followers).unwrap_or(0),
        "total_plays": total_plays,
        "total_songs": total_songs,
        "total_albums": total_albums,
        "verified": profile.map(|p| p.verified).unwrap_or(false),
    })))
}

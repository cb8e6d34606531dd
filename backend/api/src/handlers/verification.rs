use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{artist_repo, user_repo, verification_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ArtistVerification, ROLE_ARTIST};
use crate::services::storage::VERIFICATION_PREFIX;
use crate::services::{EmailService, StorageService};
use crate::utils::multipart::{collect_form, CollectedForm};
use crate::utils::pagination::{offset, PageEnvelope, PageQuery};

const DEFAULT_ADMIN_PAGE_LIMIT: i64 = 20;
const VALID_STATUSES: [&str; 3] = ["pending", "approved", "rejected"];

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub rejection_reason: Option<String>,
    pub admin_notes: Option<String>,
}

async fn upload_doc(
    storage: &StorageService,
    form: &CollectedForm,
    name: &str,
) -> Result<Option<String>> {
    match form.file(name) {
        Some(part) => Ok(Some(
            storage
                .upload(
                    VERIFICATION_PREFIX,
                    &part.filename,
                    &part.content_type,
                    part.data.clone(),
                )
                .await?,
        )),
        None => Ok(None),
    }
}

/// POST /api/v1/artist-verification/request (multipart)
pub async fn submit_request(
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
    auth: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    if verification_repo::has_pending(pool.get_ref(), auth.id).await? {
        return Err(AppError::BadRequest(
            "You already have a pending verification request".to_string(),
        ));
    }

    let user = user_repo::find_by_id(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role == ROLE_ARTIST {
        return Err(AppError::BadRequest(
            "You are already a verified artist".to_string(),
        ));
    }

    let form = collect_form(payload).await?;

    let stage_name = form
        .field("stage_name")
        .ok_or_else(|| AppError::BadRequest("Stage name is required".to_string()))?
        .to_string();
    let contact_email = form
        .field("contact_email")
        .ok_or_else(|| AppError::BadRequest("Contact email is required".to_string()))?
        .to_string();

    let released_song_links = match form.field("released_song_links") {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|_| AppError::BadRequest("Invalid released song links".to_string()))?,
        None => serde_json::json!([]),
    };

    let id_document_url = upload_doc(&storage, &form, "id_document").await?;
    let authorization_doc_url = upload_doc(&storage, &form, "authorization_doc").await?;
    let profile_image_url = upload_doc(&storage, &form, "profile_image").await?;

    let verification = verification_repo::create(
        pool.get_ref(),
        verification_repo::NewVerification {
            user_id: auth.id,
            stage_name: &stage_name,
            real_name: form.field("real_name"),
            bio: form.field("bio"),
            facebook_url: form.field("facebook_url"),
            youtube_url: form.field("youtube_url"),
            spotify_url: form.field("spotify_url"),
            instagram_url: form.field("instagram_url"),
            website_url: form.field("website_url"),
            released_song_links,
            id_document_url: id_document_url.as_deref(),
            authorization_doc_url: authorization_doc_url.as_deref(),
            profile_image_url: profile_image_url.as_deref(),
            contact_email: &contact_email,
            contact_phone: form.field("contact_phone"),
        },
    )
    .await?;

    tracing::info!(user_id = %auth.id, verification_id = %verification.id, "verification request submitted");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Verification request submitted successfully",
        "verification": {
            "id": verification.id,
            "status": verification.status,
            "created_at": verification.created_at,
        },
    })))
}

/// GET /api/v1/artist-verification/my-requests
pub async fn my_requests(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse> {
    let requests = verification_repo::list_by_user(pool.get_ref(), auth.id).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// GET /api/v1/artist-verification/admin/requests
pub async fn admin_list(
    pool: web::Data<PgPool>,
    query: web::Query<AdminListQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_ADMIN_PAGE_LIMIT);

    // Unknown status filters are ignored, not an error.
    let status = query
        .status
        .as_deref()
        .filter(|s| VALID_STATUSES.contains(s));

    let items =
        verification_repo::list_admin(pool.get_ref(), status, limit, offset(page, limit)).await?;
    let total = verification_repo::count_admin(pool.get_ref(), status).await?;

    Ok(HttpResponse::Ok().json(PageEnvelope::new(items, page, limit, total)))
}

/// GET /api/v1/artist-verification/admin/requests/{id}
pub async fn admin_detail(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let request = verification_repo::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Verification request not found".to_string()))?;

    let requester = user_repo::flat_profile(pool.get_ref(), request.user_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "request": request,
        "requester": requester,
    })))
}

fn assemble_social_links(request: &ArtistVerification) -> serde_json::Value {
    serde_json::json!({
        "facebook": request.facebook_url,
        "youtube": request.youtube_url,
        "spotify": request.spotify_url,
        "instagram": request.instagram_url,
        "website": request.website_url,
    })
}

/// POST /api/v1/artist-verification/admin/requests/{id}/approve
pub async fn approve_request(
    pool: web::Data<PgPool>,
    email_service: web::Data<EmailService>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: web::Json<ApproveRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();

    let existing = verification_repo::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Verification request not found".to_string()))?;

    let requester = user_repo::find_by_id(pool.get_ref(), existing.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Requester not found".to_string()))?;

    let mut tx = pool.begin().await?;

    let request =
        verification_repo::mark_approved(&mut tx, id, auth.id, payload.admin_notes.as_deref())
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("This request has already been processed".to_string())
            })?;

    user_repo::set_role(&mut tx, request.user_id, ROLE_ARTIST).await?;

    artist_repo::create_verified_profile(
        &mut tx,
        request.user_id,
        &request.stage_name,
        request.bio.as_deref(),
        request.profile_image_url.as_deref(),
        assemble_social_links(&request),
        Some(&request.contact_email),
    )
    .await?;

    tx.commit().await?;

    // The decision is committed; a failed email only gets logged.
    let recipient = request
        .contact_email
        .clone();
    if let Err(e) = email_service.send_verification_approved(&recipient, &request.stage_name) {
        tracing::warn!(error = %e, to = %recipient, "failed to send approval email");
    }

    tracing::info!(
        verification_id = %id,
        user_id = %requester.id,
        approved_by = %auth.id,
        "artist verification approved"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Verification approved successfully",
        "request": request,
    })))
}

/// POST /api/v1/artist-verification/admin/requests/{id}/reject
pub async fn reject_request(
    pool: web::Data<PgPool>,
    email_service: web::Data<EmailService>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: web::Json<RejectRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();

    let reason = payload
        .rejection_reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("Rejection reason is required".to_string()))?;

    if verification_repo::find_by_id(pool.get_ref(), id).await?.is_none() {
        return Err(AppError::NotFound(
            "Verification request not found".to_string(),
        ));
    }

    let request = verification_repo::mark_rejected(
        pool.get_ref(),
        id,
        auth.id,
        reason,
        payload.admin_notes.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::BadRequest("This request has already been processed".to_string()))?;

    let recipient = request.contact_email.clone();
    if let Err(e) = email_service.send_verification_rejected(&recipient, &request.stage_name, reason)
    {
        tracing::warn!(error = %e, to = %recipient, "failed to send rejection email");
    }

    tracing::info!(verification_id = %id, rejected_by = %auth.id, "artist verification rejected");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Verification rejected",
        "request": request,
    })))
}

/// GET /api/v1/artist-verification/admin/stats
pub async fn admin_stats(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let stats = verification_repo::stats(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::comment_repo::{self, CommentTarget};
use crate::db::{playlist_repo, song_repo};
use crate::error::{is_unique_violation, AppError, Result};
use crate::middleware::AuthUser;
use crate::utils::pagination::{offset, PageEnvelope, PageQuery};

const MAX_COMMENT_LEN: usize = 2000;
const DEFAULT_COMMENT_PAGE_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub song_id: Option<Uuid>,
    pub playlist_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub song_id: Option<Uuid>,
    pub playlist_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn resolve_target(song_id: Option<Uuid>, playlist_id: Option<Uuid>) -> Result<CommentTarget> {
    match (song_id, playlist_id) {
        (Some(id), None) => Ok(CommentTarget::Song(id)),
        (None, Some(id)) => Ok(CommentTarget::Playlist(id)),
        _ => Err(AppError::BadRequest(
            "Exactly one of song_id or playlist_id is required".to_string(),
        )),
    }
}

async fn ensure_target_exists(pool: &PgPool, target: CommentTarget) -> Result<()> {
    let exists = match target {
        CommentTarget::Song(id) => song_repo::find_by_id(pool, id).await?.is_some(),
        CommentTarget::Playlist(id) => playlist_repo::find_by_id(pool, id).await?.is_some(),
    };

    if !exists {
        return Err(AppError::NotFound("Comment target not found".to_string()));
    }

    Ok(())
}

/// POST /api/v1/comments
pub async fn create_comment(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    payload: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::BadRequest(
            "Content must be at most 2000 characters".to_string(),
        ));
    }

    let target = resolve_target(payload.song_id, payload.playlist_id)?;
    ensure_target_exists(pool.get_ref(), target).await?;

    // Replies are one level deep and must stay on the same target.
    if let Some(parent_id) = payload.parent_id {
        let parent = comment_repo::find_by_id(pool.get_ref(), parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;

        if parent.parent_id.is_some() {
            return Err(AppError::BadRequest(
                "Replies to replies are not allowed".to_string(),
            ));
        }

        let same_target = match target {
            CommentTarget::Song(id) => parent.song_id == Some(id),
            CommentTarget::Playlist(id) => parent.playlist_id == Some(id),
        };
        if !same_target {
            return Err(AppError::BadRequest(
                "Parent comment belongs to a different target".to_string(),
            ));
        }
    }

    let comment =
        comment_repo::create(pool.get_ref(), auth.id, target, payload.parent_id, content).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Comment created successfully",
        "comment": comment,
    })))
}

/// GET /api/v1/comments?song_id=…|playlist_id=…
pub async fn list_comments(
    pool: web::Data<PgPool>,
    query: web::Query<CommentListQuery>,
) -> Result<HttpResponse> {
    let target = resolve_target(query.song_id, query.playlist_id)?;
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DEFAULT_COMMENT_PAGE_LIMIT);

    let items =
        comment_repo::list_for_target(pool.get_ref(), target, limit, offset(page, limit)).await?;
    let total = comment_repo::count_for_target(pool.get_ref(), target).await?;

    Ok(HttpResponse::Ok().json(PageEnvelope::new(items, page, limit, total)))
}

/// POST /api/v1/comments/{id}/like
pub async fn like_comment(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment_id = path.into_inner();

    if comment_repo::find_by_id(pool.get_ref(), comment_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let inserted = match comment_repo::add_like(pool.get_ref(), auth.id, comment_id).await {
        Ok(n) => n,
        // Two concurrent likes race past the insert; the unique index decides.
        Err(e) if is_unique_violation(&e) => 0,
        Err(e) => return Err(e.into()),
    };

    if inserted == 0 {
        return Err(AppError::BadRequest(
            "Comment already liked".to_string(),
        ));
    }

    let likes = comment_repo::recount_likes(pool.get_ref(), comment_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment liked",
        "likes": likes,
    })))
}

/// DELETE /api/v1/comments/{id}/like
pub async fn unlike_comment(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment_id = path.into_inner();

    let removed = comment_repo::remove_like(pool.get_ref(), auth.id, comment_id).await?;
    if removed == 0 {
        return Err(AppError::BadRequest("Comment is not liked".to_string()));
    }

    let likes = comment_repo::recount_likes(pool.get_ref(), comment_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Like removed",
        "likes": likes,
    })))
}

/// DELETE /api/v1/comments/{id} (admin) — removes the comment, its replies,
/// their likes and reports.
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    auth.require_admin()?;

    let comment_id = path.into_inner();

    if comment_repo::find_by_id(pool.get_ref(), comment_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let mut tx = pool.begin().await?;
    let deleted = comment_repo::purge(&mut tx, comment_id).await?;
    tx.commit().await?;

    tracing::info!(%comment_id, deleted, "comment purged by admin");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_requires_exactly_one_id() {
        assert!(resolve_target(None, None).is_err());
        assert!(resolve_target(Some(Uuid::new_v4()), Some(Uuid::new_v4())).is_err());
        assert!(matches!(
            resolve_target(Some(Uuid::new_v4()), None),
            Ok(CommentTarget::Song(_))
        ));
        assert!(matches!(
            resolve_target(None, Some(Uuid::new_v4())),
            Ok(CommentTarget::Playlist(_))
        ));
    }
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{comment_repo, report_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub message: String,
}

/// POST /api/v1/reports/{comment_id}
pub async fn create_report(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: web::Json<CreateReportRequest>,
) -> Result<HttpResponse> {
    let comment_id = path.into_inner();

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message is required".to_string()));
    }

    if comment_repo::find_by_id(pool.get_ref(), comment_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let created = report_repo::create(pool.get_ref(), auth.id, comment_id, message).await?;
    if created.is_none() {
        return Err(AppError::BadRequest(
            "You have already reported this comment".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Report submitted successfully",
    })))
}

/// GET /api/v1/reports (admin)
pub async fn list_reports(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let reports = report_repo::list_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(reports))
}

/// GET /api/v1/reports/group (admin) — most-reported comments first.
pub async fn grouped_reports(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let groups = report_repo::group_by_comment(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(groups))
}

/// DELETE /api/v1/reports/{id} (admin)
pub async fn delete_report(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    auth.require_admin()?;

    let deleted = report_repo::delete(pool.get_ref(), path.into_inner()).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Report not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Report deleted successfully",
    })))
}

/// DELETE /api/v1/reports/comment/{comment_id} (admin) — purge the comment,
/// its replies and every report referencing them.
pub async fn purge_reported_comment(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
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

    tracing::info!(%comment_id, deleted, "reported comment purged");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment and its reports deleted successfully",
    })))
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::models::{ROLE_ADMIN, ROLE_USER};
use crate::security::{jwt, password};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/admin/login — unknown email and wrong password are
/// indistinguishable on purpose.
pub async fn login(
    pool: web::Data<PgPool>,
    payload: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = user_repo::find_by_email(pool.get_ref(), &payload.email)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid credentials".to_string()))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Invalid credentials".to_string()))?;

    if !password::verify_password(&payload.password, hash)? {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    if user.role != ROLE_ADMIN {
        tracing::warn!(user_id = %user.id, "non-admin attempted admin login");
        return Err(AppError::Authorization("Admin access required".to_string()));
    }

    let token = jwt::generate_token(user.id, &user.email, &user.role, &user.tier_code)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Admin login successful",
        "token": token,
        "admin": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "role": user.role,
        },
    })))
}

/// GET /api/v1/admin/users — all regular accounts, no credentials.
pub async fn list_users(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let users = user_repo::list_accounts_by_role(pool.get_ref(), ROLE_USER).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// DELETE /api/v1/admin/users/{id} — cascades owned content.
pub async fn delete_user(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let id = path.into_inner();

    let deleted = user_repo::delete_user(pool.get_ref(), id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "user deleted by admin");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "User deleted successfully",
    })))
}

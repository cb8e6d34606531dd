use actix_web::{web, HttpResponse};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::{password_reset_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::DEFAULT_AVATAR_URL;
use crate::security::{jwt, password};
use crate::services::EmailService;

const RESET_CODE_TTL_SECS: i64 = 300;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub tier_code: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub verification_code: String,
}

/// POST /api/v1/auth/register
pub async fn register(
    pool: web::Data<PgPool>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    if user_repo::find_by_email(pool.get_ref(), &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let hash = password::hash_password(&payload.password)?;
    let user = match user_repo::create_user(pool.get_ref(), &payload.username, &payload.email, &hash)
        .await
    {
        Ok(user) => user,
        // Concurrent registration with the same email loses to the unique index.
        Err(e) if crate::error::is_unique_violation(&e) => {
            return Err(AppError::Conflict("Email already exists".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    user_repo::create_profile(pool.get_ref(), user.id, DEFAULT_AVATAR_URL).await?;

    let token = jwt::generate_token(user.id, &user.email, &user.role, &user.tier_code)?;

    tracing::info!(user_id = %user.id, email = %user.email, "user registered");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User registered successfully",
        "token": token,
        "user": RegisteredUser {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            tier_code: user.tier_code,
        },
    })))
}

/// POST /api/v1/auth/login
pub async fn login(
    pool: web::Data<PgPool>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = user_repo::find_by_email(pool.get_ref(), &payload.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Social-login accounts carry no local hash and cannot log in here.
    let hash = user.password_hash.as_deref().ok_or_else(|| {
        AppError::BadRequest("This account uses social login".to_string())
    })?;

    if !password::verify_password(&payload.password, hash)? {
        tracing::warn!(email = %payload.email, "login failed: bad password");
        return Err(AppError::Authentication("Invalid password".to_string()));
    }

    let token = jwt::generate_token(user.id, &user.email, &user.role, &user.tier_code)?;

    tracing::info!(user_id = %user.id, "login successful");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Login successful",
        "token": token,
        "role": user.role,
        "tier_code": user.tier_code,
    })))
}

/// GET /api/v1/auth/me — flattened user + profile.
pub async fn me(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse> {
    let profile = user_repo::flat_profile(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/v1/auth/profile
pub async fn update_profile(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let bio = payload.bio.as_deref().unwrap_or_default();
    user_repo::upsert_bio(pool.get_ref(), auth.id, bio).await?;

    let profile = user_repo::flat_profile(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Bio updated successfully",
        "profile": profile,
    })))
}

/// POST /api/v1/auth/password/request-code
pub async fn request_password_code(
    pool: web::Data<PgPool>,
    email_service: web::Data<EmailService>,
    auth: AuthUser,
) -> Result<HttpResponse> {
    let user = user_repo::find_by_id(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User or email not found".to_string()))?;

    let code = rand::thread_rng().gen_range(100_000..=999_999u32).to_string();
    let expires_at = chrono::Utc::now() + chrono::Duration::seconds(RESET_CODE_TTL_SECS);

    password_reset_repo::upsert_code(pool.get_ref(), user.id, &code, expires_at).await?;

    // The code is useless if it never arrives, so email failure is an error.
    email_service.send_password_code(&user.email, &user.username, &code)?;

    tracing::info!(user_id = %user.id, "password change code sent");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Verification code sent to your email",
    })))
}

/// POST /api/v1/auth/password/change
pub async fn change_password(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    if payload.old_password.is_empty()
        || payload.new_password.is_empty()
        || payload.verification_code.is_empty()
    {
        return Err(AppError::BadRequest(
            "Old password, new password, and verification code are required".to_string(),
        ));
    }

    let record = password_reset_repo::find_by_user(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("No verification code requested".to_string())
        })?;

    if record.expires_at < chrono::Utc::now() {
        password_reset_repo::delete_for_user(pool.get_ref(), auth.id).await?;
        return Err(AppError::BadRequest(
            "Verification code has expired".to_string(),
        ));
    }

    if record.code != payload.verification_code {
        return Err(AppError::BadRequest(
            "Invalid verification code".to_string(),
        ));
    }

    let user = user_repo::find_by_id(pool.get_ref(), auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let hash = user.password_hash.as_deref().ok_or_else(|| {
        AppError::NotFound("User not found or is a social login account".to_string())
    })?;

    if !password::verify_password(&payload.old_password, hash)? {
        return Err(AppError::Authentication(
            "Incorrect old password".to_string(),
        ));
    }

    let new_hash = password::hash_password(&payload.new_password)?;
    user_repo::update_password(pool.get_ref(), auth.id, &new_hash).await?;
    password_reset_repo::delete_for_user(pool.get_ref(), auth.id).await?;

    tracing::info!(user_id = %auth.id, "password changed");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password changed successfully",
    })))
}

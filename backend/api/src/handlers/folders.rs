use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{folder_repo, playlist_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Folder, Playlist};

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFolderRequest {
    pub name: Option<String>,
    pub parent_id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct FolderWithPlaylists {
    #[serde(flatten)]
    pub folder: Folder,
    pub playlists: Vec<Playlist>,
}

fn normalize_parent_id(value: &Value) -> Result<Option<Uuid>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() || s == "0" => Ok(None),
        Value::String(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| AppError::BadRequest("Invalid parent folder id".to_string())),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(None),
        _ => Err(AppError::BadRequest("Invalid parent folder id".to_string())),
    }
}

async fn owned_folder(pool: &PgPool, id: Uuid, auth: &AuthUser) -> Result<Folder> {
    let folder = folder_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Folder not found".to_string()))?;

    if folder.user_id != auth.id {
        return Err(AppError::Authorization(
            "You do not own this folder".to_string(),
        ));
    }

    Ok(folder)
}

/// POST /api/v1/folders
pub async fn create_folder(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    payload: web::Json<CreateFolderRequest>,
) -> Result<HttpResponse> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    let parent_id = normalize_parent_id(&payload.parent_id)?;
    if let Some(parent_id) = parent_id {
        owned_folder(pool.get_ref(), parent_id, &auth).await?;
    }

    let folder =
        folder_repo::create(pool.get_ref(), auth.id, payload.name.trim(), parent_id).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Folder created successfully",
        "folder": folder,
    })))
}

/// GET /api/v1/folders/me — folders with their playlists.
pub async fn my_folders(pool: web::Data<PgPool>, auth: AuthUser) -> Result<HttpResponse> {
    let folders = folder_repo::list_by_user(pool.get_ref(), auth.id).await?;

    let mut out = Vec::with_capacity(folders.len());
    for folder in folders {
        let playlists = playlist_repo::list_by_folder(pool.get_ref(), folder.id).await?;
        out.push(FolderWithPlaylists { folder, playlists });
    }

    Ok(HttpResponse::Ok().json(out))
}

/// PUT /api/v1/folders/{id}
pub async fn update_folder(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateFolderRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let mut folder = owned_folder(pool.get_ref(), id, &auth).await?;

    if let Some(name) = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        folder = folder_repo::rename(pool.get_ref(), id, name).await?;
    }

    if let Some(raw) = &payload.parent_id {
        let parent_id = normalize_parent_id(raw)?;
        if let Some(parent_id) = parent_id {
            if parent_id == id {
                return Err(AppError::BadRequest(
                    "A folder cannot be its own parent".to_string(),
                ));
            }
            owned_folder(pool.get_ref(), parent_id, &auth).await?;
        }
        folder = folder_repo::set_parent(pool.get_ref(), id, parent_id).await?;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Folder updated successfully",
        "folder": folder,
    })))
}

/// DELETE /api/v1/folders/{id} — subfolders cascade, playlists revert to root.
pub async fn delete_folder(
    pool: web::Data<PgPool>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_folder(pool.get_ref(), id, &auth).await?;

    folder_repo::delete(pool.get_ref(), id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Folder deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parent_id_normalization() {
        assert_eq!(normalize_parent_id(&Value::Null).unwrap(), None);
        assert_eq!(normalize_parent_id(&json!("0")).unwrap(), None);
        assert!(normalize_parent_id(&json!(true)).is_err());
    }
}

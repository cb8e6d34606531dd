use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Folder;

const FOLDER_COLUMNS: &str = "id, user_id, name, parent_id, created_at, updated_at";

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    parent_id: Option<Uuid>,
) -> Result<Folder, sqlx::Error> {
    sqlx::query_as::<_, Folder>(&format!(
        r#"
        INSERT INTO folders (user_id, name, parent_id)
        VALUES ($1, $2, $3)
        RETURNING {FOLDER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(parent_id)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Folder>, sqlx::Error> {
    sqlx::query_as::<_, Folder>(&format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Folder>, sqlx::Error> {
    sqlx::query_as::<_, Folder>(&format!(
        "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = $1 ORDER BY created_at ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Folder, sqlx::Error> {
    sqlx::query_as::<_, Folder>(&format!(
        r#"
        UPDATE folders SET name = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {FOLDER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn set_parent(
    pool: &PgPool,
    id: Uuid,
    parent_id: Option<Uuid>,
) -> Result<Folder, sqlx::Error> {
    sqlx::query_as::<_, Folder>(&format!(
        r#"
        UPDATE folders SET parent_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {FOLDER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(parent_id)
    .fetch_one(pool)
    .await
}

/// Subfolders cascade; playlists in the folder revert to root via FK SET NULL.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM folders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

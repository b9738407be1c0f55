//! Photo repository for database operations

use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::photo::{NewPhoto, Photo, PhotoDetails};

const PHOTO_COLUMNS: &str = "id, user_id, title, description, filename, original_name, mimetype, \
                             size, url, thumbnail_url, upload_date, created_at, updated_at";

/// Photo repository
#[derive(Clone)]
pub struct PhotoRepository {
    pool: PgPool,
}

impl PhotoRepository {
    /// Create a new photo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of photos, newest upload first, with the total count
    pub async fn list(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<(Vec<Photo>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {PHOTO_COLUMNS}
            FROM photos
            WHERE user_id = $1
            ORDER BY upload_date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let photos = sqlx::query_as::<_, Photo>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((photos, total))
    }

    pub async fn create(&self, user_id: Uuid, photo: &NewPhoto) -> DatabaseResult<Photo> {
        let sql = format!(
            r#"
            INSERT INTO photos
                (user_id, title, description, filename, original_name, mimetype, size, url, thumbnail_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PHOTO_COLUMNS}
            "#
        );
        let photo = sqlx::query_as::<_, Photo>(&sql)
            .bind(user_id)
            .bind(&photo.title)
            .bind(&photo.description)
            .bind(&photo.filename)
            .bind(&photo.original_name)
            .bind(&photo.mimetype)
            .bind(photo.size)
            .bind(&photo.url)
            .bind(&photo.thumbnail_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(photo)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<Option<Photo>> {
        let sql = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = $1 AND user_id = $2");
        let photo = sqlx::query_as::<_, Photo>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(photo)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        details: &PhotoDetails,
    ) -> DatabaseResult<Option<Photo>> {
        let sql = format!(
            r#"
            UPDATE photos
            SET title = $3, description = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {PHOTO_COLUMNS}
            "#
        );
        let photo = sqlx::query_as::<_, Photo>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&details.title)
            .bind(&details.description)
            .fetch_optional(&self.pool)
            .await?;
        Ok(photo)
    }

    /// Returns whether a row was deleted
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

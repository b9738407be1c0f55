//! Memorial repository for database operations

use chrono::NaiveDate;
use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::memorial::{Memorial, MemorialFields};

const MEMORIAL_COLUMNS: &str =
    "id, user_id, title, description, date, importance, category, is_recurring, created_at, updated_at";

/// Memorial repository
#[derive(Clone)]
pub struct MemorialRepository {
    pool: PgPool,
}

impl MemorialRepository {
    /// Create a new memorial repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All memorials, earliest date first
    pub async fn list(&self, user_id: Uuid) -> DatabaseResult<Vec<Memorial>> {
        let sql = format!(
            "SELECT {MEMORIAL_COLUMNS} FROM memorials WHERE user_id = $1 ORDER BY date ASC, created_at ASC"
        );
        let memorials = sqlx::query_as::<_, Memorial>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(memorials)
    }

    /// Memorials that may fall between `from` and `to`
    ///
    /// Recurring memorials are always returned; the caller projects them
    /// onto the calendar.
    pub async fn upcoming_candidates(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DatabaseResult<Vec<Memorial>> {
        let sql = format!(
            r#"
            SELECT {MEMORIAL_COLUMNS}
            FROM memorials
            WHERE user_id = $1 AND (is_recurring OR date BETWEEN $2 AND $3)
            "#
        );
        let memorials = sqlx::query_as::<_, Memorial>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(memorials)
    }

    pub async fn create(&self, user_id: Uuid, fields: &MemorialFields) -> DatabaseResult<Memorial> {
        let sql = format!(
            r#"
            INSERT INTO memorials (user_id, title, description, date, importance, category, is_recurring)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MEMORIAL_COLUMNS}
            "#
        );
        let memorial = sqlx::query_as::<_, Memorial>(&sql)
            .bind(user_id)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(fields.date)
            .bind(fields.importance)
            .bind(&fields.category)
            .bind(fields.is_recurring)
            .fetch_one(&self.pool)
            .await?;
        Ok(memorial)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<Option<Memorial>> {
        let sql =
            format!("SELECT {MEMORIAL_COLUMNS} FROM memorials WHERE id = $1 AND user_id = $2");
        let memorial = sqlx::query_as::<_, Memorial>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(memorial)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: &MemorialFields,
    ) -> DatabaseResult<Option<Memorial>> {
        let sql = format!(
            r#"
            UPDATE memorials
            SET title = $3, description = $4, date = $5, importance = $6, category = $7,
                is_recurring = $8, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {MEMORIAL_COLUMNS}
            "#
        );
        let memorial = sqlx::query_as::<_, Memorial>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(fields.date)
            .bind(fields.importance)
            .bind(&fields.category)
            .bind(fields.is_recurring)
            .fetch_optional(&self.pool)
            .await?;
        Ok(memorial)
    }

    /// Returns whether a row was deleted
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM memorials WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

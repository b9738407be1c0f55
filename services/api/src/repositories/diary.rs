//! Diary repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::diary::{Diary, DiaryFields, Mood, Weather};
use crate::validation::escape_like;

const DIARY_COLUMNS: &str =
    "id, user_id, title, content, mood, weather, images, date, created_at, updated_at";

/// Optional predicates on diary listings
#[derive(Debug, Default, Clone)]
pub struct DiaryFilter {
    /// Substring matched against title and content
    pub text: Option<String>,
    pub mood: Option<Mood>,
    pub weather: Option<Weather>,
}

impl DiaryFilter {
    fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Postgres>, user_id: Uuid) {
        qb.push(" WHERE user_id = ").push_bind(user_id);
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(text));
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR content ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(mood) = self.mood {
            qb.push(" AND mood = ").push_bind(mood);
        }
        if let Some(weather) = self.weather {
            qb.push(" AND weather = ").push_bind(weather);
        }
    }
}

/// Diary repository
#[derive(Clone)]
pub struct DiaryRepository {
    pool: PgPool,
}

impl DiaryRepository {
    /// Create a new diary repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of diaries, newest first, with the total matching count
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &DiaryFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<(Vec<Diary>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM diaries");
        filter.push_where(&mut count, user_id);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {DIARY_COLUMNS} FROM diaries"));
        filter.push_where(&mut qb, user_id);
        qb.push(" ORDER BY date DESC, created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let diaries = qb.build_query_as::<Diary>().fetch_all(&self.pool).await?;

        Ok((diaries, total))
    }

    /// Every diary matching `filter`, newest first
    pub async fn search(&self, user_id: Uuid, filter: &DiaryFilter) -> DatabaseResult<Vec<Diary>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {DIARY_COLUMNS} FROM diaries"));
        filter.push_where(&mut qb, user_id);
        qb.push(" ORDER BY date DESC, created_at DESC");
        let diaries = qb.build_query_as::<Diary>().fetch_all(&self.pool).await?;
        Ok(diaries)
    }

    pub async fn create(&self, user_id: Uuid, fields: &DiaryFields) -> DatabaseResult<Diary> {
        let sql = format!(
            r#"
            INSERT INTO diaries (user_id, title, content, mood, weather, images, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {DIARY_COLUMNS}
            "#
        );
        let diary = sqlx::query_as::<_, Diary>(&sql)
            .bind(user_id)
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(fields.mood)
            .bind(fields.weather)
            .bind(&fields.images)
            .bind(fields.date)
            .fetch_one(&self.pool)
            .await?;
        Ok(diary)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<Option<Diary>> {
        let sql = format!("SELECT {DIARY_COLUMNS} FROM diaries WHERE id = $1 AND user_id = $2");
        let diary = sqlx::query_as::<_, Diary>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(diary)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: &DiaryFields,
    ) -> DatabaseResult<Option<Diary>> {
        let sql = format!(
            r#"
            UPDATE diaries
            SET title = $3, content = $4, mood = $5, weather = $6, images = $7, date = $8,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {DIARY_COLUMNS}
            "#
        );
        let diary = sqlx::query_as::<_, Diary>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(fields.mood)
            .bind(fields.weather)
            .bind(&fields.images)
            .bind(fields.date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(diary)
    }

    /// Returns whether a row was deleted
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM diaries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

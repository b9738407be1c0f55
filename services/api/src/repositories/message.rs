//! Message repository for database operations

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::message::{Message, MessageFields};

const MESSAGE_COLUMNS: &str =
    "id, user_id, content, author, is_special, message_date, created_at, updated_at";

/// Message repository
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Messages newest first, optionally only the special ones
    pub async fn list(&self, user_id: Uuid, special: Option<bool>) -> DatabaseResult<Vec<Message>> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages"));
        qb.push(" WHERE user_id = ").push_bind(user_id);
        if let Some(special) = special {
            qb.push(" AND is_special = ").push_bind(special);
        }
        qb.push(" ORDER BY message_date DESC, created_at DESC");
        let messages = qb.build_query_as::<Message>().fetch_all(&self.pool).await?;
        Ok(messages)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        fields: &MessageFields,
        message_date: Option<DateTime<Utc>>,
    ) -> DatabaseResult<Message> {
        let sql = format!(
            r#"
            INSERT INTO messages (user_id, content, author, is_special, message_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
            RETURNING {MESSAGE_COLUMNS}
            "#
        );
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(user_id)
            .bind(&fields.content)
            .bind(&fields.author)
            .bind(fields.is_special)
            .bind(message_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(message)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<Option<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1 AND user_id = $2");
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: &MessageFields,
    ) -> DatabaseResult<Option<Message>> {
        let sql = format!(
            r#"
            UPDATE messages
            SET content = $3, author = $4, is_special = $5, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {MESSAGE_COLUMNS}
            "#
        );
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&fields.content)
            .bind(&fields.author)
            .bind(fields.is_special)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }

    /// Returns whether a row was deleted
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Todo repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::todo::{Todo, TodoFields, TodoQuery};

const TODO_COLUMNS: &str = "id, user_id, content, priority, category, is_completed, completed_at, \
                            due_date, created_at, updated_at";

fn list_query(user_id: Uuid, query: &TodoQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {TODO_COLUMNS} FROM todos"));
    qb.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(completed) = query.completed {
        qb.push(" AND is_completed = ").push_bind(completed);
    }
    if let Some(priority) = query.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    // Incomplete first, then high priority first, then oldest first
    qb.push(" ORDER BY is_completed ASC, priority DESC, created_at ASC");
    qb
}

/// Todo repository
#[derive(Clone)]
pub struct TodoRepository {
    pool: PgPool,
}

impl TodoRepository {
    /// Create a new todo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: Uuid, query: &TodoQuery) -> DatabaseResult<Vec<Todo>> {
        let mut qb = list_query(user_id, query);
        let todos = qb.build_query_as::<Todo>().fetch_all(&self.pool).await?;
        Ok(todos)
    }

    pub async fn create(&self, user_id: Uuid, fields: &TodoFields) -> DatabaseResult<Todo> {
        let sql = format!(
            r#"
            INSERT INTO todos (user_id, content, priority, category, due_date, is_completed, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TODO_COLUMNS}
            "#
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(user_id)
            .bind(&fields.content)
            .bind(fields.priority)
            .bind(&fields.category)
            .bind(fields.due_date)
            .bind(fields.is_completed)
            .bind(fields.completed_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(todo)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<Option<Todo>> {
        let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2");
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: &TodoFields,
    ) -> DatabaseResult<Option<Todo>> {
        let sql = format!(
            r#"
            UPDATE todos
            SET content = $3, priority = $4, category = $5, due_date = $6,
                is_completed = $7, completed_at = $8, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TODO_COLUMNS}
            "#
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&fields.content)
            .bind(fields.priority)
            .bind(&fields.category)
            .bind(fields.due_date)
            .bind(fields.is_completed)
            .bind(fields.completed_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    /// Flip the completion flag and its timestamp in one statement
    pub async fn toggle(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<Option<Todo>> {
        // SET expressions read the row as it was before the update
        let sql = format!(
            r#"
            UPDATE todos
            SET is_completed = NOT is_completed,
                completed_at = CASE WHEN is_completed THEN NULL ELSE NOW() END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TODO_COLUMNS}
            "#
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    /// Returns whether a row was deleted
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

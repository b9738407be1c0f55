//! User repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::user::{Settings, User};

const USER_COLUMNS: &str = "id, username, password_hash, person1_name, person2_name, \
                            love_start_date, is_active, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Find an active user by ID
    pub async fn find_active_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Create the account unless it already exists, returning the stored row
    ///
    /// Concurrent first logins race on the unique username; the loser reads
    /// back the winner's row, so exactly one account is ever created.
    pub async fn create_if_absent(
        &self,
        username: &str,
        password_hash: &str,
    ) -> DatabaseResult<User> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            info!("Created account {}", username);
        }

        self.find_by_username(username)
            .await?
            .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))
    }

    /// Store new settings for a user
    pub async fn update_settings(
        &self,
        id: Uuid,
        settings: &Settings,
    ) -> DatabaseResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET person1_name = $2, person2_name = $3, love_start_date = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&settings.person1_name)
            .bind(&settings.person2_name)
            .bind(settings.love_start_date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

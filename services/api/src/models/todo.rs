//! Shared to-do items

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    CATEGORY_MAX, TODO_CONTENT_MAX, empty_as_none, empty_variant_as_none, lenient_date,
    nullable_date,
};
use crate::error::ApiResult;
use crate::validation::{check_length, non_blank, require_text};

pub const DEFAULT_CATEGORY: &str = "general";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "todo_priority", rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Todo model
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub priority: Priority,
    pub category: String,
    pub is_completed: bool,
    /// Set exactly while `is_completed` is true
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored todo fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFields {
    pub content: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TodoFields {
    pub fn check(&self) -> ApiResult<()> {
        check_length(&self.content, TODO_CONTENT_MAX, "Todo content")?;
        check_length(&self.category, CATEGORY_MAX, "Category")
    }
}

/// Completion state after an explicit request, or unchanged when `requested` is `None`
///
/// Re-completing an already completed todo keeps its original timestamp.
pub fn completion(
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    requested: Option<bool>,
    now: DateTime<Utc>,
) -> (bool, Option<DateTime<Utc>>) {
    match requested {
        None => (is_completed, completed_at),
        Some(false) => (false, None),
        Some(true) if is_completed => (true, completed_at.or(Some(now))),
        Some(true) => (true, Some(now)),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub content: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    pub is_completed: Option<bool>,
}

impl CreateTodoRequest {
    pub fn into_fields(self, now: DateTime<Utc>) -> ApiResult<TodoFields> {
        let (is_completed, completed_at) = completion(false, None, self.is_completed, now);
        Ok(TodoFields {
            content: require_text(self.content, "Todo content is required")?,
            priority: self.priority.unwrap_or_default(),
            category: non_blank(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            due_date: self.due_date,
            is_completed,
            completed_at,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub content: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub due_date: Option<Option<NaiveDate>>,
    pub is_completed: Option<bool>,
}

impl UpdateTodoRequest {
    pub fn apply(self, current: &Todo, now: DateTime<Utc>) -> TodoFields {
        let (is_completed, completed_at) = completion(
            current.is_completed,
            current.completed_at,
            self.is_completed,
            now,
        );
        TodoFields {
            content: non_blank(self.content).unwrap_or_else(|| current.content.clone()),
            priority: self.priority.unwrap_or(current.priority),
            category: non_blank(self.category).unwrap_or_else(|| current.category.clone()),
            due_date: match self.due_date {
                Some(due_date) => due_date,
                None => current.due_date,
            },
            is_completed,
            completed_at,
        }
    }
}

/// Query for `GET /todos`
#[derive(Debug, Default, Deserialize)]
pub struct TodoQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "empty_variant_as_none")]
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

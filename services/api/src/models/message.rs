//! Private notes left for each other

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{NAME_MAX, empty_as_none};
use crate::error::ApiResult;
use crate::validation::{check_length, non_blank, require_text};

/// Message model
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    /// One of the two display names
    pub author: String,
    pub is_special: bool,
    pub message_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored message fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFields {
    pub content: String,
    pub author: String,
    pub is_special: bool,
}

impl MessageFields {
    pub fn check(&self) -> ApiResult<()> {
        check_length(&self.author, NAME_MAX, "Author")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub content: Option<String>,
    pub author: Option<String>,
    pub is_special: Option<bool>,
    /// Defaults to the time of creation
    pub message_date: Option<DateTime<Utc>>,
}

impl CreateMessageRequest {
    pub fn into_fields(self) -> ApiResult<(MessageFields, Option<DateTime<Utc>>)> {
        const MISSING: &str = "Content and author are required";
        let fields = MessageFields {
            content: require_text(self.content, MISSING)?,
            author: require_text(self.author, MISSING)?,
            is_special: self.is_special.unwrap_or(false),
        };
        Ok((fields, self.message_date))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageRequest {
    pub content: Option<String>,
    pub author: Option<String>,
    pub is_special: Option<bool>,
}

impl UpdateMessageRequest {
    pub fn apply(self, current: &Message) -> MessageFields {
        MessageFields {
            content: non_blank(self.content).unwrap_or_else(|| current.content.clone()),
            author: non_blank(self.author).unwrap_or_else(|| current.author.clone()),
            is_special: self.is_special.unwrap_or(current.is_special),
        }
    }
}

/// Query for `GET /messages`
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub special: Option<bool>,
}

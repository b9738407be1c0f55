//! Uploaded photos

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{TITLE_MAX, nullable};
use crate::error::ApiResult;
use crate::validation::{check_length, non_blank};

/// Photo model
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Stored file name inside the content directory
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row inserted for one uploaded file
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub title: String,
    pub description: Option<String>,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
    pub url: String,
    pub thumbnail_url: String,
}

/// Editable photo metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDetails {
    pub title: String,
    pub description: Option<String>,
}

impl PhotoDetails {
    pub fn check(&self) -> ApiResult<()> {
        check_length(&self.title, TITLE_MAX, "Title")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePhotoRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

impl UpdatePhotoRequest {
    pub fn apply(self, current: &Photo) -> PhotoDetails {
        PhotoDetails {
            title: non_blank(self.title).unwrap_or_else(|| current.title.clone()),
            description: match self.description {
                Some(description) => description,
                None => current.description.clone(),
            },
        }
    }
}

//! Diary entries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{TITLE_MAX, empty_as_none, empty_variant_as_none, lenient_date};
use crate::error::ApiResult;
use crate::validation::{check_length, non_blank, require_text};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "diary_mood", rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Happy,
    Love,
    Sad,
    Excited,
    Calm,
    Romantic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "diary_weather", rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Windy,
}

/// Diary model
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub mood: Mood,
    pub weather: Weather,
    pub images: Vec<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored diary fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryFields {
    pub title: String,
    pub content: String,
    pub mood: Mood,
    pub weather: Weather,
    pub images: Vec<String>,
    pub date: NaiveDate,
}

impl DiaryFields {
    pub fn check(&self) -> ApiResult<()> {
        check_length(&self.title, TITLE_MAX, "Title")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateDiaryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub weather: Option<Weather>,
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
}

impl CreateDiaryRequest {
    pub fn into_fields(self, today: NaiveDate) -> ApiResult<DiaryFields> {
        const MISSING: &str = "Title and content are required";
        Ok(DiaryFields {
            title: require_text(self.title, MISSING)?,
            content: require_text(self.content, MISSING)?,
            mood: self.mood.unwrap_or_default(),
            weather: self.weather.unwrap_or_default(),
            images: self.images.unwrap_or_default(),
            date: self.date.unwrap_or(today),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDiaryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub weather: Option<Weather>,
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
}

impl UpdateDiaryRequest {
    /// Merge onto the stored entry, keeping every field not provided
    pub fn apply(self, current: &Diary) -> DiaryFields {
        DiaryFields {
            title: non_blank(self.title).unwrap_or_else(|| current.title.clone()),
            content: non_blank(self.content).unwrap_or_else(|| current.content.clone()),
            mood: self.mood.unwrap_or(current.mood),
            weather: self.weather.unwrap_or(current.weather),
            images: self.images.unwrap_or_else(|| current.images.clone()),
            date: self.date.unwrap_or(current.date),
        }
    }
}

/// Query for `GET /diaries/search`
#[derive(Debug, Default, Deserialize)]
pub struct DiarySearchQuery {
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_variant_as_none")]
    pub mood: Option<Mood>,
    #[serde(default, deserialize_with = "empty_variant_as_none")]
    pub weather: Option<Weather>,
}

/// Query for `GET /diaries`
#[derive(Debug, Default, Deserialize)]
pub struct DiaryListQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "empty_variant_as_none")]
    pub mood: Option<Mood>,
    #[serde(default, deserialize_with = "empty_variant_as_none")]
    pub weather: Option<Weather>,
}

//! Anniversaries and other dates worth remembering

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{CATEGORY_MAX, TITLE_MAX, lenient_date, nullable};
use crate::error::{ApiError, ApiResult};
use crate::validation::{check_length, non_blank, require_text};

/// How far ahead `upcoming` looks, in days
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

pub const DEFAULT_CATEGORY: &str = "anniversary";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "importance_level", rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
}

/// Memorial model
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Memorial {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub importance: Importance,
    pub category: String,
    pub is_recurring: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored memorial fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorialFields {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub importance: Importance,
    pub category: String,
    pub is_recurring: bool,
}

impl MemorialFields {
    pub fn check(&self) -> ApiResult<()> {
        check_length(&self.title, TITLE_MAX, "Title")?;
        check_length(&self.category, CATEGORY_MAX, "Category")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemorialRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    pub importance: Option<Importance>,
    pub category: Option<String>,
    pub is_recurring: Option<bool>,
}

impl CreateMemorialRequest {
    pub fn into_fields(self) -> ApiResult<MemorialFields> {
        const MISSING: &str = "Title and date are required";
        let title = require_text(self.title, MISSING)?;
        let date = self.date.ok_or_else(|| ApiError::validation(MISSING))?;
        Ok(MemorialFields {
            title,
            description: non_blank(self.description),
            date,
            importance: self.importance.unwrap_or_default(),
            category: non_blank(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            is_recurring: self.is_recurring.unwrap_or(true),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemorialRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    pub importance: Option<Importance>,
    pub category: Option<String>,
    pub is_recurring: Option<bool>,
}

impl UpdateMemorialRequest {
    pub fn apply(self, current: &Memorial) -> MemorialFields {
        MemorialFields {
            title: non_blank(self.title).unwrap_or_else(|| current.title.clone()),
            description: match self.description {
                Some(description) => description,
                None => current.description.clone(),
            },
            date: self.date.unwrap_or(current.date),
            importance: self.importance.unwrap_or(current.importance),
            category: non_blank(self.category).unwrap_or_else(|| current.category.clone()),
            is_recurring: self.is_recurring.unwrap_or(current.is_recurring),
        }
    }
}

/// A memorial annotated with its next occurrence
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingMemorial {
    #[serde(flatten)]
    pub memorial: Memorial,
    pub next_occurrence: NaiveDate,
    pub days_until: i64,
}

/// Move `date` to `year`, mapping Feb 29 to Feb 28 in non-leap years
fn on_year(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
}

/// Next day on or after `today` that the memorial falls on
///
/// Recurring memorials repeat every year on the stored month and day. The
/// stored date itself is never changed.
pub fn next_occurrence(memorial: &Memorial, today: NaiveDate) -> Option<NaiveDate> {
    if memorial.date >= today || !memorial.is_recurring {
        return Some(memorial.date);
    }
    let this_year = on_year(memorial.date, today.year())?;
    if this_year >= today {
        Some(this_year)
    } else {
        on_year(memorial.date, today.year() + 1)
    }
}

/// Memorials occurring within the upcoming window, soonest first
pub fn upcoming(memorials: Vec<Memorial>, today: NaiveDate) -> Vec<UpcomingMemorial> {
    let window_end = today + Duration::days(UPCOMING_WINDOW_DAYS);
    let mut upcoming: Vec<UpcomingMemorial> = memorials
        .into_iter()
        .filter_map(|memorial| {
            let next = next_occurrence(&memorial, today)?;
            (next >= today && next <= window_end).then(|| UpcomingMemorial {
                days_until: (next - today).num_days(),
                next_occurrence: next,
                memorial,
            })
        })
        .collect();
    upcoming.sort_by(|a, b| {
        a.next_occurrence
            .cmp(&b.next_occurrence)
            .then_with(|| a.memorial.title.cmp(&b.memorial.title))
    });
    upcoming
}

//! The shared account and its settings

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{NAME_MAX, lenient_date};
use crate::error::ApiResult;
use crate::validation::{check_length, non_blank};

/// Username of the single shared account
pub const ACCOUNT_USERNAME: &str = "couple";

/// User model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub person1_name: String,
    pub person2_name: String,
    pub love_start_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public profile returned to the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub person1_name: String,
    pub person2_name: String,
    pub love_start_date: NaiveDate,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            person1_name: user.person1_name.clone(),
            person2_name: user.person2_name.clone(),
            love_start_date: user.love_start_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

impl ProfileResponse {
    pub fn new(user: &User) -> Self {
        Self {
            success: true,
            user: user.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub person1_name: Option<String>,
    pub person2_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub love_start_date: Option<NaiveDate>,
}

/// Settings as they will be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub person1_name: String,
    pub person2_name: String,
    pub love_start_date: NaiveDate,
}

impl Settings {
    pub fn check(&self) -> ApiResult<()> {
        check_length(&self.person1_name, NAME_MAX, "Name")?;
        check_length(&self.person2_name, NAME_MAX, "Name")
    }
}

impl UpdateSettingsRequest {
    /// Merge into the current settings; omitted or blank fields keep their value
    pub fn apply(self, user: &User) -> Settings {
        Settings {
            person1_name: non_blank(self.person1_name).unwrap_or_else(|| user.person1_name.clone()),
            person2_name: non_blank(self.person2_name).unwrap_or_else(|| user.person2_name.clone()),
            love_start_date: self.love_start_date.unwrap_or(user.love_start_date),
        }
    }
}

//! One-time import of data cached by the pre-API client
//!
//! The legacy blob is untrusted: every record is decoded and submitted on
//! its own, and the outcome of each one is reported back to the caller.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::JournalApi;
use crate::error::ClientResult;
use crate::models::{
    Collection, Importance, Mood, NewDiary, NewMemorial, NewMessage, NewTodo, Priority, Weather,
};
use crate::storage::{LEGACY_DATA_KEY, LocalStore, PENDING_MIGRATION_KEY};

/// Collections of the legacy cache, each item kept as raw JSON
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyData {
    #[serde(deserialize_with = "lenient_list")]
    pub diaries: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pub photos: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pub memorials: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pub todos: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pub messages: Vec<Value>,
}

impl LegacyData {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn is_empty(&self) -> bool {
        self.diaries.is_empty()
            && self.photos.is_empty()
            && self.memorials.is_empty()
            && self.todos.is_empty()
            && self.messages.is_empty()
    }
}

/// Copy a non-empty legacy cache to the pending slot
///
/// Returns whether anything was staged. An unparseable cache is removed.
pub fn stage_legacy_cache(store: &dyn LocalStore) -> ClientResult<bool> {
    let Some(raw) = store.get(LEGACY_DATA_KEY)? else {
        return Ok(false);
    };
    match LegacyData::parse(&raw) {
        Ok(data) if !data.is_empty() => {
            info!("Local data found, it will be imported after the next login");
            store.set(PENDING_MIGRATION_KEY, &raw)?;
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(e) => {
            warn!("Discarding corrupt local cache: {}", e);
            store.remove(LEGACY_DATA_KEY)?;
            Ok(false)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    Imported,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub collection: Collection,
    /// Position of the item within its legacy collection
    pub index: usize,
    pub status: ImportStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl MigrationReport {
    fn count(&self, pred: impl Fn(&ImportStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn imported(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::Imported))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::Skipped(_)))
    }

    fn record(&mut self, collection: Collection, index: usize, status: ImportStatus) {
        if let ImportStatus::Failed(reason) = &status {
            warn!("Failed to import {} #{}: {}", collection, index, reason);
        }
        self.outcomes.push(ItemOutcome {
            collection,
            index,
            status,
        });
    }
}

/// Values of the wrong shape read as absent instead of failing the record
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// A collection that is `null` or not an array reads as empty
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Option<Vec<Value>> = lenient(deserializer)?;
    Ok(items.unwrap_or_default())
}

/// Calendar dates were cached either as plain dates or ISO timestamps
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = lenient(deserializer)?;
    Ok(value.as_deref().and_then(parse_legacy_date))
}

fn parse_legacy_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyDiary {
    title: String,
    content: String,
    #[serde(default, deserialize_with = "lenient")]
    mood: Option<Mood>,
    #[serde(default, deserialize_with = "lenient")]
    weather: Option<Weather>,
    #[serde(default, deserialize_with = "lenient_date")]
    date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient")]
    images: Option<Vec<String>>,
}

impl From<LegacyDiary> for NewDiary {
    fn from(legacy: LegacyDiary) -> Self {
        NewDiary {
            title: legacy.title,
            content: legacy.content,
            mood: legacy.mood,
            weather: legacy.weather,
            date: legacy.date,
            images: legacy.images.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTodo {
    content: String,
    #[serde(default, deserialize_with = "lenient")]
    priority: Option<Priority>,
    #[serde(default, deserialize_with = "lenient")]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    is_completed: Option<bool>,
}

impl From<LegacyTodo> for NewTodo {
    fn from(legacy: LegacyTodo) -> Self {
        NewTodo {
            content: legacy.content,
            priority: Some(legacy.priority.unwrap_or(Priority::Medium)),
            category: Some(legacy.category.unwrap_or_else(|| "general".to_string())),
            due_date: None,
            is_completed: Some(legacy.is_completed.unwrap_or(false)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMemorial {
    title: String,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(deserialize_with = "required_date")]
    date: NaiveDate,
    #[serde(default, deserialize_with = "lenient")]
    importance: Option<Importance>,
    #[serde(default, deserialize_with = "lenient")]
    category: Option<String>,
}

fn required_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_date(deserializer)?.ok_or_else(|| serde::de::Error::custom("invalid date"))
}

impl From<LegacyMemorial> for NewMemorial {
    fn from(legacy: LegacyMemorial) -> Self {
        NewMemorial {
            title: legacy.title,
            description: legacy.description,
            date: legacy.date,
            importance: Some(legacy.importance.unwrap_or(Importance::Medium)),
            category: Some(legacy.category.unwrap_or_else(|| "anniversary".to_string())),
            is_recurring: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMessage {
    content: String,
    author: String,
    #[serde(default, deserialize_with = "lenient")]
    is_special: Option<bool>,
}

impl From<LegacyMessage> for NewMessage {
    fn from(legacy: LegacyMessage) -> Self {
        NewMessage {
            content: legacy.content,
            author: legacy.author,
            is_special: Some(legacy.is_special.unwrap_or(false)),
        }
    }
}

fn decode<T: DeserializeOwned>(item: &Value) -> Result<T, ImportStatus> {
    serde_json::from_value(item.clone())
        .map_err(|e| ImportStatus::Failed(format!("malformed record: {e}")))
}

fn settle<T>(result: ClientResult<T>) -> ImportStatus {
    match result {
        Ok(_) => ImportStatus::Imported,
        Err(e) => ImportStatus::Failed(e.user_message()),
    }
}

/// Submit every legacy record as its own create call
///
/// Never fails as a whole: each record's fate is in the report. Legacy
/// photos carry no file reference that could be uploaded, so they are
/// reported as skipped.
pub async fn import_legacy<A>(api: &A, batch: &LegacyData) -> MigrationReport
where
    A: JournalApi + ?Sized,
{
    let mut report = MigrationReport::default();

    for (index, item) in batch.diaries.iter().enumerate() {
        let status = match decode::<LegacyDiary>(item) {
            Ok(diary) => settle(api.create_diary(&diary.into()).await),
            Err(status) => status,
        };
        report.record(Collection::Diaries, index, status);
    }

    for (index, item) in batch.todos.iter().enumerate() {
        let status = match decode::<LegacyTodo>(item) {
            Ok(todo) => settle(api.create_todo(&todo.into()).await),
            Err(status) => status,
        };
        report.record(Collection::Todos, index, status);
    }

    for (index, item) in batch.memorials.iter().enumerate() {
        let status = match decode::<LegacyMemorial>(item) {
            Ok(memorial) => settle(api.create_memorial(&memorial.into()).await),
            Err(status) => status,
        };
        report.record(Collection::Memorials, index, status);
    }

    for (index, item) in batch.messages.iter().enumerate() {
        let status = match decode::<LegacyMessage>(item) {
            Ok(message) => settle(api.create_message(&message.into()).await),
            Err(status) => status,
        };
        report.record(Collection::Messages, index, status);
    }

    for index in 0..batch.photos.len() {
        report.record(
            Collection::Photos,
            index,
            ImportStatus::Skipped("cached photos hold no uploadable file".to_string()),
        );
    }

    info!(
        "Legacy import finished: {} imported, {} failed, {} skipped",
        report.imported(),
        report.failed(),
        report.skipped()
    );
    report
}

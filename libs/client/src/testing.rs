//! In-memory [`JournalApi`] used by the unit tests

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::api::JournalApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    Collection, CollectionData, Diary, DiaryUpdate, Importance, LoginSession, Memorial,
    MemorialUpdate, Message, MessageUpdate, Mood, NewDiary, NewMemorial, NewMessage, NewTodo,
    Photo, PhotoUpdate, PhotoUpload, Priority, Profile, SettingsUpdate, Todo, TodoUpdate, Weather,
};

pub const PASSWORD: &str = "love2024";
pub const TOKEN: &str = "session-token";

struct Inner {
    token: Option<String>,
    expired: bool,
    unavailable: bool,
    profile: Profile,
    diaries: Vec<Diary>,
    photos: Vec<Photo>,
    memorials: Vec<Memorial>,
    todos: Vec<Todo>,
    messages: Vec<Message>,
    failing: HashSet<Collection>,
    requests: Vec<String>,
}

pub struct FakeApi {
    inner: Mutex<Inner>,
}

fn invalid(message: &str) -> ClientError {
    ClientError::Api {
        status: 400,
        message: message.to_string(),
    }
}

fn not_found(collection: Collection) -> ClientError {
    ClientError::Api {
        status: 404,
        message: format!("{} not found", collection.noun()),
    }
}

fn blank(text: &str) -> bool {
    text.trim().is_empty()
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                token: None,
                expired: false,
                unavailable: false,
                profile: Profile {
                    id: Uuid::new_v4(),
                    username: "couple".to_string(),
                    person1_name: "Alex".to_string(),
                    person2_name: "Sam".to_string(),
                    love_start_date: NaiveDate::from_ymd_opt(2023, 9, 9).unwrap(),
                },
                diaries: Vec::new(),
                photos: Vec::new(),
                memorials: Vec::new(),
                todos: Vec::new(),
                messages: Vec::new(),
                failing: HashSet::new(),
                requests: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Log the request and refuse it once the session has expired
    fn begin(&self, request: String) -> ClientResult<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        inner.requests.push(request);
        if inner.unavailable {
            return Err(ClientError::Api {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        if inner.expired {
            return Err(ClientError::Unauthorized("Token expired".to_string()));
        }
        Ok(inner)
    }

    /// Every later request fails as if the server were unreachable
    pub fn go_offline(&self) {
        self.lock().unavailable = true;
    }

    /// Every later request answers 401
    pub fn expire_session(&self) {
        self.lock().expired = true;
    }

    pub fn fail_fetch(&self, collection: Collection) {
        self.lock().failing.insert(collection);
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.lock().todos.clone()
    }

    pub fn memorials(&self) -> Vec<Memorial> {
        self.lock().memorials.clone()
    }

    pub fn diaries(&self) -> Vec<Diary> {
        self.lock().diaries.clone()
    }

    pub fn seed_todo(&self, content: &str) -> Uuid {
        let todo = Todo {
            id: Uuid::new_v4(),
            content: content.to_string(),
            priority: Priority::Medium,
            category: "general".to_string(),
            is_completed: false,
            completed_at: None,
            due_date: None,
            created_at: Utc::now(),
        };
        let id = todo.id;
        self.lock().todos.push(todo);
        id
    }
}

#[async_trait]
impl JournalApi for FakeApi {
    fn set_token(&self, token: Option<String>) {
        self.lock().token = token;
    }

    async fn login(&self, password: &str) -> ClientResult<LoginSession> {
        let mut inner = self.lock();
        inner.requests.push("POST auth/login".to_string());
        if password != PASSWORD {
            return Err(ClientError::Unauthorized("Incorrect password".to_string()));
        }
        inner.expired = false;
        Ok(LoginSession {
            token: TOKEN.to_string(),
            user: inner.profile.clone(),
        })
    }

    async fn profile(&self) -> ClientResult<Profile> {
        let inner = self.begin("GET auth/profile".to_string())?;
        if inner.token.as_deref() != Some(TOKEN) {
            return Err(ClientError::Unauthorized("Invalid token".to_string()));
        }
        Ok(inner.profile.clone())
    }

    async fn update_settings(&self, update: &SettingsUpdate) -> ClientResult<Profile> {
        let mut inner = self.begin("PUT auth/settings".to_string())?;
        let profile = &mut inner.profile;
        if let Some(name) = update.person1_name.as_deref().filter(|n| !blank(n)) {
            profile.person1_name = name.to_string();
        }
        if let Some(name) = update.person2_name.as_deref().filter(|n| !blank(n)) {
            profile.person2_name = name.to_string();
        }
        if let Some(date) = update.love_start_date {
            profile.love_start_date = date;
        }
        Ok(profile.clone())
    }

    async fn fetch(&self, collection: Collection) -> ClientResult<CollectionData> {
        let inner = self.begin(format!("GET {collection}"))?;
        if inner.failing.contains(&collection) {
            return Err(ClientError::Api {
                status: 500,
                message: "Internal server error".to_string(),
            });
        }
        Ok(match collection {
            Collection::Diaries => CollectionData::Diaries(inner.diaries.clone()),
            Collection::Photos => CollectionData::Photos(inner.photos.clone()),
            Collection::Memorials => CollectionData::Memorials(inner.memorials.clone()),
            Collection::Todos => CollectionData::Todos(inner.todos.clone()),
            Collection::Messages => CollectionData::Messages(inner.messages.clone()),
        })
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> ClientResult<()> {
        let mut inner = self.begin(format!("DELETE {collection}/{id}"))?;
        let removed = match collection {
            Collection::Diaries => {
                let n = inner.diaries.len();
                inner.diaries.retain(|d| d.id != id);
                n != inner.diaries.len()
            }
            Collection::Photos => {
                let n = inner.photos.len();
                inner.photos.retain(|p| p.id != id);
                n != inner.photos.len()
            }
            Collection::Memorials => {
                let n = inner.memorials.len();
                inner.memorials.retain(|m| m.id != id);
                n != inner.memorials.len()
            }
            Collection::Todos => {
                let n = inner.todos.len();
                inner.todos.retain(|t| t.id != id);
                n != inner.todos.len()
            }
            Collection::Messages => {
                let n = inner.messages.len();
                inner.messages.retain(|m| m.id != id);
                n != inner.messages.len()
            }
        };
        if removed { Ok(()) } else { Err(not_found(collection)) }
    }

    async fn create_diary(&self, diary: &NewDiary) -> ClientResult<Diary> {
        let mut inner = self.begin("POST diaries".to_string())?;
        if blank(&diary.title) || blank(&diary.content) {
            return Err(invalid("Title and content are required"));
        }
        let now = Utc::now();
        let created = Diary {
            id: Uuid::new_v4(),
            title: diary.title.trim().to_string(),
            content: diary.content.trim().to_string(),
            mood: diary.mood.unwrap_or(Mood::Happy),
            weather: diary.weather.unwrap_or(Weather::Sunny),
            images: diary.images.clone(),
            date: diary.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
            updated_at: now,
        };
        inner.diaries.push(created.clone());
        Ok(created)
    }

    async fn update_diary(&self, id: Uuid, update: &DiaryUpdate) -> ClientResult<Diary> {
        let mut inner = self.begin(format!("PUT diaries/{id}"))?;
        let diary = inner
            .diaries
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found(Collection::Diaries))?;
        if let Some(title) = update.title.as_deref().filter(|t| !blank(t)) {
            diary.title = title.to_string();
        }
        if let Some(content) = update.content.as_deref().filter(|c| !blank(c)) {
            diary.content = content.to_string();
        }
        diary.mood = update.mood.unwrap_or(diary.mood);
        diary.weather = update.weather.unwrap_or(diary.weather);
        diary.date = update.date.unwrap_or(diary.date);
        Ok(diary.clone())
    }

    async fn upload_photos(&self, upload: PhotoUpload) -> ClientResult<Vec<Photo>> {
        let mut inner = self.begin("POST photos/upload".to_string())?;
        if upload.files.is_empty() {
            return Err(invalid("Please select photos to upload"));
        }
        let total = upload.files.len();
        let now = Utc::now();
        let photos: Vec<Photo> = upload
            .files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                let title = match upload.title.as_deref() {
                    Some(title) if total > 1 => format!("{} {}", title, index + 1),
                    Some(title) => title.to_string(),
                    None => file.name.clone(),
                };
                Photo {
                    id: Uuid::new_v4(),
                    title,
                    description: upload.description.clone(),
                    filename: file.name.clone(),
                    original_name: file.name.clone(),
                    mimetype: file.content_type,
                    size: file.data.len() as i64,
                    url: format!("/uploads/{}", file.name),
                    thumbnail_url: Some(format!("/uploads/thumb_{}", file.name)),
                    upload_date: now,
                    created_at: now,
                }
            })
            .collect();
        inner.photos.extend(photos.iter().cloned());
        Ok(photos)
    }

    async fn update_photo(&self, id: Uuid, update: &PhotoUpdate) -> ClientResult<Photo> {
        let mut inner = self.begin(format!("PUT photos/{id}"))?;
        let photo = inner
            .photos
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(Collection::Photos))?;
        if let Some(title) = update.title.as_deref().filter(|t| !blank(t)) {
            photo.title = title.to_string();
        }
        if let Some(description) = &update.description {
            photo.description = description.clone();
        }
        Ok(photo.clone())
    }

    async fn create_memorial(&self, memorial: &NewMemorial) -> ClientResult<Memorial> {
        let mut inner = self.begin("POST memorials".to_string())?;
        if blank(&memorial.title) {
            return Err(invalid("Title and date are required"));
        }
        let created = Memorial {
            id: Uuid::new_v4(),
            title: memorial.title.trim().to_string(),
            description: memorial.description.clone(),
            date: memorial.date,
            importance: memorial.importance.unwrap_or(Importance::Medium),
            category: memorial
                .category
                .clone()
                .unwrap_or_else(|| "anniversary".to_string()),
            is_recurring: memorial.is_recurring.unwrap_or(true),
            created_at: Utc::now(),
        };
        inner.memorials.push(created.clone());
        Ok(created)
    }

    async fn update_memorial(&self, id: Uuid, update: &MemorialUpdate) -> ClientResult<Memorial> {
        let mut inner = self.begin(format!("PUT memorials/{id}"))?;
        let memorial = inner
            .memorials
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| not_found(Collection::Memorials))?;
        if let Some(title) = update.title.as_deref().filter(|t| !blank(t)) {
            memorial.title = title.to_string();
        }
        if let Some(description) = &update.description {
            memorial.description = description.clone();
        }
        memorial.date = update.date.unwrap_or(memorial.date);
        memorial.importance = update.importance.unwrap_or(memorial.importance);
        memorial.is_recurring = update.is_recurring.unwrap_or(memorial.is_recurring);
        Ok(memorial.clone())
    }

    async fn create_todo(&self, todo: &NewTodo) -> ClientResult<Todo> {
        let mut inner = self.begin("POST todos".to_string())?;
        if blank(&todo.content) {
            return Err(invalid("Todo content is required"));
        }
        let now = Utc::now();
        let is_completed = todo.is_completed.unwrap_or(false);
        let created = Todo {
            id: Uuid::new_v4(),
            content: todo.content.trim().to_string(),
            priority: todo.priority.unwrap_or(Priority::Medium),
            category: todo.category.clone().unwrap_or_else(|| "general".to_string()),
            is_completed,
            completed_at: is_completed.then_some(now),
            due_date: todo.due_date,
            created_at: now,
        };
        inner.todos.push(created.clone());
        Ok(created)
    }

    async fn update_todo(&self, id: Uuid, update: &TodoUpdate) -> ClientResult<Todo> {
        let mut inner = self.begin(format!("PUT todos/{id}"))?;
        let todo = inner
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(Collection::Todos))?;
        if let Some(content) = update.content.as_deref().filter(|c| !blank(c)) {
            todo.content = content.to_string();
        }
        todo.priority = update.priority.unwrap_or(todo.priority);
        if let Some(due_date) = update.due_date {
            todo.due_date = due_date;
        }
        if let Some(done) = update.is_completed {
            todo.is_completed = done;
            todo.completed_at = done.then(Utc::now);
        }
        Ok(todo.clone())
    }

    async fn toggle_todo(&self, id: Uuid) -> ClientResult<Todo> {
        let mut inner = self.begin(format!("PATCH todos/{id}/toggle"))?;
        let todo = inner
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(Collection::Todos))?;
        todo.is_completed = !todo.is_completed;
        todo.completed_at = todo.is_completed.then(Utc::now);
        Ok(todo.clone())
    }

    async fn create_message(&self, message: &NewMessage) -> ClientResult<Message> {
        let mut inner = self.begin("POST messages".to_string())?;
        if blank(&message.content) || blank(&message.author) {
            return Err(invalid("Content and author are required"));
        }
        let now = Utc::now();
        let created = Message {
            id: Uuid::new_v4(),
            content: message.content.trim().to_string(),
            author: message.author.trim().to_string(),
            is_special: message.is_special.unwrap_or(false),
            message_date: now,
            created_at: now,
        };
        inner.messages.push(created.clone());
        Ok(created)
    }

    async fn update_message(&self, id: Uuid, update: &MessageUpdate) -> ClientResult<Message> {
        let mut inner = self.begin(format!("PUT messages/{id}"))?;
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| not_found(Collection::Messages))?;
        if let Some(content) = update.content.as_deref().filter(|c| !blank(c)) {
            message.content = content.to_string();
        }
        if let Some(author) = update.author.as_deref().filter(|a| !blank(a)) {
            message.author = author.to_string();
        }
        message.is_special = update.is_special.unwrap_or(message.is_special);
        Ok(message.clone())
    }
}

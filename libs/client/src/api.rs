//! The network seam of the client
//!
//! [`JournalApi`] is everything the controller needs from the server.
//! [`ApiClient`] implements it over HTTP with [`reqwest`].

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, multipart};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::models::{
    Collection, CollectionData, Diary, DiaryUpdate, LoginSession, Memorial, MemorialUpdate,
    Message, MessageUpdate, NewDiary, NewMemorial, NewMessage, NewTodo, Photo, PhotoUpdate,
    PhotoUpload, Profile, SettingsUpdate, Todo, TodoUpdate,
};

/// Page size requested when mirroring paginated collections
pub const MIRROR_PAGE_SIZE: u32 = 100;

#[async_trait]
pub trait JournalApi: Send + Sync {
    /// Token attached to every subsequent request
    fn set_token(&self, token: Option<String>);

    async fn login(&self, password: &str) -> ClientResult<LoginSession>;
    async fn profile(&self) -> ClientResult<Profile>;
    async fn update_settings(&self, update: &SettingsUpdate) -> ClientResult<Profile>;

    /// Fetch one whole collection
    async fn fetch(&self, collection: Collection) -> ClientResult<CollectionData>;
    async fn delete(&self, collection: Collection, id: Uuid) -> ClientResult<()>;

    async fn create_diary(&self, diary: &NewDiary) -> ClientResult<Diary>;
    async fn update_diary(&self, id: Uuid, update: &DiaryUpdate) -> ClientResult<Diary>;

    async fn upload_photos(&self, upload: PhotoUpload) -> ClientResult<Vec<Photo>>;
    async fn update_photo(&self, id: Uuid, update: &PhotoUpdate) -> ClientResult<Photo>;

    async fn create_memorial(&self, memorial: &NewMemorial) -> ClientResult<Memorial>;
    async fn update_memorial(&self, id: Uuid, update: &MemorialUpdate) -> ClientResult<Memorial>;

    async fn create_todo(&self, todo: &NewTodo) -> ClientResult<Todo>;
    async fn update_todo(&self, id: Uuid, update: &TodoUpdate) -> ClientResult<Todo>;
    async fn toggle_todo(&self, id: Uuid) -> ClientResult<Todo>;

    async fn create_message(&self, message: &NewMessage) -> ClientResult<Message>;
    async fn update_message(&self, id: Uuid, update: &MessageUpdate) -> ClientResult<Message>;
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: Profile,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    password: &'a str,
}

/// HTTP client for the journal REST API
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// * `base_url` - API root including `/api`, e.g. `http://localhost:3001/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let envelope: DataEnvelope<T> = self.send(builder).await?;
        Ok(envelope.data)
    }

    async fn list<T: DeserializeOwned>(&self, collection: Collection) -> ClientResult<Vec<T>> {
        let mut builder = self.request(Method::GET, collection.path());
        if matches!(collection, Collection::Diaries | Collection::Photos) {
            builder = builder.query(&[("limit", MIRROR_PAGE_SIZE)]);
        }
        self.data(builder).await
    }

    /// Map non-2xx responses to [`ClientError`], keeping the server's message
    async fn ensure_success(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!("Request failed with {}: {}", status, body);
        Err(error_from_body(status, &body))
    }
}

/// Build the error for a failed response from its status and raw body
pub fn error_from_body(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    if status == StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized(message)
    } else {
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl JournalApi for ApiClient {
    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn login(&self, password: &str) -> ClientResult<LoginSession> {
        let builder = self
            .request(Method::POST, "auth/login")
            .json(&LoginBody { password });
        self.send(builder).await
    }

    async fn profile(&self) -> ClientResult<Profile> {
        let envelope: UserEnvelope = self.send(self.request(Method::GET, "auth/profile")).await?;
        Ok(envelope.user)
    }

    async fn update_settings(&self, update: &SettingsUpdate) -> ClientResult<Profile> {
        let builder = self.request(Method::PUT, "auth/settings").json(update);
        let envelope: UserEnvelope = self.send(builder).await?;
        Ok(envelope.user)
    }

    async fn fetch(&self, collection: Collection) -> ClientResult<CollectionData> {
        Ok(match collection {
            Collection::Diaries => CollectionData::Diaries(self.list(collection).await?),
            Collection::Photos => CollectionData::Photos(self.list(collection).await?),
            Collection::Memorials => CollectionData::Memorials(self.list(collection).await?),
            Collection::Todos => CollectionData::Todos(self.list(collection).await?),
            Collection::Messages => CollectionData::Messages(self.list(collection).await?),
        })
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> ClientResult<()> {
        let path = format!("{}/{}", collection.path(), id);
        let _: serde_json::Value = self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn create_diary(&self, diary: &NewDiary) -> ClientResult<Diary> {
        self.data(self.request(Method::POST, "diaries").json(diary))
            .await
    }

    async fn update_diary(&self, id: Uuid, update: &DiaryUpdate) -> ClientResult<Diary> {
        let path = format!("diaries/{id}");
        self.data(self.request(Method::PUT, &path).json(update)).await
    }

    async fn upload_photos(&self, upload: PhotoUpload) -> ClientResult<Vec<Photo>> {
        let mut form = multipart::Form::new();
        if let Some(title) = upload.title {
            form = form.text("title", title);
        }
        if let Some(description) = upload.description {
            form = form.text("description", description);
        }
        for file in upload.files {
            let part = multipart::Part::bytes(file.data)
                .file_name(file.name)
                .mime_str(&file.content_type)?;
            form = form.part("photos", part);
        }
        self.data(self.request(Method::POST, "photos/upload").multipart(form))
            .await
    }

    async fn update_photo(&self, id: Uuid, update: &PhotoUpdate) -> ClientResult<Photo> {
        let path = format!("photos/{id}");
        self.data(self.request(Method::PUT, &path).json(update)).await
    }

    async fn create_memorial(&self, memorial: &NewMemorial) -> ClientResult<Memorial> {
        self.data(self.request(Method::POST, "memorials").json(memorial))
            .await
    }

    async fn update_memorial(&self, id: Uuid, update: &MemorialUpdate) -> ClientResult<Memorial> {
        let path = format!("memorials/{id}");
        self.data(self.request(Method::PUT, &path).json(update)).await
    }

    async fn create_todo(&self, todo: &NewTodo) -> ClientResult<Todo> {
        self.data(self.request(Method::POST, "todos").json(todo)).await
    }

    async fn update_todo(&self, id: Uuid, update: &TodoUpdate) -> ClientResult<Todo> {
        let path = format!("todos/{id}");
        self.data(self.request(Method::PUT, &path).json(update)).await
    }

    async fn toggle_todo(&self, id: Uuid) -> ClientResult<Todo> {
        let path = format!("todos/{id}/toggle");
        self.data(self.request(Method::PATCH, &path)).await
    }

    async fn create_message(&self, message: &NewMessage) -> ClientResult<Message> {
        self.data(self.request(Method::POST, "messages").json(message))
            .await
    }

    async fn update_message(&self, id: Uuid, update: &MessageUpdate) -> ClientResult<Message> {
        let path = format!("messages/{id}");
        self.data(self.request(Method::PUT, &path).json(update)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slashes() {
        let api = ApiClient::new("http://localhost:3001/api/");
        assert_eq!(api.url("todos"), "http://localhost:3001/api/todos");
        assert_eq!(api.url("/auth/login"), "http://localhost:3001/api/auth/login");
    }

    #[test]
    fn test_token_is_replaceable() {
        let api = ApiClient::new("http://localhost:3001/api");
        assert_eq!(api.token(), None);
        api.set_token(Some("abc".to_string()));
        assert_eq!(api.token().as_deref(), Some("abc"));
        api.set_token(None);
        assert_eq!(api.token(), None);
    }

    #[test]
    fn test_401_becomes_unauthorized() {
        let err = error_from_body(
            StatusCode::UNAUTHORIZED,
            r#"{"success":false,"error":"Token expired"}"#,
        );
        assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "Token expired"));
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let err = error_from_body(StatusCode::NOT_FOUND, "<html>nope</html>");
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

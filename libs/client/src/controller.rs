//! Effects: everything that talks to the network or local storage
//!
//! The controller issues requests, turns their results into [`Action`]s
//! for the [`Store`] and never renders anything itself.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::JournalApi;
use crate::error::{ClientError, ClientResult};
use crate::migration::{LegacyData, MigrationReport, import_legacy, stage_legacy_cache};
use crate::models::{
    Collection, Diary, DiaryUpdate, Memorial, MemorialUpdate, Message, MessageUpdate, NewDiary,
    NewMemorial, NewMessage, NewTodo, Photo, PhotoUpdate, PhotoUpload, Profile, SettingsUpdate,
    Todo, TodoUpdate,
};
use crate::state::{Action, AppState, NotificationKind, Section};
use crate::storage::{LEGACY_DATA_KEY, LocalStore, PENDING_MIGRATION_KEY, TOKEN_KEY};
use crate::store::Store;

/// Asks the user to approve a destructive action
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct Controller<A, S> {
    api: A,
    local: S,
    store: Store,
}

impl<A, S> Controller<A, S>
where
    A: JournalApi,
    S: LocalStore,
{
    pub fn new(api: A, local: S) -> Self {
        Self {
            api,
            local,
            store: Store::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn local(&self) -> &S {
        &self.local
    }

    pub fn state(&self) -> AppState {
        self.store.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.store.subscribe()
    }

    /// Stage any legacy cache, then resume the stored session if it is still valid
    pub async fn boot(&self) -> ClientResult<()> {
        stage_legacy_cache(&self.local)?;

        let Some(token) = self.local.get(TOKEN_KEY)? else {
            return Ok(());
        };
        self.api.set_token(Some(token));

        match self.api.profile().await {
            Ok(user) => self.start_session(user).await,
            Err(e) if e.is_unauthorized() => {
                warn!("Stored session rejected: {}", e);
                self.forget_token();
                Ok(())
            }
            Err(e) => {
                warn!("Automatic login failed, keeping the stored session: {}", e);
                Ok(())
            }
        }
    }

    pub async fn login(&self, password: &str) -> ClientResult<()> {
        if password.is_empty() {
            return Err(self.report(ClientError::Validation(
                "Please enter the password".to_string(),
            )));
        }

        let session = self.guard(self.api.login(password).await)?;
        self.local.set(TOKEN_KEY, &session.token)?;
        self.api.set_token(Some(session.token));
        info!("Logged in as {}", session.user.username);
        self.start_session(session.user).await
    }

    async fn start_session(&self, user: Profile) -> ClientResult<()> {
        self.store.dispatch(Action::LoggedIn(user));
        self.load_all().await;
        self.migrate_pending().await?;
        Ok(())
    }

    pub fn logout(&self) {
        self.forget_token();
        self.store.dispatch(Action::LoggedOut);
    }

    /// Fetch all five collections concurrently
    ///
    /// A failed fetch is logged and leaves that collection empty; the
    /// others still load.
    pub async fn load_all(&self) {
        let (diaries, photos, memorials, todos, messages) = tokio::join!(
            self.api.fetch(Collection::Diaries),
            self.api.fetch(Collection::Photos),
            self.api.fetch(Collection::Memorials),
            self.api.fetch(Collection::Todos),
            self.api.fetch(Collection::Messages),
        );

        let mut loaded = Vec::with_capacity(Collection::ALL.len());
        let mut unauthorized = None;
        let results = [diaries, photos, memorials, todos, messages];
        for (collection, result) in Collection::ALL.into_iter().zip(results) {
            match result {
                Ok(data) => loaded.push(data),
                Err(e) if e.is_unauthorized() => unauthorized = Some(e),
                Err(e) => warn!("Failed to load {}: {}", collection, e),
            }
        }

        match unauthorized {
            Some(e) => {
                self.report(e);
            }
            None => self.store.dispatch(Action::Loaded(loaded)),
        }
    }

    /// Replace one collection with the server's current contents
    pub async fn refresh(&self, collection: Collection) -> ClientResult<()> {
        let data = self.guard(self.api.fetch(collection).await)?;
        self.store.dispatch(Action::Refreshed(data));
        Ok(())
    }

    /// Import the staged legacy cache, then discard it
    ///
    /// The cache is cleared once the report exists, whatever it says.
    pub async fn migrate_pending(&self) -> ClientResult<Option<MigrationReport>> {
        let Some(raw) = self.local.get(PENDING_MIGRATION_KEY)? else {
            return Ok(None);
        };

        let report = match LegacyData::parse(&raw) {
            Ok(batch) => Some(import_legacy(&self.api, &batch).await),
            Err(e) => {
                warn!("Discarding unreadable pending migration: {}", e);
                None
            }
        };

        self.local.remove(PENDING_MIGRATION_KEY)?;
        self.local.remove(LEGACY_DATA_KEY)?;

        if let Some(report) = &report {
            self.notify(
                NotificationKind::Info,
                format!("Imported {} items from local data", report.imported()),
            );
            self.load_all().await;
        }
        Ok(report)
    }

    pub fn navigate(&self, section: Section) {
        self.store.dispatch(Action::Navigate(section));
    }

    pub fn dismiss(&self, id: u64) {
        self.store.dispatch(Action::Dismiss(id));
    }

    /// Expire notifications older than their display time
    pub fn tick(&self, now: DateTime<Utc>) {
        self.store.dispatch(Action::Tick(now));
    }

    pub async fn save_settings(&self, update: &SettingsUpdate) -> ClientResult<Profile> {
        let user = self.guard(self.api.update_settings(update).await)?;
        self.store.dispatch(Action::SettingsSaved(user.clone()));
        self.notify(NotificationKind::Success, "Settings saved");
        Ok(user)
    }

    pub async fn create_diary(&self, diary: &NewDiary) -> ClientResult<Diary> {
        let result = self.api.create_diary(diary).await;
        self.mutated(Collection::Diaries, result, "Diary saved").await
    }

    pub async fn update_diary(&self, id: Uuid, update: &DiaryUpdate) -> ClientResult<Diary> {
        let result = self.api.update_diary(id, update).await;
        self.mutated(Collection::Diaries, result, "Diary updated").await
    }

    pub async fn upload_photos(&self, upload: PhotoUpload) -> ClientResult<Vec<Photo>> {
        if upload.files.is_empty() {
            return Err(self.report(ClientError::Validation(
                "Please select photos to upload".to_string(),
            )));
        }
        let count = upload.files.len();
        let result = self.api.upload_photos(upload).await;
        let message = format!("Uploaded {count} photos");
        self.mutated(Collection::Photos, result, &message).await
    }

    pub async fn update_photo(&self, id: Uuid, update: &PhotoUpdate) -> ClientResult<Photo> {
        let result = self.api.update_photo(id, update).await;
        self.mutated(Collection::Photos, result, "Photo updated").await
    }

    pub async fn create_memorial(&self, memorial: &NewMemorial) -> ClientResult<Memorial> {
        let result = self.api.create_memorial(memorial).await;
        self.mutated(Collection::Memorials, result, "Memorial saved").await
    }

    pub async fn update_memorial(
        &self,
        id: Uuid,
        update: &MemorialUpdate,
    ) -> ClientResult<Memorial> {
        let result = self.api.update_memorial(id, update).await;
        self.mutated(Collection::Memorials, result, "Memorial updated").await
    }

    pub async fn create_todo(&self, todo: &NewTodo) -> ClientResult<Todo> {
        let result = self.api.create_todo(todo).await;
        self.mutated(Collection::Todos, result, "Todo saved").await
    }

    pub async fn update_todo(&self, id: Uuid, update: &TodoUpdate) -> ClientResult<Todo> {
        let result = self.api.update_todo(id, update).await;
        self.mutated(Collection::Todos, result, "Todo updated").await
    }

    pub async fn toggle_todo(&self, id: Uuid) -> ClientResult<Todo> {
        let todo = self.guard(self.api.toggle_todo(id).await)?;
        self.refresh_after_change(Collection::Todos).await;
        Ok(todo)
    }

    pub async fn create_message(&self, message: &NewMessage) -> ClientResult<Message> {
        let result = self.api.create_message(message).await;
        self.mutated(Collection::Messages, result, "Message sent").await
    }

    pub async fn update_message(&self, id: Uuid, update: &MessageUpdate) -> ClientResult<Message> {
        let result = self.api.update_message(id, update).await;
        self.mutated(Collection::Messages, result, "Message updated").await
    }

    /// Delete one item after the user confirms
    ///
    /// Returns `false` without issuing a request when the user declines.
    pub async fn delete(
        &self,
        collection: Collection,
        id: Uuid,
        confirm: &dyn Confirm,
    ) -> ClientResult<bool> {
        let noun = collection.noun();
        if !confirm.confirm(&format!("Delete this {}?", noun.to_lowercase())) {
            return Ok(false);
        }
        let result = self.api.delete(collection, id).await;
        self.mutated(collection, result, &format!("{noun} deleted"))
            .await?;
        Ok(true)
    }

    /// Notify on success and reload the affected collection in full
    async fn mutated<T>(
        &self,
        collection: Collection,
        result: ClientResult<T>,
        success: &str,
    ) -> ClientResult<T> {
        let value = self.guard(result)?;
        self.notify(NotificationKind::Success, success);
        self.refresh_after_change(collection).await;
        Ok(value)
    }

    /// The change itself already succeeded, so a failed reload is only reported
    async fn refresh_after_change(&self, collection: Collection) {
        if let Err(e) = self.refresh(collection).await {
            warn!("Reloading {} after a change failed: {}", collection, e);
        }
    }

    fn guard<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        result.map_err(|e| self.report(e))
    }

    /// Surface a failure; a rejected session also ends it
    fn report(&self, err: ClientError) -> ClientError {
        if err.is_unauthorized() && self.state().is_authenticated() {
            warn!("Session rejected by the server, logging out");
            self.forget_token();
            self.store.dispatch(Action::Unauthorized);
        }
        self.notify(NotificationKind::Error, err.user_message());
        err
    }

    fn forget_token(&self) {
        self.api.set_token(None);
        if let Err(e) = self.local.remove(TOKEN_KEY) {
            warn!("Failed to clear the stored token: {}", e);
        }
    }

    fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        self.store.dispatch(Action::Notify {
            kind,
            message: message.into(),
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::state::Phase;
    use crate::storage::MemoryStore;
    use crate::testing::{FakeApi, PASSWORD, TOKEN};

    fn controller() -> Controller<FakeApi, MemoryStore> {
        Controller::new(FakeApi::new(), MemoryStore::new())
    }

    async fn logged_in() -> Controller<FakeApi, MemoryStore> {
        let controller = controller();
        controller.login(PASSWORD).await.unwrap();
        controller
    }

    fn requests_of(controller: &Controller<FakeApi, MemoryStore>, prefix: &str) -> usize {
        controller
            .api()
            .requests()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    #[tokio::test]
    async fn test_boot_resumes_session_and_imports_legacy_cache() {
        let controller = controller();
        let local = controller.local();
        local.set(TOKEN_KEY, TOKEN).unwrap();
        local
            .set(
                LEGACY_DATA_KEY,
                &json!({
                    "diaries": [{ "title": 42 }],
                    "todos": [{ "content": "Learn to dance" }, { "content": "Adopt a cat" }]
                })
                .to_string(),
            )
            .unwrap();

        controller.boot().await.unwrap();

        let state = controller.state();
        assert!(state.is_loaded());
        assert_eq!(state.data.todos.len(), 2);
        assert!(state.data.diaries.is_empty());
        assert_eq!(controller.api().todos().len(), 2);
        assert_eq!(local.get(PENDING_MIGRATION_KEY).unwrap(), None);
        assert_eq!(local.get(LEGACY_DATA_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_boot_with_stale_token_stays_logged_out() {
        let controller = controller();
        controller.local().set(TOKEN_KEY, "stale").unwrap();

        controller.boot().await.unwrap();

        assert_eq!(controller.state().phase, Phase::Unauthenticated);
        assert_eq!(controller.local().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(controller.api().token(), None);
    }

    #[tokio::test]
    async fn test_boot_keeps_token_when_server_is_unreachable() {
        let controller = controller();
        controller.local().set(TOKEN_KEY, TOKEN).unwrap();
        controller.api().go_offline();

        controller.boot().await.unwrap();

        assert_eq!(controller.state().phase, Phase::Unauthenticated);
        assert_eq!(controller.local().get(TOKEN_KEY).unwrap().as_deref(), Some(TOKEN));
    }

    #[tokio::test]
    async fn test_login_stores_token_and_loads() {
        let controller = logged_in().await;

        let state = controller.state();
        assert!(state.is_loaded());
        assert_eq!(state.user.unwrap().username, "couple");
        assert_eq!(controller.local().get(TOKEN_KEY).unwrap().as_deref(), Some(TOKEN));
        assert_eq!(controller.api().token().as_deref(), Some(TOKEN));
        assert_eq!(requests_of(&controller, "GET "), 5);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let controller = controller();

        let err = controller.login("").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(controller.api().requests().is_empty());

        let err = controller.login("wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
        let state = controller.state();
        assert_eq!(state.phase, Phase::Unauthenticated);
        assert_eq!(state.notifications.len(), 2);
        assert_eq!(state.notifications[1].kind, NotificationKind::Error);
        assert_eq!(state.notifications[1].message, "Incorrect password");
        assert_eq!(controller.local().get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_one_failed_fetch_does_not_block_the_others() {
        let controller = controller();
        controller.api().seed_todo("Buy flowers");
        controller.api().fail_fetch(Collection::Photos);

        controller.login(PASSWORD).await.unwrap();

        let state = controller.state();
        assert!(state.is_loaded());
        assert_eq!(state.data.todos.len(), 1);
        assert!(state.data.photos.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_response_ends_session() {
        let controller = logged_in().await;
        controller.navigate(Section::Todo);
        controller.api().expire_session();

        let err = controller.refresh(Collection::Todos).await.unwrap_err();
        assert!(err.is_unauthorized());

        let state = controller.state();
        assert_eq!(state.phase, Phase::Unauthenticated);
        assert_eq!(state.section, Section::Dashboard);
        assert!(state.user.is_none());
        assert_eq!(controller.local().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(controller.api().token(), None);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let controller = controller();
        let id = controller.api().seed_todo("Cancel gym");
        controller.login(PASSWORD).await.unwrap();

        let declined = controller
            .delete(Collection::Todos, id, &|_: &str| false)
            .await
            .unwrap();
        assert!(!declined);
        assert_eq!(requests_of(&controller, "DELETE"), 0);
        assert_eq!(controller.state().data.todos.len(), 1);

        let prompts = std::sync::Mutex::new(Vec::new());
        let confirm = |prompt: &str| {
            prompts.lock().unwrap().push(prompt.to_string());
            true
        };
        assert!(controller.delete(Collection::Todos, id, &confirm).await.unwrap());
        assert_eq!(prompts.lock().unwrap().as_slice(), ["Delete this todo?"]);
        assert_eq!(requests_of(&controller, "DELETE"), 1);
        assert!(controller.state().data.todos.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_refresh_their_collection() {
        let controller = logged_in().await;

        let todo = controller
            .create_todo(&NewTodo {
                content: "Write a letter".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(controller.state().data.todos.len(), 1);

        let toggled = controller.toggle_todo(todo.id).await.unwrap();
        assert!(toggled.is_completed);
        assert!(controller.state().data.todos[0].completed_at.is_some());

        controller.toggle_todo(todo.id).await.unwrap();
        let state = controller.state();
        let mirrored = &state.data.todos[0];
        assert!(!mirrored.is_completed);
        assert!(mirrored.completed_at.is_none());

        let err = controller
            .create_diary(&NewDiary {
                title: " ".to_string(),
                content: "x".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Title and content are required");
        assert!(controller.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_reload_does_not_fail_a_saved_change() {
        let controller = logged_in().await;
        controller.api().fail_fetch(Collection::Todos);

        let todo = controller
            .create_todo(&NewTodo {
                content: "Plan the picnic".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(todo.content, "Plan the picnic");
        assert_eq!(controller.api().todos().len(), 1);

        let state = controller.state();
        assert!(state.is_authenticated());
        let kinds: Vec<_> = state.notifications.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, [NotificationKind::Success, NotificationKind::Error]);
    }

    #[tokio::test]
    async fn test_upload_without_files_issues_no_request() {
        let controller = logged_in().await;
        let before = controller.api().requests().len();

        let err = controller
            .upload_photos(PhotoUpload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(controller.api().requests().len(), before);
    }

    #[tokio::test]
    async fn test_settings_and_logout() {
        let controller = logged_in().await;

        controller
            .save_settings(&SettingsUpdate {
                person1_name: Some("Jordan".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let user = controller.state().user.unwrap();
        assert_eq!(user.person1_name, "Jordan");
        assert_eq!(user.person2_name, "Sam");

        controller.logout();
        let state = controller.state();
        assert_eq!(state.phase, Phase::Unauthenticated);
        assert!(state.user.is_none());
        assert_eq!(controller.local().get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_views_observe_published_snapshots() {
        let controller = controller();
        let mut rx = controller.subscribe();

        controller.login(PASSWORD).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loaded());
    }
}

//! Application state snapshots and the pure reducer that advances them

use chrono::{DateTime, Duration, Utc};

use crate::models::{CollectionData, Diary, Memorial, Message, Photo, Profile, Todo};

/// Seconds a notification stays visible unless dismissed
pub const NOTIFICATION_TTL_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unauthenticated,
    Authenticated {
        loaded: bool,
    },
}

/// The navigable sections; purely view state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Dashboard,
    Diary,
    Photos,
    Memorial,
    Todo,
    Message,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// In-memory mirror of the server collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub diaries: Vec<Diary>,
    pub photos: Vec<Photo>,
    pub memorials: Vec<Memorial>,
    pub todos: Vec<Todo>,
    pub messages: Vec<Message>,
}

impl Collections {
    fn replace(&mut self, data: CollectionData) {
        match data {
            CollectionData::Diaries(items) => self.diaries = items,
            CollectionData::Photos(items) => self.photos = items,
            CollectionData::Memorials(items) => self.memorials = items,
            CollectionData::Todos(items) => self.todos = items,
            CollectionData::Messages(items) => self.messages = items,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub phase: Phase,
    pub user: Option<Profile>,
    pub data: Collections,
    pub section: Section,
    pub notifications: Vec<Notification>,
    next_notification_id: u64,
}

impl AppState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, Phase::Authenticated { .. })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.phase, Phase::Authenticated { loaded: true })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoggedIn(Profile),
    /// Bulk load finished; collections whose fetch failed are absent
    Loaded(Vec<CollectionData>),
    Refreshed(CollectionData),
    SettingsSaved(Profile),
    Unauthorized,
    LoggedOut,
    Navigate(Section),
    Notify {
        kind: NotificationKind,
        message: String,
        at: DateTime<Utc>,
    },
    Dismiss(u64),
    /// Drop notifications that expired before `now`
    Tick(DateTime<Utc>),
}

/// Compute the snapshot following `state` under `action`
pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::LoggedIn(user) => {
            next.phase = Phase::Authenticated { loaded: false };
            next.user = Some(user);
            next.data = Collections::default();
            next.section = Section::Dashboard;
        }
        Action::Loaded(collections) => {
            if !state.is_authenticated() {
                return next;
            }
            for data in collections {
                next.data.replace(data);
            }
            next.phase = Phase::Authenticated { loaded: true };
        }
        Action::Refreshed(data) => {
            if state.is_authenticated() {
                next.data.replace(data);
            }
        }
        Action::SettingsSaved(user) => {
            if state.is_authenticated() {
                next.user = Some(user);
            }
        }
        Action::Unauthorized | Action::LoggedOut => {
            // Notifications outlive the session so the reason stays visible
            next = AppState {
                notifications: state.notifications.clone(),
                next_notification_id: state.next_notification_id,
                ..AppState::default()
            };
        }
        Action::Navigate(section) => next.section = section,
        Action::Notify { kind, message, at } => {
            next.notifications.push(Notification {
                id: next.next_notification_id,
                kind,
                message,
                expires_at: at + Duration::seconds(NOTIFICATION_TTL_SECS),
            });
            next.next_notification_id += 1;
        }
        Action::Dismiss(id) => next.notifications.retain(|n| n.id != id),
        Action::Tick(now) => next.notifications.retain(|n| n.expires_at > now),
    }
    next
}

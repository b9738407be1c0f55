//! View models derived from a state snapshot
//!
//! Everything here is a pure function of an [`AppState`] and the current
//! date or time; nothing touches the network.

use std::cmp::Reverse;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use crate::models::{Diary, Memorial, Message, Photo, Todo};
use crate::state::{AppState, Notification};

/// Entries shown in the dashboard's recent activity feed
pub const RECENT_ACTIVITY_LIMIT: usize = 5;
/// Newest diaries and photos each considered for the feed
const RECENT_PER_KIND: usize = 3;
/// Countdowns at or below this many days are highlighted
pub const SOON_DAYS: i64 = 7;

/// Today / Yesterday / N days ago for the last week, otherwise the date
pub fn relative_label(date: NaiveDate, today: NaiveDate) -> String {
    match (today - date).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        days @ 2..=6 => format!("{days} days ago"),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

/// Days together, counting the start date as day one
pub fn days_together(start: NaiveDate, today: NaiveDate) -> i64 {
    ((today - start).num_days() + 1).max(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Diary,
    Photo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub kind: ActivityKind,
    pub title: String,
    pub at: DateTime<Utc>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub days_together: Option<i64>,
    pub diary_count: usize,
    pub photo_count: usize,
    pub pending_todo_count: usize,
    pub message_count: usize,
    pub recent: Vec<Activity>,
}

pub fn dashboard(state: &AppState, today: NaiveDate) -> Dashboard {
    let diaries = diary_list(state).into_iter().take(RECENT_PER_KIND).map(|d| Activity {
        kind: ActivityKind::Diary,
        title: d.title.clone(),
        at: d.date.and_time(NaiveTime::MIN).and_utc(),
        label: relative_label(d.date, today),
    });
    let photos = photo_list(state).into_iter().take(RECENT_PER_KIND).map(|p| Activity {
        kind: ActivityKind::Photo,
        title: p.title.clone(),
        at: p.upload_date,
        label: relative_label(p.upload_date.date_naive(), today),
    });

    let mut recent: Vec<Activity> = diaries.chain(photos).collect();
    recent.sort_by_key(|activity| Reverse(activity.at));
    recent.truncate(RECENT_ACTIVITY_LIMIT);

    let data = &state.data;
    Dashboard {
        days_together: state
            .user
            .as_ref()
            .map(|user| days_together(user.love_start_date, today)),
        diary_count: data.diaries.len(),
        photo_count: data.photos.len(),
        pending_todo_count: data.todos.iter().filter(|t| !t.is_completed).count(),
        message_count: data.messages.len(),
        recent,
    }
}

/// Newest entry date first
pub fn diary_list(state: &AppState) -> Vec<&Diary> {
    let mut diaries: Vec<&Diary> = state.data.diaries.iter().collect();
    diaries.sort_by_key(|d| Reverse((d.date, d.created_at)));
    diaries
}

/// Newest upload first
pub fn photo_list(state: &AppState) -> Vec<&Photo> {
    let mut photos: Vec<&Photo> = state.data.photos.iter().collect();
    photos.sort_by_key(|p| Reverse(p.upload_date));
    photos
}

/// Newest message first
pub fn message_list(state: &AppState) -> Vec<&Message> {
    let mut messages: Vec<&Message> = state.data.messages.iter().collect();
    messages.sort_by_key(|m| Reverse(m.message_date));
    messages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TodoFilter {
    fn accepts(&self, todo: &Todo) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Pending => !todo.is_completed,
            TodoFilter::Completed => todo.is_completed,
        }
    }
}

/// Incomplete first, then highest priority, then oldest
pub fn todo_list(state: &AppState, filter: TodoFilter) -> Vec<&Todo> {
    let mut todos: Vec<&Todo> = state.data.todos.iter().filter(|t| filter.accepts(t)).collect();
    todos.sort_by_key(|t| (t.is_completed, Reverse(t.priority), t.created_at));
    todos
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Passed,
    Today,
    DaysLeft(i64),
}

impl Countdown {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => Countdown::Passed,
            0 => Countdown::Today,
            d => Countdown::DaysLeft(d),
        }
    }

    pub fn is_soon(&self) -> bool {
        match self {
            Countdown::Today => true,
            Countdown::DaysLeft(days) => *days <= SOON_DAYS,
            Countdown::Passed => false,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Passed => f.write_str("Passed"),
            Countdown::Today => f.write_str("Today"),
            Countdown::DaysLeft(1) => f.write_str("1 day left"),
            Countdown::DaysLeft(days) => write!(f, "{days} days left"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemorialCard<'a> {
    pub memorial: &'a Memorial,
    /// Date the countdown refers to; recurring memorials roll forward
    pub target: NaiveDate,
    pub countdown: Countdown,
}

fn on_year(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

/// Recurring dates are projected only once the stored date has passed
fn countdown_target(memorial: &Memorial, today: NaiveDate) -> NaiveDate {
    if !memorial.is_recurring || memorial.date >= today {
        return memorial.date;
    }
    let this_year = on_year(memorial.date, today.year());
    if this_year >= today {
        this_year
    } else {
        on_year(memorial.date, today.year() + 1)
    }
}

/// Memorials ordered by stored date, each with its countdown
pub fn memorial_cards(state: &AppState, today: NaiveDate) -> Vec<MemorialCard<'_>> {
    let mut memorials: Vec<&Memorial> = state.data.memorials.iter().collect();
    memorials.sort_by_key(|m| m.date);
    memorials
        .into_iter()
        .map(|memorial| {
            let target = countdown_target(memorial, today);
            MemorialCard {
                memorial,
                target,
                countdown: Countdown::from_days((target - today).num_days()),
            }
        })
        .collect()
}

/// Notifications still visible at `now`
pub fn visible_notifications(state: &AppState, now: DateTime<Utc>) -> Vec<&Notification> {
    state
        .notifications
        .iter()
        .filter(|n| n.expires_at > now)
        .collect()
}

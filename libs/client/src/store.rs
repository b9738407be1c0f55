use tokio::sync::watch;

use crate::state::{Action, AppState, reduce};

/// Holds the current snapshot and publishes every new one to subscribers
#[derive(Debug)]
pub struct Store {
    tx: watch::Sender<AppState>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    /// Current snapshot
    pub fn state(&self) -> AppState {
        self.tx.borrow().clone()
    }

    pub fn dispatch(&self, action: Action) {
        self.tx.send_modify(|state| {
            let next = reduce(state, action);
            *state = next;
        });
    }

    /// Receiver that wakes whenever a new snapshot is published
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Section;

    #[tokio::test]
    async fn test_subscribers_see_each_snapshot() {
        let store = Store::new();
        let mut rx = store.subscribe();

        store.dispatch(Action::Navigate(Section::Memorial));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().section, Section::Memorial);
        assert_eq!(store.state().section, Section::Memorial);
    }
}

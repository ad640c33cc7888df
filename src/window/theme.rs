//! Process-wide theme broadcast subscriptions.
//!
//! Each window subscribes on construction and unsubscribes on teardown.
//! OS theme changes arrive once per native window; only actual changes are
//! broadcast.

use parking_lot::Mutex;

use super::identity::WindowId;

pub const THEME_CHANGED_EVENT: &str = "theme-changed";

#[derive(Debug, Default)]
struct ThemeState {
    subscribers: Vec<WindowId>,
    last_dark: Option<bool>,
}

#[derive(Debug, Default)]
pub struct ThemeBroadcaster {
    state: Mutex<ThemeState>,
}

impl ThemeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, id: WindowId) {
        let mut state = self.state.lock();
        if !state.subscribers.contains(&id) {
            state.subscribers.push(id);
        }
    }

    pub fn unsubscribe(&self, id: WindowId) {
        self.state.lock().subscribers.retain(|s| *s != id);
    }

    pub fn subscribers(&self) -> Vec<WindowId> {
        self.state.lock().subscribers.clone()
    }

    pub fn current(&self) -> Option<bool> {
        self.state.lock().last_dark
    }

    /// Record a theme observation. Returns the subscribers to notify, empty
    /// when the theme did not change.
    pub fn observe(&self, dark: bool) -> Vec<WindowId> {
        let mut state = self.state.lock();
        if state.last_dark == Some(dark) {
            return Vec::new();
        }
        state.last_dark = Some(dark);
        state.subscribers.clone()
    }
}

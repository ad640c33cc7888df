//! Event delivery to one or all windows, and channel -> identity lookup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::identity::WindowId;
use super::instance::ManagedWindow;
use super::native::{ChannelRef, NativeWindow};

/// Injective map from a live window's channel to its identity.
///
/// Entries only name channels; they never keep a window alive.
#[derive(Debug, Default)]
pub struct ChannelIndex {
    by_channel: HashMap<ChannelRef, WindowId>,
}

impl ChannelIndex {
    /// Build from `(channel, id)` pairs. A later pair for the same identity
    /// replaces the earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = (ChannelRef, WindowId)>) -> Self {
        let mut by_id: HashMap<WindowId, ChannelRef> = HashMap::new();
        for (channel, id) in entries {
            by_id.insert(id, channel);
        }
        Self {
            by_channel: by_id.into_iter().map(|(id, ch)| (ch, id)).collect(),
        }
    }

    pub fn resolve(&self, channel: &ChannelRef) -> Option<WindowId> {
        self.by_channel.get(channel).copied()
    }

    pub fn len(&self) -> usize {
        self.by_channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_channel.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct BroadcastRouter {
    index: RwLock<ChannelIndex>,
}

impl BroadcastRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole index in one swap.
    pub fn rebuild(&self, entries: impl IntoIterator<Item = (ChannelRef, WindowId)>) {
        let index = ChannelIndex::from_entries(entries);
        *self.index.write() = index;
    }

    pub fn resolve_identity(&self, channel: &ChannelRef) -> Option<WindowId> {
        self.index.read().resolve(channel)
    }

    /// Deliver to every live window. Returns the number of deliveries.
    pub fn to_all<W: NativeWindow>(&self, windows: &[(WindowId, Arc<ManagedWindow<W>>)], event: &str, payload: &Value) -> usize {
        windows
            .iter()
            .filter(|(_, window)| deliver(window, event, payload))
            .count()
    }

    /// Deliver to one window; a missing instance is skipped with a warning.
    pub fn to_one<W: NativeWindow>(&self, id: WindowId, window: Option<&Arc<ManagedWindow<W>>>, event: &str, payload: &Value) -> bool {
        match window {
            Some(window) => deliver(window, event, payload),
            None => {
                log::warn!("[broadcast] No live {} window for '{}'", id, event);
                false
            },
        }
    }
}

fn deliver<W: NativeWindow>(window: &ManagedWindow<W>, event: &str, payload: &Value) -> bool {
    if !window.is_alive() {
        log::debug!("[broadcast] Skipping '{}' for closed {} window", event, window.id());
        return false;
    }
    match window.native().emit(event, payload) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("[broadcast] Failed to deliver '{}' to {}: {}", event, window.id(), e);
            false
        },
    }
}

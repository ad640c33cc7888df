//! Identity registry: at most one live instance per window identity.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::identity::WindowId;
use crate::error::ShellResult;

pub struct IdentityRegistry<T> {
    entries: Mutex<HashMap<WindowId, Arc<T>>>,
}

impl<T> Default for IdentityRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> IdentityRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live instance for `id`, constructing it with `construct`
    /// when absent. The boolean is `true` when this call constructed it.
    ///
    /// `construct` runs under the registry lock and must not call back into
    /// the registry. A concurrent caller observes either nothing or the
    /// fully inserted instance, never a second construction.
    pub fn get_or_insert_with<F>(&self, id: WindowId, construct: F) -> ShellResult<(Arc<T>, bool)>
    where
        F: FnOnce() -> ShellResult<T>,
    {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&id) {
            return Ok((existing.clone(), false));
        }
        let instance = Arc::new(construct()?);
        entries.insert(id, instance.clone());
        Ok((instance, true))
    }

    pub fn get(&self, id: WindowId) -> Option<Arc<T>> {
        self.entries.lock().get(&id).cloned()
    }

    pub fn has(&self, id: WindowId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Remove `id` only if it still maps to `instance`.
    pub fn remove_if_current(&self, id: WindowId, instance: &Arc<T>) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(&id) {
            Some(current) if Arc::ptr_eq(current, instance) => {
                entries.remove(&id);
                true
            },
            _ => false,
        }
    }

    pub fn remove(&self, id: WindowId) -> Option<Arc<T>> {
        self.entries.lock().remove(&id)
    }

    /// Stable snapshot for fan-out. The lock is not held while callers iterate.
    pub fn snapshot(&self) -> Vec<(WindowId, Arc<T>)> {
        let entries = self.entries.lock();
        let mut items: Vec<_> = entries.iter().map(|(id, v)| (*id, v.clone())).collect();
        items.sort_by_key(|(id, _)| *id);
        items
    }

    pub fn for_each(&self, mut f: impl FnMut(WindowId, &Arc<T>)) {
        for (id, instance) in self.snapshot() {
            f(id, &instance);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

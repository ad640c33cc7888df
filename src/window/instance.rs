//! Runtime state of one live window.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::crash::{CrashPolicy, CrashTracker, CrashVerdict};
use super::identity::{WindowId, WindowIdentity};
use super::loader::LoadController;
use super::native::{ChannelRef, NativeWindow};
use super::phase::LifecyclePhase;

pub(crate) struct RuntimeState {
    pub(crate) phase: LifecyclePhase,
    pub(crate) crash: CrashTracker,
    pub(crate) loader: LoadController,
    pub(crate) zoom: f64,
}

/// A window instance owned by the lifecycle manager.
///
/// The native handle is owned here and never handed out by value.
pub struct ManagedWindow<W: NativeWindow> {
    identity: WindowIdentity,
    generation: u64,
    native: W,
    torn_down: AtomicBool,
    hidden_by_user: AtomicBool,
    pub(crate) state: Mutex<RuntimeState>,
}

impl<W: NativeWindow> ManagedWindow<W> {
    pub(crate) fn new(
        identity: WindowIdentity,
        generation: u64,
        native: W,
        loader: LoadController,
        zoom: f64,
    ) -> Self {
        Self {
            identity,
            generation,
            native,
            torn_down: AtomicBool::new(false),
            hidden_by_user: AtomicBool::new(false),
            state: Mutex::new(RuntimeState {
                phase: LifecyclePhase::Uninitialized,
                crash: CrashTracker::default(),
                loader,
                zoom,
            }),
        }
    }

    pub fn id(&self) -> WindowId {
        self.identity.id
    }

    pub fn identity(&self) -> &WindowIdentity {
        &self.identity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn native(&self) -> &W {
        &self.native
    }

    pub fn channel(&self) -> ChannelRef {
        self.native.channel()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.state.lock().phase
    }

    pub fn zoom(&self) -> f64 {
        self.state.lock().zoom
    }

    pub fn retry_armed(&self) -> bool {
        self.state.lock().loader.retry_armed()
    }

    pub fn last_crash_ms(&self) -> Option<i64> {
        self.state.lock().crash.last_crash_ms()
    }

    /// Set once teardown starts. Completions of in-flight loads check this
    /// before touching the instance.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Mark torn down. Returns false if teardown already started.
    pub(crate) fn begin_teardown(&self) -> bool {
        !self.torn_down.swap(true, Ordering::SeqCst)
    }

    /// A hide or keep-alive close was requested for this instance. Boot
    /// consults this before its initial show.
    pub fn hidden_by_user(&self) -> bool {
        self.hidden_by_user.load(Ordering::SeqCst)
    }

    pub(crate) fn note_hidden_by_user(&self) {
        self.hidden_by_user.store(true, Ordering::SeqCst);
    }

    /// Both the instance and its native handle are still usable.
    pub fn is_alive(&self) -> bool {
        !self.is_torn_down() && !self.native.is_destroyed()
    }

    /// Apply a phase transition, rejecting illegal edges.
    pub(crate) fn transition(&self, next: LifecyclePhase) -> bool {
        let mut state = self.state.lock();
        self.transition_locked(&mut state, next)
    }

    pub(crate) fn transition_locked(&self, state: &mut RuntimeState, next: LifecyclePhase) -> bool {
        if state.phase == next {
            return true;
        }
        if !state.phase.can_transition_to(next) {
            log::warn!(
                "[window:{}] Ignoring illegal transition {:?} -> {:?}",
                self.identity.id,
                state.phase,
                next
            );
            return false;
        }
        log::debug!(
            "[window:{}] {:?} -> {:?}",
            self.identity.id,
            state.phase,
            next
        );
        state.phase = next;
        true
    }

    /// Track native visibility in the phase once content is loaded.
    pub(crate) fn sync_visibility(&self, visible: bool) {
        let mut state = self.state.lock();
        if state.phase.is_settled() {
            let next = if visible {
                LifecyclePhase::Visible
            } else {
                LifecyclePhase::Hidden
            };
            self.transition_locked(&mut state, next);
        }
    }

    /// Content finished loading: Ready, then settle on current visibility.
    pub(crate) fn mark_ready(&self) {
        let visible = self.native.is_visible().unwrap_or(false);
        let mut state = self.state.lock();
        if self.transition_locked(&mut state, LifecyclePhase::Ready) {
            let next = if visible {
                LifecyclePhase::Visible
            } else {
                LifecyclePhase::Hidden
            };
            self.transition_locked(&mut state, next);
        }
    }

    pub(crate) fn record_crash(&self, now_ms: i64, policy: &CrashPolicy) -> CrashVerdict {
        self.state.lock().crash.record(now_ms, policy)
    }

    pub(crate) fn set_zoom_factor(&self, zoom: f64) {
        self.state.lock().zoom = zoom;
    }
}

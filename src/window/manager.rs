//! Window lifecycle manager.
//!
//! Composes the registry, geometry store, loader, crash policy, display
//! controller and broadcast router for every window identity.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized -> PlaceholderLoading -> ContentLoading -> Ready -> Visible <-> Hidden
//!                                              |  ^
//!                                              v  | retry
//!                                             Error
//! any live phase -> Closing -> Destroyed   (keep-alive windows hide instead,
//!                                           unless the process is quitting)
//! ```
//!
//! No lock is held across an `.await`. Failures in one window never touch
//! another window's state.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use super::broadcast::BroadcastRouter;
use super::builder::build_window_spec;
use super::crash::{CrashPolicy, CrashVerdict, CRASH_LOOP_EXIT_CODE};
use super::display::{DisplayController, PlatformCapabilities, ToggleAction};
use super::geometry::{clamp_zoom, GeometryStore, WindowPrefs};
use super::identity::{WindowCatalog, WindowId};
use super::instance::ManagedWindow;
use super::loader::{content_url, LoadController, RetryOutcome};
use super::native::{ChannelRef, NativeWindow, WindowBackend};
use super::phase::LifecyclePhase;
use super::registry::IdentityRegistry;
use super::theme::{ThemeBroadcaster, THEME_CHANGED_EVENT};
use crate::error::{ShellError, ShellResult};

/// Process-wide quitting flag, set by the shutdown sequence.
#[derive(Debug, Clone, Default)]
pub struct QuitFlag(Arc<AtomicBool>);

impl QuitFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseDecision {
    NotOpen,
    /// Keep-alive veto: the window was hidden instead.
    Hidden,
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub content_base_url: String,
    pub crash_policy: CrashPolicy,
    pub capabilities: PlatformCapabilities,
    pub geometry_dir: PathBuf,
    pub quit_flag: QuitFlag,
}

pub type WindowHandle<B> = Arc<ManagedWindow<<B as WindowBackend>::Window>>;

pub struct WindowManager<B: WindowBackend> {
    backend: B,
    catalog: WindowCatalog,
    registry: IdentityRegistry<ManagedWindow<B::Window>>,
    geometry: GeometryStore,
    display: DisplayController,
    router: BroadcastRouter,
    theme: ThemeBroadcaster,
    crash_policy: CrashPolicy,
    quitting: QuitFlag,
    content_base_url: String,
    next_generation: AtomicU64,
}

impl<B: WindowBackend> WindowManager<B> {
    pub fn new(backend: B, catalog: WindowCatalog, options: ManagerOptions) -> ShellResult<Self> {
        // Fail at startup rather than on first window.
        content_url(&options.content_base_url, "/")?;

        Ok(Self {
            backend,
            catalog,
            registry: IdentityRegistry::new(),
            geometry: GeometryStore::new(options.geometry_dir),
            display: DisplayController::new(options.capabilities),
            router: BroadcastRouter::new(),
            theme: ThemeBroadcaster::new(),
            crash_policy: options.crash_policy,
            quitting: options.quit_flag,
            content_base_url: options.content_base_url,
            next_generation: AtomicU64::new(1),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn geometry(&self) -> &GeometryStore {
        &self.geometry
    }

    pub fn quit_flag(&self) -> &QuitFlag {
        &self.quitting
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting.is_set()
    }

    // ========================================================================
    // Identity registry
    // ========================================================================

    /// Return the live window for `id`, constructing and booting it if needed.
    ///
    /// A concurrent `get` while the first one is still loading returns the
    /// same in-progress instance.
    pub async fn get(&self, id: WindowId) -> ShellResult<WindowHandle<B>> {
        let (window, created) = self.instantiate(id)?;
        if created {
            self.boot(&window).await;
        }
        Ok(window)
    }

    /// Existing live instance, without constructing one.
    pub fn window(&self, id: WindowId) -> Option<WindowHandle<B>> {
        self.registry.get(id)
    }

    pub fn has(&self, id: WindowId) -> bool {
        self.registry.has(id)
    }

    pub fn phase(&self, id: WindowId) -> Option<LifecyclePhase> {
        self.registry.get(id).map(|w| w.phase())
    }

    pub fn for_each(&self, f: impl FnMut(WindowId, &WindowHandle<B>)) {
        self.registry.for_each(f);
    }

    fn instantiate(&self, id: WindowId) -> ShellResult<(WindowHandle<B>, bool)> {
        if let Some(existing) = self.registry.get(id) {
            return Ok((existing, false));
        }

        let identity = self
            .catalog
            .identity(id)
            .map_err(|e| {
                log::error!("[window:{}] Not in the window catalog", id);
                e
            })?
            .clone();

        // Resolved before taking the registry lock.
        let parent_bounds = identity
            .parent
            .and_then(|parent| self.registry.get(parent))
            .filter(|parent| parent.is_alive())
            .and_then(|parent| parent.native().outer_bounds().ok());
        let geometry = self.geometry.load(id);
        let zoom = clamp_zoom(self.geometry.load_prefs(id).zoom_factor);

        let (window, created) = self.registry.get_or_insert_with(id, || {
            let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
            let spec = build_window_spec(&identity, generation, geometry.as_ref(), parent_bounds, zoom);
            let loader = LoadController::new(&identity, &self.content_base_url)?;
            let native = self.backend.create(&spec)?;
            log::info!("[window:{}] Created {}", id, spec.label);
            Ok(ManagedWindow::new(identity.clone(), generation, native, loader, zoom))
        })?;

        if created {
            self.theme.subscribe(id);
            self.refresh_channels();
        }
        Ok((window, created))
    }

    /// Placeholder, then content. Shows after the placeholder has painted
    /// when the identity asks for it.
    async fn boot(&self, window: &WindowHandle<B>) {
        window.transition(LifecyclePhase::PlaceholderLoading);
        window.load_placeholder().await;
        if window.is_torn_down() {
            log::debug!("[window:{}] Closed during placeholder load", window.id());
            return;
        }

        window.transition(LifecyclePhase::ContentLoading);
        if window.identity().show_on_init {
            if window.hidden_by_user() {
                log::debug!("[window:{}] Hidden during boot, skipping initial show", window.id());
            } else {
                self.show_window(window);
            }
        }

        let loaded = window.load_content().await;
        if window.is_torn_down() {
            log::debug!("[window:{}] Dropping stale content completion", window.id());
            return;
        }

        if loaded {
            window.mark_ready();
            log::info!("[window:{}] Ready ({:?})", window.id(), window.phase());
        } else {
            window.enter_error().await;
        }
    }

    // ========================================================================
    // Display
    // ========================================================================

    /// Show a window, constructing it first if needed.
    pub async fn show(&self, id: WindowId) -> ShellResult<()> {
        let window = self.get(id).await?;
        self.show_window(&window);
        Ok(())
    }

    pub fn hide(&self, id: WindowId) -> bool {
        match self.registry.get(id) {
            Some(window) => self.hide_window(&window),
            None => {
                log::warn!("[window:{}] Hide requested but window is not open", id);
                false
            },
        }
    }

    pub async fn toggle(&self, id: WindowId) -> ShellResult<ToggleAction> {
        let Some(window) = self.registry.get(id) else {
            self.show(id).await?;
            return Ok(ToggleAction::Shown);
        };

        let other_focused = self.other_window(id, |w| w.native().is_focused().unwrap_or(false));
        let action = self.display.toggle(window.native(), &self.backend, other_focused);
        match action {
            ToggleAction::Shown => {
                window.sync_visibility(true);
                self.refresh_channels();
                self.sync_dock();
            },
            ToggleAction::Hidden => {
                window.note_hidden_by_user();
                window.sync_visibility(false);
                self.sync_dock();
            },
            ToggleAction::Focused | ToggleAction::Ignored => {},
        }
        Ok(action)
    }

    pub fn center(&self, id: WindowId) -> Option<(i32, i32)> {
        let window = self.registry.get(id)?;
        self.display.center_on_display(window.native())
    }

    pub fn bring_to_front(&self, id: WindowId) {
        if let Some(window) = self.registry.get(id) {
            self.display.bring_to_front(window.native());
            window.sync_visibility(true);
        }
    }

    /// True when hiding `closing` would leave no managed window visible
    /// and the platform can hide its dock icon.
    pub fn should_hide_dock(&self, closing: WindowId) -> bool {
        let other_visible = self.other_window(closing, |w| w.native().is_visible().unwrap_or(false));
        self.display.should_hide_dock(other_visible)
    }

    fn show_window(&self, window: &WindowHandle<B>) {
        if self.display.show(window.native()) {
            window.sync_visibility(true);
            self.refresh_channels();
            self.sync_dock();
        }
    }

    fn hide_window(&self, window: &WindowHandle<B>) -> bool {
        let id = window.id();
        window.note_hidden_by_user();
        let other_focused = self.other_window(id, |w| w.native().is_focused().unwrap_or(false));
        if self.display.hide(window.native(), &self.backend, other_focused) {
            window.sync_visibility(false);
            self.sync_dock();
            true
        } else {
            false
        }
    }

    fn other_window(&self, id: WindowId, pred: impl Fn(&WindowHandle<B>) -> bool) -> bool {
        self.registry
            .snapshot()
            .iter()
            .any(|(other, w)| *other != id && w.is_alive() && pred(w))
    }

    fn sync_dock(&self) {
        if !self.display.capabilities().supports_dock_hiding {
            return;
        }
        let any_visible = self
            .registry
            .snapshot()
            .iter()
            .any(|(_, w)| w.is_alive() && w.native().is_visible().unwrap_or(false));
        if let Err(e) = self.backend.set_dock_visible(any_visible) {
            log::warn!("[window] Failed to update dock visibility: {}", e);
        }
    }

    // ========================================================================
    // Close / quit
    // ========================================================================

    /// Handle a close request. Keep-alive windows are hidden unless the
    /// process is quitting.
    pub fn close(&self, id: WindowId) -> CloseDecision {
        let Some(window) = self.registry.get(id) else {
            return CloseDecision::NotOpen;
        };

        if window.identity().keep_alive && !self.quitting.is_set() {
            log::info!("[window:{}] Close vetoed, hiding keep-alive window", id);
            self.hide_window(&window);
            return CloseDecision::Hidden;
        }

        self.teardown(&window);
        CloseDecision::Destroyed
    }

    /// Set the quitting flag and destroy every window, keep-alive included.
    /// Resolves once captured geometry is on disk.
    pub async fn quit(&self) {
        log::info!("[window] Quitting, destroying {} window(s)", self.registry.len());
        self.quitting.set();
        for (_, window) in self.registry.snapshot() {
            self.teardown(&window);
        }
        self.geometry.flush().await;
    }

    fn teardown(&self, window: &WindowHandle<B>) {
        if !window.begin_teardown() {
            return;
        }
        let id = window.id();
        window.transition(LifecyclePhase::Closing);

        let native = window.native();
        if !native.is_destroyed() {
            if let Err(e) = self.geometry.capture(id, native) {
                log::warn!("[window:{}] Failed to persist geometry: {}", id, e);
            }
        }

        window.state.lock().loader.disarm();
        self.theme.unsubscribe(id);
        self.registry.remove_if_current(id, window);

        if !native.is_destroyed() {
            if let Err(e) = native.destroy() {
                log::warn!("[window:{}] Failed to destroy native window: {}", id, e);
            }
        }

        window.transition(LifecyclePhase::Destroyed);
        self.refresh_channels();
        self.sync_dock();
        log::info!("[window:{}] Destroyed {}", id, window.channel());
    }

    /// The toolkit destroyed a window behind our back.
    pub fn on_native_destroyed(&self, channel: &ChannelRef) {
        if let Some(window) = self.current_for_channel(channel) {
            log::info!("[window:{}] Native window destroyed externally", window.id());
            self.teardown(&window);
        }
    }

    // ========================================================================
    // Retry / crash recovery
    // ========================================================================

    /// The `retry-connection-<id>` action.
    pub async fn retry(&self, id: WindowId) -> RetryOutcome {
        match self.registry.get(id) {
            Some(window) => window.retry().await,
            None => RetryOutcome::failure(format!("{} window is not open", id)),
        }
    }

    pub async fn on_renderer_gone(&self, id: WindowId) -> Option<CrashVerdict> {
        self.on_renderer_gone_at(id, chrono::Utc::now().timestamp_millis()).await
    }

    /// Apply the crash policy to a renderer termination at `now_ms`.
    pub async fn on_renderer_gone_at(&self, id: WindowId, now_ms: i64) -> Option<CrashVerdict> {
        let Some(window) = self.registry.get(id) else {
            log::warn!("[window:{}] Renderer gone but window is not open", id);
            return None;
        };
        if !window.is_alive() {
            return None;
        }

        let verdict = window.record_crash(now_ms, &self.crash_policy);
        match verdict {
            CrashVerdict::Fatal => {
                log::error!(
                    "[window:{}] Renderer crashed twice within {} ms, exiting",
                    id,
                    self.crash_policy.threshold_ms()
                );
                self.backend.exit(CRASH_LOOP_EXIT_CODE);
            },
            CrashVerdict::Reload => {
                log::warn!("[window:{}] Renderer crashed, reloading", id);
                window.reload_after_crash().await;
            },
        }
        Some(verdict)
    }

    // ========================================================================
    // Geometry / zoom
    // ========================================================================

    /// Managed geometry binding: called on every move/resize. Only updates
    /// the in-memory record; the store writes it out once moves settle.
    pub fn on_bounds_changed(&self, channel: &ChannelRef) {
        let Some(window) = self.current_for_channel(channel) else {
            return;
        };
        if let Err(e) = self.geometry.capture(window.id(), window.native()) {
            log::warn!("[window:{}] Failed to persist geometry: {}", window.id(), e);
        }
    }

    pub fn set_zoom(&self, id: WindowId, factor: f64) -> ShellResult<f64> {
        let window = self
            .registry
            .get(id)
            .filter(|w| w.is_alive())
            .ok_or_else(|| ShellError::WindowError(format!("{} window is not open", id)))?;

        let zoom = clamp_zoom(factor);
        window.native().set_zoom(zoom)?;
        window.set_zoom_factor(zoom);
        self.geometry.save_prefs(id, &WindowPrefs { zoom_factor: zoom })?;
        Ok(zoom)
    }

    // ========================================================================
    // Broadcast
    // ========================================================================

    pub fn broadcast_all(&self, event: &str, payload: &Value) -> usize {
        self.router.to_all(&self.registry.snapshot(), event, payload)
    }

    pub fn broadcast_to(&self, id: WindowId, event: &str, payload: &Value) -> bool {
        self.router.to_one(id, self.registry.get(id).as_ref(), event, payload)
    }

    pub fn resolve_identity(&self, channel: &ChannelRef) -> Option<WindowId> {
        self.router.resolve_identity(channel)
    }

    /// Broadcast an OS theme change to subscribed windows, once per change.
    pub fn notify_theme_changed(&self, dark: bool) -> usize {
        let payload = json!({ "dark": dark });
        self.theme
            .observe(dark)
            .into_iter()
            .filter(|id| self.broadcast_to(*id, THEME_CHANGED_EVENT, &payload))
            .count()
    }

    fn current_for_channel(&self, channel: &ChannelRef) -> Option<WindowHandle<B>> {
        let id = self.router.resolve_identity(channel)?;
        let window = self.registry.get(id)?;
        if window.channel() != *channel {
            log::debug!("[window:{}] Ignoring event from stale channel {}", id, channel);
            return None;
        }
        Some(window)
    }

    fn refresh_channels(&self) {
        let entries: Vec<_> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|(_, w)| w.is_alive())
            .map(|(id, w)| (w.channel(), id))
            .collect();
        self.router.rebuild(entries);
    }
}

//! Scripted in-memory backend for lifecycle tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use super::builder::{Placement, WindowBuildSpec};
use super::display::centered_origin;
use super::geometry::Bounds;
use super::identity::WindowId;
use super::native::{ChannelRef, LoadFuture, LoadTarget, NativeWindow, WindowBackend};
use crate::error::{ShellError, ShellResult};

pub const WORK_AREA: Bounds = Bounds {
    x: 0,
    y: 0,
    width: 1920,
    height: 1040,
};

/// Decorations the mock adds on top of the content size.
pub const TITLE_BAR_HEIGHT: u32 = 30;

/// Scripted result of one remote load.
pub enum LoadStep {
    Ok,
    Fail(&'static str),
    /// Pending until the sender resolves it.
    Gate(oneshot::Receiver<Result<(), String>>),
}

/// A gated load and the sender that releases it.
pub fn gate() -> (oneshot::Sender<Result<(), String>>, LoadStep) {
    let (tx, rx) = oneshot::channel();
    (tx, LoadStep::Gate(rx))
}

type Script = Arc<Mutex<VecDeque<LoadStep>>>;
type LocalGates = Arc<Mutex<VecDeque<oneshot::Receiver<()>>>>;

#[derive(Debug, Default)]
struct WindowFlags {
    visible: bool,
    focused: bool,
    minimized: bool,
    maximized: bool,
    fullscreen: bool,
    destroyed: bool,
    zoom: f64,
}

struct MockWindowInner {
    id: WindowId,
    label: String,
    flags: Mutex<WindowFlags>,
    bounds: Mutex<Bounds>,
    calls: Mutex<Vec<String>>,
    loads: Mutex<Vec<LoadTarget>>,
    emitted: Mutex<Vec<(String, Value)>>,
    script: Script,
    fail_local: Arc<AtomicBool>,
    local_gates: LocalGates,
}

#[derive(Clone)]
pub struct MockWindow {
    inner: Arc<MockWindowInner>,
}

impl MockWindow {
    pub fn new(id: WindowId, label: &str) -> Self {
        Self::with_parts(
            id,
            label,
            Bounds { x: 0, y: 0, width: 800, height: 600 },
            Script::default(),
            Arc::default(),
            LocalGates::default(),
        )
    }

    fn with_parts(
        id: WindowId,
        label: &str,
        bounds: Bounds,
        script: Script,
        fail_local: Arc<AtomicBool>,
        local_gates: LocalGates,
    ) -> Self {
        Self {
            inner: Arc::new(MockWindowInner {
                id,
                label: label.to_string(),
                flags: Mutex::new(WindowFlags {
                    zoom: 1.0,
                    ..Default::default()
                }),
                bounds: Mutex::new(bounds),
                calls: Mutex::new(Vec::new()),
                loads: Mutex::new(Vec::new()),
                emitted: Mutex::new(Vec::new()),
                script,
                fail_local,
                local_gates,
            }),
        }
    }

    pub fn id(&self) -> WindowId {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.inner.calls.lock().clear();
    }

    pub fn loads(&self) -> Vec<LoadTarget> {
        self.inner.loads.lock().clone()
    }

    pub fn remote_loads(&self) -> usize {
        self.loads().iter().filter(|t| !t.is_local()).count()
    }

    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.inner.emitted.lock().clone()
    }

    pub fn zoom_factor(&self) -> f64 {
        self.inner.flags.lock().zoom
    }

    pub fn set_minimized(&self, minimized: bool) {
        self.inner.flags.lock().minimized = minimized;
    }

    pub fn set_focused(&self, focused: bool) {
        self.inner.flags.lock().focused = focused;
    }

    pub fn set_fullscreen_flag(&self, fullscreen: bool) {
        self.inner.flags.lock().fullscreen = fullscreen;
    }

    pub fn set_maximized_flag(&self, maximized: bool) {
        self.inner.flags.lock().maximized = maximized;
    }

    /// Content rectangle (outer position, inner size).
    pub fn bounds(&self) -> Bounds {
        *self.inner.bounds.lock()
    }

    /// Simulate the user dragging/resizing the window.
    pub fn move_to(&self, bounds: Bounds) {
        *self.inner.bounds.lock() = bounds;
    }

    /// Simulate the OS destroying the window without asking.
    pub fn kill(&self) {
        self.inner.flags.lock().destroyed = true;
    }

    fn record(&self, call: impl Into<String>) {
        self.inner.calls.lock().push(call.into());
    }

    fn live(&self) -> ShellResult<()> {
        if self.inner.flags.lock().destroyed {
            return Err(ShellError::WindowDestroyed {
                label: self.inner.label.clone(),
            });
        }
        Ok(())
    }

    fn update(&self, call: impl Into<String>, f: impl FnOnce(&mut WindowFlags)) -> ShellResult<()> {
        self.live()?;
        self.record(call);
        f(&mut self.inner.flags.lock());
        Ok(())
    }
}

fn load_error(target: &LoadTarget, reason: impl Into<String>) -> ShellError {
    ShellError::LoadFailed {
        url: target.to_string(),
        reason: reason.into(),
    }
}

impl NativeWindow for MockWindow {
    fn channel(&self) -> ChannelRef {
        ChannelRef(self.inner.label.clone())
    }

    fn load(&self, target: LoadTarget) -> LoadFuture {
        self.inner.loads.lock().push(target.clone());
        if let Err(e) = self.live() {
            return futures::future::ready(Err(e)).boxed();
        }

        if target.is_local() {
            let result = if self.inner.fail_local.load(Ordering::SeqCst) {
                Err(load_error(&target, "local page missing"))
            } else {
                Ok(())
            };
            return match self.inner.local_gates.lock().pop_front() {
                Some(gate) => async move {
                    let _ = gate.await;
                    result
                }
                .boxed(),
                None => futures::future::ready(result).boxed(),
            };
        }

        match self.inner.script.lock().pop_front() {
            None | Some(LoadStep::Ok) => futures::future::ready(Ok(())).boxed(),
            Some(LoadStep::Fail(reason)) => futures::future::ready(Err(load_error(&target, reason))).boxed(),
            Some(LoadStep::Gate(rx)) => async move {
                match rx.await {
                    Ok(result) => result.map_err(|reason| load_error(&target, reason)),
                    Err(_) => Err(load_error(&target, "gate dropped")),
                }
            }
            .boxed(),
        }
    }

    fn is_destroyed(&self) -> bool {
        self.inner.flags.lock().destroyed
    }

    fn is_visible(&self) -> ShellResult<bool> {
        self.live()?;
        Ok(self.inner.flags.lock().visible)
    }

    fn is_focused(&self) -> ShellResult<bool> {
        self.live()?;
        Ok(self.inner.flags.lock().focused)
    }

    fn is_minimized(&self) -> ShellResult<bool> {
        self.live()?;
        Ok(self.inner.flags.lock().minimized)
    }

    fn is_maximized(&self) -> ShellResult<bool> {
        self.live()?;
        Ok(self.inner.flags.lock().maximized)
    }

    fn is_fullscreen(&self) -> ShellResult<bool> {
        self.live()?;
        Ok(self.inner.flags.lock().fullscreen)
    }

    fn show(&self) -> ShellResult<()> {
        self.update("show", |f| f.visible = true)
    }

    fn hide(&self) -> ShellResult<()> {
        self.update("hide", |f| {
            f.visible = false;
            f.focused = false;
        })
    }

    fn focus(&self) -> ShellResult<()> {
        self.update("focus", |f| f.focused = true)
    }

    fn minimize(&self) -> ShellResult<()> {
        self.update("minimize", |f| {
            f.minimized = true;
            f.focused = false;
        })
    }

    fn unminimize(&self) -> ShellResult<()> {
        self.update("unminimize", |f| {
            f.minimized = false;
            f.visible = true;
        })
    }

    fn set_fullscreen(&self, fullscreen: bool) -> ShellResult<()> {
        self.update(format!("fullscreen:{}", fullscreen), |f| f.fullscreen = fullscreen)
    }

    fn set_visible_on_all_workspaces(&self, visible: bool) -> ShellResult<()> {
        self.update(format!("all_workspaces:{}", visible), |_| {})
    }

    fn outer_bounds(&self) -> ShellResult<Bounds> {
        self.live()?;
        let content = self.bounds();
        Ok(Bounds {
            height: content.height + TITLE_BAR_HEIGHT,
            ..content
        })
    }

    fn content_bounds(&self) -> ShellResult<Bounds> {
        self.live()?;
        Ok(self.bounds())
    }

    fn set_position(&self, x: i32, y: i32) -> ShellResult<()> {
        self.live()?;
        self.record(format!("set_position:{},{}", x, y));
        let mut bounds = self.inner.bounds.lock();
        bounds.x = x;
        bounds.y = y;
        Ok(())
    }

    fn work_area(&self) -> ShellResult<Option<Bounds>> {
        self.live()?;
        Ok(Some(WORK_AREA))
    }

    fn set_zoom(&self, factor: f64) -> ShellResult<()> {
        self.update(format!("zoom:{}", factor), |f| f.zoom = factor)
    }

    fn emit(&self, event: &str, payload: &Value) -> ShellResult<()> {
        self.live()?;
        self.inner
            .emitted
            .lock()
            .push((event.to_string(), payload.clone()));
        Ok(())
    }

    fn destroy(&self) -> ShellResult<()> {
        self.update("destroy", |f| {
            f.destroyed = true;
            f.visible = false;
        })
    }
}

#[derive(Default)]
struct BackendInner {
    specs: Mutex<Vec<WindowBuildSpec>>,
    windows: Mutex<Vec<MockWindow>>,
    scripts: Mutex<HashMap<WindowId, Script>>,
    fail_local: Arc<AtomicBool>,
    local_gates: LocalGates,
    exit_code: Mutex<Option<i32>>,
    dock: Mutex<Vec<bool>>,
    app_hidden: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<BackendInner>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn script_for(&self, id: WindowId) -> Script {
        self.inner.scripts.lock().entry(id).or_default().clone()
    }

    /// Queue outcomes for the next remote loads of `id` (any instance).
    pub fn script(&self, id: WindowId, steps: impl IntoIterator<Item = LoadStep>) {
        self.script_for(id).lock().extend(steps);
    }

    /// Hold the next local page load (any window) until the sender fires.
    pub fn gate_next_local(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.local_gates.lock().push_back(rx);
        tx
    }

    pub fn set_fail_local(&self, fail: bool) {
        self.inner.fail_local.store(fail, Ordering::SeqCst);
    }

    pub fn specs(&self) -> Vec<WindowBuildSpec> {
        self.inner.specs.lock().clone()
    }

    pub fn created_count(&self, id: WindowId) -> usize {
        self.inner.specs.lock().iter().filter(|s| s.id == id).count()
    }

    /// Most recently created native window for `id`.
    pub fn latest(&self, id: WindowId) -> Option<MockWindow> {
        self.inner
            .windows
            .lock()
            .iter()
            .rev()
            .find(|w| w.id() == id)
            .cloned()
    }

    pub fn exit_code(&self) -> Option<i32> {
        *self.inner.exit_code.lock()
    }

    pub fn dock_history(&self) -> Vec<bool> {
        self.inner.dock.lock().clone()
    }

    pub fn app_hidden_count(&self) -> usize {
        self.inner.app_hidden.load(Ordering::SeqCst)
    }
}

impl WindowBackend for MockBackend {
    type Window = MockWindow;

    fn create(&self, spec: &WindowBuildSpec) -> ShellResult<MockWindow> {
        let width = spec.width.round() as u32;
        let height = spec.height.round() as u32;
        let bounds = match spec.placement {
            Placement::Restore(bounds) => bounds,
            Placement::Offset { x, y } => Bounds { x, y, width, height },
            Placement::Centered => {
                // The toolkit centers the frame, not the content.
                let size = Bounds {
                    x: 0,
                    y: 0,
                    width,
                    height: height + TITLE_BAR_HEIGHT,
                };
                let (x, y) = centered_origin(WORK_AREA, size);
                Bounds { x, y, width, height }
            },
        };

        let window = MockWindow::with_parts(
            spec.id,
            &spec.label,
            bounds,
            self.script_for(spec.id),
            self.inner.fail_local.clone(),
            self.inner.local_gates.clone(),
        );
        {
            let mut flags = window.inner.flags.lock();
            flags.maximized = spec.maximized;
            flags.fullscreen = spec.fullscreen;
            flags.zoom = spec.zoom;
        }

        self.inner.specs.lock().push(spec.clone());
        self.inner.windows.lock().push(window.clone());
        Ok(window)
    }

    fn hide_application(&self) -> ShellResult<()> {
        self.inner.app_hidden.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_dock_visible(&self, visible: bool) -> ShellResult<()> {
        self.inner.dock.lock().push(visible);
        Ok(())
    }

    fn exit(&self, code: i32) {
        self.inner.exit_code.lock().get_or_insert(code);
    }
}

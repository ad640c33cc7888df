//! Tauri implementation of the window toolkit seam.
//!
//! Each managed window is one `WebviewWindow` whose label is the per-instance
//! channel reference. Page loads resolve on `PageLoadEvent::Finished`; remote
//! loads are probed over HTTP first because the webview does not report
//! navigation failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use tauri::webview::PageLoadEvent;
use tauri::{
    AppHandle, Emitter, EventTarget, Manager, PhysicalPosition, PhysicalSize, Url, WebviewUrl,
    WebviewWindow, WebviewWindowBuilder,
};
use tokio::sync::oneshot;

use crate::error::{ShellError, ShellResult};
use crate::window::builder::{Placement, WindowBuildSpec};
use crate::window::native::{ChannelRef, LoadFuture, LoadTarget, NativeWindow, WindowBackend};
use crate::window::Bounds;

#[cfg(any(windows, target_os = "android"))]
const LOCAL_ORIGIN: &str = "http://tauri.localhost/";
#[cfg(not(any(windows, target_os = "android")))]
const LOCAL_ORIGIN: &str = "tauri://localhost/";

const BLANK_PAGE: &str = "about:blank";

/// How remote loads are performed.
#[derive(Debug, Clone)]
pub struct LoadSettings {
    pub timeout: Duration,
    pub probe: bool,
}

/// Scheme, host, port and path. Custom-scheme origins are opaque in
/// `Url::origin`, so compare the parts directly. Query and fragment are left
/// out because webviews are free to normalize them.
type NavKey = (String, Option<String>, Option<u16>, String);

fn nav_key(url: &Url) -> NavKey {
    (
        url.scheme().to_string(),
        url.host_str().map(str::to_string),
        url.port_or_known_default(),
        url.path().to_string(),
    )
}

struct PendingLoad {
    target: NavKey,
    /// The webview reported `Started` for the requested URL.
    started: bool,
    done: oneshot::Sender<()>,
}

/// Page-load bookkeeping shared with the builder's `on_page_load` hook.
///
/// A load is tied to its own navigation: it starts when the webview reports
/// `Started` for the requested URL, and the next `Finished` settles it
/// wherever redirects ended up. A `Finished` for the requested URL itself
/// also settles it, in case `Started` was missed.
#[derive(Default)]
struct PageLoads {
    pending: Mutex<Option<PendingLoad>>,
    destroyed: AtomicBool,
}

impl PageLoads {
    /// Replacing an unresolved load drops its sender, which fails it as
    /// superseded.
    fn begin(&self, url: &Url) -> oneshot::Receiver<()> {
        let (done, rx) = oneshot::channel();
        *self.pending.lock() = Some(PendingLoad {
            target: nav_key(url),
            started: false,
            done,
        });
        rx
    }

    fn started(&self, url: &Url) {
        if let Some(load) = self.pending.lock().as_mut() {
            if !load.started && load.target == nav_key(url) {
                load.started = true;
            }
        }
    }

    fn finished(&self, url: &Url) {
        let mut pending = self.pending.lock();
        let settles = pending
            .as_ref()
            .map(|load| load.started || load.target == nav_key(url))
            .unwrap_or(false);
        if settles {
            if let Some(load) = pending.take() {
                let _ = load.done.send(());
            }
        }
    }

    fn cancel(&self) {
        self.pending.lock().take();
    }
}

// ============================================================================
// Window
// ============================================================================

#[derive(Clone)]
pub struct TauriWindow {
    window: WebviewWindow,
    loads: Arc<PageLoads>,
    http: reqwest::Client,
    settings: LoadSettings,
}

impl TauriWindow {
    pub fn label(&self) -> &str {
        self.window.label()
    }

    fn resolve(&self, target: &LoadTarget) -> ShellResult<Url> {
        let parsed = match target {
            LoadTarget::Local(path) => Url::parse(LOCAL_ORIGIN).and_then(|base| base.join(path)),
            LoadTarget::Remote(url) => Url::parse(url),
        };
        parsed.map_err(|e| ShellError::LoadFailed {
            url: target.to_string(),
            reason: e.to_string(),
        })
    }

    async fn probe(&self, url: &Url) -> ShellResult<()> {
        let fail = |reason: String| ShellError::LoadFailed {
            url: url.to_string(),
            reason,
        };
        let response = self
            .http
            .get(url.clone())
            .timeout(self.settings.timeout)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(fail(format!("server responded {}", response.status())));
        }
        Ok(())
    }

    async fn navigate(self, target: LoadTarget) -> ShellResult<()> {
        if self.is_destroyed() {
            return Err(ShellError::WindowDestroyed {
                label: self.label().to_string(),
            });
        }

        let url = self.resolve(&target)?;
        if !target.is_local() && self.settings.probe {
            self.probe(&url).await?;
        }

        let finished = self.loads.begin(&url);
        self.window.navigate(url.clone())?;

        match tokio::time::timeout(self.settings.timeout, finished).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ShellError::LoadFailed {
                url: url.to_string(),
                reason: "navigation superseded".into(),
            }),
            Err(_) => {
                self.loads.cancel();
                Err(ShellError::LoadFailed {
                    url: url.to_string(),
                    reason: format!("timed out after {} ms", self.settings.timeout.as_millis()),
                })
            },
        }
    }
}

impl NativeWindow for TauriWindow {
    fn channel(&self) -> ChannelRef {
        ChannelRef(self.window.label().to_string())
    }

    fn load(&self, target: LoadTarget) -> LoadFuture {
        self.clone().navigate(target).boxed()
    }

    fn is_destroyed(&self) -> bool {
        self.loads.destroyed.load(Ordering::SeqCst)
            || self
                .window
                .app_handle()
                .get_webview_window(self.window.label())
                .is_none()
    }

    fn is_visible(&self) -> ShellResult<bool> {
        Ok(self.window.is_visible()?)
    }

    fn is_focused(&self) -> ShellResult<bool> {
        Ok(self.window.is_focused()?)
    }

    fn is_minimized(&self) -> ShellResult<bool> {
        Ok(self.window.is_minimized()?)
    }

    fn is_maximized(&self) -> ShellResult<bool> {
        Ok(self.window.is_maximized()?)
    }

    fn is_fullscreen(&self) -> ShellResult<bool> {
        Ok(self.window.is_fullscreen()?)
    }

    fn show(&self) -> ShellResult<()> {
        Ok(self.window.show()?)
    }

    fn hide(&self) -> ShellResult<()> {
        Ok(self.window.hide()?)
    }

    fn focus(&self) -> ShellResult<()> {
        Ok(self.window.set_focus()?)
    }

    fn minimize(&self) -> ShellResult<()> {
        Ok(self.window.minimize()?)
    }

    fn unminimize(&self) -> ShellResult<()> {
        Ok(self.window.unminimize()?)
    }

    fn set_fullscreen(&self, fullscreen: bool) -> ShellResult<()> {
        Ok(self.window.set_fullscreen(fullscreen)?)
    }

    fn set_visible_on_all_workspaces(&self, visible: bool) -> ShellResult<()> {
        Ok(self.window.set_visible_on_all_workspaces(visible)?)
    }

    fn outer_bounds(&self) -> ShellResult<Bounds> {
        let position = self.window.outer_position()?;
        let size = self.window.outer_size()?;
        Ok(Bounds {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        })
    }

    fn content_bounds(&self) -> ShellResult<Bounds> {
        // `set_size` restores the inner size, so that is what gets captured.
        let position = self.window.outer_position()?;
        let size = self.window.inner_size()?;
        Ok(Bounds {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        })
    }

    fn set_position(&self, x: i32, y: i32) -> ShellResult<()> {
        Ok(self.window.set_position(PhysicalPosition::new(x, y))?)
    }

    fn work_area(&self) -> ShellResult<Option<Bounds>> {
        let monitor = match self.window.current_monitor()? {
            Some(monitor) => Some(monitor),
            None => self.window.primary_monitor()?,
        };
        Ok(monitor.map(|m| {
            let area = m.work_area();
            Bounds {
                x: area.position.x,
                y: area.position.y,
                width: area.size.width,
                height: area.size.height,
            }
        }))
    }

    fn set_zoom(&self, factor: f64) -> ShellResult<()> {
        Ok(self.window.set_zoom(factor)?)
    }

    fn emit(&self, event: &str, payload: &Value) -> ShellResult<()> {
        self.window
            .app_handle()
            .emit_to(EventTarget::webview_window(self.window.label()), event, payload.clone())?;
        Ok(())
    }

    fn destroy(&self) -> ShellResult<()> {
        self.loads.cancel();
        self.window.destroy()?;
        self.loads.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Backend
// ============================================================================

#[derive(Clone)]
pub struct TauriBackend {
    app: AppHandle,
    http: reqwest::Client,
    settings: LoadSettings,
}

impl TauriBackend {
    pub fn new(app: AppHandle, settings: LoadSettings) -> ShellResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.timeout)
            .build()
            .map_err(|e| ShellError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { app, http, settings })
    }

    fn place(window: &WebviewWindow, placement: Placement) -> ShellResult<()> {
        match placement {
            // Outer position, inner size: see `NativeWindow::content_bounds`.
            Placement::Restore(bounds) => {
                window.set_position(PhysicalPosition::new(bounds.x, bounds.y))?;
                window.set_size(PhysicalSize::new(bounds.width, bounds.height))?;
            },
            Placement::Offset { x, y } => {
                window.set_position(PhysicalPosition::new(x, y))?;
            },
            Placement::Centered => {},
        }
        Ok(())
    }

    /// WebKitGTK reports renderer death through `web-process-terminated`.
    #[cfg(target_os = "linux")]
    fn attach_crash_hook(&self, window: &WebviewWindow, id: crate::window::WindowId) {
        let app = self.app.clone();
        let result = window.with_webview(move |webview| {
            use webkit2gtk::WebViewExt;

            webview
                .inner()
                .connect_web_process_terminated(move |_, reason| {
                    log::error!("[window:{}] Web process terminated: {:?}", id, reason);
                    crate::app::events::renderer_gone(&app, id);
                });
        });
        if let Err(e) = result {
            log::warn!("[window:{}] Failed to attach crash hook: {}", id, e);
        }
    }
}

impl WindowBackend for TauriBackend {
    type Window = TauriWindow;

    fn create(&self, spec: &WindowBuildSpec) -> ShellResult<TauriWindow> {
        let loads = Arc::new(PageLoads::default());
        let hook = loads.clone();

        // Start blank: the placeholder is the first load the manager tracks.
        let blank = Url::parse(BLANK_PAGE).map_err(|e| ShellError::WindowError(e.to_string()))?;
        let mut builder = WebviewWindowBuilder::new(&self.app, &spec.label, WebviewUrl::External(blank))
            .title(&spec.title)
            .inner_size(spec.width, spec.height)
            .min_inner_size(spec.min_width, spec.min_height)
            .visible(false)
            .maximized(spec.maximized)
            .fullscreen(spec.fullscreen)
            .on_page_load(move |_, payload| match payload.event() {
                PageLoadEvent::Started => hook.started(payload.url()),
                PageLoadEvent::Finished => hook.finished(payload.url()),
            });
        if spec.placement == Placement::Centered {
            builder = builder.center();
        }

        let window = builder.build()?;
        if let Err(e) = Self::place(&window, spec.placement) {
            log::warn!("[window:{}] Failed to apply placement: {}", spec.id, e);
        }
        if (spec.zoom - 1.0).abs() > f64::EPSILON {
            if let Err(e) = window.set_zoom(spec.zoom) {
                log::warn!("[window:{}] Failed to apply zoom: {}", spec.id, e);
            }
        }

        #[cfg(target_os = "linux")]
        self.attach_crash_hook(&window, spec.id);

        Ok(TauriWindow {
            window,
            loads,
            http: self.http.clone(),
            settings: self.settings.clone(),
        })
    }

    fn hide_application(&self) -> ShellResult<()> {
        #[cfg(target_os = "macos")]
        self.app.hide()?;
        Ok(())
    }

    fn set_dock_visible(&self, visible: bool) -> ShellResult<()> {
        #[cfg(target_os = "macos")]
        {
            let policy = if visible {
                tauri::ActivationPolicy::Regular
            } else {
                tauri::ActivationPolicy::Accessory
            };
            self.app.set_activation_policy(policy)?;
        }
        #[cfg(not(target_os = "macos"))]
        let _ = visible;
        Ok(())
    }

    fn exit(&self, code: i32) {
        self.app.exit(code);
    }
}

//! Seam between the lifecycle core and the platform window toolkit.
//!
//! The core only ever talks to windows through these traits. The Tauri
//! implementation lives in `app::native`; tests use a scripted mock.

use std::fmt;

use futures::future::BoxFuture;
use serde_json::Value;

use super::builder::WindowBuildSpec;
use super::geometry::Bounds;
use crate::error::ShellResult;

/// Local page shown while remote content loads.
pub const PLACEHOLDER_PAGE: &str = "placeholder.html";

/// Local page shown when remote content fails to load.
pub const ERROR_PAGE: &str = "error.html";

/// Completion of a navigation request.
pub type LoadFuture = BoxFuture<'static, ShellResult<()>>;

/// Where a webview should navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    /// Page bundled with the app, relative to the app origin.
    Local(String),
    /// Absolute remote URL.
    Remote(String),
}

impl LoadTarget {
    pub fn is_local(&self) -> bool {
        matches!(self, LoadTarget::Local(_))
    }
}

impl fmt::Display for LoadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadTarget::Local(path) => write!(f, "app://{}", path),
            LoadTarget::Remote(url) => f.write_str(url),
        }
    }
}

/// Non-owning reference to a window's renderer communication channel.
///
/// This is the native webview label. Labels are unique per native instance,
/// so a recreated window gets a fresh channel reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelRef(pub String);

impl ChannelRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live native window hosting one webview.
///
/// Every method may race with asynchronous teardown; callers check
/// `is_destroyed` and treat errors as recoverable.
pub trait NativeWindow: Send + Sync + 'static {
    fn channel(&self) -> ChannelRef;

    /// Navigate the webview, resolving once the page finished loading.
    fn load(&self, target: LoadTarget) -> LoadFuture;

    fn is_destroyed(&self) -> bool;
    fn is_visible(&self) -> ShellResult<bool>;
    fn is_focused(&self) -> ShellResult<bool>;
    fn is_minimized(&self) -> ShellResult<bool>;
    fn is_maximized(&self) -> ShellResult<bool>;
    fn is_fullscreen(&self) -> ShellResult<bool>;

    fn show(&self) -> ShellResult<()>;
    fn hide(&self) -> ShellResult<()>;
    fn focus(&self) -> ShellResult<()>;
    fn minimize(&self) -> ShellResult<()>;
    fn unminimize(&self) -> ShellResult<()>;
    fn set_fullscreen(&self, fullscreen: bool) -> ShellResult<()>;
    fn set_visible_on_all_workspaces(&self, visible: bool) -> ShellResult<()>;

    /// Frame rectangle, decorations included.
    fn outer_bounds(&self) -> ShellResult<Bounds>;
    /// Outer position with the inner (content) size. This is the rectangle
    /// `Placement::Restore` applies, so it is what geometry persists.
    fn content_bounds(&self) -> ShellResult<Bounds>;
    fn set_position(&self, x: i32, y: i32) -> ShellResult<()>;
    /// Work area of the display currently under the window.
    fn work_area(&self) -> ShellResult<Option<Bounds>>;

    fn set_zoom(&self, factor: f64) -> ShellResult<()>;
    fn emit(&self, event: &str, payload: &Value) -> ShellResult<()>;
    fn destroy(&self) -> ShellResult<()>;
}

/// Process-level services the core needs from the toolkit.
pub trait WindowBackend: Send + Sync + 'static {
    type Window: NativeWindow;

    /// Construct a hidden native window from a fully resolved build spec.
    fn create(&self, spec: &WindowBuildSpec) -> ShellResult<Self::Window>;

    /// Hide the whole application (macOS `NSApp hide`).
    fn hide_application(&self) -> ShellResult<()>;

    fn set_dock_visible(&self, visible: bool) -> ShellResult<()>;

    /// Terminate the process with the given status.
    fn exit(&self, code: i32);
}

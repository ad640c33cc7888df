//! Show/hide/toggle/center normalized across platforms.
//!
//! Platform differences are captured once in `PlatformCapabilities` instead
//! of `cfg` branches in every operation. Every operation is a logged no-op
//! when the native window is already gone, since display requests race
//! with asynchronous close.

use serde::Serialize;

use super::geometry::Bounds;
use super::native::{NativeWindow, WindowBackend};
use crate::error::ShellResult;

/// How a window is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideStrategy {
    /// Minimize first so restore animates from the taskbar (Windows).
    MinimizeThenHide,
    /// Hide, then hide the whole app if nothing else kept focus (macOS).
    HideApplicationUnlessFocused,
    Plain,
}

/// Platform behavior table, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub supports_workspace_visibility: bool,
    /// A hidden fullscreen window cannot be shown directly.
    pub exit_fullscreen_before_show: bool,
    pub supports_dock_hiding: bool,
    pub hide_strategy: HideStrategy,
}

impl PlatformCapabilities {
    pub const MACOS: Self = Self {
        supports_workspace_visibility: true,
        exit_fullscreen_before_show: true,
        supports_dock_hiding: true,
        hide_strategy: HideStrategy::HideApplicationUnlessFocused,
    };

    pub const WINDOWS: Self = Self {
        supports_workspace_visibility: true,
        exit_fullscreen_before_show: false,
        supports_dock_hiding: false,
        hide_strategy: HideStrategy::MinimizeThenHide,
    };

    pub const LINUX: Self = Self {
        supports_workspace_visibility: false,
        exit_fullscreen_before_show: false,
        supports_dock_hiding: false,
        hide_strategy: HideStrategy::Plain,
    };

    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MACOS
        } else if cfg!(target_os = "windows") {
            Self::WINDOWS
        } else {
            Self::LINUX
        }
    }
}

/// What `toggle` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleAction {
    Ignored,
    Hidden,
    Focused,
    Shown,
}

#[derive(Debug, Clone, Copy)]
pub struct DisplayController {
    caps: PlatformCapabilities,
}

impl DisplayController {
    pub fn new(caps: PlatformCapabilities) -> Self {
        Self { caps }
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        &self.caps
    }

    /// Show and focus. Returns true if the window ends up visible.
    pub fn show<W: NativeWindow>(&self, window: &W) -> bool {
        if gone(window, "show") {
            return false;
        }

        if window.is_minimized().unwrap_or(false) {
            log_err(window, "unminimize", window.unminimize());
            return true;
        }

        // Let the window appear on the workspace the user is looking at.
        if self.caps.supports_workspace_visibility {
            log_err(window, "workspace visibility", window.set_visible_on_all_workspaces(true));
        }

        if self.caps.exit_fullscreen_before_show
            && window.is_fullscreen().unwrap_or(false)
            && !window.is_visible().unwrap_or(false)
        {
            log_err(window, "exit fullscreen", window.set_fullscreen(false));
        }

        log_err(window, "show", window.show());
        log_err(window, "focus", window.focus());

        if self.caps.supports_workspace_visibility {
            log_err(window, "workspace visibility", window.set_visible_on_all_workspaces(false));
        }
        true
    }

    /// Hide per platform strategy. `other_focused` says whether another
    /// managed window currently holds focus.
    pub fn hide<W: NativeWindow, B: WindowBackend>(&self, window: &W, backend: &B, other_focused: bool) -> bool {
        if gone(window, "hide") {
            return false;
        }

        match self.caps.hide_strategy {
            HideStrategy::MinimizeThenHide => {
                log_err(window, "minimize", window.minimize());
                log_err(window, "hide", window.hide());
            },
            HideStrategy::HideApplicationUnlessFocused => {
                log_err(window, "hide", window.hide());
                if !other_focused {
                    if let Err(e) = backend.hide_application() {
                        log::warn!("[display] Failed to hide application: {}", e);
                    }
                }
            },
            HideStrategy::Plain => {
                log_err(window, "hide", window.hide());
            },
        }
        true
    }

    pub fn toggle<W: NativeWindow, B: WindowBackend>(&self, window: &W, backend: &B, other_focused: bool) -> ToggleAction {
        if gone(window, "toggle") {
            return ToggleAction::Ignored;
        }

        let visible = window.is_visible().unwrap_or(false);
        let fullscreen = window.is_fullscreen().unwrap_or(false);

        if visible && fullscreen {
            // Let the window manager own fullscreen windows.
            return ToggleAction::Ignored;
        }

        if visible {
            if window.is_focused().unwrap_or(false) {
                self.hide(window, backend, other_focused);
                ToggleAction::Hidden
            } else {
                log_err(window, "focus", window.focus());
                ToggleAction::Focused
            }
        } else {
            self.show(window);
            ToggleAction::Shown
        }
    }

    /// Center on the display currently under the window.
    pub fn center_on_display<W: NativeWindow>(&self, window: &W) -> Option<(i32, i32)> {
        if gone(window, "center") {
            return None;
        }

        let bounds = match window.outer_bounds() {
            Ok(bounds) => bounds,
            Err(e) => {
                log::warn!("[display] {}: failed to read bounds: {}", window.channel(), e);
                return None;
            },
        };
        let area = match window.work_area() {
            Ok(Some(area)) => area,
            Ok(None) => {
                log::warn!("[display] {}: no display under window", window.channel());
                return None;
            },
            Err(e) => {
                log::warn!("[display] {}: failed to read work area: {}", window.channel(), e);
                return None;
            },
        };

        let (x, y) = centered_origin(area, bounds);
        log_err(window, "set position", window.set_position(x, y));
        Some((x, y))
    }

    pub fn bring_to_front<W: NativeWindow>(&self, window: &W) {
        if gone(window, "bring to front") {
            return;
        }
        if window.is_minimized().unwrap_or(false) {
            log_err(window, "unminimize", window.unminimize());
        }
        log_err(window, "show", window.show());
        log_err(window, "focus", window.focus());
    }

    pub fn activate<W: NativeWindow>(&self, window: &W) {
        if gone(window, "activate") {
            return;
        }
        log_err(window, "focus", window.focus());
    }

    /// The dock icon may be hidden only when no other managed window shows.
    pub fn should_hide_dock(&self, other_visible: bool) -> bool {
        self.caps.supports_dock_hiding && !other_visible
    }
}

/// Top-left that centers `bounds` in `area`, never left of or above the
/// work-area origin.
pub fn centered_origin(area: Bounds, bounds: Bounds) -> (i32, i32) {
    let x = area.x + (area.width as i32 - bounds.width as i32) / 2;
    let y = area.y + (area.height as i32 - bounds.height as i32) / 2;
    (x.max(area.x), y.max(area.y))
}

fn gone<W: NativeWindow>(window: &W, op: &str) -> bool {
    if window.is_destroyed() {
        log::warn!("[display] Skipping {} on destroyed window {}", op, window.channel());
        return true;
    }
    false
}

fn log_err<W: NativeWindow>(window: &W, op: &str, result: ShellResult<()>) {
    if let Err(e) = result {
        log::warn!("[display] {} failed on {}: {}", op, window.channel(), e);
    }
}

//! Window management commands.
//!
//! Thin IPC wrappers over the window manager. Window ids arrive as
//! lowercase strings and are rejected by deserialization unless they name a
//! catalog identity.

use std::sync::Arc;

use serde_json::Value;
use tauri::{command, State, WebviewWindow};

use crate::app::Shell;
use crate::error::ShellError;
use crate::window::{ChannelRef, CloseDecision, LifecyclePhase, RetryOutcome, ToggleAction, WindowId};

type ShellState<'a> = State<'a, Arc<Shell>>;

// ============================================================================
// Lifecycle
// ============================================================================

/// Construct (if needed) and boot a window without forcing it visible.
#[command]
pub async fn open_window(shell: ShellState<'_>, id: WindowId) -> Result<(), ShellError> {
    shell.get(id).await?;
    Ok(())
}

#[command]
pub fn close_window(shell: ShellState<'_>, id: WindowId) -> CloseDecision {
    shell.close(id)
}

#[command]
pub fn window_phase(shell: ShellState<'_>, id: WindowId) -> Option<LifecyclePhase> {
    shell.phase(id)
}

/// Invoked by the error surface's Retry button.
#[command]
pub async fn retry_connection(shell: ShellState<'_>, window_id: WindowId) -> Result<RetryOutcome, ShellError> {
    Ok(shell.retry(window_id).await)
}

// ============================================================================
// Display
// ============================================================================

#[command]
pub async fn show_window(shell: ShellState<'_>, id: WindowId) -> Result<(), ShellError> {
    shell.show(id).await
}

#[command]
pub fn hide_window(shell: ShellState<'_>, id: WindowId) -> bool {
    shell.hide(id)
}

#[command]
pub async fn toggle_window(shell: ShellState<'_>, id: WindowId) -> Result<ToggleAction, ShellError> {
    shell.toggle(id).await
}

#[command]
pub fn center_window(shell: ShellState<'_>, id: WindowId) -> Option<(i32, i32)> {
    shell.center(id)
}

#[command]
pub fn set_window_zoom(shell: ShellState<'_>, id: WindowId, factor: f64) -> Result<f64, ShellError> {
    shell.set_zoom(id, factor)
}

// ============================================================================
// Broadcast
// ============================================================================

/// Send `event` to one window, or to every live window when `target` is
/// absent. Returns the number of windows reached.
#[command]
pub fn broadcast(shell: ShellState<'_>, event: String, payload: Value, target: Option<WindowId>) -> usize {
    match target {
        Some(id) => usize::from(shell.broadcast_to(id, &event, &payload)),
        None => shell.broadcast_all(&event, &payload),
    }
}

/// Identity of the calling webview, `None` for unmanaged or stale webviews.
#[command]
pub fn current_window_id(shell: ShellState<'_>, webview_window: WebviewWindow) -> Option<WindowId> {
    shell.resolve_identity(&ChannelRef(webview_window.label().to_string()))
}

//! Window and run-loop event handlers.
//!
//! Native events are routed to the window manager by channel (webview label);
//! events from windows the manager does not own are ignored.

use std::sync::Arc;

use tauri::{AppHandle, Manager, RunEvent, Theme, Window, WindowEvent};

use super::Shell;
use crate::window::{ChannelRef, WindowId};

fn shell(app: &AppHandle) -> Option<Arc<Shell>> {
    app.try_state::<Arc<Shell>>().map(|s| s.inner().clone())
}

/// Handle window events for the application.
///
/// This is called from the Tauri builder's `on_window_event` hook.
pub fn handle_window_event(window: &Window, event: &WindowEvent) {
    let Some(shell) = shell(window.app_handle()) else {
        return;
    };
    let channel = ChannelRef(window.label().to_string());

    match event {
        WindowEvent::CloseRequested { api, .. } => {
            let Some(id) = shell.resolve_identity(&channel) else {
                return;
            };
            // The manager decides between hiding and destroying.
            api.prevent_close();
            let decision = shell.close(id);
            log::debug!("[events] Close requested for {}: {:?}", id, decision);
        },

        // Fix Windows resize lag by adding small delay
        // See: https://github.com/tauri-apps/tauri/issues/6322#issuecomment-2495685888
        WindowEvent::Resized(_) => {
            #[cfg(target_os = "windows")]
            std::thread::sleep(std::time::Duration::from_millis(1));
            shell.on_bounds_changed(&channel);
        },

        WindowEvent::Moved(_) => shell.on_bounds_changed(&channel),

        WindowEvent::Destroyed => shell.on_native_destroyed(&channel),

        WindowEvent::ThemeChanged(theme) => {
            let delivered = shell.notify_theme_changed(*theme == Theme::Dark);
            if delivered > 0 {
                log::info!("[events] Theme changed to {:?}, notified {} window(s)", theme, delivered);
            }
        },

        _ => {},
    }
}

/// Renderer process of `id` died; apply the crash policy off the UI thread.
pub fn renderer_gone(app: &AppHandle, id: WindowId) {
    let Some(shell) = shell(app) else {
        return;
    };
    tauri::async_runtime::spawn(async move {
        shell.on_renderer_gone(id).await;
    });
}

/// Show a window from a non-async context (tray, second instance, dock).
pub fn spawn_show(app: &AppHandle, id: WindowId) {
    let Some(shell) = shell(app) else {
        return;
    };
    tauri::async_runtime::spawn(async move {
        if let Err(e) = shell.show(id).await {
            log::error!("[events] Failed to show {}: {}", id, e);
        }
    });
}

pub fn spawn_toggle(app: &AppHandle, id: WindowId) {
    let Some(shell) = shell(app) else {
        return;
    };
    tauri::async_runtime::spawn(async move {
        if let Err(e) = shell.toggle(id).await {
            log::error!("[events] Failed to toggle {}: {}", id, e);
        }
    });
}

/// Destroy every window, keep-alive included, then let the process exit.
pub fn quit(app: &AppHandle) {
    let Some(shell) = shell(app) else {
        app.exit(0);
        return;
    };
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        shell.quit().await;
        app.exit(0);
    });
}

/// Handle run-loop events.
pub fn handle_run_event(app: &AppHandle, event: &RunEvent) {
    match event {
        RunEvent::ExitRequested { api, .. } => {
            // Hold the exit until the shutdown sequence has flushed geometry.
            if let Some(shell) = shell(app) {
                if !shell.is_quitting() {
                    api.prevent_exit();
                    quit(app);
                }
            }
        },

        #[cfg(target_os = "macos")]
        RunEvent::Reopen { .. } => spawn_show(app, WindowId::Chat),

        _ => {},
    }
}

//! Application lifecycle and platform integration.
//!
//! - `native`: Tauri implementation of the window toolkit seam
//! - `events`: window and run-loop event handlers
//! - `tray`: system tray setup and menu handling

pub mod events;
pub mod native;

#[cfg(desktop)]
pub mod tray;

use crate::window::WindowManager;

/// The window manager as run by the app.
pub type Shell = WindowManager<native::TauriBackend>;

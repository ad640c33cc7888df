//! Window identities and the static window catalog.
//!
//! Every window kind the shell can host is described once here. The catalog
//! is read-only after startup; runtime state lives in `ManagedWindow`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ShellError, ShellResult};

/// Stable logical name of a window kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum WindowId {
    Chat,
    Settings,
    Devtools,
}

impl WindowId {
    pub const ALL: [WindowId; 3] = [WindowId::Chat, WindowId::Settings, WindowId::Devtools];

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowId::Chat => "chat",
            WindowId::Settings => "settings",
            WindowId::Devtools => "devtools",
        }
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowId {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(WindowId::Chat),
            "settings" => Ok(WindowId::Settings),
            "devtools" => Ok(WindowId::Devtools),
            other => Err(ShellError::UnknownWindow(other.to_string())),
        }
    }
}

/// Logical window size (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Immutable description of one window kind.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowIdentity {
    pub id: WindowId,
    pub title: &'static str,
    /// Route on the content server, joined to the configured base URL.
    pub content_path: &'static str,
    /// Owner window used for initial positioning.
    pub parent: Option<WindowId>,
    /// Hide instead of destroy on a normal close.
    pub keep_alive: bool,
    pub show_on_init: bool,
    pub size: Size,
    pub min_size: Size,
}

impl WindowIdentity {
    /// Name of the inbound retry action for this window.
    pub fn retry_channel_key(&self) -> String {
        format!("retry-connection-{}", self.id)
    }
}

/// Read-only table of every window the shell knows about.
#[derive(Debug, Clone)]
pub struct WindowCatalog {
    entries: HashMap<WindowId, WindowIdentity>,
}

impl WindowCatalog {
    pub fn new(identities: impl IntoIterator<Item = WindowIdentity>) -> Self {
        Self {
            entries: identities.into_iter().map(|i| (i.id, i)).collect(),
        }
    }

    pub fn identity(&self, id: WindowId) -> ShellResult<&WindowIdentity> {
        self.entries
            .get(&id)
            .ok_or_else(|| ShellError::UnknownWindow(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for WindowCatalog {
    fn default() -> Self {
        Self::new([
            WindowIdentity {
                id: WindowId::Chat,
                title: "Chat",
                content_path: "/",
                parent: None,
                keep_alive: true,
                show_on_init: true,
                size: Size::new(1100.0, 760.0),
                min_size: Size::new(640.0, 480.0),
            },
            WindowIdentity {
                id: WindowId::Settings,
                title: "Settings",
                content_path: "/settings",
                parent: None,
                keep_alive: true,
                show_on_init: true,
                size: Size::new(720.0, 560.0),
                min_size: Size::new(560.0, 420.0),
            },
            WindowIdentity {
                id: WindowId::Devtools,
                title: "Developer Tools",
                content_path: "/devtools",
                parent: Some(WindowId::Chat),
                keep_alive: false,
                show_on_init: true,
                size: Size::new(900.0, 600.0),
                min_size: Size::new(480.0, 320.0),
            },
        ])
    }
}

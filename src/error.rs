//! Central error types for ChatShell.
//!
//! This module provides typed errors for the window shell. All errors
//! implement `Serialize` for Tauri IPC compatibility.

use serde::Serialize;
use thiserror::Error;

/// Main error type for ChatShell operations.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Identifier is not part of the window catalog
    #[error("Unknown window identity: {0}")]
    UnknownWindow(String),

    /// Native window operation failed
    #[error("Window error: {0}")]
    WindowError(String),

    /// Native handle was already destroyed
    #[error("Window {label} has already been destroyed")]
    WindowDestroyed { label: String },

    /// Remote content or local page failed to load
    #[error("Failed to load {url}: {reason}")]
    LoadFailed { url: String, reason: String },

    /// Persisted state could not be read or written
    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration is invalid
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Implement Serialize for Tauri IPC compatibility.
/// Tauri requires errors to be serializable to send to the frontend.
impl Serialize for ShellError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<tauri::Error> for ShellError {
    fn from(err: tauri::Error) -> Self {
        ShellError::WindowError(err.to_string())
    }
}

impl From<String> for ShellError {
    fn from(msg: String) -> Self {
        ShellError::Other(msg)
    }
}

impl From<&str> for ShellError {
    fn from(msg: &str) -> Self {
        ShellError::Other(msg.to_string())
    }
}

/// Extension trait for adding context to Results.
///
/// Similar to anyhow's `Context` trait, this allows chaining context
/// information onto errors for better debugging.
///
/// # Example
/// ```ignore
/// use crate::error::{ResultExt, ShellResult};
///
/// fn load_config() -> ShellResult<String> {
///     std::fs::read_to_string("config.json").context("failed to read config file")
/// }
/// ```
pub trait ResultExt<T> {
    /// Add context to an error, converting it to ShellError::Other.
    fn context(self, msg: &str) -> ShellResult<T>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> ShellResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context(self, msg: &str) -> ShellResult<T> {
        self.map_err(|e| ShellError::Other(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> ShellResult<T> {
        self.map_err(|e| ShellError::Other(format!("{}: {}", f(), e)))
    }
}

/// Extension trait for adding context to Option types.
pub trait OptionExt<T> {
    /// Convert None to ShellError::Other with the given message.
    fn context(self, msg: &str) -> ShellResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context(self, msg: &str) -> ShellResult<T> {
        self.ok_or_else(|| ShellError::Other(msg.to_string()))
    }
}

/// Type alias for Results using ShellError.
pub type ShellResult<T> = Result<T, ShellError>;

//! Application-level configuration.
//!
//! Where the shell loads its content from and how patient it is:
//! - Remote content origin
//! - Load timeout and reachability probe
//! - Renderer crash-loop threshold
//!
//! Read once at startup from `config.json` in the app config directory, then
//! overridden by environment variables. Uses `parking_lot::RwLock` for
//! thread-safe access.

use std::fs;
use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const ENV_CONTENT_URL: &str = "CHATSHELL_CONTENT_URL";
pub const ENV_LOAD_TIMEOUT_MS: &str = "CHATSHELL_LOAD_TIMEOUT_MS";

lazy_static! {
    /// Global app configuration.
    pub static ref APP_CONFIG: RwLock<AppConfig> = RwLock::new(AppConfig::default());
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AppConfig {
    /// Origin the window content paths are joined onto.
    pub content_base_url: String,
    /// How long a remote load may take before it counts as failed.
    pub load_timeout_ms: u64,
    /// Two renderer crashes closer than this exit the process.
    pub crash_loop_threshold_ms: u64,
    /// Probe the content URL over HTTP before navigating to it.
    pub probe_before_load: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            content_base_url: "http://127.0.0.1:5173/".to_string(),
            load_timeout_ms: 15_000,
            crash_loop_threshold_ms: 60_000,
            probe_before_load: true,
        }
    }
}

impl AppConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn crash_loop_threshold(&self) -> Duration {
        Duration::from_millis(self.crash_loop_threshold_ms)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Read `config.json` from `config_dir`. Missing or malformed files fall back
/// to defaults.
pub fn load_from_dir(config_dir: &Path) -> AppConfig {
    let path = config_dir.join(CONFIG_FILE_NAME);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("[APP_CONFIG] No {} found, using defaults", path.display());
            return AppConfig::default();
        },
        Err(e) => {
            log::warn!("[APP_CONFIG] Failed to read {}: {}", path.display(), e);
            return AppConfig::default();
        },
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("[APP_CONFIG] Malformed {}: {}, using defaults", path.display(), e);
            AppConfig::default()
        },
    }
}

/// Apply environment overrides. `lookup` is `std::env::var` in production.
pub fn apply_env_overrides(mut config: AppConfig, lookup: impl Fn(&str) -> Option<String>) -> AppConfig {
    if let Some(url) = lookup(ENV_CONTENT_URL).filter(|v| !v.trim().is_empty()) {
        log::info!("[APP_CONFIG] {} override: {}", ENV_CONTENT_URL, url);
        config.content_base_url = url.trim().to_string();
    }

    if let Some(raw) = lookup(ENV_LOAD_TIMEOUT_MS) {
        match raw.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => config.load_timeout_ms = ms,
            _ => log::warn!("[APP_CONFIG] Ignoring invalid {}={}", ENV_LOAD_TIMEOUT_MS, raw),
        }
    }
    config
}

/// Load, apply env overrides and publish to `APP_CONFIG`.
pub fn init(config_dir: &Path) -> AppConfig {
    let config = apply_env_overrides(load_from_dir(config_dir), |key| std::env::var(key).ok());
    log::info!("[APP_CONFIG] {:?}", config);
    *APP_CONFIG.write() = config.clone();
    config
}

// ============================================================================
// Tauri Commands
// ============================================================================

/// Get the current app configuration.
#[tauri::command]
pub fn get_app_config() -> AppConfig {
    APP_CONFIG.read().clone()
}

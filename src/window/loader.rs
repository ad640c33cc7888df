//! Placeholder, content and retry loading for a single window.
//!
//! ## Sequence
//!
//! ```text
//! placeholder (best effort) -> content -> Ready
//!                                 \-> Error + error surface + retry armed
//! retry: Error -> ContentLoading -> Ready (retry disarmed)
//!                                \-> Error (error surface reloaded, same retry re-armed)
//! ```

use serde::Serialize;
use ts_rs::TS;

use super::identity::WindowIdentity;
use super::instance::ManagedWindow;
use super::native::{LoadTarget, NativeWindow, ERROR_PAGE, PLACEHOLDER_PAGE};
use super::phase::LifecyclePhase;
use crate::error::{ShellError, ShellResult};

/// Result of a retry request. Never surfaces as an IPC error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "status", rename_all = "camelCase")]
#[ts(export)]
pub enum RetryOutcome {
    Success,
    Failure { reason: String },
}

impl RetryOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        RetryOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success)
    }
}

/// The single armed retry action of a window instance.
#[derive(Debug)]
struct RetryHandle {
    in_flight: bool,
}

/// Load targets and retry bookkeeping for one window instance.
#[derive(Debug)]
pub struct LoadController {
    content_url: String,
    error_page: String,
    retry_key: String,
    retry: Option<RetryHandle>,
}

impl LoadController {
    pub fn new(identity: &WindowIdentity, content_base_url: &str) -> ShellResult<Self> {
        let retry_key = identity.retry_channel_key();
        Ok(Self {
            content_url: content_url(content_base_url, identity.content_path)?,
            error_page: format!("{}?window={}&channel={}", ERROR_PAGE, identity.id, retry_key),
            retry_key,
            retry: None,
        })
    }

    pub fn placeholder_target() -> LoadTarget {
        LoadTarget::Local(PLACEHOLDER_PAGE.to_string())
    }

    pub fn content_target(&self) -> LoadTarget {
        LoadTarget::Remote(self.content_url.clone())
    }

    pub fn error_target(&self) -> LoadTarget {
        LoadTarget::Local(self.error_page.clone())
    }

    pub fn retry_key(&self) -> &str {
        &self.retry_key
    }

    pub fn retry_armed(&self) -> bool {
        self.retry.is_some()
    }

    pub fn retry_in_flight(&self) -> bool {
        self.retry.as_ref().map(|r| r.in_flight).unwrap_or(false)
    }

    /// Register the retry action. Re-arming an armed handle keeps it.
    /// Returns true if a new handle was registered.
    pub fn arm_retry(&mut self) -> bool {
        match &mut self.retry {
            Some(handle) => {
                handle.in_flight = false;
                false
            },
            None => {
                self.retry = Some(RetryHandle { in_flight: false });
                true
            },
        }
    }

    /// Claim the retry action, rejecting when absent or already running.
    pub fn begin_retry(&mut self) -> Result<LoadTarget, RetryOutcome> {
        match &mut self.retry {
            None => Err(RetryOutcome::failure("no retry pending")),
            Some(handle) if handle.in_flight => {
                Err(RetryOutcome::failure("retry already in progress"))
            },
            Some(handle) => {
                handle.in_flight = true;
                Ok(LoadTarget::Remote(self.content_url.clone()))
            },
        }
    }

    /// Settle a claimed retry: success deregisters, failure re-arms.
    pub fn finish_retry(&mut self, succeeded: bool) {
        if succeeded {
            self.retry = None;
        } else {
            self.arm_retry();
        }
    }

    pub fn disarm(&mut self) {
        self.retry = None;
    }
}

/// Join a content route onto the configured base URL.
pub fn content_url(base: &str, path: &str) -> ShellResult<String> {
    let base = reqwest::Url::parse(base)
        .map_err(|e| ShellError::ConfigError(format!("invalid content base URL {}: {}", base, e)))?;
    let url = base
        .join(path.trim_start_matches('/'))
        .map_err(|e| ShellError::ConfigError(format!("invalid content path {}: {}", path, e)))?;
    Ok(url.to_string())
}

impl<W: NativeWindow> ManagedWindow<W> {
    /// Best effort: failures are logged and never escalate.
    pub(crate) async fn load_placeholder(&self) {
        if let Err(e) = self.native().load(LoadController::placeholder_target()).await {
            log::warn!("[window:{}] Placeholder failed to load: {}", self.id(), e);
        }
    }

    pub(crate) async fn load_content(&self) -> bool {
        let target = self.state.lock().loader.content_target();
        log::info!("[window:{}] Loading {}", self.id(), target);

        match self.native().load(target).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[window:{}] Content failed to load: {}", self.id(), e);
                false
            },
        }
    }

    /// ContentLoading -> Error: arm the retry action and show the error surface.
    pub(crate) async fn enter_error(&self) {
        {
            let mut state = self.state.lock();
            if !self.transition_locked(&mut state, LifecyclePhase::Error) {
                return;
            }
            if state.loader.arm_retry() {
                log::info!(
                    "[window:{}] Registered {}",
                    self.id(),
                    state.loader.retry_key()
                );
            }
        }
        self.show_error_surface().await;
    }

    async fn show_error_surface(&self) {
        let target = self.state.lock().loader.error_target();
        if let Err(e) = self.native().load(target).await {
            log::warn!("[window:{}] Error surface failed to load: {}", self.id(), e);
        }
    }

    /// Re-attempt the content URL.
    ///
    /// At most one retry runs per instance; a second call while one is in
    /// flight is rejected.
    pub async fn retry(&self) -> RetryOutcome {
        if self.is_torn_down() {
            return RetryOutcome::failure("window closed");
        }

        let target = {
            let mut state = self.state.lock();
            if state.loader.retry_in_flight() {
                return RetryOutcome::failure("retry already in progress");
            }
            if state.phase != LifecyclePhase::Error {
                return RetryOutcome::failure("no retry pending");
            }
            let target = match state.loader.begin_retry() {
                Ok(target) => target,
                Err(rejected) => return rejected,
            };
            self.transition_locked(&mut state, LifecyclePhase::ContentLoading);
            target
        };

        log::info!("[window:{}] Retrying {}", self.id(), target);
        let result = self.native().load(target).await;

        if self.is_torn_down() {
            log::debug!("[window:{}] Dropping stale retry completion", self.id());
            return RetryOutcome::failure("window closed");
        }

        match result {
            Ok(()) => {
                self.state.lock().loader.finish_retry(true);
                self.mark_ready();
                log::info!("[window:{}] Retry succeeded", self.id());
                RetryOutcome::Success
            },
            Err(e) => {
                {
                    let mut state = self.state.lock();
                    self.transition_locked(&mut state, LifecyclePhase::Error);
                    state.loader.finish_retry(false);
                }
                self.show_error_surface().await;
                RetryOutcome::failure(e.to_string())
            },
        }
    }

    /// Reload whatever the window was showing before its renderer died.
    pub(crate) async fn reload_after_crash(&self) {
        let target = {
            let state = self.state.lock();
            if state.phase == LifecyclePhase::Error {
                state.loader.error_target()
            } else {
                state.loader.content_target()
            }
        };
        log::info!("[window:{}] Reloading {} after renderer crash", self.id(), target);
        if let Err(e) = self.native().load(target).await {
            log::warn!("[window:{}] Reload after crash failed: {}", self.id(), e);
        }
    }
}

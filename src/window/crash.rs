//! Renderer crash recovery policy.
//!
//! A crash long after the previous one is treated as transient and the
//! window reloads. Two crashes within the threshold mean the render target
//! is persistently broken, and the process exits instead of looping.

use std::time::Duration;

pub const DEFAULT_CRASH_LOOP_THRESHOLD: Duration = Duration::from_secs(60);

/// Exit status used when a crash loop is detected.
pub const CRASH_LOOP_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashVerdict {
    Reload,
    Fatal,
}

#[derive(Debug, Clone, Copy)]
pub struct CrashPolicy {
    threshold_ms: i64,
}

impl CrashPolicy {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold_ms: threshold.as_millis().min(i64::MAX as u128) as i64,
        }
    }

    pub fn threshold_ms(&self) -> i64 {
        self.threshold_ms
    }
}

impl Default for CrashPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CRASH_LOOP_THRESHOLD)
    }
}

/// Per-window crash history.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrashTracker {
    last_crash_ms: Option<i64>,
}

impl CrashTracker {
    pub fn last_crash_ms(&self) -> Option<i64> {
        self.last_crash_ms
    }

    /// Record a crash at `now_ms` (epoch millis) and decide what to do.
    pub fn record(&mut self, now_ms: i64, policy: &CrashPolicy) -> CrashVerdict {
        let verdict = match self.last_crash_ms {
            Some(last) if now_ms.saturating_sub(last) <= policy.threshold_ms => CrashVerdict::Fatal,
            _ => CrashVerdict::Reload,
        };
        self.last_crash_ms = Some(now_ms);
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_crash_reloads() {
        let policy = CrashPolicy::default();
        let mut tracker = CrashTracker::default();
        assert_eq!(tracker.record(1_000, &policy), CrashVerdict::Reload);
        assert_eq!(tracker.last_crash_ms(), Some(1_000));
    }

    #[test]
    fn test_spaced_crashes_reload() {
        let policy = CrashPolicy::default();
        let mut tracker = CrashTracker::default();
        assert_eq!(tracker.record(0, &policy), CrashVerdict::Reload);
        assert_eq!(tracker.record(70_000, &policy), CrashVerdict::Reload);
        assert_eq!(tracker.record(140_001, &policy), CrashVerdict::Reload);
    }

    #[test]
    fn test_rapid_crashes_are_fatal() {
        let policy = CrashPolicy::default();
        let mut tracker = CrashTracker::default();
        assert_eq!(tracker.record(0, &policy), CrashVerdict::Reload);
        assert_eq!(tracker.record(10_000, &policy), CrashVerdict::Fatal);
    }

    #[test]
    fn test_threshold_boundary() {
        let policy = CrashPolicy::new(Duration::from_secs(60));
        let mut tracker = CrashTracker::default();
        tracker.record(0, &policy);
        assert_eq!(tracker.record(60_000, &policy), CrashVerdict::Fatal);
        assert_eq!(tracker.record(120_001, &policy), CrashVerdict::Reload);
    }
}

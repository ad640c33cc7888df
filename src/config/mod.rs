//! Application configuration management.
//!
//! Typed config behind a `parking_lot::RwLock`, loaded once at startup.

pub mod app;

pub use app::{AppConfig, APP_CONFIG};

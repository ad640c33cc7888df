//! Window lifecycle and recovery core.
//!
//! ## Architecture
//!
//! ```text
//! window/
//!   identity.rs  - WindowId, WindowIdentity, static catalog
//!   builder.rs   - identity + persisted state -> native build spec
//!   native.rs    - NativeWindow / WindowBackend traits (toolkit seam)
//!   phase.rs     - lifecycle phases and legal transitions
//!   registry.rs  - one live instance per identity
//!   instance.rs  - ManagedWindow runtime state
//!   geometry.rs  - persisted bounds and zoom
//!   loader.rs    - placeholder/content/error loading, retry action
//!   crash.rs     - renderer crash-loop policy
//!   display.rs   - platform-normalized show/hide/toggle/center
//!   broadcast.rs - event fan-out and channel -> identity index
//!   theme.rs     - theme change subscriptions
//!   manager.rs   - WindowManager, composes everything above
//! ```

pub mod broadcast;
pub mod builder;
pub mod crash;
pub mod display;
pub mod geometry;
pub mod identity;
pub mod instance;
pub mod loader;
pub mod manager;
pub mod native;
pub mod phase;
pub mod registry;
pub mod theme;

#[cfg(test)]
pub(crate) mod mock;

pub use display::{PlatformCapabilities, ToggleAction};
pub use geometry::{Bounds, GeometryRecord};
pub use identity::{WindowCatalog, WindowId, WindowIdentity};
pub use loader::RetryOutcome;
pub use manager::{CloseDecision, ManagerOptions, QuitFlag, WindowManager};
pub use native::{ChannelRef, LoadTarget, NativeWindow, WindowBackend};
pub use phase::LifecyclePhase;

//! Resolves an identity plus persisted state into native construction
//! parameters.

use super::geometry::{Bounds, GeometryRecord};
use super::identity::{WindowId, WindowIdentity};

/// Where a new window should appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Exact persisted bounds (physical pixels).
    Restore(Bounds),
    /// Top-left in physical pixels, centered over the owner window.
    Offset { x: i32, y: i32 },
    /// Toolkit default: centered on the primary display.
    Centered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowBuildSpec {
    pub id: WindowId,
    /// Unique native label, also used as the channel reference.
    pub label: String,
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub placement: Placement,
    pub maximized: bool,
    pub fullscreen: bool,
    pub zoom: f64,
}

/// Native label for the `generation`-th instance of a window.
pub fn window_label(id: WindowId, generation: u64) -> String {
    format!("{}-{}", id, generation)
}

pub fn build_window_spec(
    identity: &WindowIdentity,
    generation: u64,
    geometry: Option<&GeometryRecord>,
    parent_bounds: Option<Bounds>,
    zoom: f64,
) -> WindowBuildSpec {
    let placement = match (geometry, identity.parent, parent_bounds) {
        (Some(record), _, _) => Placement::Restore(record.bounds()),
        (None, Some(_), Some(parent)) => center_over(parent, identity.size.width, identity.size.height),
        (None, Some(parent_id), None) => {
            log::info!(
                "[window:{}] Parent {} is not live, using default position",
                identity.id,
                parent_id
            );
            Placement::Centered
        },
        (None, None, _) => Placement::Centered,
    };

    WindowBuildSpec {
        id: identity.id,
        label: window_label(identity.id, generation),
        title: identity.title.to_string(),
        width: identity.size.width,
        height: identity.size.height,
        min_width: identity.min_size.width,
        min_height: identity.min_size.height,
        placement,
        maximized: geometry.map(|g| g.is_maximized).unwrap_or(false),
        fullscreen: geometry.map(|g| g.is_full_screen).unwrap_or(false),
        zoom,
    }
}

fn center_over(parent: Bounds, width: f64, height: f64) -> Placement {
    let x = parent.x + (parent.width as i32 - width.round() as i32) / 2;
    let y = parent.y + (parent.height as i32 - height.round() as i32) / 2;
    Placement::Offset { x, y }
}

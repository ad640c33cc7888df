//! Persisted per-window geometry and zoom.
//!
//! One JSON file per identity (`<id>.json`) holds the last known bounds and
//! maximize/fullscreen flags. Zoom lives beside it in `<id>.prefs.json`.
//! The store is the only writer of these files.
//!
//! Bounds are the outer position with the inner (content) size, the same
//! rectangle `Placement::Restore` applies, so a capture/restore cycle is
//! exact on decorated windows.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use ts_rs::TS;

use super::identity::WindowId;
use super::native::NativeWindow;
use crate::error::ShellResult;

/// Zoom factors outside this range are clamped.
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 5.0;

/// Physical-pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Last known placement of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GeometryRecord {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub is_maximized: bool,
    #[serde(default)]
    pub is_full_screen: bool,
}

impl GeometryRecord {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Per-window preferences that are not geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowPrefs {
    #[serde(default = "default_zoom")]
    pub zoom_factor: f64,
}

fn default_zoom() -> f64 {
    1.0
}

impl Default for WindowPrefs {
    fn default() -> Self {
        Self { zoom_factor: 1.0 }
    }
}

pub fn clamp_zoom(factor: f64) -> f64 {
    if factor.is_finite() {
        factor.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}

/// Quiet period after the last bounds change before it is written out.
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug)]
enum WriteRequest {
    Save(WindowId, GeometryRecord),
    Flush(oneshot::Sender<()>),
}

/// File-backed geometry store rooted at a directory.
///
/// Records are cached in memory. Captures from move/resize events only touch
/// the cache and hand the record to a background writer, which coalesces
/// bursts and writes once the window has been still for `PERSIST_DEBOUNCE`.
/// Without a tokio runtime (plain unit tests) captures are written inline.
#[derive(Debug)]
pub struct GeometryStore {
    dir: PathBuf,
    records: Mutex<HashMap<WindowId, Option<GeometryRecord>>>,
    writer: Option<mpsc::UnboundedSender<WriteRequest>>,
}

impl GeometryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_debounce(dir, PERSIST_DEBOUNCE)
    }

    pub fn with_debounce(dir: impl Into<PathBuf>, debounce: Duration) -> Self {
        let dir = dir.into();
        let writer = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let (tx, rx) = mpsc::unbounded_channel();
                runtime.spawn(run_writer(dir.clone(), rx, debounce));
                Some(tx)
            },
            Err(_) => None,
        };
        Self {
            dir,
            records: Mutex::new(HashMap::new()),
            writer,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn geometry_path(&self, id: WindowId) -> PathBuf {
        geometry_path(&self.dir, id)
    }

    fn prefs_path(&self, id: WindowId) -> PathBuf {
        self.dir.join(format!("{}.prefs.json", id))
    }

    /// Latest known geometry, from the cache or else from disk.
    /// Missing or malformed files yield `None`.
    pub fn load(&self, id: WindowId) -> Option<GeometryRecord> {
        if let Some(cached) = self.records.lock().get(&id) {
            return *cached;
        }
        let record = read_json(&self.geometry_path(id));
        *self.records.lock().entry(id).or_insert(record)
    }

    /// Write a record straight to disk.
    pub fn save(&self, id: WindowId, record: &GeometryRecord) -> ShellResult<()> {
        write_json(&self.geometry_path(id), record)?;
        self.records.lock().insert(id, Some(*record));
        Ok(())
    }

    pub fn load_prefs(&self, id: WindowId) -> WindowPrefs {
        read_json(&self.prefs_path(id)).unwrap_or_default()
    }

    pub fn save_prefs(&self, id: WindowId, prefs: &WindowPrefs) -> ShellResult<()> {
        write_json(&self.prefs_path(id), prefs)
    }

    /// Snapshot a live window into its record.
    ///
    /// While maximized or fullscreen only the flags change, so the restored
    /// (normal) bounds survive for the next launch. A minimized window keeps
    /// its previous record untouched: Windows reports the iconic rectangle
    /// (-32000, -32000) for it. Returns the record now current, if any.
    pub fn capture<W: NativeWindow>(&self, id: WindowId, window: &W) -> ShellResult<Option<GeometryRecord>> {
        let previous = self.load(id);
        if window.is_minimized()? {
            return Ok(previous);
        }

        let is_maximized = window.is_maximized()?;
        let is_full_screen = window.is_fullscreen()?;
        let record = match previous {
            Some(prev) if is_maximized || is_full_screen => GeometryRecord {
                is_maximized,
                is_full_screen,
                ..prev
            },
            _ => {
                let bounds = window.content_bounds()?;
                GeometryRecord {
                    x: bounds.x,
                    y: bounds.y,
                    width: bounds.width,
                    height: bounds.height,
                    is_maximized,
                    is_full_screen,
                }
            },
        };

        if previous != Some(record) {
            self.records.lock().insert(id, Some(record));
            self.persist(id, record)?;
        }
        Ok(Some(record))
    }

    fn persist(&self, id: WindowId, record: GeometryRecord) -> ShellResult<()> {
        if let Some(writer) = &self.writer {
            if writer.send(WriteRequest::Save(id, record)).is_ok() {
                return Ok(());
            }
            log::warn!("[geometry] Writer stopped, saving {} inline", id);
        }
        write_json(&self.geometry_path(id), &record)
    }

    /// Write every pending capture now.
    pub async fn flush(&self) {
        let Some(writer) = &self.writer else {
            return;
        };
        let (done, flushed) = oneshot::channel();
        if writer.send(WriteRequest::Flush(done)).is_ok() {
            let _ = flushed.await;
        }
    }
}

/// Background writer. Every new capture restarts the quiet period; a flush
/// request or the store going away writes whatever is pending.
async fn run_writer(dir: PathBuf, mut rx: mpsc::UnboundedReceiver<WriteRequest>, debounce: Duration) {
    let mut pending: HashMap<WindowId, GeometryRecord> = HashMap::new();
    loop {
        let request = if pending.is_empty() {
            rx.recv().await
        } else {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(request) => request,
                Err(_) => {
                    write_pending(&dir, &mut pending).await;
                    continue;
                },
            }
        };

        match request {
            Some(WriteRequest::Save(id, record)) => {
                pending.insert(id, record);
            },
            Some(WriteRequest::Flush(done)) => {
                write_pending(&dir, &mut pending).await;
                let _ = done.send(());
            },
            None => {
                write_pending(&dir, &mut pending).await;
                break;
            },
        }
    }
}

async fn write_pending(dir: &Path, pending: &mut HashMap<WindowId, GeometryRecord>) {
    for (id, record) in pending.drain() {
        let path = geometry_path(dir, id);
        if let Err(e) = write_json_async(&path, &record).await {
            log::warn!("[geometry] Failed to write {:?}: {}", path, e);
        }
    }
}

fn geometry_path(dir: &Path, id: WindowId) -> PathBuf {
    dir.join(format!("{}.json", id))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            log::warn!("[geometry] Failed to read {:?}: {}", path, e);
            return None;
        },
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("[geometry] Ignoring malformed {:?}: {}", path, e);
            None
        },
    }
}

/// Written to a temp file, then renamed into place.
fn write_json<T: Serialize>(path: &Path, value: &T) -> ShellResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

async fn write_json_async<T: Serialize>(path: &Path, value: &T) -> ShellResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(value)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

//! Unified logging for the shell.
//!
//! Backend `log` records and renderer pages (placeholder, error surface,
//! content) share one daily log file with size-based rotation and cleanup.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tauri::{command, AppHandle, Manager};

/// Maximum log file size before rotation (5MB)
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum number of log files to keep
const MAX_LOG_FILES: usize = 5;

const LOG_PREFIX: &str = "chatshell";

/// Get the path for the current log file (one per day)
fn current_log_path(log_dir: &Path) -> PathBuf {
    let date = Local::now().format("%Y-%m-%d");
    log_dir.join(format!("{}_{}.log", LOG_PREFIX, date))
}

/// Clean up old log files, keeping only the most recent `keep`
fn cleanup_old_logs(log_dir: &Path, keep: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "log")
                    .unwrap_or(false)
            })
            .collect();

        // Sort by modification time (newest first)
        log_files.sort_by(|a, b| {
            let a_time = a.metadata().and_then(|m| m.modified()).ok();
            let b_time = b.metadata().and_then(|m| m.modified()).ok();
            b_time.cmp(&a_time)
        });

        for file in log_files.into_iter().skip(keep) {
            let _ = fs::remove_file(file.path());
        }
    }
}

// ============================================================================
// Rotating writer
// ============================================================================

/// `env_logger` target that appends to today's file and rotates it once it
/// grows past `max_size`.
pub struct RotatingLogWriter {
    dir: PathBuf,
    path: PathBuf,
    file: File,
    max_size: u64,
    keep: usize,
    echo: bool,
}

impl RotatingLogWriter {
    pub fn open(dir: &Path) -> io::Result<Self> {
        Self::with_limits(dir, MAX_LOG_SIZE, MAX_LOG_FILES)
    }

    pub fn with_limits(dir: &Path, max_size: u64, keep: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = current_log_path(dir);
        let file = open_append(&path)?;
        cleanup_old_logs(dir, keep);
        Ok(Self {
            dir: dir.to_path_buf(),
            path,
            file,
            max_size,
            keep,
            echo: cfg!(debug_assertions),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotate_if_needed(&mut self) -> io::Result<()> {
        let today = current_log_path(&self.dir);
        if today != self.path {
            self.path = today;
            self.file = open_append(&self.path)?;
            cleanup_old_logs(&self.dir, self.keep);
            return Ok(());
        }

        if self.file.metadata()?.len() > self.max_size {
            let timestamp = Local::now().format("%Y-%m-%d_%H%M%S%.3f");
            let rotated = self.dir.join(format!("{}_{}.log", LOG_PREFIX, timestamp));
            fs::rename(&self.path, rotated)?;
            self.file = open_append(&self.path)?;
            cleanup_old_logs(&self.dir, self.keep);
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RotatingLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Err(e) = self.rotate_if_needed() {
            eprintln!("[logging] Rotation failed: {}", e);
        }
        if self.echo {
            let _ = io::stderr().write_all(buf);
        }
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Install the global logger. The filter comes from `RUST_LOG`, default `info`.
pub fn init_logging(log_dir: &Path) -> Result<(), String> {
    let writer = RotatingLogWriter::open(log_dir)
        .map_err(|e| format!("Failed to open log file in {:?}: {}", log_dir, e))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(writer)))
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    log::info!("[logging] Logging initialized in {:?}", log_dir);
    Ok(())
}

fn parse_level(level: &str) -> log::Level {
    match level.to_lowercase().as_str() {
        "debug" => log::Level::Debug,
        "warn" | "warning" => log::Level::Warn,
        "error" => log::Level::Error,
        "trace" => log::Level::Trace,
        _ => log::Level::Info,
    }
}

// ============================================================================
// Tauri Commands
// ============================================================================

/// Write a log message from a renderer page
#[command]
pub fn write_log(level: String, source: String, message: String) {
    log::log!(target: source.as_str(), parse_level(&level), "{}", message);
}

/// Write multiple log messages from a renderer page (batch)
#[command]
pub fn write_logs(logs: Vec<(String, String, String)>) {
    for (level, source, message) in logs {
        write_log(level, source, message);
    }
}

/// Get the log directory path
#[command]
pub fn get_log_dir(app: AppHandle) -> Result<String, String> {
    let log_dir = app
        .path()
        .app_log_dir()
        .map_err(|e| format!("Failed to get log directory: {}", e))?;

    Ok(log_dir.to_string_lossy().to_string())
}

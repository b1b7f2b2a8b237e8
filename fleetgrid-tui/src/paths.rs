//! Where the console keeps its layout database and session logs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use directories::ProjectDirs;

/// Archived session logs kept next to the current one.
const KEEP_SESSIONS: usize = 25;

const CURRENT_LOG: &str = "latest.log";
const SESSION_PREFIX: &str = "session-";

/// Per-user directories, resolved once at startup.
///
/// Layouts go to the data directory (`~/.local/share/fleetgrid` on Linux),
/// logs to the cache directory.
#[derive(Debug, Clone)]
pub struct AppDirs {
    data: PathBuf,
    cache: PathBuf,
}

impl AppDirs {
    pub fn locate() -> Option<Self> {
        let dirs = ProjectDirs::from("dev", "fleetgrid", "fleetgrid")?;
        Some(Self {
            data: dirs.data_dir().to_path_buf(),
            cache: dirs.cache_dir().to_path_buf(),
        })
    }

    pub fn layout_db(&self) -> PathBuf {
        self.data.join("layout.db")
    }

    pub fn log_file(&self) -> PathBuf {
        self.cache.join(CURRENT_LOG)
    }

    /// Archives the previous session's log and prunes old archives. Call
    /// before creating the new log file.
    pub fn rotate_logs(&self) -> io::Result<()> {
        rotate_in(&self.cache, Local::now(), KEEP_SESSIONS)
    }
}

fn rotate_in(dir: &Path, now: DateTime<Local>, keep: usize) -> io::Result<()> {
    let current = dir.join(CURRENT_LOG);
    if current.exists() {
        let archived = format!("{}{}.log", SESSION_PREFIX, now.format("%Y%m%d-%H%M%S"));
        fs::rename(&current, dir.join(archived))?;
    }

    // Archive names embed the timestamp, so name order is age order.
    let mut sessions: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(SESSION_PREFIX) && name.ends_with(".log"))
        })
        .collect();
    sessions.sort();

    let excess = sessions.len().saturating_sub(keep);
    for path in &sessions[..excess] {
        fs::remove_file(path)?;
    }
    Ok(())
}

// backupper/src/utils/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

/// Validates a path for writing backups into. Creates the directory when
/// absent; a path that turns out to be a plain file falls back to its parent
/// directory. Returns `None` when the path is unusable.
pub fn check_dir(dirpath: &Path) -> Option<PathBuf> {
    if dirpath.as_os_str().is_empty() {
        return None;
    }
    if !dirpath.exists() && fs::create_dir_all(dirpath).is_err() {
        return None;
    }
    if !dirpath.is_dir() {
        return dirpath.parent().map(Path::to_path_buf);
    }
    Some(dirpath.to_path_buf())
}

/// Rounds to two decimal places, for sizes and durations in the report.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

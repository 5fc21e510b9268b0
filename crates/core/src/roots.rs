//! Where a search can start.

use std::path::{Path, PathBuf};

/// A bare drive letter (`"E"` or `"E:"`) becomes `E:\` on Windows; anything
/// else is used as a path.
pub fn resolve_root(root: &str) -> PathBuf {
    let trimmed = root.trim();
    if cfg!(windows) {
        let letter = trimmed.trim_end_matches(':');
        if letter.len() == 1 && letter.chars().all(|c| c.is_ascii_alphabetic()) {
            return PathBuf::from(format!("{}:\\", letter.to_ascii_uppercase()));
        }
    }
    PathBuf::from(trimmed)
}

/// Existing drive letters on Windows; elsewhere `/` plus mounted volumes.
pub fn list_scan_roots() -> Vec<String> {
    if cfg!(windows) {
        return ('A'..='Z')
            .filter(|d| Path::new(&format!("{d}:\\")).exists())
            .map(|d| format!("{d}:"))
            .collect();
    }

    let mut roots = vec!["/".to_string()];
    for parent in ["/mnt", "/media", "/Volumes"] {
        let Ok(entries) = std::fs::read_dir(parent) else {
            continue;
        };
        let mut mounts: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.path().to_string_lossy().into_owned())
            .collect();
        mounts.sort();
        roots.extend(mounts);
    }
    roots
}

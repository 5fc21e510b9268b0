//! Bounded directory traversal producing candidate files for one extension.

use crate::models::CandidateFile;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct ScanLimits {
    /// Subdirectory levels below the root that may be listed.
    pub max_depth: usize,
    /// Exclusive upper bound on file size in bytes.
    pub max_file_size: u64,
}

/// Collects regular files under `root` whose name ends with `.{extension}`
/// (case-insensitive).
///
/// Hidden directories are not entered and directory symlinks are not
/// followed. Directories that cannot be listed are skipped silently.
pub fn scan(root: &Path, extension: &str, limits: &ScanLimits) -> Vec<CandidateFile> {
    let suffix = format!(".{}", normalize_extension(extension));
    let mut eligible = Vec::new();

    // Entries directly in the root sit at walkdir depth 1.
    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(limits.max_depth + 1)
        .into_iter()
        .filter_entry(should_descend);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        let meta = if entry.file_type().is_symlink() {
            // Symlinked files count; symlinked directories are never walked.
            match fs::metadata(entry.path()) {
                Ok(m) => m,
                Err(_) => continue,
            }
        } else {
            match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            }
        };
        if !meta.is_file() || !matches_extension(&entry, &suffix) {
            continue;
        }
        if meta.len() >= limits.max_file_size {
            debug!(path = %entry.path().display(), size = meta.len(), "over size cap");
            continue;
        }

        eligible.push(CandidateFile {
            path: entry.path().to_path_buf(),
            size: meta.len(),
            modified: meta.modified().unwrap_or(std::time::UNIX_EPOCH),
        });
    }

    eligible
}

pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

fn matches_extension(entry: &DirEntry, suffix: &str) -> bool {
    entry
        .file_name()
        .to_string_lossy()
        .to_lowercase()
        .ends_with(suffix)
}

fn should_descend(entry: &DirEntry) -> bool {
    // The root is always walked, even if its own name looks hidden.
    entry.depth() == 0 || !(entry.file_type().is_dir() && is_hidden(entry))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

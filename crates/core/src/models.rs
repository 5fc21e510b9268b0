use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A file that passed the extension, size and depth filters.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl CandidateFile {
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Seconds since the Unix epoch; zero when the platform reports an earlier time.
    pub fn modified_secs(&self) -> i64 {
        self.modified
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub path: String,
    pub filename: String,
    pub size: u64,
    /// Unix seconds.
    pub modified: i64,
    pub relevance_score: f32,
    pub preview: String,
}

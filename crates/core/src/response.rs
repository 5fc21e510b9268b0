//! The caller-facing envelope around a search.

use crate::models::SearchResult;
use crate::roots::resolve_root;
use crate::search::{SearchEngine, SearchQuery};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub path: String,
    pub filename: String,
    pub size: u64,
    /// RFC 3339, UTC.
    pub modified: String,
    pub relevance_score: f64,
    pub preview: String,
}

impl From<SearchResult> for ResultEntry {
    fn from(r: SearchResult) -> Self {
        let modified = DateTime::<Utc>::from_timestamp(r.modified, 0)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| r.modified.to_string());
        Self {
            path: r.path,
            filename: r.filename,
            size: r.size,
            modified,
            relevance_score: round3(r.relevance_score),
            preview: r.preview,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SearchResponse {
    Success {
        found: usize,
        results: Vec<ResultEntry>,
    },
    Error {
        message: String,
        results: Vec<ResultEntry>,
    },
}

impl SearchResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[ResultEntry] {
        match self {
            Self::Success { results, .. } | Self::Error { results, .. } => results,
        }
    }
}

/// Searches `root` (a path, or a drive letter on Windows) for files ending in
/// `extension` whose content matches `hint`.
///
/// Only results strictly above the surfacing threshold are returned. The
/// threshold is pushed into the query so it applies before truncation.
pub async fn search_by_content(
    engine: &SearchEngine,
    root: &str,
    extension: &str,
    hint: &str,
    max_results: usize,
) -> SearchResponse {
    let surface = engine.config().surface_threshold;
    let query = SearchQuery {
        root: resolve_root(root),
        extension: extension.to_string(),
        hint: hint.to_string(),
        max_results,
        min_score: Some(surface),
    };
    match engine.search(&query).await {
        Ok(outcome) => {
            let results: Vec<ResultEntry> = outcome
                .results
                .into_iter()
                .filter(|r| r.relevance_score > surface)
                .map(ResultEntry::from)
                .collect();
            SearchResponse::Success {
                found: results.len(),
                results,
            }
        }
        Err(err) => {
            warn!(error = %err, "search failed");
            SearchResponse::error(err.to_string())
        }
    }
}

fn round3(score: f32) -> f64 {
    (f64::from(score) * 1000.0).round() / 1000.0
}

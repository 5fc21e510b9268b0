//! Bounded-concurrency search: scan, then extract and score candidates in
//! batches, each task under its own time budget.

use crate::config::SearchConfig;
use crate::extractor::{self, truncate_chars};
use crate::models::{CandidateFile, SearchResult};
use crate::scanner::{self, ScanLimits};
use crate::scorer::{self, RelevanceScorer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search root does not exist: {0}")]
    RootNotFound(PathBuf),
    #[error("search root is not a directory: {0}")]
    RootNotDirectory(PathBuf),
    #[error("extension must not be empty")]
    EmptyExtension,
    #[error("directory scan aborted: {0}")]
    Scan(String),
}

/// Why a single candidate produced no result.
#[derive(Debug, Error)]
pub enum TaskFault {
    #[error("timed out")]
    Timeout,
    #[error("unreadable: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("task failed: {0}")]
    Crashed(String),
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub root: PathBuf,
    pub extension: String,
    pub hint: String,
    pub max_results: usize,
    /// Raises the retain threshold for this query.
    pub min_score: Option<f32>,
}

#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub candidates: usize,
    pub processed: usize,
    pub errors: usize,
    pub timeouts: usize,
}

pub struct SearchEngine {
    config: Arc<SearchConfig>,
    scorer: Arc<RelevanceScorer>,
}

impl SearchEngine {
    pub fn new(config: SearchConfig, scorer: RelevanceScorer) -> Self {
        Self {
            config: Arc::new(config),
            scorer: Arc::new(scorer),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchOutcome, SearchError> {
        check_root(&query.root)?;
        let extension = scanner::normalize_extension(&query.extension);
        if extension.is_empty() {
            return Err(SearchError::EmptyExtension);
        }

        let limits = ScanLimits {
            max_depth: self.config.max_depth,
            max_file_size: self.config.max_file_size,
        };
        let root = query.root.clone();
        let candidates =
            tokio::task::spawn_blocking(move || scanner::scan(&root, &extension, &limits))
                .await
                .map_err(|e| SearchError::Scan(e.to_string()))?;
        info!(root = %query.root.display(), candidates = candidates.len(), "scan complete");

        let mut outcome = SearchOutcome {
            candidates: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            return Ok(outcome);
        }

        let threshold = query
            .min_score
            .map_or(self.config.retain_threshold, |m| {
                m.max(self.config.retain_threshold)
            });
        let hint: Arc<str> = Arc::from(query.hint.as_str());
        let keywords: Arc<[String]> = scorer::keywords(&query.hint).into();
        let workers = Arc::new(Semaphore::new(self.config.workers));

        for batch in candidates.chunks(self.config.batch_size) {
            let mut tasks = JoinSet::new();
            for candidate in batch {
                let ctx = TaskContext {
                    config: Arc::clone(&self.config),
                    scorer: Arc::clone(&self.scorer),
                    hint: Arc::clone(&hint),
                    keywords: Arc::clone(&keywords),
                };
                let workers = Arc::clone(&workers);
                let candidate = candidate.clone();
                tasks.spawn(async move {
                    let permit = workers
                        .acquire_owned()
                        .await
                        .map_err(|e| TaskFault::Crashed(e.to_string()))?;
                    let path = candidate.path.clone();
                    let budget = ctx.config.task_timeout();
                    // The work owns the permit, so a worker slot stays taken until
                    // the extraction or inference really ends, even after we stop
                    // waiting for it.
                    let work = tokio::spawn(async move {
                        let _permit = permit;
                        ctx.process(candidate).await
                    });
                    match tokio::time::timeout(budget, work).await {
                        Ok(Ok(result)) => result,
                        Ok(Err(join_err)) => Err(TaskFault::Crashed(join_err.to_string())),
                        Err(_) => {
                            warn!(path = %path.display(), "file processing timed out");
                            Err(TaskFault::Timeout)
                        }
                    }
                });
            }

            let mut kept = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(result)) => {
                        outcome.processed += 1;
                        if result.relevance_score > threshold {
                            kept.push(result);
                        }
                    }
                    Ok(Err(TaskFault::Timeout)) => {
                        outcome.errors += 1;
                        outcome.timeouts += 1;
                    }
                    Ok(Err(fault)) => {
                        debug!(error = %fault, "candidate dropped");
                        outcome.errors += 1;
                    }
                    Err(join_err) => {
                        debug!(error = %join_err, "candidate task panicked");
                        outcome.errors += 1;
                    }
                }
            }
            outcome.results.extend(kept);
        }

        rank(&mut outcome.results, query.max_results);
        info!(
            candidates = outcome.candidates,
            processed = outcome.processed,
            errors = outcome.errors,
            timeouts = outcome.timeouts,
            returned = outcome.results.len(),
            "search complete"
        );
        Ok(outcome)
    }
}

/// Sorts by descending relevance (path breaks ties) and keeps the top `max`.
pub fn rank(results: &mut Vec<SearchResult>, max: usize) {
    results.sort_by(|a, b| {
        b.relevance_score
            .total_cmp(&a.relevance_score)
            .then_with(|| a.path.cmp(&b.path))
    });
    results.truncate(max);
}

fn check_root(root: &Path) -> Result<(), SearchError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SearchError::RootNotDirectory(root.to_path_buf())),
        Err(_) => Err(SearchError::RootNotFound(root.to_path_buf())),
    }
}

struct TaskContext {
    config: Arc<SearchConfig>,
    scorer: Arc<RelevanceScorer>,
    hint: Arc<str>,
    keywords: Arc<[String]>,
}

impl TaskContext {
    async fn process(self, candidate: CandidateFile) -> Result<SearchResult, TaskFault> {
        let filename = candidate.filename();
        let max_chars = self.config.max_extract_chars;
        let path = candidate.path.clone();
        // After a timeout this keeps running detached; its result is discarded.
        let text = tokio::task::spawn_blocking(move || -> Result<String, std::io::Error> {
            std::fs::File::open(&path)?;
            Ok(extractor::extract_text(&path, max_chars))
        })
        .await
        .map_err(|e| TaskFault::Crashed(e.to_string()))??;

        let relevance = self
            .scorer
            .components(&self.hint, &self.keywords, &text, &filename)
            .await
            .relevance();

        let preview = if text.is_empty() {
            format!("File: {filename}")
        } else {
            truncate_chars(&text, self.config.max_preview_chars).to_string()
        };

        Ok(SearchResult {
            path: candidate.path.to_string_lossy().into_owned(),
            filename,
            size: candidate.size,
            modified: candidate.modified_secs(),
            relevance_score: relevance,
            preview,
        })
    }
}

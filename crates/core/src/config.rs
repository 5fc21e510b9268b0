use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub semantic: SemanticConfig,
}

/// Bounds for a single query. None of these may be zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Files at or above this many bytes are never candidates.
    pub max_file_size: u64,
    pub max_extract_chars: usize,
    pub max_preview_chars: usize,
    /// Subdirectory levels descended below the root.
    pub max_depth: usize,
    pub batch_size: usize,
    pub workers: usize,
    pub task_timeout_ms: u64,
    /// Minimum relevance a scored file needs to be kept by the orchestrator.
    pub retain_threshold: f32,
    /// Minimum relevance for a result to leave the response boundary.
    pub surface_threshold: f32,
    pub default_max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024,
            max_extract_chars: 2000,
            max_preview_chars: 500,
            max_depth: 6,
            batch_size: 20,
            workers: 4,
            task_timeout_ms: 20_000,
            retain_threshold: 0.3,
            surface_threshold: 0.4,
            default_max_results: 10,
        }
    }
}

impl SearchConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [
            ("max_file_size", self.max_file_size == 0),
            ("max_extract_chars", self.max_extract_chars == 0),
            ("max_preview_chars", self.max_preview_chars == 0),
            ("batch_size", self.batch_size == 0),
            ("workers", self.workers == 0),
            ("task_timeout_ms", self.task_timeout_ms == 0),
            ("default_max_results", self.default_max_results == 0),
        ];
        if let Some((name, _)) = bounds.iter().find(|(_, zero)| *zero) {
            return Err(ConfigError::ZeroBound(name));
        }
        for (name, value) in [
            ("retain_threshold", self.retain_threshold),
            ("surface_threshold", self.surface_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdRange(name, value));
            }
        }
        if self.retain_threshold > self.surface_threshold {
            return Err(ConfigError::ThresholdOrder {
                retain: self.retain_threshold,
                surface: self.surface_threshold,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// `local`, `openai` or `none`.
    pub provider: String,
    pub model: String,
    /// Leading characters of extracted text that get embedded.
    pub text_chars: usize,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            text_chars: 1000,
            base_url: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroBound(&'static str),
    #[error("{0} must be within [0, 1], got {1}")]
    ThresholdRange(&'static str, f32),
    #[error("retain_threshold ({retain}) must not exceed surface_threshold ({surface})")]
    ThresholdOrder { retain: f32, surface: f32 },
}

/// Layers an optional TOML file and `FINDER__*` environment variables over
/// the defaults, then validates the result.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("FINDER")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    let cfg: AppConfig = settings.build()?.try_deserialize()?;
    cfg.search.validate()?;
    Ok(cfg)
}

//! Lexical, filename and semantic relevance, fused into one score in [0, 1].

use crate::extractor::truncate_chars;
use once_cell::sync::Lazy;
use providers::EmbeddingProvider;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static regex"));

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "about",
];

pub const SEMANTIC_WEIGHTS: Weights = Weights {
    keyword: 0.35,
    semantic: 0.50,
    filename: 0.15,
};
pub const LEXICAL_WEIGHTS: Weights = Weights {
    keyword: 0.80,
    semantic: 0.0,
    filename: 0.20,
};
/// Applied to the filename score when a file yielded no text at all.
pub const FILENAME_ONLY_FACTOR: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub keyword: f32,
    pub semantic: f32,
    pub filename: f32,
}

/// Lowercased hint words longer than two characters, minus stopwords,
/// deduplicated in first-seen order.
pub fn keywords(hint: &str) -> Vec<String> {
    let lowered = hint.to_lowercase();
    let mut seen = HashSet::new();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 2 && !STOPWORDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

/// Fraction of `keywords` that occur as substrings of lowercased `text`.
pub fn keyword_score(keywords: &[String], text: &str) -> f32 {
    if keywords.is_empty() || text.is_empty() {
        return 0.0;
    }
    let haystack = text.to_lowercase();
    let matches = keywords
        .iter()
        .filter(|k| haystack.contains(k.as_str()))
        .count();
    matches as f32 / keywords.len() as f32
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponents {
    pub keyword: f32,
    pub filename: f32,
    /// `None` when no embedding model is loaded or the text was empty.
    pub semantic: Option<f32>,
    pub text_empty: bool,
}

impl ScoreComponents {
    pub fn relevance(&self) -> f32 {
        if self.text_empty {
            return self.filename * FILENAME_ONLY_FACTOR;
        }
        let fused = match self.semantic {
            Some(semantic) => {
                let w = SEMANTIC_WEIGHTS;
                w.keyword * self.keyword + w.semantic * semantic + w.filename * self.filename
            }
            None => {
                let w = LEXICAL_WEIGHTS;
                w.keyword * self.keyword + w.filename * self.filename
            }
        };
        fused.clamp(0.0, 1.0)
    }
}

/// Scores extracted text against a hint. Holds the embedding model, if any,
/// for the whole session; without one it scores lexically.
#[derive(Clone)]
pub struct RelevanceScorer {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    semantic_chars: usize,
}

impl RelevanceScorer {
    pub fn lexical() -> Self {
        Self {
            embedder: None,
            semantic_chars: 1000,
        }
    }

    pub fn new(embedder: Option<Arc<dyn EmbeddingProvider>>, semantic_chars: usize) -> Self {
        Self {
            embedder,
            semantic_chars,
        }
    }

    pub fn has_semantic(&self) -> bool {
        self.embedder.is_some()
    }

    /// Cosine similarity of hint and leading text, floored at zero.
    /// Returns 0 for blank text or any embedding failure.
    pub async fn semantic_score(&self, hint: &str, text: &str) -> f32 {
        let Some(embedder) = &self.embedder else {
            return 0.0;
        };
        if text.trim().is_empty() {
            return 0.0;
        }
        let inputs = [
            hint.to_string(),
            truncate_chars(text, self.semantic_chars).to_string(),
        ];
        match embedder.embed(&inputs).await {
            Ok(resp) if resp.vectors.len() == 2 => {
                cosine_similarity(&resp.vectors[0], &resp.vectors[1]).max(0.0)
            }
            Ok(resp) => {
                debug!(vectors = resp.vectors.len(), "unexpected embedding count");
                0.0
            }
            Err(err) => {
                debug!(error = %err, "embedding failed");
                0.0
            }
        }
    }

    pub async fn components(
        &self,
        hint: &str,
        keywords: &[String],
        text: &str,
        filename: &str,
    ) -> ScoreComponents {
        let filename_score = keyword_score(keywords, filename);
        if text.is_empty() {
            return ScoreComponents {
                keyword: 0.0,
                filename: filename_score,
                semantic: None,
                text_empty: true,
            };
        }
        let semantic = if self.has_semantic() {
            Some(self.semantic_score(hint, text).await)
        } else {
            None
        };
        ScoreComponents {
            keyword: keyword_score(keywords, text),
            filename: filename_score,
            semantic,
            text_empty: false,
        }
    }

    pub async fn score(&self, hint: &str, text: &str, filename: &str) -> f32 {
        let keywords = keywords(hint);
        self.components(hint, &keywords, text, filename)
            .await
            .relevance()
    }
}

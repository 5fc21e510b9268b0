//! Content search over a filesystem subtree: scanning, extraction, scoring
//! and bounded-concurrency orchestration. Nothing persists between queries.

pub mod config;
pub mod extractor;
pub mod models;
pub mod response;
pub mod roots;
pub mod scanner;
pub mod scorer;
pub mod search;
pub mod semantic;

pub use response::{search_by_content, SearchResponse};
pub use search::{SearchEngine, SearchQuery};

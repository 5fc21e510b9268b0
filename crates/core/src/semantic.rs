//! Builds the session's embedding model from configuration.

use crate::config::SemanticConfig;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::{EmbeddingProvider, ProviderError, ProviderRegistry};
use std::sync::Arc;
use tracing::{info, warn};

pub fn build_registry(config: &SemanticConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new();

    let key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());
    let base = config
        .base_url
        .clone()
        .or_else(|| std::env::var("OPENAI_BASE_URL").ok());
    if let (Some(api_key), Some(base_url)) = (key, base) {
        match OpenAiProvider::new(OpenAiConfig {
            api_key,
            base_url,
            embedding_model: config.model.clone(),
        }) {
            Ok(provider) => reg = reg.with_embedding("openai", Arc::new(provider)),
            Err(err) => warn!(error = %err, "openai embeddings unavailable"),
        }
    }

    if config.provider == "local" {
        match load_local() {
            Ok(provider) => reg = reg.with_embedding("local", provider),
            Err(err) => warn!(error = %err, "local embedding model unavailable"),
        }
    }

    reg.set_preferred_embedding(&config.provider)
}

/// Loads the configured model once. `None` means the scorer runs lexically
/// for the rest of the session.
pub fn load_model(config: &SemanticConfig) -> Option<Arc<dyn EmbeddingProvider>> {
    if config.provider == "none" {
        info!("semantic scoring disabled");
        return None;
    }
    match build_registry(config).embedding(None) {
        Ok(provider) => {
            info!(provider = %config.provider, "semantic scoring enabled");
            Some(provider)
        }
        Err(err) => {
            warn!(error = %err, "falling back to keyword scoring");
            None
        }
    }
}

#[cfg(feature = "local-embeddings")]
fn load_local() -> Result<Arc<dyn EmbeddingProvider>, ProviderError> {
    Ok(Arc::new(providers::local::LocalProvider::load()?))
}

#[cfg(not(feature = "local-embeddings"))]
fn load_local() -> Result<Arc<dyn EmbeddingProvider>, ProviderError> {
    Err(ProviderError::Unavailable(
        "built without local-embeddings".into(),
    ))
}

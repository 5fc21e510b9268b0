//! In-process sentence embeddings (all-MiniLM-L6-v2 via ONNX Runtime).

use crate::{EmbedResponse, EmbeddingProvider, ProviderError};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Local MiniLM model. Inference is serialized behind a mutex because the
/// underlying session is not guaranteed safe for concurrent runs.
#[derive(Clone)]
pub struct LocalProvider {
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalProvider {
    /// Loads (and on first use downloads) the model. Slow; call once per process.
    pub fn load() -> Result<Self, ProviderError> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
        )
        .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        info!("loaded local embedding model all-MiniLM-L6-v2");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for LocalProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || {
            let guard = model
                .lock()
                .map_err(|_| ProviderError::Unavailable("embedding model lock poisoned".into()))?;
            guard
                .embed(texts, None)
                .map_err(|e| ProviderError::RequestFailed(e.to_string()))
        })
        .await
        .map_err(|e| ProviderError::RequestFailed(e.to_string()))??;
        Ok(EmbedResponse { vectors })
    }
}

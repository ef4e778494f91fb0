//! Embedding function used for both chunks and queries.

use std::sync::Arc;

use async_trait::async_trait;
use rig::client::EmbeddingsClient;
use rig::embeddings::EmbeddingModel;
use secrecy::ExposeSecret;

use crate::config::EmbeddingConfig;
use crate::error::KnowledgeError;
use crate::knowledge::onnx::OnnxEmbedder;

/// Turns text into fixed-length vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KnowledgeError::EmbeddingFailed {
                reason: "embedder returned no vector".to_string(),
            })
    }

    /// Model identifier, used in logs.
    fn model_name(&self) -> &str;
}

/// Build the configured embedding backend.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, KnowledgeError> {
    match config {
        EmbeddingConfig::Local { model_dir } => {
            Ok(Arc::new(OnnxEmbedder::from_directory(model_dir)?))
        }
        EmbeddingConfig::OpenAi { api_key, model } => {
            use rig::providers::openai;

            let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
                openai::Client::new(api_key.expose_secret()).map_err(|e| {
                    KnowledgeError::EmbeddingFailed {
                        reason: format!("Failed to create OpenAI client: {e}"),
                    }
                })?;
            tracing::info!("Using OpenAI embeddings (model: {})", model);
            Ok(Arc::new(RigEmbedder::new(client.embedding_model(model), model)))
        }
    }
}

/// Wraps a rig embedding model, batching by the model's document limit.
pub struct RigEmbedder<M> {
    model: M,
    model_name: String,
}

impl<M: EmbeddingModel> RigEmbedder<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> Embedder for RigEmbedder<M>
where
    M: EmbeddingModel + 'static,
{
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(M::MAX_DOCUMENTS.max(1)) {
            let embeddings = self
                .model
                .embed_texts(batch.to_vec())
                .await
                .map_err(|e| KnowledgeError::EmbeddingFailed {
                    reason: e.to_string(),
                })?;
            if embeddings.len() != batch.len() {
                return Err(KnowledgeError::EmbeddingMismatch {
                    chunks: batch.len(),
                    embeddings: embeddings.len(),
                });
            }
            vectors.extend(
                embeddings
                    .into_iter()
                    .map(|e| e.vec.into_iter().map(|x| x as f32).collect::<Vec<f32>>()),
            );
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn embed_one_uses_batch_path() {
        let v = FixedEmbedder.embed_one("abcd").await.unwrap();
        assert_eq!(v, vec![4.0, 1.0]);
    }

    #[test]
    fn openai_backend_constructs_without_network() {
        let config = EmbeddingConfig::OpenAi {
            api_key: secrecy::SecretString::from("sk-test"),
            model: "text-embedding-3-small".to_string(),
        };
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }

    #[test]
    fn local_backend_requires_model_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmbeddingConfig::Local {
            model_dir: dir.path().to_path_buf(),
        };
        let err = create_embedder(&config).err().unwrap();
        assert!(matches!(err, KnowledgeError::ModelUnavailable { .. }));
    }
}

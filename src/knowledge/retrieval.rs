//! Nearest-neighbour retrieval over the chunk store.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::KnowledgeConfig;
use crate::error::KnowledgeError;
use crate::knowledge::chunker::{Chunk, chunk_words};
use crate::knowledge::document::{Document, load_document};
use crate::knowledge::embeddings::Embedder;

/// A chunk paired with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Compute the L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Dot product divided by the product of the norms.
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Immutable chunk store plus one embedding per chunk.
///
/// Built once at startup and shared read-only across requests. An empty
/// knowledge base is the degraded mode: every query returns nothing.
pub struct KnowledgeBase {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    embedder: Option<Arc<dyn Embedder>>,
    top_k: usize,
    relevance_threshold: f32,
    fallback_k: usize,
}

impl KnowledgeBase {
    /// A knowledge base with no chunks.
    pub fn empty(config: &KnowledgeConfig) -> Self {
        Self {
            chunks: Vec::new(),
            embeddings: Vec::new(),
            embedder: None,
            top_k: config.top_k,
            relevance_threshold: config.relevance_threshold,
            fallback_k: config.fallback_k,
        }
    }

    /// Chunk `document` and embed every chunk, in chunk order.
    pub async fn build(
        document: &Document,
        embedder: Arc<dyn Embedder>,
        config: &KnowledgeConfig,
    ) -> Result<Self, KnowledgeError> {
        let chunks = chunk_words(&document.text, config.chunk_size, config.chunk_overlap);
        if chunks.is_empty() {
            return Err(KnowledgeError::EmptyDocument(
                document.source.display().to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(KnowledgeError::EmbeddingMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        let dims = embeddings[0].len();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dims) {
            return Err(KnowledgeError::DimensionMismatch {
                expected: dims,
                actual: bad.len(),
            });
        }

        info!(
            chunks = chunks.len(),
            dims,
            model = embedder.model_name(),
            source = %document.source.display(),
            "Knowledge base built"
        );

        Ok(Self {
            chunks,
            embeddings,
            embedder: Some(embedder),
            top_k: config.top_k,
            relevance_threshold: config.relevance_threshold,
            fallback_k: config.fallback_k,
        })
    }

    /// Load the configured document and build the store, degrading to an
    /// empty knowledge base on any failure.
    pub async fn load(config: &KnowledgeConfig, embedder: Option<Arc<dyn Embedder>>) -> Self {
        let Some(embedder) = embedder else {
            warn!("No embedding backend configured; question answering is disabled");
            return Self::empty(config);
        };

        let document = match load_document(&config.document_path).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "Reference document unavailable; running without it");
                return Self::empty(config);
            }
        };

        match Self::build(&document, embedder, config).await {
            Ok(kb) => kb,
            Err(e) => {
                warn!(error = %e, "Failed to build knowledge base; running without it");
                Self::empty(config)
            }
        }
    }

    /// Whether any chunks are loaded.
    pub fn is_ready(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Rank chunks against an already-embedded query.
    ///
    /// Returns the `top_k` best chunks scoring strictly above the relevance
    /// threshold, best first. When none clear the threshold the best
    /// `fallback_k` are returned anyway, so a non-empty store always yields
    /// some context.
    pub fn rank(&self, query: &[f32]) -> Vec<RetrievedChunk> {
        if self.chunks.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, e)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(self.top_k);

        let relevant: Vec<(usize, f32)> = scored
            .iter()
            .copied()
            .filter(|(_, score)| *score > self.relevance_threshold)
            .collect();

        let selected = if relevant.is_empty() {
            debug!(
                threshold = self.relevance_threshold,
                "No chunk cleared the relevance threshold; using best matches"
            );
            scored.into_iter().take(self.fallback_k).collect()
        } else {
            relevant
        };

        selected
            .into_iter()
            .map(|(i, score)| RetrievedChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }

    /// Embed `query` and rank the store against it.
    pub async fn try_retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>, KnowledgeError> {
        let Some(embedder) = self.embedder.as_ref().filter(|_| self.is_ready()) else {
            return Ok(Vec::new());
        };
        let embedding = embedder.embed_one(query).await?;
        let expected = self.embeddings[0].len();
        if embedding.len() != expected {
            return Err(KnowledgeError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
        Ok(self.rank(&embedding))
    }

    /// Retrieve context for `query`. Failures count as "nothing relevant".
    pub async fn retrieve(&self, query: &str) -> Vec<RetrievedChunk> {
        match self.try_retrieve(query).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Retrieval failed; treating as no relevant chunks");
                Vec::new()
            }
        }
    }
}

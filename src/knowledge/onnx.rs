//! Local sentence-transformer embeddings through ONNX Runtime.
//!
//! Loads an all-MiniLM-L6-v2 style export from a directory holding
//! `model.onnx` and `tokenizer.json`. Token embeddings are mean-pooled over
//! the attention mask and L2-normalized, so no network access or API key is
//! needed to answer questions.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::Session;
use ort::value::TensorRef;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::error::KnowledgeError;
use crate::knowledge::embeddings::Embedder;

/// Longest token sequence fed to the model.
pub const MAX_SEQUENCE_TOKENS: usize = 256;

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

/// Embedder backed by a local ONNX sentence-transformer.
pub struct OnnxEmbedder {
    model: Arc<OnnxModel>,
    model_name: String,
}

impl std::fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("model_name", &self.model_name)
            .finish()
    }
}

fn unavailable(path: &Path, reason: impl std::fmt::Display) -> KnowledgeError {
    KnowledgeError::ModelUnavailable {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn failed(reason: impl std::fmt::Display) -> KnowledgeError {
    KnowledgeError::EmbeddingFailed {
        reason: reason.to_string(),
    }
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn from_directory(model_dir: &Path) -> Result<Self, KnowledgeError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        if !model_path.exists() {
            return Err(unavailable(&model_path, "ONNX model not found"));
        }
        if !tokenizer_path.exists() {
            return Err(unavailable(&tokenizer_path, "tokenizer not found"));
        }

        let session = Session::builder()
            .map_err(|e| unavailable(&model_path, format!("session builder: {e}")))?
            .with_intra_threads(1)
            .map_err(|e| unavailable(&model_path, format!("set threads: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| unavailable(&model_path, format!("load model: {e}")))?;

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| unavailable(&tokenizer_path, e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_TOKENS,
                ..TruncationParams::default()
            }))
            .map_err(|e| unavailable(&tokenizer_path, e))?;
        tokenizer.with_padding(None);

        let model_name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());
        info!(model = %model_path.display(), "Loaded ONNX embedding model");

        Ok(Self {
            model: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
            }),
            model_name,
        })
    }
}

impl OnnxModel {
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| failed(format!("tokenization failed: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();
        let seq_len = input_ids.len();

        let ids = ndarray::Array2::from_shape_vec((1, seq_len), input_ids).map_err(failed)?;
        let mask =
            ndarray::Array2::from_shape_vec((1, seq_len), attention_mask.clone()).map_err(failed)?;
        let types = ndarray::Array2::from_shape_vec((1, seq_len), type_ids).map_err(failed)?;

        let ids = TensorRef::from_array_view(&ids).map_err(failed)?;
        let mask = TensorRef::from_array_view(&mask).map_err(failed)?;
        let types = TensorRef::from_array_view(&types).map_err(failed)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| failed(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![ids, mask, types])
            .map_err(|e| failed(format!("inference failed: {e}")))?;

        // [1, seq_len, hidden]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| failed(format!("extract embeddings: {e}")))?;
        let hidden = shape
            .last()
            .copied()
            .filter(|d| *d > 0 && shape.len() >= 2)
            .ok_or_else(|| failed(format!("unexpected output shape {shape:?}")))?
            as usize;

        Ok(normalize(mean_pool(data, &attention_mask, hidden)))
    }
}

/// Average token vectors whose mask is set.
pub fn mean_pool(data: &[f32], mask: &[i64], hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];
    let mut count = 0.0f32;
    for (token, _) in mask.iter().enumerate().filter(|(_, m)| **m > 0) {
        let Some(row) = data.get(token * hidden..(token + 1) * hidden) else {
            break;
        };
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += v;
        }
        count += 1.0;
    }
    if count > 0.0 {
        pooled.iter_mut().for_each(|v| *v /= count);
    }
    pooled
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        // Inference is CPU-bound.
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|t| model.embed_text(t))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| failed(format!("embedding task panicked: {e}")))?
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_directory_is_unavailable() {
        let err = OnnxEmbedder::from_directory(Path::new("/nonexistent/minilm")).unwrap_err();
        assert!(matches!(err, KnowledgeError::ModelUnavailable { .. }));
        assert!(err.to_string().contains("model.onnx"));
    }

    #[test]
    fn missing_tokenizer_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"").unwrap();
        let err = OnnxEmbedder::from_directory(dir.path()).unwrap_err();
        assert!(err.to_string().contains("tokenizer.json"));
    }

    #[test]
    fn mean_pool_skips_masked_tokens() {
        let data = [1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        assert_eq!(mean_pool(&data, &[1, 1, 0], 2), vec![2.0, 3.0]);
    }

    #[test]
    fn mean_pool_with_empty_mask_is_zero() {
        assert_eq!(mean_pool(&[5.0, 5.0], &[0], 2), vec![0.0, 0.0]);
    }

    #[test]
    fn normalize_produces_unit_vectors() {
        let v = normalize(vec![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_eq!(normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}

//! Error types for Intake Assist.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

/// Reference document, embedding, and retrieval errors.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Reference document not found: {0}")]
    DocumentNotFound(String),

    #[error("Failed to extract text from {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("Reference document {0} contains no text")]
    EmptyDocument(String),

    #[error("Embedding model unavailable at {path}: {reason}")]
    ModelUnavailable { path: String, reason: String },

    #[error("Embedding generation failed: {reason}")]
    EmbeddingFailed { reason: String },

    #[error("Embedding count mismatch: {embeddings} embeddings for {chunks} chunks")]
    EmbeddingMismatch { chunks: usize, embeddings: usize },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Calendar booking errors.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Calendar integration is not configured")]
    NotConfigured,

    #[error("Calendar request failed: {0}")]
    RequestFailed(String),

    #[error("Calendar API rejected the event ({status}): {body}")]
    Rejected { status: u16, body: String },
}

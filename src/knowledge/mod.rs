//! Knowledge base: the reference document as searchable, embedded chunks.
//!
//! Built once at startup from a single document. If the document or the
//! embedding backend is unavailable the knowledge base stays empty and the
//! service keeps running with question answering degraded.

pub mod chunker;
pub mod document;
pub mod embeddings;
pub mod onnx;
pub mod retrieval;

pub use chunker::{Chunk, chunk_words};
pub use document::{Document, load_document};
pub use embeddings::{Embedder, RigEmbedder, create_embedder};
pub use onnx::OnnxEmbedder;
pub use retrieval::{KnowledgeBase, RetrievedChunk, cosine_similarity};

//! Vector-State: embedding and similarity storage for repository intelligence
//!
//! This crate owns every conversation with an embedding API or a vector
//! database. Callers hand it chunked documents and get back ranked chunks.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: deterministic ranking, backend-agnostic traits.
//!
//! ## Key Components
//!
//! - `VectorStore` / `Embedder`: the async storage seams
//! - `OpenAiEmbedder`: OpenAI-compatible `/embeddings` client
//! - `SupabaseVectorStore`: pgvector behind PostgREST
//! - `SurrealVectorStore`: SurrealDB with `vector::similarity::cosine`
//! - `fakes`: in-memory implementations for tests

pub mod embedder;
mod error;
pub mod fakes;
pub mod storage_traits;
mod supabase;
mod surreal;

pub use embedder::{EmbeddingConfig, OpenAiEmbedder};
pub use error::StoreError;
pub use storage_traits::{
    cosine_similarity, Document, Embedder, Metadata, MetadataFilter, ScoredDocument, StoreResult,
    VectorStore, SOURCE_KEY, UNKNOWN_SOURCE,
};
pub use supabase::{SupabaseConfig, SupabaseVectorStore};
pub use surreal::{SurrealConfig, SurrealVectorStore};

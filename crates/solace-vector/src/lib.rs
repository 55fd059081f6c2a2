//! Solace vector crate - chunking, embedding, flat L2 index, persistence, and retrieval.
//!
//! Documents are cut into fixed-size character chunks, embedded with a
//! sentence-embedding model, and held in an exact nearest-neighbour index
//! that can be persisted and reloaded. The [`Retriever`] ties these together
//! behind a single "top-k chunks for a query" operation.

pub mod chunker;
pub mod corpus;
pub mod embedding;
pub mod index;
pub mod retriever;
pub mod store;

pub use chunker::{Chunker, Chunks};
pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding, OnnxEmbeddingService};
pub use index::{SearchHit, VectorIndex};
pub use retriever::{RetrievedChunk, Retriever, RetrieverOptions};
pub use store::IndexStore;

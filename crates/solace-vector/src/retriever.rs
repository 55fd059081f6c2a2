//! Retriever: corpus ingestion, index caching, and query-time lookup.
//!
//! At startup the retriever loads the persisted index if both artifacts are
//! present and compatible with the embedder, and otherwise rebuilds it from
//! the document directory and saves it. At query time it embeds the query and
//! returns the nearest chunks.

use std::path::PathBuf;

use solace_core::config::SolaceConfig;
use solace_core::error::{Result, SolaceError};
use solace_core::types::DocumentChunk;
use tracing::{debug, info, warn};

use crate::chunker::Chunker;
use crate::corpus::load_corpus;
use crate::embedding::{DynEmbeddingService, EmbeddingService};
use crate::index::VectorIndex;
use crate::store::IndexStore;

/// Where the corpus lives and how it is chunked and cached.
#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    pub docs_dir: PathBuf,
    pub store: IndexStore,
    pub chunk_size: usize,
    /// Ignore any persisted index and rebuild from the documents.
    pub force_rebuild: bool,
}

impl RetrieverOptions {
    pub fn from_config(config: &SolaceConfig) -> Self {
        Self {
            docs_dir: config.resolve_path(&config.corpus.docs_dir),
            store: IndexStore::new(
                config.resolve_path(&config.corpus.index_path),
                config.resolve_path(&config.corpus.chunks_path),
            ),
            chunk_size: config.corpus.chunk_size,
            force_rebuild: false,
        }
    }
}

/// A retrieved chunk together with its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: DocumentChunk,
    pub distance: f32,
}

/// Top-k chunk retrieval over a read-only index.
///
/// Uses dynamic dispatch so that production code can supply
/// `OnnxEmbeddingService` while tests use `MockEmbedding`.
pub struct Retriever {
    index: VectorIndex,
    embedder: Box<dyn DynEmbeddingService>,
}

impl Retriever {
    /// Wrap an already-built index.
    pub fn new(index: VectorIndex, embedder: impl EmbeddingService + 'static) -> Self {
        Self::new_dyn(index, Box::new(embedder))
    }

    pub fn new_dyn(index: VectorIndex, embedder: Box<dyn DynEmbeddingService>) -> Self {
        Self { index, embedder }
    }

    /// A retriever with no index. Every query returns no chunks.
    pub fn empty(embedder: Box<dyn DynEmbeddingService>) -> Self {
        Self::new_dyn(VectorIndex::default(), embedder)
    }

    /// Load the cached index or build (and cache) a fresh one.
    ///
    /// A cached index that fails to load, or whose dimension does not match
    /// the embedder, is rebuilt. Failing to save a freshly built index is
    /// logged but not fatal. An empty corpus is fatal.
    pub async fn open(
        options: &RetrieverOptions,
        embedder: Box<dyn DynEmbeddingService>,
    ) -> Result<Self> {
        if !options.force_rebuild && options.store.exists() {
            match options.store.load() {
                Ok(index) if index.dimensions() == embedder.dimensions() => {
                    return Ok(Self::new_dyn(index, embedder));
                }
                Ok(index) => warn!(
                    cached = index.dimensions(),
                    expected = embedder.dimensions(),
                    "Cached index dimension does not match embedder, rebuilding"
                ),
                Err(e) => warn!(error = %e, "Cached index unreadable, rebuilding"),
            }
        }

        let chunker = Chunker::new(options.chunk_size);
        let chunks = load_corpus(&options.docs_dir, &chunker)?;
        let index = VectorIndex::build(chunks, embedder.as_ref()).await?;

        if let Err(e) = options.store.save(&index) {
            warn!(error = %e, "Failed to persist vector index; it will be rebuilt next run");
        } else {
            info!("Created new vector index and saved embeddings");
        }

        Ok(Self::new_dyn(index, embedder))
    }

    /// The `top_k` chunks nearest to `query`, best match first.
    ///
    /// Returns an empty list for an empty index or a blank query.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<DocumentChunk>> {
        Ok(self
            .retrieve_scored(query, top_k)
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    /// Like [`Retriever::retrieve`] but keeps the distances.
    pub async fn retrieve_scored(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.index.is_empty() || top_k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_boxed(query).await?;
        let hits = self.index.search(&query_vec, top_k)?;

        let results = hits
            .into_iter()
            .map(|hit| {
                self.index
                    .chunk(hit.row)
                    .cloned()
                    .map(|chunk| RetrievedChunk {
                        chunk,
                        distance: hit.distance,
                    })
                    .ok_or_else(|| SolaceError::Index(format!("hit row {} out of range", hit.row)))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(top_k, results = results.len(), "Retrieved context chunks");
        Ok(results)
    }

    /// Get a reference to the underlying vector index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

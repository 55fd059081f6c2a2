//! Flat (exact) L2 nearest-neighbour index over embedded document chunks.
//!
//! The corpus is a handful of documents, so every query scans all rows. The
//! index is immutable once built or loaded and is shared read-only between
//! sessions behind an `Arc`.

use solace_core::error::{Result, SolaceError};
use solace_core::types::DocumentChunk;
use tracing::{debug, info};

use crate::embedding::DynEmbeddingService;

/// A single hit returned from a vector search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Row of the matching chunk.
    pub row: usize,
    /// Squared Euclidean distance to the query (smaller is closer).
    pub distance: f32,
}

/// Embedding matrix plus the chunk list it was computed from.
///
/// Row `i` of the matrix is the embedding of chunk `i`. Both are only ever
/// set together, so the row count always equals the chunk count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dimensions: usize,
    rows: Vec<Vec<f32>>,
    chunks: Vec<DocumentChunk>,
}

impl VectorIndex {
    /// Assemble an index from parallel chunk and vector lists.
    ///
    /// Fails if the lists differ in length or the vectors differ in dimension.
    pub fn from_parts(chunks: Vec<DocumentChunk>, rows: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != rows.len() {
            return Err(SolaceError::Index(format!(
                "{} chunks but {} embedding rows",
                chunks.len(),
                rows.len()
            )));
        }

        let dimensions = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dimensions) {
            return Err(SolaceError::Index(format!(
                "row {} has dimension {}, expected {}",
                i,
                row.len(),
                dimensions
            )));
        }

        Ok(Self {
            dimensions,
            rows,
            chunks,
        })
    }

    /// Embed every chunk and build an index over the results.
    ///
    /// Fails with [`SolaceError::EmptyCorpus`] when `chunks` is empty. Either
    /// every chunk is embedded or an error is returned; there is no partial
    /// index.
    pub async fn build<E>(chunks: Vec<DocumentChunk>, embedder: &E) -> Result<Self>
    where
        E: DynEmbeddingService + ?Sized,
    {
        if chunks.is_empty() {
            return Err(SolaceError::EmptyCorpus);
        }

        let mut rows = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let embedding = embedder.embed_boxed(&chunk.content).await?;
            if embedding.len() != embedder.dimensions() {
                return Err(SolaceError::Index(format!(
                    "embedder returned {} dimensions for chunk {}, expected {}",
                    embedding.len(),
                    i,
                    embedder.dimensions()
                )));
            }
            rows.push(embedding);
        }

        let index = Self::from_parts(chunks, rows)?;
        info!(
            chunks = index.len(),
            dimensions = index.dimensions(),
            "Vector index built"
        );
        Ok(index)
    }

    /// Find the `k` rows closest to `query`, nearest first.
    ///
    /// `k` is clamped to the number of rows; an empty index yields no hits.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.rows.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(SolaceError::Index(format!(
                "query has dimension {}, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut hits: Vec<SearchHit> = self
            .rows
            .iter()
            .enumerate()
            .map(|(row, embedding)| SearchHit {
                row,
                distance: squared_l2(query, embedding),
            })
            .collect();

        // Stable sort keeps corpus order between equidistant rows.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k.min(self.rows.len()));

        debug!(k, hits = hits.len(), "Index searched");
        Ok(hits)
    }

    /// The chunk stored at `row`, if any.
    pub fn chunk(&self, row: usize) -> Option<&DocumentChunk> {
        self.chunks.get(row)
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    /// Embedding dimension, or 0 for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Split the index back into its chunk list and embedding matrix.
    pub fn into_parts(self) -> (Vec<DocumentChunk>, Vec<Vec<f32>>) {
        (self.chunks, self.rows)
    }
}

/// Squared Euclidean distance. Callers guarantee equal lengths.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

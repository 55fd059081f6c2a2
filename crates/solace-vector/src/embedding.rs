//! Embedding service trait and implementations.
//!
//! - `OnnxEmbeddingService` runs all-MiniLM-L6-v2 (ONNX export) through ort
//!   and tokenizes with the HuggingFace tokenizers crate.
//! - `MockEmbedding` produces deterministic hash-seeded vectors for tests and
//!   for the `hash` backend.

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ndarray::Array2;
use ort::session::Session;
use ort::value::TensorRef;
use solace_core::error::SolaceError;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Dimension of all-MiniLM-L6-v2 sentence embeddings.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Longest token sequence the sentence-transformer was trained on.
const MAX_SEQUENCE_TOKENS: usize = 256;

/// Service for generating text embeddings.
///
/// Corpus chunks and queries must be embedded by the same service so that
/// L2 distances between them are meaningful.
pub trait EmbeddingService: Send + Sync {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, SolaceError>> + Send;

    fn dimensions(&self) -> usize;
}

pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, SolaceError>> + Send + 'a>>;

/// Boxed-future twin of [`EmbeddingService`], usable as `dyn`.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a>;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

fn embedding_err(context: &str, err: impl std::fmt::Display) -> SolaceError {
    SolaceError::Embedding(format!("{context}: {err}"))
}

fn reject_empty(text: &str) -> Result<(), SolaceError> {
    if text.is_empty() {
        return Err(SolaceError::Embedding("cannot embed empty text".to_string()));
    }
    Ok(())
}

// ONNX backend

/// Loaded model and tokenizer, shared with blocking inference tasks.
struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OnnxModel {
    fn encode(&self, text: &str) -> Result<Vec<f32>, SolaceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| embedding_err("tokenize", e))?;

        let mask = encoding.get_attention_mask().to_vec();
        let input_ids = as_row(encoding.get_ids())?;
        let attention_mask = as_row(&mask)?;
        let token_type_ids = as_row(encoding.get_type_ids())?;

        let inputs = ort::inputs![
            TensorRef::from_array_view(&input_ids)
                .map_err(|e| embedding_err("input_ids", e))?,
            TensorRef::from_array_view(&attention_mask)
                .map_err(|e| embedding_err("attention_mask", e))?,
            TensorRef::from_array_view(&token_type_ids)
                .map_err(|e| embedding_err("token_type_ids", e))?,
        ];

        let mut session = self
            .session
            .lock()
            .map_err(|e| embedding_err("session lock", e))?;
        let outputs = session
            .run(inputs)
            .map_err(|e| embedding_err("inference", e))?;
        let (shape, tokens) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| embedding_err("extract output", e))?;

        // [batch, seq_len, hidden]
        let hidden = match shape.iter().last() {
            Some(&d) if d > 0 => d as usize,
            _ => {
                return Err(SolaceError::Embedding(format!(
                    "unexpected output shape {:?}",
                    shape.iter().collect::<Vec<_>>()
                )))
            }
        };

        debug!(tokens = mask.len(), hidden, "ONNX inference done");
        Ok(mean_pool(tokens, &mask, hidden))
    }
}

/// One-row i64 tensor from tokenizer output.
fn as_row(values: &[u32]) -> Result<Array2<i64>, SolaceError> {
    let row: Vec<i64> = values.iter().map(|&v| i64::from(v)).collect();
    Array2::from_shape_vec((1, row.len()), row)
        .map_err(|e| embedding_err("tensor shape", e))
}

/// Sentence embeddings from an all-MiniLM-L6-v2 ONNX export.
///
/// The model directory must contain `model.onnx` and `tokenizer.json`.
/// Inputs longer than the model's sequence limit are truncated. Output
/// vectors are mean-pooled under the attention mask and unit length.
#[derive(Clone)]
pub struct OnnxEmbeddingService {
    model: Arc<OnnxModel>,
    dimensions: usize,
}

impl std::fmt::Debug for OnnxEmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingService")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingService {
    pub fn from_directory(model_dir: &Path) -> Result<Self, SolaceError> {
        Self::from_files(
            &model_dir.join("model.onnx"),
            &model_dir.join("tokenizer.json"),
        )
    }

    pub fn from_files(model_path: &Path, tokenizer_path: &Path) -> Result<Self, SolaceError> {
        for (what, path) in [("model", model_path), ("tokenizer", tokenizer_path)] {
            if !path.is_file() {
                return Err(SolaceError::Embedding(format!(
                    "{what} file not found at {}",
                    path.display()
                )));
            }
        }

        let session = Session::builder()
            .map_err(|e| embedding_err("session builder", e))?
            .with_intra_threads(1)
            .map_err(|e| embedding_err("intra threads", e))?
            .commit_from_file(model_path)
            .map_err(|e| embedding_err("load model", e))?;

        // Unknown dims are reported as -1.
        let dimensions = session
            .outputs()
            .first()
            .and_then(|out| out.dtype().tensor_shape())
            .and_then(|shape| shape.last().copied())
            .filter(|&d| d > 0)
            .map_or(DEFAULT_DIMENSIONS, |d| d as usize);

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| embedding_err("load tokenizer", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_TOKENS,
                ..TruncationParams::default()
            }))
            .map_err(|e| embedding_err("configure truncation", e))?;

        info!(model = %model_path.display(), dimensions, "ONNX embedding model ready");

        Ok(Self {
            model: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
            }),
            dimensions,
        })
    }
}

impl EmbeddingService for OnnxEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SolaceError> {
        reject_empty(text)?;
        let model = Arc::clone(&self.model);
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || model.encode(&text))
            .await
            .map_err(|e| embedding_err("inference task", e))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Average the token rows whose mask is set, then scale to unit length.
fn mean_pool(tokens: &[f32], mask: &[u32], hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];
    let mut counted = 0u32;

    for (row, _) in tokens
        .chunks_exact(hidden)
        .zip(mask)
        .filter(|(_, m)| **m > 0)
    {
        pooled.iter_mut().zip(row).for_each(|(acc, v)| *acc += v);
        counted += 1;
    }

    if counted > 0 {
        let n = counted as f32;
        pooled.iter_mut().for_each(|v| *v /= n);
    }
    normalize(&mut pooled);
    pooled
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

// Hash backend

/// Deterministic unit vectors seeded by a hash of the text.
///
/// Identical text always maps to the same vector, so a query equal to a
/// chunk's content is at distance zero from it. Similar texts are not close.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|_| {
                state = splitmix64(state);
                // Map to [-1, 1).
                ((state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) as f32
            })
            .collect();
        normalize(&mut vector);
        vector
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SolaceError> {
        reject_empty(text)?;
        Ok(self.vector_for(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_mock_default_and_custom_dimensions() {
        let default = MockEmbedding::new();
        assert_eq!(default.embed("exam stress").await.unwrap().len(), DEFAULT_DIMENSIONS);

        let small = MockEmbedding::with_dimensions(8);
        assert_eq!(small.embed("exam stress").await.unwrap().len(), 8);
        assert_eq!(EmbeddingService::dimensions(&small), 8);
    }

    #[tokio::test]
    async fn test_mock_is_deterministic_per_text() {
        let service = MockEmbedding::with_dimensions(32);
        let a = service.embed("can't sleep").await.unwrap();
        let b = service.embed("can't sleep").await.unwrap();
        let c = service.embed("can't focus").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_mock_vectors_are_unit_length() {
        let service = MockEmbedding::new();
        let v = service.embed("lonely on campus").await.unwrap();
        assert!((norm(&v) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let service = MockEmbedding::new();
        assert!(matches!(service.embed("").await, Err(SolaceError::Embedding(_))));
        assert!(service.embed(" ").await.is_ok());
    }

    #[tokio::test]
    async fn test_dyn_dispatch() {
        let service: Box<dyn DynEmbeddingService> = Box::new(MockEmbedding::with_dimensions(16));
        let v = service.embed_boxed("boxed").await.unwrap();
        assert_eq!(v.len(), service.dimensions());
    }

    #[test]
    fn test_mean_pool_skips_masked_tokens() {
        // Two tokens of width 2; the second is padding.
        let pooled = mean_pool(&[3.0, 4.0, 100.0, 100.0], &[1, 0], 2);
        assert!((pooled[0] - 0.6).abs() < 1e-6);
        assert!((pooled[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_mean_pool_all_masked_is_zero() {
        let pooled = mean_pool(&[1.0, 2.0], &[0], 2);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }

    #[test]
    fn test_missing_model_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxEmbeddingService::from_directory(dir.path()).unwrap_err();
        assert!(err.to_string().contains("model file not found"));
    }
}

//! On-disk persistence for the vector index.
//!
//! An index is stored as two JSON artifacts: the embedding matrix and the
//! row-aligned chunk list. Loading requires both; a pair that does not line
//! up is rejected rather than partially loaded.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use solace_core::error::{Result, SolaceError};
use solace_core::types::DocumentChunk;
use tracing::info;

use crate::index::VectorIndex;

/// Serialized form of the embedding matrix.
#[derive(Debug, Serialize, Deserialize)]
struct StoredVectors {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

/// Locations of the two persisted index artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStore {
    index_path: PathBuf,
    chunks_path: PathBuf,
}

impl IndexStore {
    pub fn new(index_path: impl Into<PathBuf>, chunks_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            chunks_path: chunks_path.into(),
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn chunks_path(&self) -> &Path {
        &self.chunks_path
    }

    /// True when both artifacts are present.
    pub fn exists(&self) -> bool {
        self.index_path.is_file() && self.chunks_path.is_file()
    }

    /// Write both artifacts, creating parent directories as needed.
    ///
    /// Each file is written to a temporary sibling and renamed into place so
    /// that a crash never leaves a half-written artifact behind.
    pub fn save(&self, index: &VectorIndex) -> Result<()> {
        let vectors = StoredVectors {
            dimensions: index.dimensions(),
            vectors: index.rows().to_vec(),
        };
        write_json(&self.index_path, &vectors)?;
        write_json(&self.chunks_path, &index.chunks())?;

        info!(
            index = %self.index_path.display(),
            chunks = %self.chunks_path.display(),
            rows = index.len(),
            "Vector index saved"
        );
        Ok(())
    }

    /// Read both artifacts and reassemble the index.
    pub fn load(&self) -> Result<VectorIndex> {
        let vectors: StoredVectors = read_json(&self.index_path)?;
        let chunks: Vec<DocumentChunk> = read_json(&self.chunks_path)?;

        if vectors.vectors.iter().any(|v| v.len() != vectors.dimensions) {
            return Err(SolaceError::Index(format!(
                "{} contains vectors that are not {}-dimensional",
                self.index_path.display(),
                vectors.dimensions
            )));
        }

        let index = VectorIndex::from_parts(chunks, vectors.vectors)?;
        info!(
            index = %self.index_path.display(),
            rows = index.len(),
            "Loaded cached vector index"
        );
        Ok(index)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    let mut writer = std::io::BufWriter::new(std::fs::File::create(&tmp)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

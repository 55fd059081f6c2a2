//! Corpus ingestion: a directory of plain-text documents becomes a list of chunks.

use std::path::Path;

use solace_core::error::{Result, SolaceError};
use solace_core::types::DocumentChunk;
use tracing::{debug, info, warn};

use crate::chunker::Chunker;

/// File extension of ingestible documents.
const DOCUMENT_EXTENSION: &str = "txt";

/// Read every `.txt` file in `dir` and chunk it.
///
/// Files are processed in file-name order so the chunk order (and therefore
/// the index row order) is stable between runs. Whitespace-only documents and
/// files that are not valid UTF-8 are skipped with a warning. Fails with
/// [`SolaceError::EmptyCorpus`] when nothing usable is found.
pub fn load_corpus(dir: &Path, chunker: &Chunker) -> Result<Vec<DocumentChunk>> {
    if !dir.is_dir() {
        return Err(SolaceError::Corpus(format!(
            "Document path does not exist: {}",
            dir.display()
        )));
    }

    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
        })
        .collect();
    files.sort();

    let mut chunks = Vec::new();
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable document");
                continue;
            }
        };

        if content.trim().is_empty() {
            debug!(file = %name, "Skipping empty document");
            continue;
        }

        let before = chunks.len();
        chunks.extend(chunker.chunk_document(&name, &content));
        debug!(file = %name, chunks = chunks.len() - before, "Document chunked");
    }

    if chunks.is_empty() {
        warn!(dir = %dir.display(), "No valid text files found to create embeddings");
        return Err(SolaceError::EmptyCorpus);
    }

    info!(
        dir = %dir.display(),
        documents = files.len(),
        chunks = chunks.len(),
        chunk_size = chunker.chunk_size(),
        "Corpus loaded"
    );
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &[u8]) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let result = load_corpus(Path::new("/nonexistent/docs"), &Chunker::new(10));
        assert!(matches!(result, Err(SolaceError::Corpus(_))));
    }

    #[test]
    fn test_empty_directory_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_corpus(dir.path(), &Chunker::new(10));
        assert!(matches!(result, Err(SolaceError::EmptyCorpus)));
    }

    #[test]
    fn test_whitespace_only_documents_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blank.txt", b"   \n\t  ");
        let result = load_corpus(dir.path(), &Chunker::new(10));
        assert!(matches!(result, Err(SolaceError::EmptyCorpus)));
    }

    #[test]
    fn test_only_txt_files_ingested_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_sleep.txt", b"sleep well");
        write(dir.path(), "a_stress.txt", b"breathe slowly");
        write(dir.path(), "notes.pdf", b"%PDF-1.4");
        write(dir.path(), "README.md", b"# readme");

        let chunks = load_corpus(dir.path(), &Chunker::new(1000)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source_name, "a_stress.txt");
        assert_eq!(chunks[0].content, "breathe slowly");
        assert_eq!(chunks[1].source_name, "b_sleep.txt");
    }

    #[test]
    fn test_long_document_split_into_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let text = "x".repeat(2500);
        write(dir.path(), "long.txt", text.as_bytes());

        let chunks = load_corpus(dir.path(), &Chunker::new(1000)).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].content.len(), 500);
        assert!(chunks.iter().all(|c| c.source_name == "long.txt"));
    }

    #[test]
    fn test_invalid_utf8_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.txt", &[0xff, 0xfe, 0x00, 0x80]);
        write(dir.path(), "good.txt", b"valid text");

        let chunks = load_corpus(dir.path(), &Chunker::new(100)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_name, "good.txt");
    }
}

//! Fixed-size character chunking.
//!
//! Chunks are measured in Unicode scalar values, never split a character,
//! never overlap, and concatenate back to the original text exactly.

use std::iter::FusedIterator;

use solace_core::types::DocumentChunk;

/// Splits text into chunks of at most `chunk_size` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    /// Create a chunker. A size of zero is clamped to one so iteration always
    /// makes progress.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Lazily iterate over the chunks of `text`.
    ///
    /// The returned iterator is cheap to clone; cloning it (or calling this
    /// again) restarts from wherever the clone was taken.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            rest: text,
            chunk_size: self.chunk_size,
        }
    }

    /// Chunk a whole document, tagging every chunk with its source name.
    pub fn chunk_document<'a>(
        &self,
        source_name: &'a str,
        text: &'a str,
    ) -> impl Iterator<Item = DocumentChunk> + 'a {
        self.chunks(text)
            .map(move |content| DocumentChunk::new(source_name, content))
    }
}

/// Iterator over the chunks of a borrowed string. See [`Chunker::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    chunk_size: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let split_at = self
            .rest
            .char_indices()
            .nth(self.chunk_size)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(split_at);
        self.rest = rest;
        Some(chunk)
    }
}

impl FusedIterator for Chunks<'_> {}

//! Benchmarks for chunking, flat index search, and end-to-end retrieval.
//!
//! The default corpus is 1,000 chunks, well above the size of a typical
//! student-support document set. Set `BENCH_LARGE_CORPUS=1` for 10,000.
//!
//! ```bash
//! BENCH_LARGE_CORPUS=1 cargo bench -p solace-vector
//! ```

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use solace_core::types::DocumentChunk;
use solace_vector::chunker::Chunker;
use solace_vector::embedding::{EmbeddingService, MockEmbedding};
use solace_vector::index::VectorIndex;
use solace_vector::retriever::Retriever;

const DEFAULT_CHUNK_COUNT: usize = 1_000;
const LARGE_CHUNK_COUNT: usize = 10_000;

fn chunk_text(index: usize) -> String {
    format!(
        "Exam season can bring on poor sleep, racing thoughts, and trouble \
         concentrating. Short walks, regular meals, and a fixed bedtime help \
         many students feel steadier. If worry starts to crowd out daily life, \
         talking to a counsellor or a trusted friend is a good next step. \
         Passage identifier: {}",
        index
    )
}

fn chunk_count() -> usize {
    if std::env::var("BENCH_LARGE_CORPUS").is_ok() {
        LARGE_CHUNK_COUNT
    } else {
        DEFAULT_CHUNK_COUNT
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime")
}

fn build_index(rt: &tokio::runtime::Runtime, count: usize) -> VectorIndex {
    let chunks: Vec<DocumentChunk> = (0..count)
        .map(|i| DocumentChunk::new(format!("doc_{}.txt", i % 20), chunk_text(i)))
        .collect();
    let index = rt
        .block_on(VectorIndex::build(chunks, &MockEmbedding::new()))
        .expect("index build failed");
    assert_eq!(index.len(), count);
    index
}

fn bench_chunking(c: &mut Criterion) {
    let text: String = (0..200).map(chunk_text).collect::<Vec<_>>().join("\n");
    let chunker = Chunker::new(1000);

    c.bench_function("chunk_200_passages", |b| {
        b.iter(|| chunker.chunks(&text).count());
    });
}

fn bench_index_search(c: &mut Criterion) {
    let rt = runtime();
    let count = chunk_count();
    let index = build_index(&rt, count);
    let query = rt
        .block_on(MockEmbedding::new().embed("I can't sleep before exams"))
        .expect("query embed failed");

    let mut group = c.benchmark_group("index_search");
    group.measurement_time(Duration::from_secs(5));
    group.bench_function(format!("top2_{}chunks", count), |b| {
        b.iter(|| {
            let hits = index.search(&query, 2).expect("search failed");
            assert_eq!(hits.len(), 2);
            hits
        });
    });
    group.finish();
}

fn bench_retrieve(c: &mut Criterion) {
    let rt = runtime();
    let count = chunk_count();
    let retriever = Retriever::new(build_index(&rt, count), MockEmbedding::new());

    let mut group = c.benchmark_group("retrieve");
    group.measurement_time(Duration::from_secs(5));
    group.bench_function(format!("embed_and_search_{}chunks", count), |b| {
        b.iter(|| {
            rt.block_on(retriever.retrieve("how do I stop worrying about grades", 2))
                .expect("retrieve failed")
        });
    });
    group.finish();
}

criterion_group!(benches, bench_chunking, bench_index_search, bench_retrieve);
criterion_main!(benches);

//! BM25 indexing and retrieval benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hcr_core::Chunk;
use hcr_retrieve::Bm25Index;

fn generate_chunks(n_docs: usize, terms_per_doc: usize, vocab_size: usize) -> Vec<Chunk> {
    (0..n_docs)
        .map(|d| {
            let content: Vec<String> = (0..terms_per_doc)
                .map(|i| format!("term{}", (d + i * 7) % vocab_size))
                .collect();
            Chunk::new(
                format!("c-{d}"),
                "doc",
                content.join(" "),
                terms_per_doc as u32,
            )
            .unwrap()
        })
        .collect()
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25_indexing");

    for (n_docs, terms_per_doc) in [(100, 50), (1000, 100), (10000, 200)].iter() {
        let chunks = generate_chunks(*n_docs, *terms_per_doc, 1000);

        group.bench_with_input(
            BenchmarkId::new("build", format!("{}docs_{}terms", n_docs, terms_per_doc)),
            &chunks,
            |b, chunks| {
                b.iter(|| {
                    black_box(Bm25Index::new(chunks));
                })
            },
        );
    }

    group.finish();
}

fn bench_retrieval(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25_retrieval");

    for (n_docs, terms_per_doc, k) in [(1000, 100, 10), (10000, 200, 50)].iter() {
        let chunks = generate_chunks(*n_docs, *terms_per_doc, 1000);
        let index = Bm25Index::new(&chunks);
        let query = "term3 term17 term42 term99";

        group.bench_with_input(
            BenchmarkId::new("search", format!("{}docs_k{}", n_docs, k)),
            &index,
            |b, index| {
                b.iter(|| {
                    black_box(index.search(query, *k));
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_indexing, bench_retrieval);
criterion_main!(benches);

//! Benchmarks for topdf conversion performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks exercise pagination, graph building, and optimization
//! on synthetic flow documents.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use topdf::graph::build_graph;
use topdf::{FlowDocument, Margins, Paragraph, WriteOptions};

/// Creates a synthetic flow document with the given number of paragraphs.
fn create_test_document(paragraph_count: usize) -> FlowDocument {
    let mut doc = FlowDocument::new();
    for i in 0..paragraph_count {
        if i % 10 == 0 {
            doc.add_paragraph(Paragraph::heading(format!("Section {}", i / 10 + 1), 2));
        }
        doc.add_paragraph(Paragraph::with_text(format!(
            "Paragraph {} with enough words to wrap across a few lines of an \
             A4 page at the default body size, exercising the measurement \
             tables and the greedy line breaker.",
            i
        )));
    }
    doc
}

/// Benchmark pagination at various document sizes.
fn bench_pagination(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagination");
    let geometry = topdf::resolve("A4", "Portrait");

    for count in [10, 100, 500].iter() {
        let doc = create_test_document(*count);
        group.bench_function(format!("{}_paragraphs", count), |b| {
            b.iter(|| {
                topdf::paginate::paginate(
                    black_box(&doc),
                    geometry,
                    Margins::default(),
                    false,
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark graph building and both serialization modes.
fn bench_serialization(c: &mut Criterion) {
    let doc = create_test_document(100);
    let fixed = topdf::paginate::paginate(
        &doc,
        topdf::resolve("A4", "Portrait"),
        Margins::default(),
        false,
    )
    .unwrap();
    let graph = build_graph(&fixed);

    c.bench_function("build_graph", |b| {
        b.iter(|| build_graph(black_box(&fixed)));
    });

    c.bench_function("write_classic", |b| {
        b.iter(|| topdf::write_graph(black_box(&graph), &WriteOptions::classic()).unwrap());
    });

    c.bench_function("write_compressed", |b| {
        b.iter(|| topdf::write_graph(black_box(&graph), &WriteOptions::compressed()).unwrap());
    });
}

/// Benchmark the deduplication pass.
fn bench_optimization(c: &mut Criterion) {
    let doc = create_test_document(200);
    let fixed = topdf::paginate::paginate(
        &doc,
        topdf::resolve("A4", "Portrait"),
        Margins::default(),
        false,
    )
    .unwrap();
    let graph = build_graph(&fixed);

    c.bench_function("optimize_graph", |b| {
        b.iter(|| {
            let mut scratch = graph.clone();
            topdf::optimize::optimize(black_box(&mut scratch)).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_pagination,
    bench_serialization,
    bench_optimization,
);
criterion_main!(benches);

//! Benchmarks for the HTML codec and toolbar dispatch.
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use scribe_core::{Session, ToolbarAction};
use scribe_doc::FormatFlag;

/// Generates a post with `blocks` mixed blocks.
fn generate_post(blocks: usize) -> String {
    (0..blocks)
        .map(|i| match i % 4 {
            0 => format!("<h2>Section {i}</h2>"),
            1 => format!("<p>Paragraph {i} with <strong>bold</strong> and <em>italic</em> text.</p>"),
            2 => format!("<ul><li>item {i}</li><li>item <a href=\"https://example.com/{i}\">link</a></li></ul>"),
            _ => format!("<p><span style=\"font-size: 18px; color: #333\">Styled {i}</span></p>"),
        })
        .collect()
}

/// Benchmarks HTML parsing into a tree.
fn bench_deserialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize");

    for size in [10, 100, 1000].iter() {
        let html = generate_post(*size);

        group.bench_with_input(BenchmarkId::new("blocks", size), &html, |b, html| {
            b.iter(|| black_box(scribe_html::deserialize(black_box(html))))
        });
    }

    group.finish();
}

/// Benchmarks tree serialization.
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for size in [10, 100, 1000].iter() {
        let tree = scribe_html::deserialize(&generate_post(*size));

        group.bench_with_input(BenchmarkId::new("blocks", size), &tree, |b, tree| {
            b.iter(|| black_box(scribe_html::serialize(black_box(tree))))
        });
    }

    group.finish();
}

/// Benchmarks a full toolbar action: mutate, normalize, serialize, notify.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let html = generate_post(200);

    group.bench_function("bold_select_all", |b| {
        b.iter_with_setup(
            || {
                let mut session = Session::from_html(&html);
                session.select_all();
                session
            },
            |mut session| {
                session
                    .dispatch(&ToolbarAction::ToggleFormat(FormatFlag::Bold))
                    .unwrap();
                black_box(session)
            },
        )
    });

    group.finish();
}

criterion_group!(benches, bench_deserialize, bench_serialize, bench_dispatch);
criterion_main!(benches);

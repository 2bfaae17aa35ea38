//! Benchmarks for clustering and record extraction on synthetic roll pages.
//!
//! Run with: `cargo bench --bench clustering_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use voter_slip::extractors::VoterExtractor;
use voter_slip::layout::SpatialClusterer;
use voter_slip::model::{PageTokens, TextToken};
use voter_slip::pipeline::{ExtractionPipeline, JsonTokenSource};

/// One voter card of eight labeled tokens with its top-left at (x, y).
fn card(x: f32, y: f32, n: usize) -> Vec<TextToken> {
    vec![
        TextToken::at(format!("ক্রমিক: {}", n), x, y),
        TextToken::at("নাম: আবদুর রহিম", x, y - 12.0),
        TextToken::at(format!("ভোটার নং: ১৯৮৭৬৫৪৩২{:04}", n), x, y - 24.0),
        TextToken::at("পিতা: নুরুল ইসলাম", x, y - 36.0),
        TextToken::at("মাতা: রাহেলা বেগম", x, y - 48.0),
        TextToken::at("পেশা: কৃষক", x, y - 60.0),
        TextToken::at("জন্ম তারিখ: ০১/০১/১৯৮০", x + 90.0, y - 60.0),
        TextToken::at("ঠিকানা: পশ্চিম পাড়া, রামু", x, y - 72.0),
    ]
}

/// A page laid out as `columns` x `rows` cards spaced beyond the linkage envelope.
fn roll_page(columns: usize, rows: usize) -> Vec<TextToken> {
    let mut tokens = Vec::with_capacity(columns * rows * 8);
    for row in 0..rows {
        for col in 0..columns {
            let x = col as f32 * 400.0;
            let y = 4000.0 - row as f32 * 300.0;
            tokens.extend(card(x, y, row * columns + col));
        }
    }
    tokens
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");
    let clusterer = SpatialClusterer::new();

    for (columns, rows) in [(3, 3), (3, 6), (3, 12)] {
        let tokens = roll_page(columns, rows);
        group.throughput(Throughput::Elements(tokens.len() as u64));
        group.bench_with_input(BenchmarkId::new("cards", columns * rows), &tokens, |b, tokens| {
            b.iter(|| clusterer.cluster(black_box(tokens)))
        });
    }
    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let clusters = SpatialClusterer::new().cluster(&roll_page(3, 6));
    let extractor = VoterExtractor::new();

    c.bench_function("extract_18_cards", |b| {
        b.iter(|| extractor.extract_all(black_box(&clusters), 1))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let pages: Vec<PageTokens> = (0..10)
        .map(|_| PageTokens {
            width: 1200.0,
            height: 4000.0,
            tokens: roll_page(3, 6),
        })
        .collect();
    let pipeline = ExtractionPipeline::new();

    c.bench_function("pipeline_10_pages", |b| {
        b.iter(|| {
            let mut source = JsonTokenSource::new(pages.clone());
            pipeline.run(black_box(&mut source))
        })
    });
}

criterion_group!(benches, bench_clustering, bench_extraction, bench_pipeline);
criterion_main!(benches);

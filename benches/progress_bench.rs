//! Benchmarks for progress estimation and page rendering
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use moodgarden::calendar::{month_cells, YearMonth};
use moodgarden::garden::{estimate_at, stage_label, ProgressEstimator};
use moodgarden::share::{render_share_page, ShareMeta};
use std::time::Duration;
use tokio::time::Instant;

fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");

    // One frame every 16ms across 40s of pending time
    let frames: Vec<Duration> = (0..2500).map(|i| Duration::from_millis(i * 16)).collect();
    group.throughput(Throughput::Elements(frames.len() as u64));

    group.bench_function("curve_2500_frames", |b| {
        b.iter(|| {
            frames
                .iter()
                .map(|d| estimate_at(black_box(*d)))
                .sum::<f64>()
        })
    });

    group.bench_function("estimator_ticks", |b| {
        let origin = Instant::now();
        b.iter(|| {
            let mut est = ProgressEstimator::new();
            est.start(origin);
            for d in &frames {
                est.tick(origin + *d);
            }
            black_box(stage_label(est.displayed()))
        })
    });

    group.finish();
}

fn bench_calendar(c: &mut Criterion) {
    c.bench_function("month_cells_year", |b| {
        b.iter(|| {
            (1..=12)
                .filter_map(|m| YearMonth::new(2024, m))
                .map(|ym| month_cells(black_box(ym)).len())
                .sum::<usize>()
        })
    });
}

fn bench_share_page(c: &mut Criterion) {
    let meta = ShareMeta {
        title: "Ada's <sunny> garden".to_string(),
        desc: "A calm day by the sea & a long walk home".repeat(8),
        img: Some("https://res.cloudinary.com/demo/image/upload/gardens/g1".to_string()),
        view_link: "https://moodgardens.app/gardens/g1".to_string(),
    };

    c.bench_function("render_share_page", |b| {
        b.iter(|| render_share_page(black_box(&meta), "https://moodgardens.app/share/s1"))
    });
}

criterion_group!(benches, bench_estimate, bench_calendar, bench_share_page);
criterion_main!(benches);

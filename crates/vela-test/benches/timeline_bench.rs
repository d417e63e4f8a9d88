//! Benchmarks for VELA timeline projection

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vela_core::{DisplayConfig, Timestamp};
use vela_timeline::{project, project_with, TimelineConfig};

fn rotating(n: usize, interval_secs: f64) -> DisplayConfig {
    let mut cfg = DisplayConfig::with_text("primary");
    cfg.rotation_texts = (0..n).map(|i| format!("text {i}")).collect();
    cfg.rotation_interval_secs = interval_secs;
    cfg
}

fn bench_project_default_horizon(c: &mut Criterion) {
    let cfg = rotating(3, 5.0);
    let now = Timestamp::from_secs(1_700_000_000);

    c.bench_function("project_default_horizon", |b| {
        b.iter(|| black_box(project(black_box(&cfg), now)))
    });
}

fn bench_project_dense(c: &mut Criterion) {
    // 1s interval fills the entry cap
    let cfg = rotating(20, 1.0);
    let now = Timestamp::from_secs(1_700_000_000);
    let config = TimelineConfig::battery_saver();

    c.bench_function("project_dense_battery_saver", |b| {
        b.iter(|| black_box(project_with(black_box(&cfg), now, &config)))
    });
}

fn bench_project_static(c: &mut Criterion) {
    let cfg = DisplayConfig::with_text("static");
    let now = Timestamp::from_secs(1_700_000_000);

    c.bench_function("project_static", |b| {
        b.iter(|| black_box(project(black_box(&cfg), now)))
    });
}

criterion_group!(
    benches,
    bench_project_default_horizon,
    bench_project_dense,
    bench_project_static,
);
criterion_main!(benches);

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use mushy_map::services::duration::{project, relative_from_seconds, RateChange};
use mushy_map::services::DurationCalculator;
use std::hint::black_box;

fn benchmark_projection(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();

    // A busy cook: players joining and leaving every half hour.
    let changes: Vec<RateChange> = (0..40)
        .map(|i| RateChange {
            rate_delta: if i % 3 == 0 { -2.0 } else { 5.0 },
            delay_hours: 0.5,
        })
        .collect();

    let mut group = c.benchmark_group("projection");

    group.bench_function("project_40_changes", |b| {
        b.iter(|| project(black_box(3_850_200.0), black_box(25.0), &changes, Some(start)))
    });

    let mut calculator = DurationCalculator::new();
    calculator.set_hp(3_850_200.0);
    calculator.set_rate(25.0);
    calculator.set_start(Some(start));
    calculator.set_zone(Some(5.5));
    calculator.replace_changes(changes.clone());

    group.bench_function("render_view_40_changes", |b| {
        b.iter(|| black_box(&calculator).view_in(&Utc))
    });

    group.finish();
}

fn benchmark_relative(c: &mut Criterion) {
    c.bench_function("relative_from_seconds", |b| {
        b.iter(|| relative_from_seconds(black_box(193_512.0), black_box(true)))
    });
}

criterion_group!(benches, benchmark_projection, benchmark_relative);
criterion_main!(benches);

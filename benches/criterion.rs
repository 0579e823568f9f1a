//! Benchmarks for row transformation, label alignment and unit resolution

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use perf_report_core::{
    align_label_parts, PerRevisionStats, RawMetricRow, Revision, RowTransformer,
    RunningStatistics, Statistic, StatisticSet, TransformedRow, UnitRegistry,
};

fn make_rows(count: usize) -> Vec<RawMetricRow> {
    let stats = |mean: f64| PerRevisionStats {
        statistics: RunningStatistics::from_samples((0..32).map(|i| mean + i as f64)),
        descriptors: Vec::new(),
    };
    (0..count)
        .map(|i| RawMetricRow {
            label: format!("group{}:subgroup{}:metric{}", i / 50, i / 10, i),
            units: if i % 2 == 0 { "ms_smallerIsBetter" } else { "KB" }.to_string(),
            measurement: format!("metric{}", i),
            suites: vec!["suite".to_string()],
            bots: vec!["master:bot".to_string()],
            data: [
                ("100".to_string(), stats(i as f64)),
                ("200".to_string(), stats(i as f64 * 1.1)),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        })
        .collect()
}

fn transform_all(
    transformer: &RowTransformer<'_>,
    rows: &[RawMetricRow],
    statistics: &StatisticSet,
) -> Vec<TransformedRow> {
    rows.iter()
        .map(|row| {
            transformer.transform(row, &Revision::Number(100), &Revision::Number(200), statistics)
        })
        .collect()
}

fn bench_transform(c: &mut Criterion) {
    let units = UnitRegistry::standard();
    let transformer = RowTransformer::new(&units, "https://perf.example.com");
    let rows = make_rows(500);
    let avg = StatisticSet::default();
    let all = StatisticSet::new(Statistic::ALL);

    c.bench_function("transform::rows_500_avg", |b| {
        b.iter(|| transform_all(&transformer, black_box(&rows), &avg))
    });

    c.bench_function("transform::rows_500_all_statistics", |b| {
        b.iter(|| transform_all(&transformer, black_box(&rows), &all))
    });
}

fn bench_align(c: &mut Criterion) {
    let units = UnitRegistry::standard();
    let transformer = RowTransformer::new(&units, "");
    let transformed = transform_all(&transformer, &make_rows(500), &StatisticSet::default());

    c.bench_function("align::rows_500", |b| {
        b.iter_batched(
            || transformed.clone(),
            |mut rows| {
                align_label_parts(&mut rows);
                rows
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_units(c: &mut Criterion) {
    let units = UnitRegistry::standard();

    c.bench_function("units::resolve_registered", |b| {
        b.iter(|| units.resolve(black_box("msDelta_smallerIsBetter"), None, 4))
    });

    c.bench_function("units::resolve_legacy", |b| {
        b.iter(|| units.resolve(black_box("seconds"), None, 0))
    });
}

criterion_group!(transform, bench_transform);
criterion_group!(align, bench_align);
criterion_group!(units, bench_units);

criterion_main!(transform, align, units);

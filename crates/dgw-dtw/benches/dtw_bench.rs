//! Criterion benchmarks for dgw-dtw: DTW distance, full alignment and the pairwise engine.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use dgw_dtw::{
    BandConstraint, Dataset, Dtw, Metric, Parallelism, RegionId, Sequence, pairwise_distances,
};

fn make_sine_sequence(n: usize, offset: f64) -> Sequence {
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin() + offset).collect();
    Sequence::univariate(values)
}

fn bench_dtw_distance(c: &mut Criterion) {
    let lengths = [64usize, 256, 1024];
    let bands: &[(BandConstraint, &str)] = &[
        (BandConstraint::Unconstrained, "unconstrained"),
        (BandConstraint::SlantedBand(2), "band_k2"),
        (BandConstraint::SlantedBand(10), "band_k10"),
    ];

    let mut group = c.benchmark_group("dtw_distance");

    for &len in &lengths {
        for &(band, band_label) in bands {
            let id = BenchmarkId::new(format!("len{len}"), band_label);
            let a = make_sine_sequence(len, 0.0);
            let b = make_sine_sequence(len * 3 / 4, 1.0);
            let dtw = Dtw::new(Metric::SqEuclidean).with_constraint(band);

            group.bench_with_input(id, &(a, b, dtw), |bencher, (a, b, dtw)| {
                bencher.iter(|| dtw.distance(a.as_view(), b.as_view()));
            });
        }
    }

    group.finish();
}

fn bench_dtw_align(c: &mut Criterion) {
    let a = make_sine_sequence(256, 0.0);
    let b = make_sine_sequence(200, 0.5);
    let dtw = Dtw::new(Metric::SqEuclidean).with_scale_first(true);

    c.bench_function("dtw_align_256x200_scaled", |bencher| {
        bencher.iter(|| dtw.align(a.as_view(), b.as_view()).unwrap());
    });
}

fn bench_pairwise(c: &mut Criterion) {
    let ids: Vec<RegionId> = (0..50).map(|i| RegionId::new(format!("r{i}"))).collect();
    let seqs: Vec<Sequence> = (0..50)
        .map(|i| make_sine_sequence(96 + i, i as f64 * 0.2))
        .collect();
    let dataset = Dataset::from_sequences(ids, vec!["signal".to_string()], &seqs).unwrap();
    let dtw = Dtw::new(Metric::SqEuclidean).with_constraint(BandConstraint::SlantedBand(2));

    c.bench_function("pairwise_50x128_k2", |b| {
        b.iter(|| pairwise_distances(&dataset, &dtw, Parallelism::available()).unwrap());
    });
}

criterion_group!(benches, bench_dtw_distance, bench_dtw_align, bench_pairwise);
criterion_main!(benches);

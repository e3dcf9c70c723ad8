use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use metrics_exponential::{Aggregator, Config, Histogram};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

const SAMPLES: usize = 1024;

fn samples(spread: i32) -> Vec<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0xfeed);
    (0..SAMPLES)
        .map(|_| rng.random_range(1.0..2.0) * 2f64.powi(rng.random_range(-spread..=spread)))
        .collect()
}

fn update_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    group.throughput(Throughput::Elements(SAMPLES as u64));

    // A narrow spread stays on the logarithm mapping, a wide one ends up on the exponent mapping.
    for spread in [1, 8, 64, 512] {
        let values = samples(spread);
        group.bench_with_input(BenchmarkId::new("histogram", spread), &values, |b, values| {
            b.iter_batched_ref(
                || Histogram::<f64>::new(Config::new()),
                |h| h.update_many(values.iter().copied()),
                BatchSize::SmallInput,
            )
        });
    }

    let values = samples(16);
    group.bench_function("aggregator", |b| {
        let agg = Aggregator::<f64>::new(Config::new());
        b.iter(|| {
            for value in &values {
                agg.update(*value);
            }
        })
    });

    let integers: Vec<i64> = (1..=SAMPLES as i64).collect();
    group.bench_function("integers", |b| {
        b.iter_batched_ref(
            || Histogram::<i64>::new(Config::new()),
            |h| h.update_many(integers.iter().copied()),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn merge_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    let mut wide = Histogram::<f64>::new(Config::new());
    wide.update_many(samples(64));
    let mut narrow = Histogram::<f64>::new(Config::new());
    narrow.update_many(samples(2));

    group.bench_function("mixed scales", |b| {
        b.iter_batched_ref(
            || narrow.clone(),
            |h| h.merge_from(&wide),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("copy", |b| {
        let mut dest = Histogram::<f64>::new(Config::new());
        b.iter(|| wide.copy_into(&mut dest))
    });

    group.finish();
}

criterion_group!(benches, update_benchmark, merge_benchmark);
criterion_main!(benches);

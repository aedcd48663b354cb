//! Benchmarks for wfknn hot paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use wfknn::config::DEFAULT_FEATURE_COUNT;
use wfknn::vector::MISSING;
use wfknn::{weighted_distance, Classifier, Dataset, ExperimentConfig, FeatureVector, FoldPartition};

const SITES: usize = 20;
const INSTANCES: usize = 10;
const OPEN: usize = 100;

fn random_vector(rng: &mut ChaCha8Rng) -> FeatureVector {
    let values = (0..DEFAULT_FEATURE_COUNT)
        .map(|_| {
            if rng.gen::<f64>() < 0.2 {
                MISSING
            } else {
                rng.gen_range(0.0..500.0)
            }
        })
        .collect();
    FeatureVector::from_values(values)
}

fn fixture() -> (ExperimentConfig, Dataset) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let monitored = (0..SITES * INSTANCES).map(|_| random_vector(&mut rng)).collect();
    let unmonitored = (0..OPEN).map(|_| random_vector(&mut rng)).collect();
    let dataset = Dataset::from_parts(SITES, INSTANCES, monitored, unmonitored).unwrap();
    let config = ExperimentConfig::new(SITES, INSTANCES, OPEN, "bench");
    (config, dataset)
}

fn benchmark_distance(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let a = random_vector(&mut rng);
    let b = random_vector(&mut rng);
    let weights = vec![1.0; DEFAULT_FEATURE_COUNT];
    let present = a.present_indices();

    c.bench_function("weighted_distance", |bench| {
        bench.iter(|| weighted_distance(black_box(&a), black_box(&b), &weights, &present))
    });
}

fn benchmark_classify(c: &mut Criterion) {
    let (config, dataset) = fixture();
    let partition = FoldPartition::new(&config);
    let weights = vec![1.0; DEFAULT_FEATURE_COUNT];
    let classifier = Classifier::new(&dataset, &partition, &weights, 0);

    c.bench_function("classify_k1_to_k5", |bench| {
        bench.iter(|| classifier.classify(black_box(0), &[1, 2, 3, 4, 5]))
    });
}

criterion_group!(benches, benchmark_distance, benchmark_classify);
criterion_main!(benches);

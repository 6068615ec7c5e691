//! Performance benchmarks for the matcher.
//!
//! Resolution is a linear scan, so cost grows with the number of enrolled
//! identities times the signature dimension. These benchmarks track that
//! scan at the default 128 dimensions.
//!
//! # Run Benchmarks
//!
//! ```sh
//! cargo bench --bench matcher_bench
//!
//! # Only the candidate-count sweep
//! cargo bench --bench matcher_bench -- resolve_by_candidates
//!
//! # Compare against a saved baseline
//! cargo bench --bench matcher_bench -- --save-baseline main
//! cargo bench --bench matcher_bench -- --baseline main
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use facegate_access::{Matcher, MatcherConfig};
use facegate_core::constants::DEFAULT_SIGNATURE_DIMENSION;
use facegate_core::{Candidate, FaceSignature, Identity};
use std::hint::black_box;

/// Deterministic pseudo-random signature; `seed` picks the face.
fn signature(seed: usize, dim: usize) -> FaceSignature {
    let values = (0..dim)
        .map(|i| (((seed * 31 + i * 17) % 97) as f64 / 97.0) - 0.5)
        .collect();
    FaceSignature::new(values).unwrap()
}

fn gallery(count: usize, dim: usize) -> Vec<Candidate> {
    (0..count)
        .map(|i| {
            Candidate::new(
                Identity::named(&format!("person-{i}")).unwrap(),
                signature(i, dim),
            )
        })
        .collect()
}

/// Resolution cost as the gallery grows.
fn bench_resolve_by_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_by_candidates");
    let matcher = Matcher::new(MatcherConfig::default()).unwrap();
    let query = signature(3, DEFAULT_SIGNATURE_DIMENSION);

    for count in [1, 10, 100, 1_000] {
        let candidates = gallery(count, DEFAULT_SIGNATURE_DIMENSION);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &candidates, |b, candidates| {
            b.iter(|| black_box(matcher.resolve(black_box(&query), black_box(candidates))));
        });
    }

    group.finish();
}

/// Resolution cost as the signature dimension grows, 100 candidates.
fn bench_resolve_by_dimension(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_by_dimension");
    let matcher = Matcher::default();

    for dim in [32, 128, 512] {
        let candidates = gallery(100, dim);
        let query = signature(7, dim);

        group.bench_with_input(BenchmarkId::from_parameter(dim), &candidates, |b, candidates| {
            b.iter(|| black_box(matcher.resolve(black_box(&query), black_box(candidates))));
        });
    }

    group.finish();
}

/// Multi-sample enrollments are reduced on every load.
fn bench_centroid(c: &mut Criterion) {
    let mut group = c.benchmark_group("centroid");

    for samples in [1, 5, 20] {
        let batch: Vec<_> = (0..samples)
            .map(|i| signature(i, DEFAULT_SIGNATURE_DIMENSION))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(samples), &batch, |b, batch| {
            b.iter(|| black_box(FaceSignature::centroid(black_box(batch))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_by_candidates,
    bench_resolve_by_dimension,
    bench_centroid
);
criterion_main!(benches);

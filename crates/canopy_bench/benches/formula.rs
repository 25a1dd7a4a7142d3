//! Formula benchmarks.

use canopy_bench::tree_store;
use canopy_core::{Formula, HierarchyQuery};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Benchmark computing a fresh formula versus reading a memoized one.
fn bench_compute(c: &mut Criterion) {
    let store = tree_store(10_000, 8);

    c.bench_function("formula_compute_cold", |b| {
        b.iter(|| {
            let formula = store.formula(HierarchyQuery::from_root(&[]));
            black_box(formula.compute().len());
        });
    });

    let formula = store.formula(HierarchyQuery::from_root(&[]));
    let _ = formula.compute();
    c.bench_function("formula_compute_memoized", |b| {
        b.iter(|| black_box(formula.compute().len()));
    });
}

/// Benchmark cache key derivation.
fn bench_hash(c: &mut Criterion) {
    let store = tree_store(1_000, 8);
    let formula = store.formula(HierarchyQuery::from_parent(0, true, Some(2), &[3]));

    c.bench_function("formula_hash", |b| {
        b.iter(|| black_box(formula.hash()));
    });
}

criterion_group!(benches, bench_compute, bench_hash);
criterion_main!(benches);

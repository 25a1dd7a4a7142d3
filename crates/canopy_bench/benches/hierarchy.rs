//! Hierarchy index benchmarks.

use canopy_bench::{forward_tree_ops, reverse_tree_ops, tree_store};
use canopy_core::{HierarchyIndex, HierarchyStoragePart, HierarchyStore};
use canopy_testkit::replay;
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

/// Benchmark building a tree parents-first versus children-first.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for count in [100, 1_000, 5_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        let forward = forward_tree_ops(*count, 8);
        let reverse = reverse_tree_ops(*count, 8);

        group.bench_with_input(BenchmarkId::new("parents_first", count), &forward, |b, ops| {
            b.iter_batched(
                || HierarchyStore::new(HierarchyIndex::new()),
                |store| replay(&store, black_box(ops)).unwrap(),
                BatchSize::SmallInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("children_first", count), &reverse, |b, ops| {
            b.iter_batched(
                || HierarchyStore::new(HierarchyIndex::new()),
                |store| replay(&store, black_box(ops)).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark re-parenting a subtree under another branch.
fn bench_reparent(c: &mut Criterion) {
    let store = tree_store(5_000, 8);

    c.bench_function("reparent_subtree", |b| {
        let index = store.current();
        b.iter(|| {
            let mut txn = store.begin();
            index.set_hierarchy_for(&mut txn, 1, Some(2), 0).unwrap();
            store.rollback(&mut txn).unwrap();
        });
    });
}

/// Benchmark enumeration queries over a committed generation.
fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let store = tree_store(10_000, 8);
    let index = store.current();
    let view = index.view(None);

    group.bench_function("list_from_root", |b| {
        b.iter(|| black_box(view.list_nodes_from_root(&[])));
    });
    group.bench_function("list_from_root_excluding", |b| {
        b.iter(|| black_box(view.list_nodes_from_root(black_box(&[1, 9]))));
    });
    for levels in [1u32, 3].iter() {
        group.bench_with_input(BenchmarkId::new("down_to", levels), levels, |b, &levels| {
            b.iter(|| black_box(view.list_nodes_from_root_down_to(levels, &[])));
        });
    }
    group.bench_function("parent_path", |b| {
        b.iter(|| black_box(view.parent_path_including_itself(black_box(9_999))));
    });
    group.bench_function("verify", |b| {
        b.iter(|| view.verify().unwrap());
    });
    group.finish();
}

/// Benchmark storage part encoding and decoding.
fn bench_storage_part(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage_part");
    let store = tree_store(10_000, 8);
    let part = store.current().create_storage_part(1).unwrap();
    let bytes = part.to_bytes().unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| black_box(part.to_bytes().unwrap()));
    });
    group.bench_function("decode", |b| {
        b.iter(|| black_box(HierarchyStoragePart::from_bytes(black_box(&bytes)).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_reparent,
    bench_queries,
    bench_storage_part,
);

criterion_main!(benches);

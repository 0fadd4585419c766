// SPDX-License-Identifier: Apache-2.0

//! Benchmarks for the interval-set operations on the allocation hot path.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

use cosim_procset::ProcSet;

/// A fragmented set: every other run of `width` cores over `spans` runs.
fn fragmented(spans: u32, width: u32) -> ProcSet {
    let mut set = ProcSet::new();
    for i in 0..spans {
        let lo = i * width * 2;
        set = set.union(&ProcSet::from(lo..=lo + width - 1));
    }
    set
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("procset_union");
    for spans in [16u32, 256, 4096] {
        let a = fragmented(spans, 4);
        let b = fragmented(spans, 2);
        let _ = group.bench_function(format!("spans_{spans}"), |bencher| {
            bencher.iter(|| a.union(&b));
        });
    }
    group.finish();
}

fn bench_difference_take(c: &mut Criterion) {
    let mut group = c.benchmark_group("procset_alloc_cycle");
    let free = fragmented(1024, 8);
    let _ = group.bench_function("take_then_difference", |bencher| {
        bencher.iter_batched(
            || free.clone(),
            |set| {
                let taken = set.take(64);
                set.difference(&taken)
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_union, bench_difference_take);
criterion_main!(benches);

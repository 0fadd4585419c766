// SPDX-License-Identifier: Apache-2.0

//! End-to-end simulation benchmarks: one synthetic workload per policy.

#![allow(missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};

use cosim_engine::{ComputeEngine, Logger, PolicyOptions, build};
use cosim_model::{Cluster, Database, Heatmap, Job, SocketConf};

const NODES: usize = 32;
const JOBS: u64 = 256;

fn workload() -> Vec<Job> {
    (0..JOBS)
        .map(|i| {
            let name = format!("load{}", i % 16);
            let processes = 4 + (i % 4) as u32 * 8;
            let runtime = 60.0 + (i % 7) as f64 * 45.0;
            Job::new(i, name, processes, runtime, i as f64 * 20.0, runtime * 1.2)
        })
        .collect()
}

fn heatmap() -> Heatmap {
    let mut map = Heatmap::new();
    for a in 0..16 {
        for b in 0..16 {
            let value = 0.7 + ((a * 7 + b * 3) % 8) as f64 * 0.1;
            map.insert(&format!("load{a}"), &format!("load{b}"), Some(value));
        }
    }
    map
}

fn run_policy(policy: &str) {
    let shape = SocketConf::new([8, 8]).expect("shape");
    let cluster = Cluster::new(NODES, shape).expect("cluster");
    let scheduler = build(policy, PolicyOptions::default()).expect("registered policy");
    let mut engine = ComputeEngine::new(
        Database::new(workload(), heatmap()),
        cluster,
        scheduler,
        Logger::new(),
    );
    engine.run().expect("simulation completes");
}

fn bench_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("sim_run");
    let _ = group.sample_size(10);
    for policy in ["fifo", "easy", "conservative", "ranks.jungle"] {
        let _ = group.bench_function(policy, |bencher| {
            bencher.iter(|| run_policy(policy));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_policies);
criterion_main!(benches);

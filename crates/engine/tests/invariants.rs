// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Step-by-step invariant checks over full simulations.
//!
//! The engine's `step` is public, so these tests interleave their own
//! assertions with the event loop and check the resource-accounting and
//! monotonicity invariants after every transition.

use cosim_engine::{ComputeEngine, Logger, PolicyOptions, build};
use cosim_model::{Cluster, Database, Heatmap, HostState, Job, SocketConf};

fn shape(cores: &[u32]) -> SocketConf {
    SocketConf::new(cores.iter().copied()).expect("shape")
}

fn mixed_workload() -> Vec<Job> {
    let mut jobs = vec![
        Job::new(0, "A", 4, 30.0, 0.0, 35.0),
        Job::new(0, "B", 8, 20.0, 0.0, 25.0),
        Job::new(0, "C", 2, 10.0, 5.0, 12.0),
        Job::new(0, "D", 4, 15.0, 10.0, 20.0),
        Job::new(0, "E", 6, 25.0, 20.0, 30.0),
        Job::new(0, "F", 4, 5.0, 20.0, 8.0),
    ];
    for job in &mut jobs {
        job.tags = vec![job.name.clone()];
    }
    jobs
}

fn pair_heatmap() -> Heatmap {
    let mut heatmap = Heatmap::new();
    let names = ["A", "B", "C", "D", "E", "F"];
    for (i, a) in names.iter().enumerate() {
        for (j, b) in names.iter().enumerate() {
            // A mix of good, bad, and unknown pairings.
            let value = match (i + j) % 3 {
                0 => Some(1.1),
                1 => Some(0.7),
                _ => None,
            };
            heatmap.insert(a, b, value);
        }
    }
    heatmap
}

fn check_step_invariants(engine: &ComputeEngine, last_makespan: f64) {
    let cluster = &engine.state().cluster;

    // Idle-core counter matches the per-host free sets, and the free sets
    // are disjoint from every held set (their union never exceeds total).
    cluster
        .verify_core_accounting()
        .expect("no idle-core drift");
    assert_eq!(cluster.free_procs().len(), cluster.idle_cores());

    // Makespan never moves backwards.
    assert!(engine.makespan() >= last_makespan);

    for job in &cluster.execution_list {
        assert!(
            job.sim_speedup >= job.min_speedup && job.sim_speedup <= job.max_speedup,
            "applied speedup stays within the job's profile"
        );
        assert!(job.remaining_time > 0.0);
        assert!(!job.assigned_hosts.is_empty());
    }

    for host in cluster.hosts() {
        if host.state() == HostState::Idle {
            assert_eq!(host.occupant_count(), 0);
        }
        if host.occupant_count() > 0 {
            assert_eq!(host.state(), HostState::Allocated);
        }
    }
}

fn drive(policy: &str) -> ComputeEngine {
    let cluster = Cluster::new(2, shape(&[2, 2])).expect("cluster");
    let scheduler = build(policy, PolicyOptions::default()).expect("registered policy");
    let mut engine = ComputeEngine::new(
        Database::new(mixed_workload(), pair_heatmap()),
        cluster,
        scheduler,
        Logger::new(),
    );
    engine.setup().expect("setup succeeds");

    let mut last_makespan = 0.0;
    let mut steps = 0;
    while !engine.is_done() {
        engine.step().expect("step succeeds");
        check_step_invariants(&engine, last_makespan);
        last_makespan = engine.makespan();
        steps += 1;
        assert!(steps < 10_000, "simulation failed to terminate");
    }
    engine
}

#[test]
fn every_policy_preserves_the_invariants() {
    for policy in [
        "fifo",
        "easy",
        "conservative",
        "ranks.random",
        "ranks.filler",
        "ranks.bester",
        "ranks.jungle",
        "rules",
    ] {
        let engine = drive(policy);
        assert_eq!(
            engine.state().logger.finished_count(),
            6,
            "{policy}: every admitted job eventually finishes"
        );
        assert_eq!(
            engine.state().cluster.idle_cores(),
            engine.state().cluster.total_cores(),
            "{policy}: all cores return after the run"
        );
        assert!(engine.progress() == 1.0, "{policy}");
    }
}

/// FIFO no-starvation: every job whose footprint fits the cluster starts
/// in bounded time, in submit order.
#[test]
fn fifo_starts_jobs_in_bounded_time() {
    let engine = drive("fifo");
    let records = engine.state().logger.records();
    let mut last_start = 0.0;
    for (sig, record) in records {
        assert!(record.finish > record.start, "{sig} never ran");
        // FIFO without backfill starts jobs in queue order.
        assert!(record.start >= last_start, "{sig} started out of order");
        last_start = record.start;
    }
}

/// Checkpoints are sorted and the unused-core trace stays within bounds.
#[test]
fn checkpoint_traces_are_well_formed() {
    let engine = drive("easy");
    let unused = engine.state().logger.unused_cores();
    let total = engine.state().cluster.total_cores();
    for pair in unused.checkpoints.windows(2) {
        assert!(pair[0] < pair[1], "checkpoints strictly increase");
    }
    for value in &unused.values {
        assert!(*value <= total);
    }
    let throughput = engine.state().logger.throughput();
    for pair in throughput.values.windows(2) {
        assert!(pair[0] <= pair[1], "throughput is cumulative");
    }
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Deterministic end-to-end scheduling scenarios.
//!
//! Each test drives one small workload through a full simulation and pins
//! the resulting makespan and per-job start/finish times.

use pretty_assertions::assert_eq;

use cosim_engine::{ComputeEngine, Logger, PolicyOptions, build};
use cosim_model::{Cluster, Database, Heatmap, Job, JobSig, SocketConf};

fn shape(cores: &[u32]) -> SocketConf {
    SocketConf::new(cores.iter().copied()).expect("shape")
}

fn job(name: &str, processes: u32, remaining: f64, submit: f64, wall: f64) -> Job {
    Job::new(0, name, processes, remaining, submit, wall)
}

fn run(
    policy: &str,
    jobs: Vec<Job>,
    heatmap: Heatmap,
    nodes: usize,
    conf: &[u32],
) -> ComputeEngine {
    let cluster = Cluster::new(nodes, shape(conf)).expect("cluster");
    let scheduler = build(policy, PolicyOptions::default()).expect("registered policy");
    let mut engine = ComputeEngine::new(Database::new(jobs, heatmap), cluster, scheduler, Logger::new());
    engine.run().expect("simulation completes");
    engine
}

fn record(engine: &ComputeEngine, id: u64, name: &str) -> (f64, f64) {
    let sig = JobSig {
        id,
        name: name.to_owned(),
    };
    let record = &engine.state().logger.records()[&sig];
    (record.start, record.finish)
}

fn unit_heatmap(names: &[&str]) -> Heatmap {
    let mut heatmap = Heatmap::new();
    for a in names {
        for b in names {
            heatmap.insert(a, b, Some(1.0));
        }
    }
    heatmap
}

/// S1: a single compact job owns the whole cluster.
#[test]
fn s1_single_job_runs_to_its_remaining_time() {
    let heatmap = unit_heatmap(&["A"]);
    let engine = run(
        "fifo",
        vec![job("A", 4, 10.0, 0.0, 10.0)],
        heatmap,
        1,
        &[2, 2],
    );
    assert_eq!(engine.makespan(), 10.0);
    assert_eq!(record(&engine, 0, "A"), (0.0, 10.0));

    let sig = JobSig {
        id: 0,
        name: "A".to_owned(),
    };
    assert!(
        engine.state().logger.records()[&sig].speedup_trace.is_empty(),
        "a compact job never changes speedup"
    );
}

/// S2: two compact jobs fill two nodes side by side.
#[test]
fn s2_two_jobs_run_in_parallel() {
    let engine = run(
        "fifo",
        vec![job("A", 4, 10.0, 0.0, 10.0), job("B", 4, 10.0, 0.0, 10.0)],
        Heatmap::new(),
        2,
        &[2, 2],
    );
    assert_eq!(engine.makespan(), 10.0);
    assert_eq!(record(&engine, 0, "A"), (0.0, 10.0));
    assert_eq!(record(&engine, 1, "B"), (0.0, 10.0));
}

/// S3: the third job waits for a free node.
#[test]
fn s3_third_job_queues_behind_the_first_two() {
    let engine = run(
        "fifo",
        vec![
            job("A", 4, 10.0, 0.0, 10.0),
            job("B", 4, 10.0, 0.0, 10.0),
            job("C", 4, 10.0, 0.0, 10.0),
        ],
        Heatmap::new(),
        2,
        &[2, 2],
    );
    assert_eq!(engine.makespan(), 20.0);
    assert_eq!(record(&engine, 0, "A"), (0.0, 10.0));
    assert_eq!(record(&engine, 1, "B"), (0.0, 10.0));
    assert_eq!(record(&engine, 2, "C"), (10.0, 20.0));
}

/// S4: with a neutral heatmap, half-socket co-scheduling packs two jobs
/// per node and the whole batch runs concurrently.
#[test]
fn s4_coscheduling_packs_two_jobs_per_node() {
    let heatmap = unit_heatmap(&["A", "B", "C", "D"]);
    let engine = run(
        "ranks.random",
        vec![
            job("A", 4, 10.0, 0.0, 10.0),
            job("B", 4, 10.0, 0.0, 10.0),
            job("C", 4, 10.0, 0.0, 10.0),
            job("D", 4, 10.0, 0.0, 10.0),
        ],
        heatmap,
        4,
        &[2, 2],
    );
    assert_eq!(engine.makespan(), 10.0);
    for (id, name) in [(0, "A"), (1, "B"), (2, "C"), (3, "D")] {
        assert_eq!(record(&engine, id, name), (0.0, 10.0), "{name}");
    }
    // Every job shared each of its hosts with exactly one neighbor.
    for row in engine.state().logger.gantt() {
        assert_eq!(row.hosts.len(), 2, "half-socket footprint spans two hosts");
    }
}

/// S5: EASY backfills the short job inside the head's reservation and
/// keeps the long one out.
#[test]
fn s5_easy_backfill_respects_the_head_reservation() {
    let engine = run(
        "easy",
        vec![
            job("X", 4, 40.0, 0.0, 40.0),
            job("head", 8, 50.0, 0.0, 50.0),
            job("b1", 4, 10.0, 0.0, 10.0),
            job("b2", 4, 100.0, 0.0, 100.0),
        ],
        Heatmap::new(),
        2,
        &[2, 2],
    );
    assert_eq!(record(&engine, 0, "X"), (0.0, 40.0));
    assert_eq!(record(&engine, 2, "b1"), (0.0, 10.0), "b1 fits the reservation");
    assert_eq!(record(&engine, 1, "head").0, 40.0, "the head is not delayed");
    assert_eq!(
        record(&engine, 3, "b2").0,
        90.0,
        "b2's wall time exceeds the reservation and must wait for the head"
    );
    assert_eq!(engine.makespan(), 190.0);
}

/// S6: a bad pairing halves both speedups and doubles both runtimes.
#[test]
fn s6_interference_doubles_corunning_jobs() {
    let mut heatmap = Heatmap::new();
    heatmap.insert("A", "A", Some(1.0));
    heatmap.insert("A", "B", Some(0.5));
    heatmap.insert("B", "B", Some(1.0));
    heatmap.insert("B", "A", Some(0.5));

    let engine = run(
        "ranks.random",
        vec![job("A", 4, 10.0, 0.0, 10.0), job("B", 4, 10.0, 0.0, 10.0)],
        heatmap,
        1,
        &[4, 4],
    );
    assert_eq!(engine.makespan(), 20.0);
    assert_eq!(record(&engine, 0, "A"), (0.0, 20.0));
    assert_eq!(record(&engine, 1, "B"), (0.0, 20.0));

    for (id, name) in [(0, "A"), (1, "B")] {
        let sig = JobSig {
            id,
            name: name.to_owned(),
        };
        let trace = &engine.state().logger.records()[&sig].speedup_trace;
        assert_eq!(trace.first().map(|entry| entry.1), Some(0.5));
    }
}

/// Conservative backfilling reaches the same placement as EASY on the S5
/// workload: the short candidate fits its position's reservation, the long
/// one does not.
#[test]
fn conservative_backfill_gates_candidates_by_their_reservation() {
    let engine = run(
        "conservative",
        vec![
            job("X", 4, 40.0, 0.0, 40.0),
            job("head", 8, 50.0, 0.0, 50.0),
            job("b1", 4, 10.0, 0.0, 10.0),
            job("b2", 4, 100.0, 0.0, 100.0),
        ],
        Heatmap::new(),
        2,
        &[2, 2],
    );
    assert_eq!(record(&engine, 2, "b1"), (0.0, 10.0));
    assert_eq!(record(&engine, 1, "head").0, 40.0);
    assert_eq!(record(&engine, 3, "b2").0, 90.0);
    assert_eq!(engine.makespan(), 190.0);
}

/// The workload export replays: every row carries the recorded times.
#[test]
fn workload_export_matches_the_run() {
    let engine = run(
        "fifo",
        vec![job("A", 4, 10.0, 0.0, 12.0), job("B", 4, 20.0, 5.0, 25.0)],
        Heatmap::new(),
        1,
        &[2, 2],
    );
    let rows = engine.state().logger.workload();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].run, 10.0);
    assert_eq!(rows[0].status, 1);
    assert_eq!(rows[1].req_procs, 4);
    assert!(rows[1].wait >= 0.0);
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Co-scheduling policies: half-socket placement with interference-aware
//! host scoring.
//!
//! The shared control flow lives here; the concrete variants differ only
//! in their two scoring hooks and tie-breaker state. Null heatmap entries
//! are treated as `1.0` inside host scorers (no known effect), while the
//! rank computation skips pairs with a missing value in either direction.

use std::collections::BTreeSet;
use std::collections::HashMap;

use cosim_model::{Host, HostId, Job};

use crate::error::Error;
use crate::sched::{
    HostScore, Scheduler, allocation, compact_allocation, find_suitable_nodes, wall_clock_eta,
};
use crate::state::SimState;

pub mod bester;
pub mod filler;
pub mod jungle;
pub mod random;
pub mod rules;

/// Rank bookkeeping shared by the ranks variants: how many good pairs each
/// waiting job can form.
#[derive(Debug, Default)]
pub struct RankTable {
    ranks: HashMap<u64, u32>,
}

impl RankTable {
    /// Recomputes the table over the waiting queue: a pair is good when the
    /// bidirectional average speedup exceeds `threshold`. Pairs with an
    /// unknown speedup in either direction are skipped.
    pub fn update(&mut self, state: &SimState, threshold: f64) {
        self.ranks = state
            .cluster
            .waiting_queue
            .iter()
            .map(|job| (job.id, 0))
            .collect();
        let jobs: Vec<(u64, &str)> = state
            .cluster
            .waiting_queue
            .iter()
            .map(|job| (job.id, job.name.as_str()))
            .collect();
        for (i, (id_a, name_a)) in jobs.iter().enumerate() {
            for (id_b, name_b) in &jobs[i + 1..] {
                let Some(ab) = state.database.heatmap.speedup(name_a, name_b) else {
                    continue;
                };
                let Some(ba) = state.database.heatmap.speedup(name_b, name_a) else {
                    continue;
                };
                if (ab + ba) / 2.0 > threshold {
                    *self.ranks.entry(*id_a).or_insert(0) += 1;
                    *self.ranks.entry(*id_b).or_insert(0) += 1;
                }
            }
        }
    }

    /// The rank of a job (0 when unknown).
    #[must_use]
    pub fn rank(&self, job_id: u64) -> u32 {
        self.ranks.get(&job_id).copied().unwrap_or(0)
    }
}

/// Default co-location host score: the worst pairing speedup among the
/// host's residents, with idle hosts scored at the job's maximum speedup
/// to bias toward spreading out.
pub(crate) fn worst_neighbor_score(state: &SimState, host: &Host, job: &Job) -> HostScore {
    if host.occupant_count() == 0 {
        return HostScore(job.max_speedup, 0.0);
    }
    let mut worst = f64::INFINITY;
    for sig in host.occupant_sigs() {
        let speedup = state
            .database
            .heatmap
            .speedup(&job.name, &sig.name)
            .unwrap_or(1.0);
        worst = worst.min(speedup);
    }
    HostScore(worst, 0.0)
}

/// Co-scheduled deploy pass: reorder the first `queue_depth` waiting jobs
/// by the policy's score (descending, stable) and co-locate them under the
/// half-socket shape, stopping at the first job that does not fit.
pub(crate) fn deploy_coscheduled(
    sched: &dyn Scheduler,
    state: &mut SimState,
    queue_depth: Option<usize>,
) -> Result<bool, Error> {
    let half = state.cluster.half_socket_allocation().clone();
    let half_capacity = state.cluster.nodes() as u32 * half.total();
    let depth = queue_depth.unwrap_or(usize::MAX);

    let mut scored: Vec<(f64, u64, u32)> = state
        .cluster
        .waiting_queue
        .iter()
        .take(depth)
        .map(|job| (sched.waiting_queue_reorder(state, job), job.id, job.processes))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut deployed = false;
    for (_, id, processes) in scored {
        // A job wider than the whole half-socket capacity can never be
        // co-located; it falls back to a compact allocation so schedulable
        // workloads cannot starve.
        let placed = if processes > half_capacity {
            compact_allocation(sched, state, id, false)?
        } else {
            allocation(sched, state, id, &half, false)?
        };
        if placed {
            deployed = true;
        } else {
            break;
        }
    }
    Ok(deployed)
}

/// EASY-style backfill under the half-socket shape: reserve for the blocked
/// head, then co-locate candidates sorted by wall time ascending.
pub(crate) fn backfill_coscheduled(
    sched: &dyn Scheduler,
    state: &mut SimState,
    backfill_depth: usize,
) -> Result<bool, Error> {
    if state.cluster.waiting_queue.len() <= 1 {
        return Ok(false);
    }
    let half = state.cluster.half_socket_allocation().clone();
    let Some(blocked) = state.cluster.waiting_queue.front().cloned() else {
        return Ok(false);
    };

    // Hosts that could take a share of the blocked job right now, plus the
    // hosts of the next jobs to finish, until its footprint is covered.
    let (suitable, _) = find_suitable_nodes(sched, state, blocked.processes, &half, false, &blocked);
    let mut aggregated: BTreeSet<HostId> = suitable.into_iter().map(|p| p.host).collect();

    let makespan = state.cluster.makespan();
    let mut etas: Vec<(f64, Vec<HostId>)> = state
        .cluster
        .execution_list
        .iter()
        .map(|job| (wall_clock_eta(job, makespan), job.assigned_hosts.clone()))
        .collect();
    etas.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut reserve_time = f64::INFINITY;
    for (eta, hosts) in etas {
        aggregated.extend(hosts);
        if aggregated.len() >= blocked.half_socket_nodes as usize {
            reserve_time = eta;
            break;
        }
    }
    if reserve_time.is_infinite() {
        return Ok(false);
    }

    let mut candidates: Vec<(f64, u64)> = state
        .cluster
        .waiting_queue
        .iter()
        .skip(1)
        .take(backfill_depth)
        .filter(|job| job.wall_time <= reserve_time)
        .map(|job| (job.wall_time, job.id))
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut deployed = false;
    for (_, id) in candidates {
        if allocation(sched, state, id, &half, false)? {
            deployed = true;
        }
    }
    Ok(deployed)
}

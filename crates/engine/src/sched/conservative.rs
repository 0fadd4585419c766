// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! FIFO with conservative backfilling.
//!
//! Unlike EASY, every waiting job gets a reservation, built by consuming
//! the waiting queue in order against a projection of the cluster: each
//! reservation is computed after the previous waiting job has (virtually)
//! taken its hosts. A candidate may backfill only when its wall time fits
//! inside its own position's reservation, so no queued job is delayed.

use std::collections::BTreeSet;

use cosim_model::{HostId, HostState};

use crate::error::Error;
use crate::sched::{PolicyOptions, Scheduler, compact_allocation, deploy_fifo, wall_clock_eta};
use crate::state::SimState;

/// FIFO deploy plus conservative backfilling.
pub struct Conservative {
    options: PolicyOptions,
}

impl Conservative {
    /// Builds the policy.
    #[must_use]
    pub fn new(options: PolicyOptions) -> Self {
        Self { options }
    }
}

/// A job in the reservation projection: the hosts it holds and the seconds
/// until its wall-time bound frees them.
struct Projected {
    hosts: Vec<HostId>,
    eta: f64,
}

/// Reservation times for `waiting_queue[1..=depth]`, index-aligned with the
/// candidate list.
///
/// Each position's reservation is computed against the projection left by
/// the positions before it: executing jobs shrink toward their wall-time
/// bound and every consumed waiting job virtually occupies its hosts for
/// its own wall time. A position that nothing on the horizon can cover is
/// unconstrained (infinite reservation), and so is everything behind it;
/// those candidates are gated by resources alone.
fn reservations(state: &SimState, depth: usize) -> Vec<f64> {
    let makespan = state.cluster.makespan();

    let mut free: BTreeSet<HostId> = state
        .cluster
        .hosts()
        .iter()
        .filter(|host| host.state() == HostState::Idle)
        .map(|host| host.id())
        .collect();
    let mut projection: Vec<Projected> = state
        .cluster
        .execution_list
        .iter()
        .map(|job| Projected {
            hosts: job.assigned_hosts.clone(),
            eta: wall_clock_eta(job, makespan),
        })
        .collect();

    let candidates = state
        .cluster
        .waiting_queue
        .len()
        .saturating_sub(1)
        .min(depth);
    let mut reserves = Vec::with_capacity(candidates);
    let mut start_time = 0.0;

    for waiting in state.cluster.waiting_queue.iter().skip(1).take(depth) {
        projection.sort_by(|a, b| a.eta.total_cmp(&b.eta));

        // Free hosts plus the hosts of next-finishing projected jobs until
        // the waiting job's compact footprint fits; the reservation lands
        // at the completion that closed the gap.
        let needed = waiting.full_socket_nodes as usize;
        let mut slots: Vec<HostId> = free.iter().copied().collect();
        let mut estimated = f64::INFINITY;
        for projected in &projection {
            slots.extend(projected.hosts.iter().copied());
            if slots.len() >= needed {
                estimated = projected.eta.max(0.0);
                break;
            }
        }
        if estimated.is_infinite() {
            // Nothing ahead constrains this position or any behind it.
            while reserves.len() < candidates {
                reserves.push(f64::INFINITY);
            }
            break;
        }

        reserves.push(start_time + estimated);

        // Advance the projection to the reservation instant and let the
        // reserved job virtually occupy its hosts for its wall time.
        for projected in &mut projection {
            projected.eta -= estimated;
        }
        projection.retain(|projected| projected.eta > 0.0);

        let occupied: Vec<HostId> = slots.into_iter().take(needed).collect();
        for host in &occupied {
            let _ = free.remove(host);
        }
        projection.push(Projected {
            hosts: occupied,
            eta: waiting.wall_time,
        });
        start_time += estimated;
    }

    reserves
}

impl Scheduler for Conservative {
    fn name(&self) -> &'static str {
        "conservative"
    }

    fn description(&self) -> &'static str {
        "FIFO scheduler with conservative backfilling policy"
    }

    fn deploy(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.queue_depth;
        deploy_fifo(self, state, depth)
    }

    fn backfill_enabled(&self) -> bool {
        true
    }

    fn backfill(&mut self, state: &mut SimState) -> Result<bool, Error> {
        if state.cluster.waiting_queue.len() <= 1 {
            return Ok(false);
        }

        let reserves = reservations(state, self.options.backfill_depth);
        let candidates: Vec<(u64, f64)> = state
            .cluster
            .waiting_queue
            .iter()
            .skip(1)
            .zip(reserves.iter())
            .filter(|(job, reserve)| job.wall_time <= **reserve)
            .map(|(job, _)| (job.id, job.wall_time))
            .collect();

        let mut deployed = false;
        for (id, _) in candidates {
            if compact_allocation(self, state, id, false)? {
                deployed = true;
            }
        }
        Ok(deployed)
    }
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! FIFO with EASY (aggressive) backfilling.
//!
//! When the head of the waiting queue is blocked, a reservation time is
//! computed from the wall-time bounds of the next-completing jobs: idle
//! hosts plus the hosts of jobs about to finish are accumulated until the
//! head's compact footprint fits. Shorter jobs from behind the head may
//! then run, provided their wall time fits inside the reservation; the
//! head is never delayed.

use cosim_model::HostState;

use crate::error::Error;
use crate::sched::{PolicyOptions, Scheduler, compact_allocation, deploy_fifo, wall_clock_eta};
use crate::state::SimState;

/// FIFO deploy plus EASY backfilling behind a blocked head.
pub struct Easy {
    options: PolicyOptions,
}

impl Easy {
    /// Builds the policy.
    #[must_use]
    pub fn new(options: PolicyOptions) -> Self {
        Self { options }
    }
}

/// Seconds until enough hosts free up for the blocked head's compact
/// footprint, or `None` when no completion order covers it.
pub(crate) fn head_reservation(state: &SimState) -> Option<f64> {
    let blocked = state.cluster.waiting_queue.front()?;
    let makespan = state.cluster.makespan();

    let mut etas: Vec<(f64, usize)> = state
        .cluster
        .execution_list
        .iter()
        .map(|job| (wall_clock_eta(job, makespan), job.assigned_hosts.len()))
        .collect();
    etas.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut aggregated = state
        .cluster
        .hosts()
        .iter()
        .filter(|host| host.state() == HostState::Idle)
        .count();
    for (eta, hosts) in etas {
        aggregated += hosts;
        if aggregated >= blocked.full_socket_nodes as usize {
            return Some(eta);
        }
    }
    None
}

impl Scheduler for Easy {
    fn name(&self) -> &'static str {
        "easy"
    }

    fn description(&self) -> &'static str {
        "FIFO scheduler with EASY backfilling policy"
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
        let Some(reserve_time) = head_reservation(state) else {
            return Ok(false);
        };

        let candidates: Vec<u64> = state
            .cluster
            .waiting_queue
            .iter()
            .skip(1)
            .take(self.options.backfill_depth)
            .filter(|job| job.wall_time <= reserve_time)
            .map(|job| job.id)
            .collect();

        let mut deployed = false;
        for id in candidates {
            if compact_allocation(self, state, id, false)? {
                deployed = true;
            }
        }
        Ok(deployed)
    }
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Ranks variant that fills the holes left by earlier allocations.

use cosim_model::{Host, HostState, Job};

use crate::error::Error;
use crate::sched::cosched::{RankTable, deploy_coscheduled};
use crate::sched::{HostScore, PolicyOptions, Scheduler};
use crate::state::SimState;

/// Ranks co-scheduler that pulls forward the waiting job whose size most
/// tightly fits the currently idle cores. No backfilling.
pub struct FillerRanks {
    options: PolicyOptions,
    ranks: RankTable,
}

impl FillerRanks {
    /// Builds the policy.
    #[must_use]
    pub fn new(options: PolicyOptions) -> Self {
        Self {
            options,
            ranks: RankTable::default(),
        }
    }
}

impl Scheduler for FillerRanks {
    fn name(&self) -> &'static str {
        "ranks.filler"
    }

    fn description(&self) -> &'static str {
        "Co-scheduler that fills the holes in the system's resources left by resident jobs"
    }

    fn setup(&mut self, state: &mut SimState) {
        self.ranks.update(state, self.options.ranks_threshold);
    }

    fn deploy(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.queue_depth;
        deploy_coscheduled(self, state, depth)
    }

    fn host_alloc_condition(&self, _state: &SimState, host: &Host, _job: &Job) -> HostScore {
        let idle = if host.state() == HostState::Idle { 1.0 } else { 0.0 };
        HostScore(idle, 0.0)
    }

    fn waiting_queue_reorder(&self, state: &SimState, job: &Job) -> f64 {
        // The job closest to covering the current gap is preferred; jobs
        // that overshoot the free cores are pushed to the back.
        let sys_free_cores = state.cluster.idle_cores() as f64;
        let tightness = if sys_free_cores > 0.0 {
            let diff = sys_free_cores - f64::from(job.processes);
            if diff > 0.0 {
                1.0 - diff / sys_free_cores
            } else if diff == 0.0 {
                1.0
            } else {
                -1.0
            }
        } else {
            1.0
        };

        let queue_position = (job.id + 1) as f64 / state.cluster.waiting_queue.len().max(1) as f64;
        tightness / queue_position
    }
}

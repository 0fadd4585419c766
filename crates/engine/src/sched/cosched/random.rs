// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! The plainest ranks variant: queue order untouched, idle hosts first.

use cosim_model::{Host, HostState, Job};

use crate::error::Error;
use crate::sched::cosched::{RankTable, deploy_coscheduled};
use crate::sched::{HostScore, PolicyOptions, Scheduler};
use crate::state::SimState;

/// Ranks co-scheduler with a constant queue order and a host-state
/// indicator that prefers idle hosts. No backfilling.
pub struct RandomRanks {
    options: PolicyOptions,
    ranks: RankTable,
}

impl RandomRanks {
    /// Builds the policy.
    #[must_use]
    pub fn new(options: PolicyOptions) -> Self {
        Self {
            options,
            ranks: RankTable::default(),
        }
    }
}

impl Scheduler for RandomRanks {
    fn name(&self) -> &'static str {
        "ranks.random"
    }

    fn description(&self) -> &'static str {
        "Random co-scheduling using the ranks architecture as a fallback to classic scheduling"
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
}

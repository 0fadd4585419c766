// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Ranks variant that chases average speedup across a host's residents.

use cosim_model::{Host, Job};

use crate::error::Error;
use crate::sched::cosched::{RankTable, backfill_coscheduled, deploy_coscheduled};
use crate::sched::{HostScore, PolicyOptions, Scheduler};
use crate::state::SimState;

/// Ranks co-scheduler whose host score is the tuple `(average pairwise
/// speedup over the host's residents, count of beneficial directions)`.
/// Idle hosts score the job's maximum speedup and win every tie.
pub struct JungleRanks {
    options: PolicyOptions,
    ranks: RankTable,
}

impl JungleRanks {
    /// Builds the policy.
    #[must_use]
    pub fn new(options: PolicyOptions) -> Self {
        Self {
            options,
            ranks: RankTable::default(),
        }
    }
}

impl Scheduler for JungleRanks {
    fn name(&self) -> &'static str {
        "ranks.jungle"
    }

    fn description(&self) -> &'static str {
        "Co-scheduler using the ranks architecture to favor the job's average speedup"
    }

    fn setup(&mut self, state: &mut SimState) {
        self.ranks.update(state, self.options.ranks_threshold);
    }

    fn deploy(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.queue_depth;
        deploy_coscheduled(self, state, depth)
    }

    fn backfill_enabled(&self) -> bool {
        true
    }

    fn backfill(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.backfill_depth;
        backfill_coscheduled(self, state, depth)
    }

    fn host_alloc_condition(&self, state: &SimState, host: &Host, job: &Job) -> HostScore {
        if host.occupant_count() == 0 {
            return HostScore(job.max_speedup, f64::INFINITY);
        }

        // Both directions of every pairing count: the job's speedup next to
        // the resident and the resident's speedup next to the job.
        let heatmap = &state.database.heatmap;
        let mut sum = 0.0;
        let mut beneficial = 0.0;
        for sig in host.occupant_sigs() {
            let forward = heatmap.speedup(&job.name, &sig.name).unwrap_or(1.0);
            let backward = heatmap.speedup(&sig.name, &job.name).unwrap_or(1.0);
            sum += forward + backward;
            if forward >= 1.0 {
                beneficial += 1.0;
            }
            if backward >= 1.0 {
                beneficial += 1.0;
            }
        }
        let directions = (host.occupant_count() * 2) as f64;
        HostScore(sum / directions, beneficial)
    }
}
